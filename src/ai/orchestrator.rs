//! Fallback Controller
//!
//! Runs one behavior analysis through an ordered list of provider stages.
//!
//! ## Strategy
//!
//! 1. Validate the request (no provider is called on failure)
//! 2. With an image: multimodal provider with the image. Diagnostic failures
//!    (bad key, rejected image) are surfaced at once
//! 3. Text-only provider
//! 4. Multimodal provider without the image
//! 5. All stages failed: `AnalysisExhausted` with remediation guidance
//!
//! Each stage is attempted at most once. The first success is normalized and
//! returned.

use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use super::normalize::normalize_response;
use super::prompt::PromptTemplates;
use super::provider::{ProviderConfig, SharedProvider, create_provider};
use crate::types::{
    AnalysisRequest, AnalysisResult, FailedAttempt, PawError, ProviderError, Result,
};

/// Stage labels, in chain order
pub const STAGE_VISION: &str = "vision";
pub const STAGE_TEXT: &str = "text";
pub const STAGE_VISION_FALLBACK: &str = "vision-fallback";

/// Whether a stage failure ends the chain early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassPolicy {
    /// Always continue with the next stage
    Never,
    /// Surface diagnostic failures (auth, image) to the caller
    OnDiagnostic,
}

impl BypassPolicy {
    fn should_bypass(self, err: &ProviderError) -> bool {
        match self {
            Self::Never => false,
            Self::OnDiagnostic => err.is_diagnostic(),
        }
    }
}

/// One step of the fallback chain
#[derive(Clone)]
pub struct FallbackStage {
    pub label: &'static str,
    pub provider: SharedProvider,
    /// Send the request image with this stage
    pub attach_image: bool,
    pub bypass: BypassPolicy,
}

impl std::fmt::Debug for FallbackStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackStage")
            .field("label", &self.label)
            .field("provider", &self.provider.name())
            .field("attach_image", &self.attach_image)
            .field("bypass", &self.bypass)
            .finish()
    }
}

/// Successful analysis plus the stages that failed before it
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub result: AnalysisResult,
    pub attempts: Vec<FailedAttempt>,
}

/// Behavior analysis entry point
///
/// Immutable once built; safe to share across tasks.
#[derive(Clone)]
pub struct BehaviorAnalyzer {
    text: SharedProvider,
    vision: SharedProvider,
}

impl BehaviorAnalyzer {
    pub fn new(text: SharedProvider, vision: SharedProvider) -> Self {
        Self { text, vision }
    }

    /// Build both providers from configuration.
    ///
    /// A provider without an API key keeps its stages; each of its calls
    /// fails with an auth error.
    pub fn from_config(text: &ProviderConfig, vision: &ProviderConfig) -> Result<Self> {
        Ok(Self::new(create_provider(text)?, create_provider(vision)?))
    }

    /// Stage list for a request with or without an image
    pub fn stages(&self, has_image: bool) -> Vec<FallbackStage> {
        let mut stages = Vec::with_capacity(3);

        if has_image {
            stages.push(FallbackStage {
                label: STAGE_VISION,
                provider: self.vision.clone(),
                attach_image: true,
                bypass: BypassPolicy::OnDiagnostic,
            });
        }

        stages.push(FallbackStage {
            label: STAGE_TEXT,
            provider: self.text.clone(),
            attach_image: false,
            bypass: BypassPolicy::Never,
        });
        stages.push(FallbackStage {
            label: STAGE_VISION_FALLBACK,
            provider: self.vision.clone(),
            attach_image: false,
            bypass: BypassPolicy::Never,
        });

        stages
    }

    /// Analyze a behavior, returning normalized text
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        self.analyze_with_report(request)
            .await
            .map(|report| report.result)
    }

    /// Analyze a behavior, also returning the failed stages
    #[instrument(
        skip(self, request),
        fields(species = %request.subject.species, has_image = request.image.is_some())
    )]
    pub async fn analyze_with_report(&self, request: &AnalysisRequest) -> Result<AnalysisReport> {
        request.validate()?;

        let image = request.image.as_ref();
        let mut attempts = Vec::new();

        for stage in self.stages(image.is_some()) {
            let stage_image = if stage.attach_image { image } else { None };
            let prompt = PromptTemplates::behavior_analysis_now(
                &request.subject,
                &request.behavior_text,
                &request.context_text,
                stage_image.is_some(),
            );

            info!(
                stage = stage.label,
                provider = stage.provider.name(),
                "Starting analysis stage"
            );
            debug!(stage = stage.label, prompt_len = prompt.len(), "Prompt built");

            let started = Instant::now();
            match stage.provider.generate(&prompt, stage_image).await {
                Ok(response) => {
                    info!(
                        stage = stage.label,
                        provider = %response.metadata.provider,
                        model = %response.metadata.model,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        failed_stages = attempts.len(),
                        "Analysis stage succeeded"
                    );

                    let model = if response.metadata.model.is_empty() {
                        stage.provider.model().to_string()
                    } else {
                        response.metadata.model
                    };

                    return Ok(AnalysisReport {
                        result: AnalysisResult {
                            text: normalize_response(&response.text),
                            provider: stage.provider.name().to_string(),
                            model,
                        },
                        attempts,
                    });
                }
                Err(err) => {
                    if stage.bypass.should_bypass(&err) {
                        warn!(
                            stage = stage.label,
                            provider = stage.provider.name(),
                            kind = %err.kind,
                            "Diagnostic failure, skipping fallback"
                        );
                        return Err(PawError::Provider(err));
                    }

                    warn!(
                        stage = stage.label,
                        provider = stage.provider.name(),
                        kind = %err.kind,
                        error = %err,
                        "Analysis stage failed, falling back"
                    );

                    attempts.push(FailedAttempt {
                        stage: stage.label,
                        provider: stage.provider.name().to_string(),
                        error: err,
                        elapsed: started.elapsed(),
                    });
                }
            }
        }

        warn!(failed_stages = attempts.len(), "All analysis stages failed");
        Err(PawError::AnalysisExhausted { attempts })
    }
}
