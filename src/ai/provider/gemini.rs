//! Gemini API Provider
//!
//! Multimodal adapter over the generateContent API. Text-only requests use
//! the text model; requests with an image use the vision model and send the
//! image inline as base64.
//!
//! Every request runs under linear backoff (see `retry`). Failures that
//! survive the retry loop are remapped:
//!
//! - `PERMISSION_DENIED` becomes an auth failure
//! - "Image processing failed" becomes an invalid-image failure
//! - anything else becomes a transient service error

use std::time::Instant;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::retry::{LinearBackoffBuilder, generate_with_retry};
use super::{
    LlmProvider, LlmResponse, ProviderConfig, ProviderResult, ResponseMetadata, ResponseTiming,
    TokenUsage, http_client, missing_key_error, resolve_api_key, validate_endpoint,
};
use crate::constants::providers::{GEMINI_API_BASE, GEMINI_TEXT_MODEL, GEMINI_VISION_MODEL};
use crate::constants::retry::MAX_ATTEMPTS;
use crate::types::{ImageAttachment, ProviderError, Result};

const PROVIDER_NAME: &str = "gemini";

/// Gemini API Provider with secure API key handling
pub struct GeminiProvider {
    /// `None` makes every call fail with an auth error
    api_key: Option<SecretString>,
    api_base: String,
    text_model: String,
    vision_model: String,
    temperature: f32,
    max_tokens: u32,
    backoff: LinearBackoffBuilder,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("text_model", &self.text_model)
            .field("vision_model", &self.vision_model)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = resolve_api_key(&config, "GEMINI_API_KEY");
        Self::with_key(config, api_key)
    }

    /// Build with an explicit key, bypassing config and environment lookup
    pub(crate) fn with_key(config: ProviderConfig, api_key: Option<SecretString>) -> Result<Self> {
        let api_base = validate_endpoint(
            config.api_base.as_deref().unwrap_or(GEMINI_API_BASE),
            "Gemini",
        )?;

        Ok(Self {
            api_key,
            api_base,
            text_model: config
                .model
                .unwrap_or_else(|| GEMINI_TEXT_MODEL.to_string()),
            vision_model: config
                .vision_model
                .unwrap_or_else(|| GEMINI_VISION_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            backoff: LinearBackoffBuilder::default(),
            client: http_client(config.timeout_secs)?,
        })
    }

    /// Override the retry schedule
    pub fn with_backoff(mut self, backoff: LinearBackoffBuilder) -> Self {
        self.backoff = backoff;
        self
    }

    fn model_for(&self, image: Option<&ImageAttachment>) -> &str {
        if image.is_some() {
            &self.vision_model
        } else {
            &self.text_model
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.api_base, model)
    }

    fn build_request(
        &self,
        prompt: &str,
        image: Option<&ImageAttachment>,
    ) -> ProviderResult<GenerateContentRequest> {
        let mut parts = vec![Part::Text {
            text: prompt.to_string(),
        }];

        if let Some(image) = image {
            if image.bytes.is_empty() {
                return Err(ProviderError::invalid_image(
                    "Image processing failed: the image contains no data.",
                )
                .provider(PROVIDER_NAME));
            }
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: BASE64.encode(&image.bytes),
                },
            });
        }

        Ok(GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(self.max_tokens),
                temperature: Some(self.temperature),
            }),
        })
    }

    /// One HTTP round trip; errors carry the raw upstream message
    async fn send_once(
        &self,
        api_key: &SecretString,
        model: &str,
        request: &GenerateContentRequest,
    ) -> ProviderResult<(String, TokenUsage)> {
        debug!(model = %model, "Sending request to Gemini API");

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key.expose_secret())
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to send request to Gemini API");
                ProviderError::transient(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::transient(upstream_message(
                status.as_u16(),
                &body,
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::transient(format!("Invalid response: {}", e)))?;

        extract_text(body)
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&ImageAttachment>,
    ) -> ProviderResult<LlmResponse> {
        let model = self.model_for(image).to_string();
        info!(
            "Generating with Gemini (model: {}, image: {})",
            model,
            image.is_some()
        );

        let Some(api_key) = &self.api_key else {
            return Err(missing_key_error("Gemini", "GEMINI_API_KEY", PROVIDER_NAME));
        };

        let request = self.build_request(prompt, image)?;
        let start_time = Instant::now();
        let mut attempts = 0u32;

        let outcome = generate_with_retry(self.backoff, PROVIDER_NAME, || {
            attempts += 1;
            self.send_once(api_key, &model, &request)
        })
        .await;

        let (text, usage) = outcome.map_err(remap_exhausted)?;
        let elapsed = start_time.elapsed();
        debug!(attempts, "Received response from Gemini in {:?}", elapsed);

        Ok(LlmResponse {
            text,
            usage,
            timing: ResponseTiming {
                total_ms: elapsed.as_millis() as u64,
                attempts,
            },
            metadata: ResponseMetadata {
                model,
                provider: PROVIDER_NAME.to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.text_model
    }
}

/// Turn the last raw error of the retry loop into a user-facing one
fn remap_exhausted(err: ProviderError) -> ProviderError {
    let mapped = if err.message.contains("PERMISSION_DENIED") {
        ProviderError::auth_failure("API key validation failed. Please try again later.")
    } else if err.message.contains("Image processing failed") {
        ProviderError::invalid_image(
            "Image processing failed: please try a different image or proceed without one.",
        )
    } else {
        ProviderError::transient(format!(
            "Gemini service error: Failed after {} attempts: {}",
            MAX_ATTEMPTS, err.message
        ))
    };
    mapped.provider(PROVIDER_NAME)
}

/// `STATUS: message` from a Gemini error body, or the raw body
fn upstream_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let detail = envelope.error;
            match detail.status {
                Some(code) => format!("{}: {}", code, detail.message),
                None => detail.message,
            }
        }
        Err(_) => format!("HTTP {}: {}", status, body),
    }
}

/// Concatenate candidate text parts; blank output is a retryable failure
fn extract_text(body: GenerateContentResponse) -> ProviderResult<(String, TokenUsage)> {
    let usage = body
        .usage_metadata
        .as_ref()
        .map(|u| TokenUsage::from_gemini(u.prompt_token_count, u.candidates_token_count))
        .unwrap_or_default();

    let text = body
        .candidates
        .into_iter()
        .filter_map(|c| c.content)
        .flat_map(|content| content.parts)
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        return Err(ProviderError::transient("Empty response received"));
    }

    Ok((text, usage))
}

// === Request/Response Types ===

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    status: Option<String>,
}
