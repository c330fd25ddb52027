//! LLM Provider Abstraction
//!
//! Defines the LlmProvider trait shared by the text-only and multimodal
//! adapters. All providers return `LlmResponse` with usage metrics; failures
//! are `ProviderError` values whose kind drives the fallback controller.
//!
//! ## Modules
//!
//! - `openai`: Chat completion adapter (text only)
//! - `gemini`: generateContent adapter (text or text + inline image)
//! - `retry`: Linear backoff used by the multimodal adapter

mod gemini;
mod openai;
mod retry;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use retry::{LinearBackoff, LinearBackoffBuilder, generate_with_retry, is_fatal};

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::constants::providers as defaults;
use crate::types::{ImageAttachment, PawError, ProviderError, Result};

/// Result type for provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

// =============================================================================
// LLM Response with Usage Metrics
// =============================================================================

/// Complete LLM response including text and usage metrics
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text (not yet normalized)
    pub text: String,
    /// Token usage metrics
    pub usage: TokenUsage,
    /// Response timing
    pub timing: ResponseTiming,
    /// Provider and model info
    pub metadata: ResponseMetadata,
}

impl LlmResponse {
    /// Create response with text only (usage unknown)
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: TokenUsage::default(),
            timing: ResponseTiming::default(),
            metadata: ResponseMetadata::default(),
        }
    }
}

/// Token usage metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input tokens (prompt)
    pub input_tokens: u32,
    /// Output tokens (response)
    pub output_tokens: u32,
}

impl TokenUsage {
    /// Total tokens used (input + output)
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }

    /// Create from OpenAI-style usage response
    pub fn from_openai(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            input_tokens: prompt_tokens,
            output_tokens: completion_tokens,
        }
    }

    /// Create from Gemini usage metadata
    pub fn from_gemini(prompt_token_count: u32, candidates_token_count: u32) -> Self {
        Self {
            input_tokens: prompt_token_count,
            output_tokens: candidates_token_count,
        }
    }
}

/// Response timing metrics
#[derive(Debug, Clone, Default)]
pub struct ResponseTiming {
    /// Total response time in milliseconds (wall clock, retries included)
    pub total_ms: u64,
    /// Attempts made before the response arrived
    pub attempts: u32,
}

impl ResponseTiming {
    pub fn from_duration(duration: Duration) -> Self {
        Self {
            total_ms: duration.as_millis() as u64,
            attempts: 1,
        }
    }
}

/// Response metadata
#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    /// Model used
    pub model: String,
    /// Provider name
    pub provider: String,
}

/// Shared provider handle
pub type SharedProvider = Arc<dyn LlmProvider>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Configuration for one provider
///
/// API keys are never serialized to output and are redacted in debug output.
/// Each provider converts the key to SecretString internally.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider type: "openai", "gemini"
    pub provider: String,
    /// Text model name
    pub model: Option<String>,
    /// Vision model name (multimodal providers only)
    pub vision_model: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature
    pub temperature: f32,
    /// API key; falls back to the provider's environment variable
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,
    /// Maximum tokens to generate
    pub max_tokens: u32,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("vision_model", &self.vision_model)
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            vision_model: None,
            timeout_secs: defaults::DEFAULT_TIMEOUT_SECS,
            temperature: defaults::DEFAULT_TEMPERATURE,
            api_key: None,
            api_base: None,
            max_tokens: defaults::DEFAULT_MAX_TOKENS,
        }
    }
}

impl ProviderConfig {
    /// Defaults for the text-only chat completion provider
    pub fn openai() -> Self {
        Self {
            provider: "openai".to_string(),
            model: Some(defaults::OPENAI_MODEL.to_string()),
            ..Default::default()
        }
    }

    /// Defaults for the multimodal provider
    pub fn gemini() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: Some(defaults::GEMINI_TEXT_MODEL.to_string()),
            vision_model: Some(defaults::GEMINI_VISION_MODEL.to_string()),
            ..Default::default()
        }
    }
}

// =============================================================================
// LLM Provider Trait
// =============================================================================

/// Text (and optionally image) generation provider
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a free-text answer for `prompt`.
    ///
    /// Providers that cannot read images ignore `image`.
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&ImageAttachment>,
    ) -> ProviderResult<LlmResponse>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model name used for text-only requests
    fn model(&self) -> &str;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config.clone())?)),
        "gemini" => Ok(Arc::new(GeminiProvider::new(config.clone())?)),
        _ => Err(PawError::Config(format!(
            "Unknown provider: {}. Supported: openai, gemini",
            config.provider
        ))),
    }
}

/// Resolve the API key from config or the named environment variable
fn resolve_api_key(config: &ProviderConfig, env_var: &str) -> Option<SecretString> {
    config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| std::env::var(env_var).ok())
        .filter(|k| !k.trim().is_empty())
        .map(SecretString::from)
}

/// Error returned by `generate` when no key was configured.
///
/// Carries the "API key" marker, so the vision stage surfaces it and the
/// other stages fall through.
fn missing_key_error(label: &str, env_var: &str, provider: &str) -> ProviderError {
    ProviderError::auth_failure(format!(
        "{} API key not found. Set {} env var or provide in config",
        label, env_var
    ))
    .provider(provider)
}

/// Validate endpoint URL: only http/https schemes are accepted
fn validate_endpoint(endpoint: &str, label: &str) -> Result<String> {
    let url = url::Url::parse(endpoint).map_err(|e| {
        PawError::Config(format!("Invalid {} endpoint URL '{}': {}", label, endpoint, e))
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(PawError::Config(format!(
            "{} endpoint must use http or https scheme, got: {}",
            label,
            url.scheme()
        )));
    }

    if url.scheme() == "http"
        && let Some(host) = url.host_str()
        && !matches!(host, "localhost" | "127.0.0.1" | "::1")
    {
        warn!(
            "{} endpoint uses plain http on a non-local host: {}. API keys will be sent unencrypted.",
            label, host
        );
    }

    Ok(endpoint.trim_end_matches('/').to_string())
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PawError::Config(format!("Failed to create HTTP client: {}", e)))
}
