//! OpenAI API Provider
//!
//! Text-only adapter over the Chat Completions API. Images are ignored.
//! Failures are mapped to two kinds: an exhausted quota becomes
//! `QuotaExceeded`, everything else is `Transient`.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use super::{
    LlmProvider, LlmResponse, ProviderConfig, ProviderResult, ResponseMetadata, ResponseTiming,
    TokenUsage, http_client, missing_key_error, resolve_api_key, validate_endpoint,
};
use crate::constants::providers::{OPENAI_API_BASE, OPENAI_MODEL, SYSTEM_INSTRUCTION};
use crate::types::{ImageAttachment, ProviderError, Result};

const PROVIDER_NAME: &str = "openai";
const QUOTA_CODE: &str = "insufficient_quota";

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output.
    /// `None` makes every call fail with an auth error.
    api_key: Option<SecretString>,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let api_key = resolve_api_key(&config, "OPENAI_API_KEY");
        Self::with_key(config, api_key)
    }

    /// Build with an explicit key, bypassing config and environment lookup
    pub(crate) fn with_key(config: ProviderConfig, api_key: Option<SecretString>) -> Result<Self> {
        let api_base = validate_endpoint(
            config.api_base.as_deref().unwrap_or(OPENAI_API_BASE),
            "OpenAI",
        )?;

        Ok(Self {
            api_key,
            api_base,
            model: config.model.unwrap_or_else(|| OPENAI_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client: http_client(config.timeout_secs)?,
        })
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn generate(
        &self,
        prompt: &str,
        _image: Option<&ImageAttachment>,
    ) -> ProviderResult<LlmResponse> {
        info!(
            "Generating with OpenAI (model: {}, temperature: {})",
            self.model, self.temperature
        );

        let Some(api_key) = &self.api_key else {
            return Err(missing_key_error("OpenAI", "OPENAI_API_KEY", PROVIDER_NAME));
        };

        let start_time = Instant::now();
        let request = self.build_request(prompt);
        let url = format!("{}/chat/completions", self.api_base);

        debug!("Sending request to OpenAI API");

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| service_error(&e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body));
        }

        let response_body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| service_error(&format!("Failed to parse response: {}", e)))?;

        let elapsed = start_time.elapsed();
        debug!("Received response from OpenAI in {:?}", elapsed);

        let usage = response_body
            .usage
            .as_ref()
            .map(|u| TokenUsage::from_openai(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let text = extract_text(response_body)?;

        Ok(LlmResponse {
            text,
            usage,
            timing: ResponseTiming::from_duration(elapsed),
            metadata: ResponseMetadata {
                model: self.model.clone(),
                provider: PROVIDER_NAME.to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn service_error(detail: &str) -> ProviderError {
    ProviderError::transient(format!("OpenAI service error: {}", detail)).provider(PROVIDER_NAME)
}

/// Map a non-success HTTP response to a provider error
fn classify_error(status: u16, body: &str) -> ProviderError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();

    if let Some(detail) = parsed.as_ref().map(|e| &e.error)
        && (detail.error_type.as_deref() == Some(QUOTA_CODE)
            || detail.code.as_deref() == Some(QUOTA_CODE))
    {
        return ProviderError::quota_exceeded(
            "OpenAI service quota exceeded. Trying alternative service...",
        )
        .provider(PROVIDER_NAME);
    }

    let detail = parsed
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| format!("HTTP {}: {}", status, body));
    service_error(&detail)
}

/// First non-blank choice content
fn extract_text(response: ChatCompletionResponse) -> ProviderResult<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| {
            ProviderError::transient("No response received from OpenAI").provider(PROVIDER_NAME)
        })
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    #[serde(rename = "type")]
    error_type: Option<String>,
    code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderErrorKind;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(ProviderConfig {
            api_key: Some("sk-test".to_string()),
            ..ProviderConfig::openai()
        })
        .unwrap()
    }

    #[test]
    fn test_request_carries_system_instruction() {
        let request = provider().build_request("Why does my cat knead?");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "gpt-3.5-turbo");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], SYSTEM_INSTRUCTION);
        assert_eq!(json["messages"][1]["content"], "Why does my cat knead?");
        assert_eq!(json["max_tokens"], 1000);
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_quota_by_type() {
        let body = r#"{"error":{"message":"You exceeded your current quota","type":"insufficient_quota","code":null}}"#;
        let err = classify_error(429, body);
        assert_eq!(err.kind, ProviderErrorKind::QuotaExceeded);
        assert!(err.message.contains("quota exceeded"));
    }

    #[test]
    fn test_quota_by_code() {
        let body = r#"{"error":{"message":"quota","type":"requests","code":"insufficient_quota"}}"#;
        assert_eq!(
            classify_error(429, body).kind,
            ProviderErrorKind::QuotaExceeded
        );
    }

    #[test]
    fn test_other_errors_are_transient() {
        let body = r#"{"error":{"message":"The server had an error","type":"server_error","code":null}}"#;
        let err = classify_error(500, body);
        assert_eq!(err.kind, ProviderErrorKind::Transient);
        assert_eq!(err.message, "OpenAI service error: The server had an error");
        assert_eq!(err.provider.as_deref(), Some("openai"));
    }

    #[test]
    fn test_unparseable_error_body() {
        let err = classify_error(502, "<html>bad gateway</html>");
        assert_eq!(err.kind, ProviderErrorKind::Transient);
        assert!(err.message.contains("HTTP 502"));
    }

    #[test]
    fn test_extract_text() {
        let body = r#"{"choices":[{"message":{"content":"Calm dog."}}],"usage":{"prompt_tokens":10,"completion_tokens":3}}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(extract_text(parsed).unwrap(), "Calm dog.");
    }

    #[test]
    fn test_empty_content_is_error() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{"content":"   "}}]}"#,
        ] {
            let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
            let err = extract_text(parsed).unwrap_err();
            assert_eq!(err.message, "No response received from OpenAI");
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", provider());
        assert!(!debug.contains("sk-test"));
    }

    #[tokio::test]
    async fn test_missing_key_fails_at_generate() {
        let provider = OpenAiProvider::with_key(ProviderConfig::openai(), None).unwrap();

        let err = provider.generate("Why does my cat knead?", None).await.unwrap_err();
        assert_eq!(err.kind, ProviderErrorKind::AuthFailure);
        assert!(err.message.starts_with("OpenAI API key not found"));
        assert!(err.is_diagnostic());
    }
}
