//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! Provider failures carry a kind that drives retry and fallback decisions.
//!
//! ## Provider Error Kinds
//!
//! - **QuotaExceeded**: Provider reported an exhausted quota (fall back)
//! - **Transient**: Any other provider failure (fall back)
//! - **AuthFailure**: Credentials rejected (surface to the user)
//! - **InvalidImage**: Provider could not process the image (surface to the user)

use std::time::Duration;
use thiserror::Error;

use crate::constants::analysis::{DIAGNOSTIC_MARKERS, EXHAUSTED_GUIDANCE};

// =============================================================================
// Provider Error Kinds
// =============================================================================

/// Provider failure kinds used for routing decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Quota or billing limit reached
    QuotaExceeded,
    /// Network, server or response-shape failure
    Transient,
    /// API key missing, invalid or lacking permission
    AuthFailure,
    /// The attached image was rejected by the provider
    InvalidImage,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuotaExceeded => write!(f, "QUOTA_EXCEEDED"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::AuthFailure => write!(f, "AUTH_FAILURE"),
            Self::InvalidImage => write!(f, "INVALID_IMAGE"),
        }
    }
}

// =============================================================================
// Provider Error
// =============================================================================

/// Error reported by a generation provider
#[derive(Debug, Clone)]
pub struct ProviderError {
    /// Kind for routing decisions
    pub kind: ProviderErrorKind,
    /// Human readable message (shown verbatim for diagnostic errors)
    pub message: String,
    /// Provider that produced the error
    pub provider: Option<String>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider: None,
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transient, message)
    }

    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::QuotaExceeded, message)
    }

    pub fn auth_failure(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::AuthFailure, message)
    }

    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidImage, message)
    }

    /// Add provider context
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Whether this failure is user-actionable and must bypass the fallback chain.
    ///
    /// Structured kinds are checked first; the message markers keep errors
    /// produced by other adapters (or wrapped upstream messages) routed the
    /// same way.
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::AuthFailure | ProviderErrorKind::InvalidImage
        ) || DIAGNOSTIC_MARKERS
            .iter()
            .any(|marker| self.message.contains(marker))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Structured validation error with context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// What validation failed
    pub kind: ValidationErrorKind,
    /// Field that failed validation
    pub field: Option<String>,
    /// Detailed message
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: None,
            message: message.into(),
        }
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Validation error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Required field missing or blank
    MissingField,
    /// Invalid format (mime type, date)
    Format,
    /// Value out of range (image size)
    Range,
}

// =============================================================================
// Fallback attempt record
// =============================================================================

/// One failed stage of the fallback chain, kept for diagnostics
#[derive(Debug, Clone)]
pub struct FailedAttempt {
    /// Stage label ("vision", "text", "vision-fallback")
    pub stage: &'static str,
    pub provider: String,
    pub error: ProviderError,
    pub elapsed: Duration,
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum PawError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // -------------------------------------------------------------------------
    // Analysis Errors
    // -------------------------------------------------------------------------
    /// Bad input, never retried
    #[error("{0}")]
    Validation(ValidationError),

    /// Diagnostic provider failure surfaced verbatim
    #[error("{0}")]
    Provider(ProviderError),

    /// Every fallback stage failed; only the guidance text is displayed
    #[error("{}", EXHAUSTED_GUIDANCE)]
    AnalysisExhausted { attempts: Vec<FailedAttempt> },

    // -------------------------------------------------------------------------
    // Domain Errors
    // -------------------------------------------------------------------------
    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
}

impl From<ProviderError> for PawError {
    fn from(err: ProviderError) -> Self {
        PawError::Provider(err)
    }
}

impl From<ValidationError> for PawError {
    fn from(err: ValidationError) -> Self {
        PawError::Validation(err)
    }
}

pub type Result<T> = std::result::Result<T, PawError>;

impl PawError {
    /// Create a not-found error
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Create a validation error with field context
    pub fn validation(
        kind: ValidationErrorKind,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Validation(ValidationError::new(kind, message).with_field(field))
    }
}

/// Context extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn with_context<C: Into<String>>(self, context: C) -> Result<T>;

    /// Add context using a closure (lazy evaluation)
    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn with_context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|e| PawError::Storage(format!("{}: {}", context.into(), e)))
    }

    fn with_context_fn<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| PawError::Storage(format!("{}: {}", f().into(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display() {
        assert_eq!(ProviderErrorKind::QuotaExceeded.to_string(), "QUOTA_EXCEEDED");
        assert_eq!(ProviderErrorKind::AuthFailure.to_string(), "AUTH_FAILURE");
    }

    #[test]
    fn test_diagnostic_by_kind() {
        assert!(ProviderError::auth_failure("denied").is_diagnostic());
        assert!(ProviderError::invalid_image("bad pixels").is_diagnostic());
        assert!(!ProviderError::quota_exceeded("quota").is_diagnostic());
        assert!(!ProviderError::transient("503").is_diagnostic());
    }

    #[test]
    fn test_diagnostic_by_message() {
        assert!(ProviderError::transient("Invalid API key supplied").is_diagnostic());
        assert!(ProviderError::transient("Image size should be less than 5MB").is_diagnostic());
        assert!(ProviderError::transient("Image processing failed upstream").is_diagnostic());
        // Markers are case sensitive
        assert!(!ProviderError::transient("api key rotated").is_diagnostic());
    }

    #[test]
    fn test_exhausted_display_hides_provider_messages() {
        let err = PawError::AnalysisExhausted {
            attempts: vec![FailedAttempt {
                stage: "text",
                provider: "openai".to_string(),
                error: ProviderError::transient("upstream exploded: secret detail"),
                elapsed: Duration::from_millis(5),
            }],
        };
        let shown = err.to_string();
        assert!(shown.contains("consult your veterinarian"));
        assert!(!shown.contains("secret detail"));
    }

    #[test]
    fn test_provider_error_display_is_verbatim() {
        let err: PawError = ProviderError::auth_failure("API key validation failed.")
            .provider("gemini")
            .into();
        assert_eq!(err.to_string(), "API key validation failed.");
    }

    #[test]
    fn test_with_context() {
        let res: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::other("disk gone"));
        let err = res.with_context("Failed to write blob").unwrap_err();
        assert!(matches!(err, PawError::Storage(ref m) if m.contains("Failed to write blob")));
    }
}
