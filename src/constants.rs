//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Behavior analysis constants
pub mod analysis {
    /// Maximum accepted image size (5MB)
    pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

    /// Required mime type prefix for attached images
    pub const IMAGE_MIME_PREFIX: &str = "image/";

    /// Substrings that mark a provider failure as user-actionable
    pub const DIAGNOSTIC_MARKERS: [&str; 3] =
        ["API key", "Image processing failed", "size should be less than"];

    /// Shown when every fallback stage failed
    pub const EXHAUSTED_GUIDANCE: &str = "We are currently experiencing technical difficulties \
with our AI analysis service. Please try again in a few moments. If the problem persists, \
consider the following:\n\n\
1. Try a shorter, more focused behavior description\n\
2. Remove any special characters or formatting\n\
3. If using an image, ensure it is clear and under 5MB\n\n\
For immediate assistance with urgent behavioral concerns, please consult your veterinarian.";
}

/// Multimodal provider retry constants
pub mod retry {
    /// Total generation attempts (first call included)
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Backoff unit; the delay after attempt N is N units
    pub const BACKOFF_STEP_SECS: u64 = 1;

    /// Messages that abort the retry loop immediately
    pub const FATAL_MARKERS: [&str; 2] = ["Image processing failed", "PERMISSION_DENIED"];
}

/// Provider defaults
pub mod providers {
    pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
    pub const OPENAI_MODEL: &str = "gpt-3.5-turbo";

    pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const GEMINI_TEXT_MODEL: &str = "gemini-pro";
    pub const GEMINI_VISION_MODEL: &str = "gemini-pro-vision";

    /// Sampling temperature for text generation
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    /// Maximum output tokens per analysis
    pub const DEFAULT_MAX_TOKENS: u32 = 1000;

    /// HTTP request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

    /// System message sent with every text-only request
    pub const SYSTEM_INSTRUCTION: &str = "You are a professional veterinary behavior expert. \
Provide clear, concise analysis without using markdown formatting or special characters.";
}

/// Storage constants
pub mod storage {
    /// Collection holding pet records
    pub const PETS: &str = "pets";

    /// Collection holding saved behavior analyses
    pub const BEHAVIOR_ANALYSES: &str = "behaviorAnalyses";

    /// Capacity of the change feed channel per store
    pub const CHANGE_FEED_CAPACITY: usize = 256;
}
