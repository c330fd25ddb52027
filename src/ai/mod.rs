//! AI Integration Layer
//!
//! Prompt construction, provider adapters, response cleanup and the
//! fallback controller that ties them together.

pub mod normalize;
pub mod orchestrator;
pub mod prompt;
pub mod provider;

pub use normalize::normalize_response;
pub use orchestrator::{AnalysisReport, BehaviorAnalyzer, BypassPolicy, FallbackStage};
pub use prompt::{PromptBuilder, PromptSection, PromptTemplates};
pub use provider::{
    GeminiProvider, LlmProvider, LlmResponse, OpenAiProvider, ProviderConfig, ResponseMetadata,
    ResponseTiming, SharedProvider, TokenUsage, create_provider,
};
