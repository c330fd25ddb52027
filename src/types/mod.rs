pub mod analysis;
pub mod error;
pub mod pet;
pub mod utils;

pub use analysis::{AnalysisRequest, AnalysisResult, ImageAttachment, SavedAnalysis, mime_type_for};
pub use error::{
    FailedAttempt, PawError, ProviderError, ProviderErrorKind, Result, ResultExt,
    ValidationError, ValidationErrorKind,
};
pub use pet::{Pet, PetId, Session, SubjectProfile, UserId, whole_years_between};
pub use utils::{log_filter_error, log_filter_warn, now_rfc3339};
