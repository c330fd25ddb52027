//! Behavior analysis request/result types

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::{PawError, Result, ValidationErrorKind};
use super::pet::{PetId, SubjectProfile, UserId};
use crate::constants::analysis::{IMAGE_MIME_PREFIX, MAX_IMAGE_BYTES};

/// Image attached to an analysis request, held fully in memory
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

impl ImageAttachment {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read an image file; the mime type comes from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new(mime_type_for(path), bytes))
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// File extension matching the mime type (used for blob names)
    pub fn extension(&self) -> &str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/heic" => "heic",
            "image/bmp" => "bmp",
            _ => "bin",
        }
    }

    /// Enforce the accepted type and size
    pub fn validate(&self) -> Result<()> {
        if self.size_bytes() > MAX_IMAGE_BYTES {
            return Err(PawError::validation(
                ValidationErrorKind::Range,
                "image",
                "Image size should be less than 5MB",
            ));
        }
        if !self.mime_type.starts_with(IMAGE_MIME_PREFIX) {
            return Err(PawError::validation(
                ValidationErrorKind::Format,
                "image",
                "Invalid file type. Please upload an image file.",
            ));
        }
        Ok(())
    }
}

/// Determine media type from extension
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Everything needed to ask for one behavior analysis
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub subject: SubjectProfile,
    pub behavior_text: String,
    pub context_text: String,
    pub image: Option<ImageAttachment>,
}

impl AnalysisRequest {
    pub fn new(subject: SubjectProfile, behavior_text: impl Into<String>) -> Self {
        Self {
            subject,
            behavior_text: behavior_text.into(),
            context_text: String::new(),
            image: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_text = context.into();
        self
    }

    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }

    /// The only check performed before any provider call
    pub fn validate(&self) -> Result<()> {
        if self.behavior_text.trim().is_empty() {
            return Err(PawError::validation(
                ValidationErrorKind::MissingField,
                "behavior",
                "Behavior description is required",
            ));
        }
        if let Some(image) = &self.image {
            image.validate()?;
        }
        Ok(())
    }
}

/// Normalized analysis text plus the stage that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub text: String,
    pub provider: String,
    pub model: String,
}

/// Persisted analysis, created only by an explicit save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedAnalysis {
    pub id: String,
    pub pet_id: PetId,
    pub owner_id: UserId,
    pub behavior_text: String,
    pub context_text: String,
    pub analysis_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
