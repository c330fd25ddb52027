//! Configuration Types
//!
//! Every section carries defaults so an empty config file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ai::ProviderConfig;
use crate::types::{PawError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Text-only provider (primary for requests without an image)
    pub openai: ProviderConfig,

    /// Multimodal provider (vision stage and final fallback)
    pub gemini: ProviderConfig,

    /// Local document and blob storage
    pub storage: StorageConfig,

    /// Identity used for owner-scoped records
    pub session: SessionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            openai: ProviderConfig::openai(),
            gemini: ProviderConfig::gemini(),
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `PawError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        for (section, provider) in [("openai", &self.openai), ("gemini", &self.gemini)] {
            if !(0.0..=2.0).contains(&provider.temperature) {
                return Err(PawError::Config(format!(
                    "{section}.temperature must be between 0.0 and 2.0, got {}",
                    provider.temperature
                )));
            }
            if provider.timeout_secs == 0 {
                return Err(PawError::Config(format!(
                    "{section}.timeout_secs must be greater than 0"
                )));
            }
            if provider.max_tokens == 0 {
                return Err(PawError::Config(format!(
                    "{section}.max_tokens must be greater than 0"
                )));
            }
        }

        if self.session.user_id.trim().is_empty() {
            return Err(PawError::Config(
                "session.user_id must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

// =============================================================================
// Storage Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite document database
    pub database_path: PathBuf,

    /// Root directory for uploaded photos
    pub blob_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(".pawcare/pawcare.db"),
            blob_dir: PathBuf::from(".pawcare/blobs"),
        }
    }
}

// =============================================================================
// Session Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Owner id stamped on every record created from the CLI
    pub user_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: "local".to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
