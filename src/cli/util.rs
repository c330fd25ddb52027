//! CLI Common Utilities
//!
//! Shared initialization and context management for CLI commands.

use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::ai::BehaviorAnalyzer;
use crate::behavior::PetRegistry;
use crate::config::{Config, ConfigLoader};
use crate::storage::{LocalBlobStore, SqliteDocumentStore};
use crate::types::{PawError, Result, Session};

/// Command execution context
///
/// Loads configuration, resolves the session identity and opens the local
/// document and blob stores.
#[derive(Clone)]
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    /// Owner identity for every record touched by the command
    pub session: Session,
    /// Pet records and saved analyses
    pub registry: PetRegistry,
}

impl CommandContext {
    /// Load full command context; `user` overrides the configured owner id
    pub fn load(user: Option<&str>) -> Result<Self> {
        let config = ConfigLoader::load()?;
        Self::from_config(config, user)
    }

    /// Build the context from an already resolved configuration
    pub fn from_config(config: Config, user: Option<&str>) -> Result<Self> {
        let user_id = user
            .unwrap_or(&config.session.user_id)
            .trim()
            .to_string();
        if user_id.is_empty() {
            return Err(PawError::Config("User id must not be empty".to_string()));
        }

        let docs = SqliteDocumentStore::open(&config.storage.database_path)?;
        let blobs = LocalBlobStore::new(&config.storage.blob_dir)?;
        let registry = PetRegistry::new(Arc::new(docs), Arc::new(blobs));

        Ok(Self {
            session: Session::new(user_id),
            config,
            registry,
        })
    }

    /// Build the analyzer from the configured providers
    pub fn analyzer(&self) -> Result<BehaviorAnalyzer> {
        BehaviorAnalyzer::from_config(&self.config.openai, &self.config.gemini)
    }
}

/// Birth date as shown in pet listings
pub fn describe_birth_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Human-friendly byte count
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Show a path relative to the working directory when possible
pub fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;

    fn temp_config(dir: &Path) -> Config {
        Config {
            storage: StorageConfig {
                database_path: dir.join("db/pawcare.db"),
                blob_dir: dir.join("blobs"),
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_context_uses_override_user() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CommandContext::from_config(temp_config(dir.path()), Some("bob")).unwrap();
        assert_eq!(ctx.session.user_id.as_str(), "bob");

        let ctx = CommandContext::from_config(temp_config(dir.path()), None).unwrap();
        assert_eq!(ctx.session.user_id.as_str(), "local");
        assert!(dir.path().join("db/pawcare.db").exists());
    }

    #[test]
    fn test_context_rejects_blank_user() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CommandContext::from_config(temp_config(dir.path()), Some("  ")).is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_describe_birth_date() {
        assert_eq!(describe_birth_date(None), "-");
        assert_eq!(
            describe_birth_date(NaiveDate::from_ymd_opt(2021, 3, 4)),
            "2021-03-04"
        );
    }
}
