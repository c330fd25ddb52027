//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/pawcare/config.toml)
//! 3. Project config (.pawcare/config.toml)
//! 4. Environment variables (PAWCARE_* prefix, `__` separates sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{PawError, Result};

/// Output format for `config show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Toml,
    Json,
    Yaml,
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        let global = Self::global_config_path();
        Self::load_layers(global.as_deref(), &Self::project_config_path())
    }

    /// Resolve the chain with explicit file locations
    pub fn load_layers(global: Option<&Path>, project: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if project.exists() {
            debug!("Loading project config from: {}", project.display());
            figment = figment.merge(Toml::file(project));
        }

        // PAWCARE_OPENAI__MODEL -> openai.model
        figment = figment.merge(Env::prefixed("PAWCARE_").split("__"));

        let config: Config = figment
            .extract()
            .map_err(|e| PawError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| PawError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/pawcare/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("pawcare"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".pawcare/config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Render the effective configuration (API keys are never included)
    pub fn render(config: &Config, format: ConfigFormat) -> Result<String> {
        match format {
            ConfigFormat::Toml => {
                toml::to_string_pretty(config).map_err(|e| PawError::Config(e.to_string()))
            }
            ConfigFormat::Json => Ok(serde_json::to_string_pretty(config)?),
            ConfigFormat::Yaml => {
                serde_yaml::to_string(config).map_err(|e| PawError::Config(e.to_string()))
            }
        }
    }

    /// Write a starter config file; an existing file is kept unless `force`
    pub fn init(path: &Path, force: bool) -> Result<bool> {
        if path.exists() && !force {
            info!("Config exists: {}", path.display());
            return Ok(false);
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, Self::default_config())?;
        info!("Created config: {}", path.display());
        Ok(true)
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Generate default config content (TOML)
    fn default_config() -> String {
        r#"# PawCare Configuration
# Project settings in .pawcare/config.toml override ~/.config/pawcare/config.toml.
# API keys are read from OPENAI_API_KEY / GEMINI_API_KEY unless set here.

version = "1.0"

# Text-only analysis
[openai]
provider = "openai"
model = "gpt-3.5-turbo"
timeout_secs = 60
temperature = 0.7
max_tokens = 1000

# Image analysis and final fallback
[gemini]
provider = "gemini"
model = "gemini-pro"
vision_model = "gemini-pro-vision"
timeout_secs = 60
temperature = 0.7
max_tokens = 1000

[storage]
database_path = ".pawcare/pawcare.db"
blob_dir = ".pawcare/blobs"

[session]
user_id = "local"
"#
        .to_string()
    }
}
