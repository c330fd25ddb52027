//! Config Command
//!
//! Usage:
//!   pawcare config show [-f toml|json|yaml]
//!   pawcare config path
//!   pawcare config init [-g] [--force]

use crate::cli::ui::Output;
use crate::cli::util::display_path;
use crate::config::{ConfigFormat, ConfigLoader};
use crate::types::{PawError, Result};

/// Show the merged effective configuration
pub fn show(format: ConfigFormat) -> Result<()> {
    let config = ConfigLoader::load()?;
    println!("{}", ConfigLoader::render(&config, format)?);
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    let output = Output::new();
    output.header("Configuration paths");

    let marker = |exists: bool| if exists { "✓" } else { "✗" };
    match ConfigLoader::global_config_path() {
        Some(global) => output.field(
            "Global",
            &format!("{} {}", marker(global.exists()), global.display()),
        ),
        None => output.field("Global", "(not available)"),
    }

    let project = ConfigLoader::project_config_path();
    output.field(
        "Project",
        &format!("{} {}", marker(project.exists()), project.display()),
    );

    if let Ok(config) = ConfigLoader::load() {
        output.field("Database", &display_path(&config.storage.database_path));
        output.field("Blobs", &display_path(&config.storage.blob_dir));
    }
    Ok(())
}

/// Write a starter config file
pub fn init(global: bool, force: bool) -> Result<()> {
    let path = if global {
        ConfigLoader::global_config_path().ok_or_else(|| {
            PawError::Config("Cannot determine global config directory".to_string())
        })?
    } else {
        ConfigLoader::project_config_path()
    };

    let output = Output::new();
    if ConfigLoader::init(&path, force)? {
        output.success(&format!("Created {}", path.display()));
    } else {
        output.info(&format!(
            "Config already exists: {} (use --force to overwrite)",
            path.display()
        ));
    }
    Ok(())
}
