//! CLI command handlers

pub mod analyze;
pub mod catalog;
pub mod config;
pub mod history;
pub mod pet;

/// Output format for listing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ListFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
pub(crate) mod tests {
    use crate::cli::util::CommandContext;
    use crate::config::{Config, StorageConfig};

    /// Context backed by a throwaway directory
    pub(crate) fn context() -> (tempfile::TempDir, CommandContext) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            storage: StorageConfig {
                database_path: dir.path().join("pawcare.db"),
                blob_dir: dir.path().join("blobs"),
            },
            ..Config::default()
        };
        let ctx = CommandContext::from_config(config, Some("tester")).unwrap();
        (dir, ctx)
    }
}
