use crate::core::{MttError, Result};
use crate::storage::{InMemoryStore, SnapshotManager};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE_PATH: &str = "content.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Summary block plus one status line per record
    #[default]
    Text,
    /// The full report as one JSON document
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

/// Settings for one `migrate` run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// JSON snapshot holding taxonomies and records
    pub store_path: PathBuf,

    /// Pretty-print the snapshot when saving
    pub pretty: bool,

    pub format: OutputFormat,

    pub color: ColorChoice,

    /// Report what would change without writing anything
    pub dry_run: bool,
}

impl RunConfig {
    pub fn new<P: AsRef<Path>>(store_path: P) -> Self {
        Self {
            store_path: store_path.as_ref().to_path_buf(),
            pretty: true,
            format: OutputFormat::Text,
            color: ColorChoice::Auto,
            dry_run: false,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Whether record lines should carry colour codes. `auto` colours only a
    /// terminal stdout and honours `NO_COLOR`.
    pub fn use_color(&self) -> bool {
        match self.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                self.format == OutputFormat::Text
                    && std::env::var_os("NO_COLOR").is_none()
                    && std::io::stdout().is_terminal()
            }
        }
    }

    pub fn snapshot_manager(&self) -> SnapshotManager {
        SnapshotManager::new(&self.store_path).pretty(self.pretty)
    }

    /// Load the content store. A missing file is a configuration error.
    pub fn open_store(&self) -> Result<InMemoryStore> {
        let manager = self.snapshot_manager();
        manager.load_store()?.ok_or_else(|| {
            MttError::Configuration(format!(
                "Store file '{}' not found",
                manager.path().display()
            ))
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.store_path.as_os_str().is_empty() {
            return Err(MttError::Configuration("Store path cannot be empty".to_string()));
        }

        if self.store_path.is_dir() {
            return Err(MttError::Configuration(format!(
                "Store path '{}' is a directory",
                self.store_path.display()
            )));
        }

        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert_eq!(config.store_path, PathBuf::from("content.json"));
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.color, ColorChoice::Auto);
        assert!(!config.dry_run);
        assert!(config.pretty);
    }

    #[test]
    fn test_builder_pattern() {
        let config = RunConfig::new("/data/site.json")
            .format(OutputFormat::Json)
            .color(ColorChoice::Never)
            .dry_run(true)
            .pretty(false);

        assert_eq!(config.store_path, PathBuf::from("/data/site.json"));
        assert_eq!(config.format, OutputFormat::Json);
        assert!(config.dry_run);
        assert!(!config.pretty);
        assert!(!config.use_color());
        assert!(config.color(ColorChoice::Always).use_color());
    }

    #[test]
    fn test_validate() {
        assert!(RunConfig::new("content.json").validate().is_ok());
        assert!(RunConfig::new("").validate().is_err());

        let temp_dir = TempDir::new().unwrap();
        assert!(RunConfig::new(temp_dir.path()).validate().is_err());
    }

    #[test]
    fn test_open_missing_store_is_configuration_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = RunConfig::new(temp_dir.path().join("nope.json"));
        let err = config.open_store().unwrap_err();
        assert!(err.is_configuration());
    }
}
