use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::{Deserialize, Serialize};

use crate::errors::{ScanError, ScanResult};
use crate::scan::DEFAULT_BLOCK_CAPACITY;

fn default_block_size() -> usize {
    DEFAULT_BLOCK_CAPACITY
}

fn default_progress() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Settings for a scan, loadable from YAML config files and mergeable
/// with command-line arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Pattern to search for, as literal text. Callers that need raw
    /// bytes (for example hex input) pass them to the engine directly.
    #[serde(default)]
    pub pattern: String,

    /// File to scan
    #[serde(default)]
    pub input_path: PathBuf,

    /// Bytes per window block; two blocks stay resident during a scan
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Whether to draw the progress indicator on stderr
    #[serde(default = "default_progress")]
    pub progress: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ScanConfig {
    /// Loads configuration from the default file locations: a global
    /// config dir file, then `.skipscan.yaml` in the working directory
    pub fn load() -> ScanResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally ending with an explicit file that
    /// overrides the defaults
    pub fn load_from(config_path: Option<&Path>) -> ScanResult<Self> {
        let mut builder = Config::builder();

        if let Some(config_dir) = dirs::config_dir() {
            let global_config = config_dir.join("skipscan/config.yaml");
            if global_config.exists() {
                builder = builder.add_source(File::from(global_config));
            }
        }

        let local_config = PathBuf::from(".skipscan.yaml");
        if local_config.exists() {
            builder = builder.add_source(File::from(local_config));
        }

        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ScanError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path.to_path_buf()));
        }

        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| ScanError::config_error(e.to_string()))
    }

    /// Merges CLI arguments into this configuration; explicit CLI values
    /// win over file values
    pub fn merge_with_cli(mut self, cli: ScanConfig) -> Self {
        if !cli.pattern.is_empty() {
            self.pattern = cli.pattern;
        }
        if cli.input_path != PathBuf::new() {
            self.input_path = cli.input_path;
        }
        if cli.block_size != default_block_size() {
            self.block_size = cli.block_size;
        }
        if !cli.progress {
            self.progress = false;
        }
        if cli.log_level != default_log_level() {
            self.log_level = cli.log_level;
        }
        self
    }

    pub fn validate(&self) -> ScanResult<()> {
        if self.block_size == 0 {
            return Err(ScanError::config_error(
                "block_size must be greater than zero",
            ));
        }
        Ok(())
    }
}
