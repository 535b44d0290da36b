//! YAML configuration.
//!
//! The controller is constructed programmatically, but deployments carry
//! their parameters in a YAML file:
//!
//! ```yaml
//! sample_rate: 30720000
//! numerology: 1
//! source:
//!   mode: radio
//!   frequency: 3619200000.0
//!   rf_args: "driver=uhd"
//! logging:
//!   level: debug
//! ```
//!
//! or, replaying a capture:
//!
//! ```yaml
//! sample_rate: 3840000
//! numerology: 0
//! source:
//!   mode: file
//!   path: "captures/cell.cf32"
//! ```
//!
//! Configuration is loaded from the first of: the `NRSNIFF_CONFIG`
//! environment variable, `./nrsniff.yaml`, `~/.config/nrsniff/config.yaml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use nrsniff_core::observe::LogConfig;
use nrsniff_core::params::MAX_NUMEROLOGY;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "NRSNIFF_CONFIG";

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no configuration file found")]
    NotFound,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Where samples come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Live capture from an SDR front-end.
    Radio {
        /// Center frequency in Hz.
        frequency: f64,
        /// Driver argument string, e.g. `"driver=uhd,serial=..."`.
        #[serde(default)]
        rf_args: String,
    },
    /// Playback of a recorded IQ capture.
    File {
        /// Capture path; format is guessed from the extension.
        path: PathBuf,
    },
}

/// Full acquisition configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnifferConfig {
    /// Capture sample rate in Hz.
    pub sample_rate: u64,
    /// SSB numerology μ.
    pub numerology: u8,
    /// Sample source selection.
    pub source: SourceConfig,
    /// Logging setup.
    pub logging: LogConfig,
}

impl Default for SnifferConfig {
    fn default() -> Self {
        Self {
            sample_rate: 3_840_000,
            numerology: 0,
            source: SourceConfig::Radio {
                // n78 SSB raster position commonly used in lab setups.
                frequency: 3_619_200_000.0,
                rf_args: String::new(),
            },
            logging: LogConfig::default(),
        }
    }
}

impl SnifferConfig {
    /// Parse from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Load from the search path (env var, working directory, user dir).
    pub fn load() -> Result<Self, ConfigError> {
        for path in Self::search_paths() {
            if path.is_file() {
                return Self::from_file(&path);
            }
        }
        Err(ConfigError::NotFound)
    }

    /// Candidate config locations, highest priority first.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from("nrsniff.yaml"));
        if let Ok(home) = std::env::var("HOME") {
            paths.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("nrsniff")
                    .join("config.yaml"),
            );
        }
        paths
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check invariants the constructors rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Validation(
                "sample_rate must be positive".into(),
            ));
        }
        if self.numerology > MAX_NUMEROLOGY {
            return Err(ConfigError::Validation(format!(
                "numerology {} out of range 0..={}",
                self.numerology, MAX_NUMEROLOGY
            )));
        }
        if let SourceConfig::Radio { frequency, .. } = &self.source {
            if *frequency <= 0.0 {
                return Err(ConfigError::Validation(
                    "radio frequency must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}
