//! Configuration file support
//!
//! Loads split configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{LogFormat, SplitConfig, DEFAULT_MAX_CHUNK_SECS, DEFAULT_MIN_CHUNK_SECS};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Split policy
    pub split: SplitSettings,
    /// Output settings
    pub output: Option<OutputSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSettings {
    /// Maximum part duration in seconds
    pub max_chunk_secs: f64,
    /// Minimum trailing part duration in seconds
    pub min_chunk_secs: Option<f64>,
    /// Parts extracted concurrently
    pub jobs: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory for the parts
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<LogFormat>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        Self {
            split: SplitSettings {
                max_chunk_secs: DEFAULT_MAX_CHUNK_SECS,
                min_chunk_secs: Some(DEFAULT_MIN_CHUNK_SECS),
                jobs: Some(1),
            },
            output: Some(OutputSettings { dir: None }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some(LogFormat::Pretty),
            }),
        }
    }

    /// Convert to SplitConfig
    pub fn into_split_config(self) -> SplitConfig {
        let defaults = SplitConfig::default();
        let (log_level, log_format) = match self.logging {
            Some(l) => (l.level, l.format.unwrap_or(defaults.log_format)),
            None => (defaults.log_level, defaults.log_format),
        };

        SplitConfig {
            max_chunk_secs: self.split.max_chunk_secs,
            min_chunk_secs: self.split.min_chunk_secs.unwrap_or(defaults.min_chunk_secs),
            output_dir: self.output.and_then(|o| o.dir),
            jobs: self.split.jobs.unwrap_or(defaults.jobs),
            log_level,
            log_format,
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}
