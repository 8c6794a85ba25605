//! Split configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SplitError};

/// Default maximum part length: 4 hours
pub const DEFAULT_MAX_CHUNK_SECS: f64 = 4.0 * 3600.0;

/// Default minimum length of a trailing part: 45 minutes
pub const DEFAULT_MIN_CHUNK_SECS: f64 = 45.0 * 60.0;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = SplitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(SplitError::Config(format!("unknown log format: {}", other))),
        }
    }
}

/// Split configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Maximum part duration in seconds
    pub max_chunk_secs: f64,

    /// A trailing part shorter than this is merged into the previous one
    pub min_chunk_secs: f64,

    /// Directory for the parts; `None` writes them next to the input
    pub output_dir: Option<PathBuf>,

    /// Parts extracted concurrently by `split_async` (1 = sequential)
    pub jobs: usize,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format
    pub log_format: LogFormat,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_chunk_secs: DEFAULT_MAX_CHUNK_SECS,
            min_chunk_secs: DEFAULT_MIN_CHUNK_SECS,
            output_dir: None,
            jobs: 1,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl SplitConfig {
    /// Config with the given policy and defaults for everything else
    pub fn with_policy(max_chunk_secs: f64, min_chunk_secs: f64) -> Self {
        Self {
            max_chunk_secs,
            min_chunk_secs,
            ..Default::default()
        }
    }

    /// Check values the planner can't catch.
    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(SplitError::Config("jobs must be at least 1".to_string()));
        }
        if let Some(dir) = &self.output_dir {
            if dir.as_os_str().is_empty() {
                return Err(SplitError::Config("output_dir is empty".to_string()));
            }
        }
        Ok(())
    }
}
