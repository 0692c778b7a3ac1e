//! Service configuration
//!
//! JSON file, every field optional:
//!
//! ```json
//! {
//!   "max_page_size": 100,
//!   "max_top": 1000,
//!   "max_filter_length": 2048,
//!   "max_batch_parts": 100,
//!   "log_level": "info"
//! }
//! ```
//!
//! `max_page_size: null` turns server-driven paging off.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Limits and defaults applied to query processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Server page size; `None` disables server-driven paging
    #[serde(default = "default_max_page_size")]
    pub max_page_size: Option<usize>,

    /// Largest accepted `$top`
    #[serde(default = "default_max_top")]
    pub max_top: usize,

    /// Longest accepted `$filter` text, in bytes
    #[serde(default = "default_max_filter_length")]
    pub max_filter_length: usize,

    /// Most sub-requests accepted in one batch, queries plus changeset members
    #[serde(default = "default_max_batch_parts")]
    pub max_batch_parts: usize,

    /// Minimum logged severity: trace, info, warn, error or fatal
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_page_size() -> Option<usize> {
    Some(100)
}
fn default_max_top() -> usize {
    1000
}
fn default_max_filter_length() -> usize {
    2048
}
fn default_max_batch_parts() -> usize {
    100
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_max_page_size(),
            max_top: default_max_top(),
            max_filter_length: default_max_filter_length(),
            max_batch_parts: default_max_batch_parts(),
            log_level: default_log_level(),
        }
    }
}

impl ServiceConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_page_size == Some(0) {
            return Err(ConfigError::Invalid(
                "max_page_size must be > 0 (use null to disable paging)".into(),
            ));
        }
        if self.max_top == 0 {
            return Err(ConfigError::Invalid("max_top must be > 0".into()));
        }
        if self.max_filter_length == 0 {
            return Err(ConfigError::Invalid("max_filter_length must be > 0".into()));
        }
        if self.max_batch_parts == 0 {
            return Err(ConfigError::Invalid("max_batch_parts must be > 0".into()));
        }
        self.min_severity()?;
        Ok(())
    }

    /// `log_level` as a logger severity
    pub fn min_severity(&self) -> Result<Severity, ConfigError> {
        Severity::parse(&self.log_level).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "Invalid log_level: '{}'. Must be one of trace, info, warn, error, fatal.",
                self.log_level
            ))
        })
    }

    pub fn paging_enabled(&self) -> bool {
        self.max_page_size.is_some()
    }
}
