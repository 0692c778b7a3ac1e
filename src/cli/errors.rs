//! CLI-specific error types

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::errors::ODataError;
use crate::metadata::MetadataError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (files, stdout)
    IoError,
    /// Metadata document or resource type error
    MetadataError,
    /// Query core rejected the input
    Rejected,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "ODATA_CLI_CONFIG_ERROR",
            Self::IoError => "ODATA_CLI_IO_ERROR",
            Self::MetadataError => "ODATA_CLI_METADATA_ERROR",
            Self::Rejected => "ODATA_CLI_REJECTED",
        }
    }
}

/// Failure of one CLI invocation, printed as `CODE: message`
#[derive(Debug, Error)]
#[error("{}: {message}", .code.code())]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn metadata_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::MetadataError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(CliErrorCode::ConfigError, e.to_string())
    }
}

impl From<MetadataError> for CliError {
    fn from(e: MetadataError) -> Self {
        Self::metadata_error(e.to_string())
    }
}

impl From<ODataError> for CliError {
    fn from(e: ODataError) -> Self {
        Self::new(CliErrorCode::Rejected, e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
