//! CLI-specific error types

use std::fmt;

use crate::config::ConfigError;
use crate::error::StrataError;

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// Command input was not valid (e.g. malformed JSON record)
    BadInput,
    /// Data directory already initialized
    AlreadyInitialized,
    /// An engine operation failed
    Engine,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliErrorCode::ConfigError => "STRATA_CLI_CONFIG_ERROR",
            CliErrorCode::BadInput => "STRATA_CLI_BAD_INPUT",
            CliErrorCode::AlreadyInitialized => "STRATA_CLI_ALREADY_INITIALIZED",
            CliErrorCode::Engine => "STRATA_CLI_ENGINE_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
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

    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::BadInput, message)
    }

    pub fn already_initialized(message: impl Into<String>) -> Self {
        Self::new(CliErrorCode::AlreadyInitialized, message)
    }

    /// Returns the error code
    pub fn code(&self) -> CliErrorCode {
        self.code
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::new(CliErrorCode::ConfigError, err.to_string())
    }
}

impl From<StrataError> for CliError {
    fn from(err: StrataError) -> Self {
        Self::new(CliErrorCode::Engine, err.to_string())
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
