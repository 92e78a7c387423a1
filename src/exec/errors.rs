//! Executor error types
//!
//! Pipeline failures are recoverable at the call boundary: the query
//! aborts, intermediate files are cleaned up, and the caller gets the
//! reason.

use std::fmt;

/// Executor error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecErrorCode {
    /// General execution failure
    ExecutionFailed,
    /// A spool (intermediate) file could not be created, read, or removed
    SpoolIo,
}

impl ExecErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecErrorCode::ExecutionFailed => "STRATA_EXECUTION_FAILED",
            ExecErrorCode::SpoolIo => "STRATA_SPOOL_IO",
        }
    }
}

/// Executor error with context
#[derive(Debug)]
pub struct ExecError {
    code: ExecErrorCode,
    message: String,
}

impl ExecError {
    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self {
            code: ExecErrorCode::ExecutionFailed,
            message: message.into(),
        }
    }

    pub fn spool_io(message: impl Into<String>) -> Self {
        Self {
            code: ExecErrorCode::SpoolIo,
            message: message.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ExecErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for ExecError {}

/// Result type for executor operations
pub type ExecResult<T> = Result<T, ExecError>;
