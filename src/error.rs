//! Crate-level error taxonomy
//!
//! Each area of the engine carries its own error type (code enum +
//! constructors + `Display`). `StrataError` unifies them for callers via
//! `#[from]` conversions, expressing the spec taxonomy: Compile (query),
//! Schema (catalog/table schema), Constraint, and Io (partition/spool).
//! Configuration and execution failures surface through the same type.
//! None are process-fatal; all surface as `Result` failures with a stable
//! `code()` and a human-readable message.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::exec::ExecError;
use crate::query::CompileError;
use crate::storage::{ConstraintError, StorageError};

/// The crate-level error, unifying every per-area error type.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Query compile failure (tokenize / parse / validate).
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Catalog or table-schema failure.
    #[error(transparent)]
    Schema(#[from] CatalogError),

    /// Primary-key / unique / foreign-key rejection.
    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    /// Partition-file i/o failure.
    #[error(transparent)]
    Io(#[from] StorageError),

    /// Pipeline / spool execution failure.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// Configuration load or validation failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl StrataError {
    /// Returns the stable `STRATA_*` code of the underlying error.
    pub fn code(&self) -> &str {
        match self {
            StrataError::Compile(e) => e.code().code(),
            StrataError::Schema(e) => e.code().code(),
            StrataError::Constraint(e) => e.code().code(),
            StrataError::Io(e) => e.code().code(),
            StrataError::Exec(e) => e.code().code(),
            StrataError::Config(e) => e.code(),
        }
    }

    /// Returns true when this is a query compile error.
    pub fn is_compile_error(&self) -> bool {
        matches!(self, StrataError::Compile(_))
    }
}

/// Result type used throughout the engine.
pub type StrataResult<T> = Result<T, StrataError>;
