//! Storage error types
//!
//! Two families:
//! - `StorageError` — partition/table file i/o failures
//! - `ConstraintError` — primary-key / unique / foreign-key rejections,
//!   raised before any file is modified

use std::fmt;

/// Storage error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// A partition file expected by the catalog is missing
    PartitionMissing,
    /// A partition file exists but does not hold a JSON array of objects
    PartitionCorrupt,
    /// Read failed for another i/o reason
    ReadFailed,
    /// Write or rename failed
    WriteFailed,
}

impl StorageErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::PartitionMissing => "STRATA_PARTITION_MISSING",
            StorageErrorCode::PartitionCorrupt => "STRATA_PARTITION_CORRUPT",
            StorageErrorCode::ReadFailed => "STRATA_READ_FAILED",
            StorageErrorCode::WriteFailed => "STRATA_WRITE_FAILED",
        }
    }
}

/// Storage error with context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
}

impl StorageError {
    pub fn partition_missing(path: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::PartitionMissing,
            message: format!("partition file not found: {}", path.into()),
        }
    }

    pub fn partition_corrupt(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::PartitionCorrupt,
            message: format!("{}: {}", path.into(), detail.into()),
        }
    }

    pub fn read_failed(message: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::ReadFailed,
            message: message.into(),
        }
    }

    pub fn write_failed(message: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::WriteFailed,
            message: message.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for StorageError {}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Constraint violation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintErrorCode {
    /// Duplicate primary key value
    PrimaryKey,
    /// Duplicate value in a unique column
    Unique,
    /// Foreign key value has no matching row in the referenced table
    ForeignKey,
    /// Primary key column is null or absent
    NullPrimaryKey,
}

impl ConstraintErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ConstraintErrorCode::PrimaryKey => "STRATA_PRIMARY_KEY_VIOLATION",
            ConstraintErrorCode::Unique => "STRATA_UNIQUE_VIOLATION",
            ConstraintErrorCode::ForeignKey => "STRATA_FOREIGN_KEY_VIOLATION",
            ConstraintErrorCode::NullPrimaryKey => "STRATA_NULL_PRIMARY_KEY",
        }
    }
}

/// Constraint violation with context
#[derive(Debug)]
pub struct ConstraintError {
    code: ConstraintErrorCode,
    message: String,
}

impl ConstraintError {
    pub fn primary_key(table: &str, value: impl fmt::Display) -> Self {
        Self {
            code: ConstraintErrorCode::PrimaryKey,
            message: format!("duplicate primary key {} in table '{}'", value, table),
        }
    }

    pub fn unique(table: &str, column: &str, value: impl fmt::Display) -> Self {
        Self {
            code: ConstraintErrorCode::Unique,
            message: format!(
                "duplicate value {} for unique column '{}' of table '{}'",
                value, column, table
            ),
        }
    }

    pub fn foreign_key(table: &str, column: &str, value: impl fmt::Display) -> Self {
        Self {
            code: ConstraintErrorCode::ForeignKey,
            message: format!(
                "value {} of '{}.{}' has no matching referenced row",
                value, table, column
            ),
        }
    }

    pub fn null_primary_key(table: &str, column: &str) -> Self {
        Self {
            code: ConstraintErrorCode::NullPrimaryKey,
            message: format!(
                "primary key '{}' of table '{}' must not be null",
                column, table
            ),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ConstraintErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for ConstraintError {}
