//! Catalog error types
//!
//! Every failure carries a stable code. All catalog errors are recoverable:
//! the caller is told what was wrong and no partial mutation is persisted.

use std::fmt;

/// Catalog error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogErrorCode {
    /// Catalog file could not be read or written
    Io,
    /// Catalog file exists but is not valid JSON of the expected shape
    Corrupt,
    /// Named database does not exist
    UnknownDatabase,
    /// Named collection/table does not exist in the database
    UnknownCollection,
    /// Database already exists
    DuplicateDatabase,
    /// Collection/table already exists in the database
    DuplicateCollection,
    /// A foreign key references a missing table or column
    UnknownReference,
    /// Drop refused because other tables reference this one
    TableReferenced,
    /// Document operation attempted on a relational table
    NotACollection,
    /// Relational operation attempted on a document collection
    NotATable,
    /// Row or schema names a column the table does not declare
    UnknownColumn,
    /// Row value does not match the declared column type
    TypeMismatch,
    /// Session has no database selected
    NoDatabaseSelected,
}

impl CatalogErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            CatalogErrorCode::Io => "STRATA_CATALOG_IO",
            CatalogErrorCode::Corrupt => "STRATA_CATALOG_CORRUPT",
            CatalogErrorCode::UnknownDatabase => "STRATA_UNKNOWN_DATABASE",
            CatalogErrorCode::UnknownCollection => "STRATA_UNKNOWN_COLLECTION",
            CatalogErrorCode::DuplicateDatabase => "STRATA_DUPLICATE_DATABASE",
            CatalogErrorCode::DuplicateCollection => "STRATA_DUPLICATE_COLLECTION",
            CatalogErrorCode::UnknownReference => "STRATA_UNKNOWN_REFERENCE",
            CatalogErrorCode::TableReferenced => "STRATA_TABLE_REFERENCED",
            CatalogErrorCode::NotACollection => "STRATA_NOT_A_COLLECTION",
            CatalogErrorCode::NotATable => "STRATA_NOT_A_TABLE",
            CatalogErrorCode::UnknownColumn => "STRATA_UNKNOWN_COLUMN",
            CatalogErrorCode::TypeMismatch => "STRATA_TYPE_MISMATCH",
            CatalogErrorCode::NoDatabaseSelected => "STRATA_NO_DATABASE_SELECTED",
        }
    }
}

impl fmt::Display for CatalogErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Catalog error with context
#[derive(Debug)]
pub struct CatalogError {
    code: CatalogErrorCode,
    message: String,
}

impl CatalogError {
    pub fn new(code: CatalogErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(CatalogErrorCode::Io, message)
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::new(CatalogErrorCode::Corrupt, message)
    }

    pub fn unknown_database(name: &str) -> Self {
        Self::new(
            CatalogErrorCode::UnknownDatabase,
            format!("database '{}' does not exist", name),
        )
    }

    pub fn unknown_collection(database: &str, name: &str) -> Self {
        Self::new(
            CatalogErrorCode::UnknownCollection,
            format!("collection '{}' does not exist in '{}'", name, database),
        )
    }

    pub fn duplicate_database(name: &str) -> Self {
        Self::new(
            CatalogErrorCode::DuplicateDatabase,
            format!("database '{}' already exists", name),
        )
    }

    pub fn duplicate_collection(database: &str, name: &str) -> Self {
        Self::new(
            CatalogErrorCode::DuplicateCollection,
            format!("collection '{}' already exists in '{}'", name, database),
        )
    }

    pub fn unknown_reference(table: &str, detail: impl Into<String>) -> Self {
        Self::new(
            CatalogErrorCode::UnknownReference,
            format!("foreign key on '{}': {}", table, detail.into()),
        )
    }

    pub fn table_referenced(table: &str, referencing: &[String]) -> Self {
        Self::new(
            CatalogErrorCode::TableReferenced,
            format!(
                "table '{}' is referenced by: {}",
                table,
                referencing.join(", ")
            ),
        )
    }

    pub fn not_a_collection(name: &str) -> Self {
        Self::new(
            CatalogErrorCode::NotACollection,
            format!("'{}' is a relational table, not a document collection", name),
        )
    }

    pub fn not_a_table(name: &str) -> Self {
        Self::new(
            CatalogErrorCode::NotATable,
            format!("'{}' is a document collection, not a relational table", name),
        )
    }

    pub fn unknown_column(table: &str, column: &str) -> Self {
        Self::new(
            CatalogErrorCode::UnknownColumn,
            format!("table '{}' has no column '{}'", table, column),
        )
    }

    pub fn type_mismatch(table: &str, column: &str, expected: &str) -> Self {
        Self::new(
            CatalogErrorCode::TypeMismatch,
            format!(
                "column '{}' of table '{}' expects type {}",
                column, table, expected
            ),
        )
    }

    pub fn no_database_selected() -> Self {
        Self::new(
            CatalogErrorCode::NoDatabaseSelected,
            "no database selected",
        )
    }

    /// Returns the error code
    pub fn code(&self) -> CatalogErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CatalogError {}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_stable() {
        assert_eq!(
            CatalogError::unknown_database("nba").code().code(),
            "STRATA_UNKNOWN_DATABASE"
        );
        assert_eq!(
            CatalogError::table_referenced("teams", &["players".into()])
                .code()
                .code(),
            "STRATA_TABLE_REFERENCED"
        );
    }

    #[test]
    fn test_display_includes_context() {
        let err = CatalogError::unknown_collection("nba", "players");
        let text = format!("{}", err);
        assert!(text.contains("STRATA_UNKNOWN_COLLECTION"));
        assert!(text.contains("players"));
        assert!(text.contains("nba"));
    }
}
