//! Compile error types
//!
//! Compile errors are user-input errors: the query returns no results and
//! the engine reads nothing. Each carries the specific missing or invalid
//! piece.

use std::fmt;

/// Compile error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorCode {
    /// GET or FROM clause is absent
    MissingClause,
    /// A clause is present but its content is empty or malformed
    InvalidClause,
    /// FILTER tokens do not form field/operator/literal triples
    MalformedFilter,
    /// Comparison operator is not one of > < >= <= = != in
    UnknownOperator,
    /// GET item looks like a function call but is not a known aggregation
    BadAggregate,
    /// Aggregation functions require an explicit GROUP clause
    GroupRequired,
    /// A GROUP field does not appear in the GET list
    GroupMismatch,
    /// LIMIT argument is not a non-negative integer
    BadLimit,
    /// A quoted literal was never closed
    UnterminatedString,
}

impl CompileErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            CompileErrorCode::MissingClause => "STRATA_QUERY_MISSING_CLAUSE",
            CompileErrorCode::InvalidClause => "STRATA_QUERY_INVALID_CLAUSE",
            CompileErrorCode::MalformedFilter => "STRATA_QUERY_MALFORMED_FILTER",
            CompileErrorCode::UnknownOperator => "STRATA_QUERY_UNKNOWN_OPERATOR",
            CompileErrorCode::BadAggregate => "STRATA_QUERY_BAD_AGGREGATE",
            CompileErrorCode::GroupRequired => "STRATA_QUERY_GROUP_REQUIRED",
            CompileErrorCode::GroupMismatch => "STRATA_QUERY_GROUP_MISMATCH",
            CompileErrorCode::BadLimit => "STRATA_QUERY_BAD_LIMIT",
            CompileErrorCode::UnterminatedString => "STRATA_QUERY_UNTERMINATED_STRING",
        }
    }
}

/// Compile error with context
#[derive(Debug)]
pub struct CompileError {
    code: CompileErrorCode,
    message: String,
}

impl CompileError {
    pub fn missing_clause(keyword: &str) -> Self {
        Self {
            code: CompileErrorCode::MissingClause,
            message: format!("invalid query: missing {} clause", keyword),
        }
    }

    pub fn invalid_clause(detail: impl Into<String>) -> Self {
        Self {
            code: CompileErrorCode::InvalidClause,
            message: detail.into(),
        }
    }

    pub fn malformed_filter(detail: impl Into<String>) -> Self {
        Self {
            code: CompileErrorCode::MalformedFilter,
            message: detail.into(),
        }
    }

    pub fn unknown_operator(symbol: &str) -> Self {
        Self {
            code: CompileErrorCode::UnknownOperator,
            message: format!("unknown comparison operator '{}'", symbol),
        }
    }

    pub fn bad_aggregate(detail: impl Into<String>) -> Self {
        Self {
            code: CompileErrorCode::BadAggregate,
            message: detail.into(),
        }
    }

    pub fn group_required() -> Self {
        Self {
            code: CompileErrorCode::GroupRequired,
            message: "aggregation functions require an explicit GROUP clause".to_string(),
        }
    }

    pub fn group_mismatch(field: &str) -> Self {
        Self {
            code: CompileErrorCode::GroupMismatch,
            message: format!("GROUP field '{}' does not appear in the GET list", field),
        }
    }

    pub fn bad_limit(token: &str) -> Self {
        Self {
            code: CompileErrorCode::BadLimit,
            message: format!("LIMIT expects a non-negative integer, got '{}'", token),
        }
    }

    pub fn unterminated_string() -> Self {
        Self {
            code: CompileErrorCode::UnterminatedString,
            message: "unterminated quoted literal".to_string(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> CompileErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CompileError {}

/// Result type for query compilation
pub type CompileResult<T> = Result<T, CompileError>;
