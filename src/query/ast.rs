//! Typed query AST
//!
//! The compiler produces a `CompiledQuery`; the executor consumes it. The
//! condition tree supports arbitrary nesting of AND/OR groups over
//! comparison leaves, even though the textual grammar normally produces a
//! single level.

use serde_json::Value;

/// Comparison operators
///
/// The first seven are reachable from query text. The string operators are
/// carried for the relational variant and are reachable through the
/// programmatic API only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// field > literal
    Gt,
    /// field < literal
    Lt,
    /// field >= literal
    Gte,
    /// field <= literal
    Lte,
    /// field = literal
    Eq,
    /// field != literal
    Ne,
    /// membership: literal array contains the value, or the value is a
    /// substring of a literal string
    In,
    /// SQL-style pattern with `%` wildcards
    Like,
    /// case-insensitive `Like`
    ILike,
    /// string prefix
    StartsWith,
    /// string suffix
    EndsWith,
    /// case-insensitive substring
    IContains,
}

impl CompareOp {
    /// Maps a query-text symbol to its operator
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(CompareOp::Gt),
            "<" => Some(CompareOp::Lt),
            ">=" => Some(CompareOp::Gte),
            "<=" => Some(CompareOp::Lte),
            "=" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            _ if symbol.eq_ignore_ascii_case("in") => Some(CompareOp::In),
            _ => None,
        }
    }

    /// Mirror operator, for normalizing `literal op field` leaves
    pub fn flipped(self) -> Self {
        match self {
            CompareOp::Gt => CompareOp::Lt,
            CompareOp::Lt => CompareOp::Gt,
            CompareOp::Gte => CompareOp::Lte,
            CompareOp::Lte => CompareOp::Gte,
            other => other,
        }
    }

    /// Canonical name (used in messages and tests)
    pub fn name(&self) -> &'static str {
        match self {
            CompareOp::Gt => "gt",
            CompareOp::Lt => "lt",
            CompareOp::Gte => "gte",
            CompareOp::Lte => "lte",
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::In => "in",
            CompareOp::Like => "like",
            CompareOp::ILike => "ilike",
            CompareOp::StartsWith => "startswith",
            CompareOp::EndsWith => "endswith",
            CompareOp::IContains => "icontains",
        }
    }

    /// Operators that coerce numeric-looking strings before comparing
    pub fn coerces_numeric(&self) -> bool {
        matches!(
            self,
            CompareOp::Gt | CompareOp::Lt | CompareOp::Gte | CompareOp::Lte | CompareOp::Eq
        )
    }
}

/// Logical connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    And,
    Or,
}

/// Condition tree: a comparison leaf or an AND/OR group
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Leaf: `{field, operator, literal}`
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    /// Internal node over one or more sub-conditions
    Group {
        op: LogicOp,
        children: Vec<Condition>,
    },
}

impl Condition {
    /// Creates a comparison leaf
    pub fn compare(field: impl Into<String>, op: CompareOp, value: Value) -> Self {
        Condition::Compare {
            field: field.into(),
            op,
            value,
        }
    }

    /// Creates an AND group
    pub fn all(children: Vec<Condition>) -> Self {
        Condition::Group {
            op: LogicOp::And,
            children,
        }
    }

    /// Creates an OR group
    pub fn any(children: Vec<Condition>) -> Self {
        Condition::Group {
            op: LogicOp::Or,
            children,
        }
    }
}

/// Aggregation functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggregateFn {
    /// Parses a function name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("count") {
            Some(AggregateFn::Count)
        } else if name.eq_ignore_ascii_case("sum") {
            Some(AggregateFn::Sum)
        } else if name.eq_ignore_ascii_case("avg") {
            Some(AggregateFn::Avg)
        } else if name.eq_ignore_ascii_case("max") {
            Some(AggregateFn::Max)
        } else if name.eq_ignore_ascii_case("min") {
            Some(AggregateFn::Min)
        } else {
            None
        }
    }

    /// Canonical lowercase name, used in output field names
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFn::Count => "count",
            AggregateFn::Sum => "sum",
            AggregateFn::Avg => "avg",
            AggregateFn::Max => "max",
            AggregateFn::Min => "min",
        }
    }
}

/// One item of the GET list
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*`: pass records through unchanged
    All,
    /// A plain output field
    Field(String),
    /// `FUNC(field)`
    Aggregate { field: String, func: AggregateFn },
}

/// Sort direction; DESC applies to the whole key tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// SORT clause: composite key in declared precedence order
#[derive(Debug, Clone, PartialEq)]
pub struct SortClause {
    pub keys: Vec<String>,
    pub direction: SortDirection,
}

impl SortClause {
    pub fn asc(keys: Vec<String>) -> Self {
        Self {
            keys,
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(keys: Vec<String>) -> Self {
        Self {
            keys,
            direction: SortDirection::Desc,
        }
    }
}

/// A fully compiled query
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// GET list in declared order
    pub projections: Vec<Projection>,
    /// FROM target: collection or table name
    pub table: String,
    /// Compiled FILTER tree
    pub filter: Option<Condition>,
    /// GROUP fields
    pub group_by: Vec<String>,
    /// SORT clause
    pub sort: Option<SortClause>,
    /// LIMIT cap; None = unbounded
    pub limit: Option<usize>,
}

impl CompiledQuery {
    /// Plain output field names; None when the query projects everything
    /// (`*`) or produces aggregation rows with synthetic field names.
    pub fn output_fields(&self) -> Option<Vec<String>> {
        if self.has_aggregates() || self.projections.iter().any(|p| matches!(p, Projection::All)) {
            return None;
        }
        Some(
            self.projections
                .iter()
                .filter_map(|p| match p {
                    Projection::Field(name) => Some(name.clone()),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Requested aggregations as (target field, function) pairs
    pub fn aggregates(&self) -> Vec<(String, AggregateFn)> {
        self.projections
            .iter()
            .filter_map(|p| match p {
                Projection::Aggregate { field, func } => Some((field.clone(), *func)),
                _ => None,
            })
            .collect()
    }

    /// True when the GET list contains at least one aggregation call
    pub fn has_aggregates(&self) -> bool {
        self.projections
            .iter()
            .any(|p| matches!(p, Projection::Aggregate { .. }))
    }
}
