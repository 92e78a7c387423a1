//! Query compiler
//!
//! Clause extraction works on token positions: each clause keyword owns the
//! tokens up to the next clause keyword. GET and FROM are mandatory;
//! everything else is optional. Validation runs before anything is
//! executed, so a bad query never touches storage.

use serde_json::Value;

use super::ast::{
    AggregateFn, CompareOp, CompiledQuery, Condition, LogicOp, Projection, SortClause,
    SortDirection,
};
use super::errors::{CompileError, CompileResult};
use super::token::{tokenize, Token};

const CLAUSE_KEYWORDS: [&str; 6] = ["get", "from", "filter", "group", "sort", "limit"];

/// Compiles query text into a `CompiledQuery`
pub struct QueryCompiler;

impl QueryCompiler {
    /// Compiles one line of query text.
    pub fn compile(input: &str) -> CompileResult<CompiledQuery> {
        let tokens = tokenize(input)?;

        // Locate each clause keyword (first occurrence wins); every clause
        // owns the tokens up to the next clause keyword
        let mut positions: Vec<(usize, &'static str)> = Vec::new();
        for keyword in CLAUSE_KEYWORDS {
            if let Some(pos) = tokens.iter().position(|t| t.is_keyword(keyword)) {
                positions.push((pos, keyword));
            }
        }
        positions.sort_by_key(|(pos, _)| *pos);

        let mut ranges: Vec<(&'static str, usize, usize)> = Vec::new();
        for (i, &(pos, keyword)) in positions.iter().enumerate() {
            let end = positions.get(i + 1).map_or(tokens.len(), |&(next, _)| next);
            ranges.push((keyword, pos + 1, end));
        }
        let clause = |keyword: &str| -> Option<(usize, usize)> {
            ranges
                .iter()
                .find(|(k, _, _)| *k == keyword)
                .map(|(_, start, end)| (*start, *end))
        };

        let (get_start, get_end) =
            clause("get").ok_or_else(|| CompileError::missing_clause("GET"))?;
        let (from_start, from_end) =
            clause("from").ok_or_else(|| CompileError::missing_clause("FROM"))?;

        let projections = Self::parse_projections(&tokens[get_start..get_end])?;
        let table = Self::parse_table(&tokens[from_start..from_end])?;
        let filter = match clause("filter") {
            Some((start, end)) => Some(Self::parse_filter(&tokens[start..end])?),
            None => None,
        };
        let group_by = match clause("group") {
            Some((start, end)) => Self::parse_fields(&tokens[start..end], "GROUP")?,
            None => Vec::new(),
        };
        let sort = match clause("sort") {
            Some((start, end)) => Some(Self::parse_sort(&tokens[start..end])?),
            None => None,
        };
        let limit = match clause("limit") {
            Some((start, end)) => Some(Self::parse_limit(&tokens[start..end])?),
            None => None,
        };

        let query = CompiledQuery {
            projections,
            table,
            filter,
            group_by,
            sort,
            limit,
        };
        Self::validate(&query)?;
        Ok(query)
    }

    /// Parses the GET list: plain fields, `*`, or FUNC(field) calls.
    fn parse_projections(tokens: &[Token]) -> CompileResult<Vec<Projection>> {
        if tokens.is_empty() {
            return Err(CompileError::invalid_clause("GET clause names no fields"));
        }

        let mut projections = Vec::with_capacity(tokens.len());
        for token in tokens {
            if !token.quoted && token.text == "*" {
                projections.push(Projection::All);
                continue;
            }
            if !token.quoted && token.text.contains('(') {
                let (func_name, rest) = token
                    .text
                    .split_once('(')
                    .expect("checked for parenthesis");
                let field = rest.strip_suffix(')').ok_or_else(|| {
                    CompileError::bad_aggregate(format!(
                        "malformed function call '{}'",
                        token.text
                    ))
                })?;
                let func = AggregateFn::parse(func_name).ok_or_else(|| {
                    CompileError::bad_aggregate(format!(
                        "unknown aggregation function '{}'",
                        func_name
                    ))
                })?;
                if field.is_empty() {
                    return Err(CompileError::bad_aggregate(format!(
                        "function call '{}' names no field",
                        token.text
                    )));
                }
                projections.push(Projection::Aggregate {
                    field: field.to_string(),
                    func,
                });
                continue;
            }
            projections.push(Projection::Field(token.text.clone()));
        }
        Ok(projections)
    }

    /// Parses the FROM clause: exactly one table name.
    fn parse_table(tokens: &[Token]) -> CompileResult<String> {
        match tokens {
            [table] => Ok(table.text.clone()),
            [] => Err(CompileError::invalid_clause("FROM clause names no table")),
            _ => Err(CompileError::invalid_clause(
                "FROM clause expects a single table name",
            )),
        }
    }

    /// Parses a flat FILTER token list into a condition tree.
    ///
    /// Comparisons come in triples; AND/OR connect them. When the logical
    /// operator changes mid-clause the conditions seen so far collapse into
    /// a nested group, so the last operator is authoritative at the top:
    /// `a AND b OR c` compiles to `OR(AND(a, b), c)`.
    fn parse_filter(tokens: &[Token]) -> CompileResult<Condition> {
        if tokens.is_empty() {
            return Err(CompileError::malformed_filter(
                "FILTER clause has no conditions",
            ));
        }

        let mut children: Vec<Condition> = Vec::new();
        let mut current_op: Option<LogicOp> = None;
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];
            if token.is_keyword("and") || token.is_keyword("or") {
                let op = if token.is_keyword("and") {
                    LogicOp::And
                } else {
                    LogicOp::Or
                };
                if children.is_empty() {
                    return Err(CompileError::malformed_filter(
                        "logical operator with no preceding condition",
                    ));
                }
                if let Some(previous) = current_op {
                    if previous != op && children.len() > 1 {
                        children = vec![Condition::Group {
                            op: previous,
                            children,
                        }];
                    }
                }
                current_op = Some(op);
                i += 1;
                continue;
            }

            if i + 3 > tokens.len() {
                return Err(CompileError::malformed_filter(
                    "expected 'field operator value'",
                ));
            }
            children.push(Self::parse_leaf(&tokens[i], &tokens[i + 1], &tokens[i + 2])?);
            i += 3;
        }

        match current_op {
            Some(op) => Ok(Condition::Group { op, children }),
            None => {
                if children.len() != 1 {
                    return Err(CompileError::malformed_filter(
                        "conditions must be joined with AND or OR",
                    ));
                }
                Ok(children.pop().expect("length checked"))
            }
        }
    }

    /// Parses one comparison triple, normalizing reversed literals:
    /// `130 < score` becomes `score gt 130`.
    fn parse_leaf(first: &Token, op_token: &Token, second: &Token) -> CompileResult<Condition> {
        if op_token.quoted {
            return Err(CompileError::unknown_operator(&op_token.text));
        }
        let op = CompareOp::from_symbol(&op_token.text)
            .ok_or_else(|| CompileError::unknown_operator(&op_token.text))?;

        if Self::is_numeric(first) {
            // Literal precedes the field: flip the comparison
            Ok(Condition::compare(
                second.text.clone(),
                op.flipped(),
                Self::literal(first),
            ))
        } else {
            Ok(Condition::compare(
                first.text.clone(),
                op,
                Self::literal(second),
            ))
        }
    }

    /// True for an unquoted token that parses as a number
    fn is_numeric(token: &Token) -> bool {
        !token.quoted && token.text.parse::<f64>().is_ok()
    }

    /// Types a literal token: quoted => string; else integer, then float,
    /// then raw string.
    fn literal(token: &Token) -> Value {
        if token.quoted {
            return Value::String(token.text.clone());
        }
        if let Ok(int) = token.text.parse::<i64>() {
            return Value::from(int);
        }
        if let Ok(float) = token.text.parse::<f64>() {
            if let Some(number) = serde_json::Number::from_f64(float) {
                return Value::Number(number);
            }
        }
        Value::String(token.text.clone())
    }

    /// Parses a plain field list (GROUP clause).
    fn parse_fields(tokens: &[Token], clause: &str) -> CompileResult<Vec<String>> {
        if tokens.is_empty() {
            return Err(CompileError::invalid_clause(format!(
                "{} clause names no fields",
                clause
            )));
        }
        Ok(tokens.iter().map(|t| t.text.clone()).collect())
    }

    /// Parses the SORT clause: fields plus an optional trailing ASC/DESC
    /// that applies to the whole key tuple.
    fn parse_sort(tokens: &[Token]) -> CompileResult<SortClause> {
        let mut fields = tokens;
        let mut direction = SortDirection::Asc;

        if let Some(last) = tokens.last() {
            if last.is_keyword("desc") {
                direction = SortDirection::Desc;
                fields = &tokens[..tokens.len() - 1];
            } else if last.is_keyword("asc") {
                fields = &tokens[..tokens.len() - 1];
            }
        }
        if fields.is_empty() {
            return Err(CompileError::invalid_clause("SORT clause names no fields"));
        }

        Ok(SortClause {
            keys: fields.iter().map(|t| t.text.clone()).collect(),
            direction,
        })
    }

    /// Parses the LIMIT clause: one non-negative integer.
    fn parse_limit(tokens: &[Token]) -> CompileResult<usize> {
        match tokens {
            [token] => token
                .text
                .parse::<usize>()
                .map_err(|_| CompileError::bad_limit(&token.text)),
            [] => Err(CompileError::bad_limit("")),
            _ => Err(CompileError::invalid_clause(
                "LIMIT expects a single integer",
            )),
        }
    }

    /// Cross-clause validation.
    fn validate(query: &CompiledQuery) -> CompileResult<()> {
        // Aggregations never infer grouping: GROUP must be explicit
        if query.has_aggregates() && query.group_by.is_empty() {
            return Err(CompileError::group_required());
        }

        // Every GROUP field must appear as a plain GET field
        let wildcard = query
            .projections
            .iter()
            .any(|p| matches!(p, Projection::All));
        if !wildcard {
            for group_field in &query.group_by {
                let present = query.projections.iter().any(
                    |p| matches!(p, Projection::Field(name) if name == group_field),
                );
                if !present {
                    return Err(CompileError::group_mismatch(group_field));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_query() {
        let query = QueryCompiler::compile("GET player, age FROM players").unwrap();
        assert_eq!(query.table, "players");
        assert_eq!(
            query.projections,
            vec![
                Projection::Field("player".into()),
                Projection::Field("age".into())
            ]
        );
        assert!(query.filter.is_none());
        assert!(query.group_by.is_empty());
        assert!(query.sort.is_none());
        assert_eq!(query.limit, None);
    }

    #[test]
    fn test_missing_get_rejected() {
        let err = QueryCompiler::compile("FROM players").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_QUERY_MISSING_CLAUSE");
    }

    #[test]
    fn test_missing_from_rejected() {
        let err = QueryCompiler::compile("GET a, b").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_QUERY_MISSING_CLAUSE");
    }

    #[test]
    fn test_full_query() {
        let query = QueryCompiler::compile(
            "GET season, tm, COUNT(player), AVG(age) FROM players \
             FILTER season = \"2024\" GROUP season, tm SORT age_avg DESC LIMIT 10",
        )
        .unwrap();

        assert_eq!(query.table, "players");
        assert_eq!(
            query.aggregates(),
            vec![
                ("player".to_string(), AggregateFn::Count),
                ("age".to_string(), AggregateFn::Avg)
            ]
        );
        assert_eq!(query.group_by, vec!["season", "tm"]);
        let sort = query.sort.unwrap();
        assert_eq!(sort.keys, vec!["age_avg"]);
        assert_eq!(sort.direction, SortDirection::Desc);
        assert_eq!(query.limit, Some(10));
        assert_eq!(
            query.filter.unwrap(),
            Condition::compare("season", CompareOp::Eq, json!("2024"))
        );
    }

    #[test]
    fn test_reversed_literal_flips_operator() {
        // `130 < score` normalizes to `score gt 130`
        let query = QueryCompiler::compile("GET game_id FROM games FILTER 130 < score").unwrap();
        assert_eq!(
            query.filter.unwrap(),
            Condition::compare("score", CompareOp::Gt, json!(130))
        );
    }

    #[test]
    fn test_reversed_equality_keeps_operator() {
        let query = QueryCompiler::compile("GET a FROM t FILTER 5 = score").unwrap();
        assert_eq!(
            query.filter.unwrap(),
            Condition::compare("score", CompareOp::Eq, json!(5))
        );
    }

    #[test]
    fn test_literal_typing() {
        let query = QueryCompiler::compile(
            "GET a FROM t FILTER x = 42 AND y = 4.5 AND z = \"42\" AND w = abc",
        )
        .unwrap();
        match query.filter.unwrap() {
            Condition::Group { op, children } => {
                assert_eq!(op, LogicOp::And);
                assert_eq!(children[0], Condition::compare("x", CompareOp::Eq, json!(42)));
                assert_eq!(children[1], Condition::compare("y", CompareOp::Eq, json!(4.5)));
                assert_eq!(
                    children[2],
                    Condition::compare("z", CompareOp::Eq, json!("42"))
                );
                assert_eq!(
                    children[3],
                    Condition::compare("w", CompareOp::Eq, json!("abc"))
                );
            }
            _ => panic!("expected AND group"),
        }
    }

    #[test]
    fn test_homogeneous_and_stays_flat() {
        let query =
            QueryCompiler::compile("GET a FROM t FILTER x = 1 AND y = 2 AND z = 3").unwrap();
        match query.filter.unwrap() {
            Condition::Group { op, children } => {
                assert_eq!(op, LogicOp::And);
                assert_eq!(children.len(), 3);
                assert!(children
                    .iter()
                    .all(|c| matches!(c, Condition::Compare { .. })));
            }
            _ => panic!("expected AND group"),
        }
    }

    #[test]
    fn test_mixed_operators_nest_last_wins() {
        // a AND b OR c  =>  OR(AND(a, b), c)
        let query =
            QueryCompiler::compile("GET a FROM t FILTER x = 1 AND y = 2 OR z = 3").unwrap();
        match query.filter.unwrap() {
            Condition::Group { op, children } => {
                assert_eq!(op, LogicOp::Or);
                assert_eq!(children.len(), 2);
                assert_eq!(
                    children[0],
                    Condition::all(vec![
                        Condition::compare("x", CompareOp::Eq, json!(1)),
                        Condition::compare("y", CompareOp::Eq, json!(2)),
                    ])
                );
                assert_eq!(children[1], Condition::compare("z", CompareOp::Eq, json!(3)));
            }
            _ => panic!("expected OR group"),
        }
    }

    #[test]
    fn test_quoted_literal_with_spaces() {
        let query =
            QueryCompiler::compile("GET name FROM teams FILTER name = \"San Antonio Spurs\"")
                .unwrap();
        assert_eq!(
            query.filter.unwrap(),
            Condition::compare("name", CompareOp::Eq, json!("San Antonio Spurs"))
        );
    }

    #[test]
    fn test_unknown_operator_rejected() {
        let err = QueryCompiler::compile("GET a FROM t FILTER x ~ 1").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_QUERY_UNKNOWN_OPERATOR");
    }

    #[test]
    fn test_dangling_filter_tokens_rejected() {
        let err = QueryCompiler::compile("GET a FROM t FILTER x =").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_QUERY_MALFORMED_FILTER");
    }

    #[test]
    fn test_aggregate_without_group_rejected() {
        let err = QueryCompiler::compile("GET COUNT(player) FROM players").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_QUERY_GROUP_REQUIRED");
    }

    #[test]
    fn test_group_field_must_be_in_get() {
        let err =
            QueryCompiler::compile("GET season, COUNT(player) FROM players GROUP tm").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_QUERY_GROUP_MISMATCH");
    }

    #[test]
    fn test_unknown_aggregate_rejected() {
        let err = QueryCompiler::compile("GET MEDIAN(age) FROM players GROUP age").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_QUERY_BAD_AGGREGATE");
    }

    #[test]
    fn test_bad_limit_rejected() {
        let err = QueryCompiler::compile("GET a FROM t LIMIT ten").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_QUERY_BAD_LIMIT");
        let err = QueryCompiler::compile("GET a FROM t LIMIT -1").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_QUERY_BAD_LIMIT");
    }

    #[test]
    fn test_sort_defaults_ascending() {
        let query = QueryCompiler::compile("GET a FROM t SORT a, b").unwrap();
        let sort = query.sort.unwrap();
        assert_eq!(sort.keys, vec!["a", "b"]);
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn test_wildcard_projection() {
        let query = QueryCompiler::compile("GET * FROM players LIMIT 3").unwrap();
        assert_eq!(query.projections, vec![Projection::All]);
        assert_eq!(query.output_fields(), None);
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let query =
            QueryCompiler::compile("get a from t filter a > 1 sort a desc limit 2").unwrap();
        assert_eq!(query.table, "t");
        assert_eq!(query.limit, Some(2));
        assert_eq!(query.sort.unwrap().direction, SortDirection::Desc);
    }
}
