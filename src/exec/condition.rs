//! Condition evaluation
//!
//! Evaluates a compiled condition tree against one record. A leaf whose
//! field is absent (or null) evaluates to false rather than erroring.
//!
//! Coercion rule: a string value that looks numeric is coerced to a number
//! before a gt/lt/gte/lte/eq comparison against a numeric literal. `ne` and
//! the string-only operators always compare raw values.

use std::cmp::Ordering;

use serde_json::Value;

use crate::query::{CompareOp, Condition, LogicOp};
use crate::storage::Record;

/// Evaluates condition trees against records
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluates a full condition tree. AND groups require every child,
    /// OR groups at least one; nesting depth is unbounded.
    pub fn matches(record: &Record, condition: &Condition) -> bool {
        match condition {
            Condition::Compare { field, op, value } => {
                Self::matches_leaf(record, field, *op, value)
            }
            Condition::Group { op, children } => match op {
                LogicOp::And => children.iter().all(|c| Self::matches(record, c)),
                LogicOp::Or => children.iter().any(|c| Self::matches(record, c)),
            },
        }
    }

    /// Evaluates a single comparison leaf.
    pub fn matches_leaf(record: &Record, field: &str, op: CompareOp, literal: &Value) -> bool {
        let actual = match record.get(field) {
            Some(value) if !value.is_null() => value,
            _ => return false,
        };

        match op {
            CompareOp::Eq => match Self::ordering(actual, literal, true) {
                Some(ordering) => ordering == Ordering::Equal,
                None => actual == literal,
            },
            CompareOp::Ne => actual != literal,
            CompareOp::Gt => Self::ordering(actual, literal, true) == Some(Ordering::Greater),
            CompareOp::Lt => Self::ordering(actual, literal, true) == Some(Ordering::Less),
            CompareOp::Gte => matches!(
                Self::ordering(actual, literal, true),
                Some(Ordering::Greater) | Some(Ordering::Equal)
            ),
            CompareOp::Lte => matches!(
                Self::ordering(actual, literal, true),
                Some(Ordering::Less) | Some(Ordering::Equal)
            ),
            CompareOp::In => match literal {
                Value::Array(items) => items.contains(actual),
                Value::String(haystack) => actual
                    .as_str()
                    .map_or(false, |needle| haystack.contains(needle)),
                _ => false,
            },
            CompareOp::Like => Self::like_match(actual, literal, true),
            CompareOp::ILike => Self::like_match(actual, literal, false),
            CompareOp::StartsWith => Self::str_pair(actual, literal)
                .map_or(false, |(a, p)| a.starts_with(p)),
            CompareOp::EndsWith => Self::str_pair(actual, literal)
                .map_or(false, |(a, p)| a.ends_with(p)),
            CompareOp::IContains => Self::str_pair(actual, literal)
                .map_or(false, |(a, p)| a.to_lowercase().contains(&p.to_lowercase())),
        }
    }

    /// Orders two values for comparison operators. Numbers compare as f64;
    /// strings compare lexicographically; with `coerce` set, a numeric-
    /// looking string on the record side compares numerically against a
    /// numeric literal. Anything else is incomparable.
    fn ordering(actual: &Value, literal: &Value, coerce: bool) -> Option<Ordering> {
        match (actual, literal) {
            (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
            (Value::String(a), Value::Number(b)) if coerce => {
                a.trim().parse::<f64>().ok()?.partial_cmp(&b.as_f64()?)
            }
            (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
            _ => None,
        }
    }

    fn str_pair<'a>(actual: &'a Value, literal: &'a Value) -> Option<(&'a str, &'a str)> {
        Some((actual.as_str()?, literal.as_str()?))
    }

    /// `%`-wildcard pattern match.
    fn like_match(actual: &Value, literal: &Value, case_sensitive: bool) -> bool {
        let Some((text, pattern)) = Self::str_pair(actual, literal) else {
            return false;
        };
        let (text, pattern) = if case_sensitive {
            (text.to_string(), pattern.to_string())
        } else {
            (text.to_lowercase(), pattern.to_lowercase())
        };

        let parts: Vec<&str> = pattern.split('%').collect();
        if parts.len() == 1 {
            return text == pattern;
        }

        let mut pos = 0;
        let last = parts.len() - 1;
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() {
                continue;
            }
            if i == 0 {
                if !text.starts_with(part) {
                    return false;
                }
                pos = part.len();
            } else if i == last {
                let rest = &text[pos.min(text.len())..];
                return rest.ends_with(part);
            } else {
                match text[pos.min(text.len())..].find(part) {
                    Some(found) => pos += found + part.len(),
                    None => return false,
                }
            }
        }
        true
    }
}
