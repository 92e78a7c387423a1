//! Projection stage
//!
//! Restricts each record to the requested field list, immediately before
//! rows reach the output sink. A wildcard (or an aggregation query, whose
//! rows carry synthetic field names) passes records through unchanged.

use crate::storage::Record;

/// Projects records onto a field list
pub struct ProjectionStage;

impl ProjectionStage {
    /// Applies a projection. `fields` of None passes the record through;
    /// requested fields absent from a record are simply omitted.
    pub fn apply(record: Record, fields: Option<&[String]>) -> Record {
        let Some(fields) = fields else { return record };
        let mut projected = Record::new();
        for field in fields {
            if let Some(value) = record.get(field) {
                projected.insert(field.clone(), value.clone());
            }
        }
        projected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_selects_requested_fields() {
        let r = record(json!({"a": 1, "b": 2, "c": 3}));
        let projected = ProjectionStage::apply(r, Some(&fields(&["c", "a"])));
        assert_eq!(serde_json::Value::Object(projected), json!({"c": 3, "a": 1}));
    }

    #[test]
    fn test_wildcard_passthrough() {
        let r = record(json!({"a": 1, "b": 2}));
        let projected = ProjectionStage::apply(r.clone(), None);
        assert_eq!(projected, r);
    }

    #[test]
    fn test_missing_field_omitted() {
        let r = record(json!({"a": 1}));
        let projected = ProjectionStage::apply(r, Some(&fields(&["a", "nope"])));
        assert_eq!(serde_json::Value::Object(projected), json!({"a": 1}));
    }

    #[test]
    fn test_idempotent() {
        let r = record(json!({"a": 1, "b": 2}));
        let wanted = fields(&["a"]);
        let once = ProjectionStage::apply(r, Some(&wanted));
        let twice = ProjectionStage::apply(once.clone(), Some(&wanted));
        assert_eq!(once, twice);
    }
}
