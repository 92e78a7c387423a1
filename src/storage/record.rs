//! Record helpers
//!
//! A record is an ordered mapping from field name to a JSON scalar. The
//! field set is not fixed per record: document collections are schemaless,
//! and relational tables enforce their column set at insert time instead.

use serde_json::Value;

/// One record: field name -> value, in insertion order
pub type Record = serde_json::Map<String, Value>;

/// Serialized byte length of a slice of records, as stored in a partition
/// file (JSON array). Used to decide partition rollover in `bytes` mode.
pub fn serialized_size(records: &[Record]) -> u64 {
    // A JSON array: per-record serialized length, plus separators/brackets.
    let body: u64 = records
        .iter()
        .map(|r| Value::Object(r.clone()).to_string().len() as u64)
        .sum();
    let separators = records.len().saturating_sub(1) as u64;
    body + separators + 2
}

/// Checks a document-model match condition: every key of `condition` must be
/// present in `record` with an equal value; object values recurse so nested
/// fields can be matched. An empty condition matches every record.
pub fn matches_condition(record: &Record, condition: &Record) -> bool {
    for (key, expected) in condition {
        match (record.get(key), expected) {
            (Some(Value::Object(inner)), Value::Object(nested)) => {
                if !matches_condition(inner, nested) {
                    return false;
                }
            }
            (Some(actual), expected) => {
                if actual != expected {
                    return false;
                }
            }
            (None, _) => return false,
        }
    }
    true
}

/// Merges `new_data` into `record`, overwriting existing top-level fields.
pub fn merge_fields(record: &mut Record, new_data: &Record) {
    for (key, value) in new_data {
        record.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_empty_condition_matches_all() {
        let r = record(json!({"a": 1}));
        assert!(matches_condition(&r, &Record::new()));
    }

    #[test]
    fn test_flat_condition() {
        let r = record(json!({"a": 1, "b": "x"}));
        assert!(matches_condition(&r, &record(json!({"a": 1}))));
        assert!(!matches_condition(&r, &record(json!({"a": 2}))));
        assert!(!matches_condition(&r, &record(json!({"c": 1}))));
    }

    #[test]
    fn test_nested_condition() {
        let r = record(json!({"name": "Ann", "address": {"city": "Oslo", "zip": "0150"}}));
        assert!(matches_condition(
            &r,
            &record(json!({"address": {"city": "Oslo"}}))
        ));
        assert!(!matches_condition(
            &r,
            &record(json!({"address": {"city": "Bergen"}}))
        ));
    }

    #[test]
    fn test_merge_overwrites() {
        let mut r = record(json!({"a": 1, "b": 2}));
        merge_fields(&mut r, &record(json!({"b": 9, "c": 3})));
        assert_eq!(Value::Object(r), json!({"a": 1, "b": 9, "c": 3}));
    }

    #[test]
    fn test_serialized_size_tracks_json_length() {
        let records: Vec<Record> = vec![record(json!({"a": 1})), record(json!({"b": "xy"}))];
        let text = serde_json::to_string(&records).unwrap();
        assert_eq!(serialized_size(&records), text.len() as u64);
    }
}
