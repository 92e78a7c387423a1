//! Partition file access
//!
//! Durable files are JSON arrays of records. A partition is always read
//! whole and written whole; the write goes to a temp file in the same
//! directory and is swapped in by rename.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::errors::{StorageError, StorageResult};
use super::record::Record;

/// Path of partition `n` of a document collection
pub fn partition_path(data_dir: &Path, database: &str, collection: &str, n: u32) -> PathBuf {
    data_dir.join(format!("{}_{}_{}.json", database, collection, n))
}

/// Path of a relational table's single data file
pub fn table_path(data_dir: &Path, database: &str, table: &str) -> PathBuf {
    data_dir.join(format!("{}_{}.json", database, table))
}

/// Reads all records of a partition or table file.
pub fn read_records(path: &Path) -> StorageResult<Vec<Record>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::partition_missing(path.display().to_string()))
        }
        Err(e) => {
            return Err(StorageError::read_failed(format!(
                "failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    let value: Value = serde_json::from_str(&content).map_err(|e| {
        StorageError::partition_corrupt(path.display().to_string(), format!("invalid JSON: {}", e))
    })?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(StorageError::partition_corrupt(
                path.display().to_string(),
                format!("expected a JSON array, found {}", json_type_name(&other)),
            ))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Object(record) => records.push(record),
            other => {
                return Err(StorageError::partition_corrupt(
                    path.display().to_string(),
                    format!("expected object records, found {}", json_type_name(&other)),
                ))
            }
        }
    }
    Ok(records)
}

/// Writes all records to a partition or table file atomically.
///
/// The parent directory is created if missing. Content lands in a temp file
/// first and is renamed over the target, so readers only ever observe the
/// old or the new version.
pub fn write_records(path: &Path, records: &[Record]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                StorageError::write_failed(format!(
                    "failed to create {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let content = serde_json::to_string_pretty(records).map_err(|e| {
        StorageError::write_failed(format!("failed to serialize {}: {}", path.display(), e))
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).map_err(|e| {
        StorageError::write_failed(format!("failed to write {}: {}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        StorageError::write_failed(format!("failed to replace {}: {}", path.display(), e))
    })?;
    Ok(())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
