//! Catalog entry types
//!
//! Document collections carry only a partition count. Relational tables
//! additionally declare a schema: typed columns in declaration order, an
//! optional primary key, unique columns, and foreign keys. The per-database
//! reverse-reference map is derived state, fully recomputed whenever a
//! foreign key is declared.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Supported relational column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// UTF-8 string
    String,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Boolean
    Bool,
}

impl ColumnType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
        }
    }

    /// Checks whether a JSON value conforms to this type.
    ///
    /// Null conforms to every type; an int conforms to a float column.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::String, Value::String(_)) => true,
            (ColumnType::Int, Value::Number(n)) => n.as_i64().is_some(),
            (ColumnType::Float, Value::Number(_)) => true,
            (ColumnType::Bool, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

/// A single typed column in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Column data type
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Foreign key: `column` must match `ref_column` of some row in `ref_table`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
}

impl ForeignKey {
    pub fn new(
        column: impl Into<String>,
        ref_table: impl Into<String>,
        ref_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            ref_table: ref_table.into(),
            ref_column: ref_column.into(),
        }
    }
}

/// Declared schema of a relational table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Columns in declaration order
    pub columns: Vec<ColumnDef>,
    /// Optional primary key column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// Columns whose values must be unique across the table
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique: Vec<String>,
    /// Declared foreign keys
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    /// Creates a schema with the given columns and no constraints
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self {
            columns,
            primary_key: None,
            unique: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Sets the primary key column
    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    /// Adds a unique column
    pub fn with_unique(mut self, column: impl Into<String>) -> Self {
        self.unique.push(column.into());
        self
    }

    /// Adds a foreign key
    pub fn with_foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Looks up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Checks column existence
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// One collection or table inside a database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionEntry {
    /// Collection/table name
    pub name: String,
    /// Number of partition files; always 1 for relational tables
    pub partition_count: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Declared schema; present only for relational tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<TableSchema>,
}

impl CollectionEntry {
    /// Returns true when this entry is a relational table
    pub fn is_table(&self) -> bool {
        self.schema.is_some()
    }
}

/// One database: its collections and the derived reverse-reference map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseEntry {
    /// Database name
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Collections and tables
    #[serde(default)]
    pub collections: Vec<CollectionEntry>,
    /// Referenced table -> tables referencing it; recomputed, never patched
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub referenced_by: BTreeMap<String, Vec<String>>,
}

impl DatabaseEntry {
    /// Looks up a collection or table by name
    pub fn collection(&self, name: &str) -> Option<&CollectionEntry> {
        self.collections.iter().find(|c| c.name == name)
    }

    /// Mutable lookup
    pub fn collection_mut(&mut self, name: &str) -> Option<&mut CollectionEntry> {
        self.collections.iter_mut().find(|c| c.name == name)
    }
}

/// Root of the persisted catalog file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub databases: Vec<DatabaseEntry>,
}

impl CatalogData {
    /// Looks up a database by name
    pub fn database(&self, name: &str) -> Option<&DatabaseEntry> {
        self.databases.iter().find(|d| d.name == name)
    }

    /// Mutable lookup
    pub fn database_mut(&mut self, name: &str) -> Option<&mut DatabaseEntry> {
        self.databases.iter_mut().find(|d| d.name == name)
    }
}
