//! Relational tables
//!
//! A table is one flat JSON-array file plus a declared schema in the
//! catalog. Inserts validate the row against the schema and every
//! constraint before any byte is written: unknown columns and type
//! mismatches are schema errors; duplicate primary keys, duplicate unique
//! values, and dangling foreign keys are constraint violations.

use serde_json::Value;

use crate::catalog::{Catalog, CatalogError, TableSchema};
use crate::config::Config;
use crate::error::StrataResult;
use crate::observability::Logger;

use super::errors::ConstraintError;
use super::partition::{read_records, table_path, write_records};
use super::record::Record;

/// Relational table operations over one catalog + data directory
pub struct TableStore<'a> {
    catalog: &'a mut Catalog,
    config: &'a Config,
}

impl<'a> TableStore<'a> {
    pub fn new(catalog: &'a mut Catalog, config: &'a Config) -> Self {
        Self { catalog, config }
    }

    /// Creates a table: catalog entry (schema + recomputed reference map)
    /// and an empty data file.
    pub fn create_table(
        &mut self,
        database: &str,
        name: &str,
        schema: TableSchema,
    ) -> StrataResult<()> {
        self.catalog
            .create_collection(database, name, Some(schema))?;
        let path = table_path(&self.config.data_path(), database, name);
        write_records(&path, &[])?;
        Logger::info("TABLE_CREATED", &[("database", database), ("table", name)]);
        Ok(())
    }

    /// Drops a table and its data file. Refused while other tables hold a
    /// foreign key into it.
    pub fn drop_table(&mut self, database: &str, name: &str) -> StrataResult<()> {
        let entry = self.catalog.collection(database, name)?;
        if !entry.is_table() {
            return Err(CatalogError::not_a_table(name).into());
        }
        // drop_collection re-checks the reverse-reference map
        self.catalog.drop_collection(database, name)?;

        let path = table_path(&self.config.data_path(), database, name);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(super::errors::StorageError::write_failed(format!(
                    "failed to remove {}: {}",
                    path.display(),
                    e
                ))
                .into());
            }
        }
        Logger::info("TABLE_DROPPED", &[("database", database), ("table", name)]);
        Ok(())
    }

    /// Inserts one row after validating schema and constraints.
    pub fn insert_row(&mut self, database: &str, name: &str, row: Record) -> StrataResult<()> {
        let entry = self.catalog.collection(database, name)?;
        let schema = entry
            .schema
            .as_ref()
            .ok_or_else(|| CatalogError::not_a_table(name))?
            .clone();

        // Schema checks first: unknown columns, missing columns, types
        for column in row.keys() {
            if !schema.has_column(column) {
                return Err(CatalogError::unknown_column(name, column).into());
            }
        }
        for column in &schema.columns {
            let value = row
                .get(&column.name)
                .ok_or_else(|| CatalogError::unknown_column(name, &column.name))?;
            if !column.column_type.accepts(value) {
                return Err(CatalogError::type_mismatch(
                    name,
                    &column.name,
                    column.column_type.type_name(),
                )
                .into());
            }
        }

        let data_dir = self.config.data_path();
        let path = table_path(&data_dir, database, name);
        let mut rows = read_records(&path)?;
        let null = Value::Null;

        // Constraint checks: nothing is written until all pass
        if let Some(pk) = &schema.primary_key {
            let value = row.get(pk).unwrap_or(&null);
            if value.is_null() {
                return Err(ConstraintError::null_primary_key(name, pk).into());
            }
            if rows.iter().any(|r| r.get(pk) == Some(value)) {
                return Err(ConstraintError::primary_key(name, value).into());
            }
        }
        for column in &schema.unique {
            let value = row.get(column).unwrap_or(&null);
            if !value.is_null() && rows.iter().any(|r| r.get(column) == Some(value)) {
                return Err(ConstraintError::unique(name, column, value).into());
            }
        }
        for fk in &schema.foreign_keys {
            let value = row.get(&fk.column).unwrap_or(&null);
            if value.is_null() {
                continue;
            }
            let referenced = read_records(&table_path(&data_dir, database, &fk.ref_table))?;
            if !referenced.iter().any(|r| r.get(&fk.ref_column) == Some(value)) {
                return Err(ConstraintError::foreign_key(name, &fk.column, value).into());
            }
        }

        rows.push(row);
        write_records(&path, &rows)?;
        Ok(())
    }

    /// Reads all rows of a table.
    pub fn rows(&self, database: &str, name: &str) -> StrataResult<Vec<Record>> {
        let entry = self.catalog.collection(database, name)?;
        if !entry.is_table() {
            return Err(CatalogError::not_a_table(name).into());
        }
        let path = table_path(&self.config.data_path(), database, name);
        Ok(read_records(&path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDef, ColumnType, ForeignKey};
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn setup(temp: &TempDir) -> (Catalog, Config) {
        let config = Config::new(temp.path().to_string_lossy());
        let mut catalog = Catalog::open(&config.metadata_path()).unwrap();
        catalog.create_database("nba").unwrap();
        (catalog, config)
    }

    fn teams_schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnDef::new("id", ColumnType::Int),
            ColumnDef::new("city", ColumnType::String),
        ])
        .with_primary_key("id")
        .with_unique("city")
    }

    fn players_schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnDef::new("id", ColumnType::Int),
            ColumnDef::new("player", ColumnType::String),
            ColumnDef::new("team_id", ColumnType::Int),
        ])
        .with_primary_key("id")
        .with_foreign_key(ForeignKey::new("team_id", "teams", "id"))
    }

    #[test]
    fn test_insert_and_read() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp);
        let mut store = TableStore::new(&mut catalog, &config);

        store.create_table("nba", "teams", teams_schema()).unwrap();
        store
            .insert_row("nba", "teams", record(json!({"id": 1, "city": "Boston"})))
            .unwrap();

        let rows = store.rows("nba", "teams").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["city"], json!("Boston"));
    }

    #[test]
    fn test_primary_key_violation() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp);
        let mut store = TableStore::new(&mut catalog, &config);

        store.create_table("nba", "teams", teams_schema()).unwrap();
        store
            .insert_row("nba", "teams", record(json!({"id": 1, "city": "Boston"})))
            .unwrap();
        let err = store
            .insert_row("nba", "teams", record(json!({"id": 1, "city": "Denver"})))
            .unwrap_err();
        assert_eq!(err.code(), "STRATA_PRIMARY_KEY_VIOLATION");

        // Nothing was written
        assert_eq!(store.rows("nba", "teams").unwrap().len(), 1);
    }

    #[test]
    fn test_unique_violation() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp);
        let mut store = TableStore::new(&mut catalog, &config);

        store.create_table("nba", "teams", teams_schema()).unwrap();
        store
            .insert_row("nba", "teams", record(json!({"id": 1, "city": "Boston"})))
            .unwrap();
        let err = store
            .insert_row("nba", "teams", record(json!({"id": 2, "city": "Boston"})))
            .unwrap_err();
        assert_eq!(err.code(), "STRATA_UNIQUE_VIOLATION");
    }

    #[test]
    fn test_foreign_key_violation() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp);
        let mut store = TableStore::new(&mut catalog, &config);

        store.create_table("nba", "teams", teams_schema()).unwrap();
        store
            .create_table("nba", "players", players_schema())
            .unwrap();
        store
            .insert_row("nba", "teams", record(json!({"id": 1, "city": "Boston"})))
            .unwrap();

        store
            .insert_row(
                "nba",
                "players",
                record(json!({"id": 10, "player": "Ann", "team_id": 1})),
            )
            .unwrap();

        let err = store
            .insert_row(
                "nba",
                "players",
                record(json!({"id": 11, "player": "Bo", "team_id": 99})),
            )
            .unwrap_err();
        assert_eq!(err.code(), "STRATA_FOREIGN_KEY_VIOLATION");
    }

    #[test]
    fn test_unknown_column_rejected() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp);
        let mut store = TableStore::new(&mut catalog, &config);

        store.create_table("nba", "teams", teams_schema()).unwrap();
        let err = store
            .insert_row(
                "nba",
                "teams",
                record(json!({"id": 1, "city": "Boston", "mascot": "Lucky"})),
            )
            .unwrap_err();
        assert_eq!(err.code(), "STRATA_UNKNOWN_COLUMN");
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp);
        let mut store = TableStore::new(&mut catalog, &config);

        store.create_table("nba", "teams", teams_schema()).unwrap();
        let err = store
            .insert_row("nba", "teams", record(json!({"id": "one", "city": "Boston"})))
            .unwrap_err();
        assert_eq!(err.code(), "STRATA_TYPE_MISMATCH");
    }

    #[test]
    fn test_null_primary_key_rejected() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp);
        let mut store = TableStore::new(&mut catalog, &config);

        store.create_table("nba", "teams", teams_schema()).unwrap();
        let err = store
            .insert_row("nba", "teams", record(json!({"id": null, "city": "Boston"})))
            .unwrap_err();
        assert_eq!(err.code(), "STRATA_NULL_PRIMARY_KEY");
    }

    #[test]
    fn test_drop_referenced_table_refused() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp);
        let mut store = TableStore::new(&mut catalog, &config);

        store.create_table("nba", "teams", teams_schema()).unwrap();
        store
            .create_table("nba", "players", players_schema())
            .unwrap();

        let err = store.drop_table("nba", "teams").unwrap_err();
        assert_eq!(err.code(), "STRATA_TABLE_REFERENCED");

        // Dropping the referencing table first unblocks it
        store.drop_table("nba", "players").unwrap();
        store.drop_table("nba", "teams").unwrap();
        assert!(catalog.collection("nba", "teams").is_err());
    }
}
