//! Catalog persistence and structural operations
//!
//! The catalog is an in-memory registry backed by one JSON file. Every
//! mutating operation updates memory first and then writes the whole file
//! back through a temp-file-and-rename replace, so the on-disk catalog is
//! always either the old or the new state.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::errors::{CatalogError, CatalogResult};
use super::types::{CatalogData, CollectionEntry, DatabaseEntry, TableSchema};

/// Catalog of databases, collections, and table schemas
#[derive(Debug)]
pub struct Catalog {
    /// Path of the persisted catalog file
    path: PathBuf,
    /// In-memory state
    data: CatalogData,
}

impl Catalog {
    /// Opens the catalog file, or starts empty when the file does not exist.
    pub fn open(path: &Path) -> CatalogResult<Self> {
        let data = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                CatalogError::corrupt(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CatalogData::default(),
            Err(e) => {
                return Err(CatalogError::io(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Writes the catalog back to disk atomically.
    pub fn save(&self) -> CatalogResult<()> {
        let content = serde_json::to_string_pretty(&self.data)
            .map_err(|e| CatalogError::io(format!("failed to serialize catalog: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    CatalogError::io(format!("failed to create {}: {}", parent.display(), e))
                })?;
            }
        }

        // Write-then-rename: readers see the old or the new file, never a
        // partial one.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .map_err(|e| CatalogError::io(format!("failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            CatalogError::io(format!("failed to replace {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }

    /// Returns the catalog file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ---- lookups ----

    /// Looks up a database entry
    pub fn database(&self, name: &str) -> CatalogResult<&DatabaseEntry> {
        self.data
            .database(name)
            .ok_or_else(|| CatalogError::unknown_database(name))
    }

    /// Looks up a collection/table entry
    pub fn collection(&self, database: &str, name: &str) -> CatalogResult<&CollectionEntry> {
        self.database(database)?
            .collection(name)
            .ok_or_else(|| CatalogError::unknown_collection(database, name))
    }

    /// Returns the partition count of a collection
    pub fn partition_count(&self, database: &str, name: &str) -> CatalogResult<u32> {
        Ok(self.collection(database, name)?.partition_count)
    }

    /// Lists database names
    pub fn list_databases(&self) -> Vec<&str> {
        self.data.databases.iter().map(|d| d.name.as_str()).collect()
    }

    /// Lists collection/table names of a database
    pub fn list_collections(&self, database: &str) -> CatalogResult<Vec<&str>> {
        Ok(self
            .database(database)?
            .collections
            .iter()
            .map(|c| c.name.as_str())
            .collect())
    }

    /// Tables referencing `table` through a declared foreign key
    pub fn referencing_tables(&self, database: &str, table: &str) -> CatalogResult<Vec<String>> {
        Ok(self
            .database(database)?
            .referenced_by
            .get(table)
            .cloned()
            .unwrap_or_default())
    }

    // ---- structural mutations ----

    /// Creates a database entry
    pub fn create_database(&mut self, name: &str) -> CatalogResult<()> {
        if self.data.database(name).is_some() {
            return Err(CatalogError::duplicate_database(name));
        }
        self.data.databases.push(DatabaseEntry {
            name: name.to_string(),
            created_at: Utc::now(),
            collections: Vec::new(),
            referenced_by: Default::default(),
        });
        self.save()
    }

    /// Removes a database entry. Data files are not touched here; the
    /// storage layer removes them before calling in.
    pub fn drop_database(&mut self, name: &str) -> CatalogResult<()> {
        let before = self.data.databases.len();
        self.data.databases.retain(|d| d.name != name);
        if self.data.databases.len() == before {
            return Err(CatalogError::unknown_database(name));
        }
        self.save()
    }

    /// Creates a collection (schema = None) or table (schema = Some).
    ///
    /// For tables, every foreign key must reference an existing table and
    /// column; the database's reverse-reference map is recomputed from
    /// scratch afterwards.
    pub fn create_collection(
        &mut self,
        database: &str,
        name: &str,
        schema: Option<TableSchema>,
    ) -> CatalogResult<()> {
        // Validate before mutating
        {
            let db = self.database(database)?;
            if db.collection(name).is_some() {
                return Err(CatalogError::duplicate_collection(database, name));
            }
            if let Some(schema) = &schema {
                Self::validate_schema(db, name, schema)?;
            }
        }

        let declared_fk = schema
            .as_ref()
            .map_or(false, |s| !s.foreign_keys.is_empty());

        let db = self
            .data
            .database_mut(database)
            .expect("database checked above");
        db.collections.push(CollectionEntry {
            name: name.to_string(),
            partition_count: 1,
            created_at: Utc::now(),
            schema,
        });
        if declared_fk {
            Self::recompute_references(db);
        }
        self.save()
    }

    /// Removes a collection/table entry. Dropping a table still referenced
    /// by others is refused.
    pub fn drop_collection(&mut self, database: &str, name: &str) -> CatalogResult<()> {
        let referencing = self.referencing_tables(database, name)?;
        if !referencing.is_empty() {
            return Err(CatalogError::table_referenced(name, &referencing));
        }

        let db = self
            .data
            .database_mut(database)
            .ok_or_else(|| CatalogError::unknown_database(database))?;
        let before = db.collections.len();
        db.collections.retain(|c| c.name != name);
        if db.collections.len() == before {
            return Err(CatalogError::unknown_collection(database, name));
        }
        Self::recompute_references(db);
        self.save()
    }

    /// Records a new partition count after a rollover
    pub fn set_partition_count(
        &mut self,
        database: &str,
        name: &str,
        partition_count: u32,
    ) -> CatalogResult<()> {
        let db = self
            .data
            .database_mut(database)
            .ok_or_else(|| CatalogError::unknown_database(database))?;
        let entry = db
            .collection_mut(name)
            .ok_or_else(|| CatalogError::unknown_collection(database, name))?;
        entry.partition_count = partition_count;
        self.save()
    }

    /// Validates a table schema against the database it joins
    fn validate_schema(
        db: &DatabaseEntry,
        table: &str,
        schema: &TableSchema,
    ) -> CatalogResult<()> {
        if let Some(pk) = &schema.primary_key {
            if !schema.has_column(pk) {
                return Err(CatalogError::unknown_column(table, pk));
            }
        }
        for unique in &schema.unique {
            if !schema.has_column(unique) {
                return Err(CatalogError::unknown_column(table, unique));
            }
        }
        for fk in &schema.foreign_keys {
            if !schema.has_column(&fk.column) {
                return Err(CatalogError::unknown_column(table, &fk.column));
            }
            let target = db.collection(&fk.ref_table).ok_or_else(|| {
                CatalogError::unknown_reference(
                    table,
                    format!("referenced table '{}' does not exist", fk.ref_table),
                )
            })?;
            let target_schema = target.schema.as_ref().ok_or_else(|| {
                CatalogError::unknown_reference(
                    table,
                    format!("'{}' is not a relational table", fk.ref_table),
                )
            })?;
            if !target_schema.has_column(&fk.ref_column) {
                return Err(CatalogError::unknown_reference(
                    table,
                    format!(
                        "referenced column '{}.{}' does not exist",
                        fk.ref_table, fk.ref_column
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Rebuilds the reverse-reference map from every declared foreign key.
    fn recompute_references(db: &mut DatabaseEntry) {
        db.referenced_by.clear();
        for entry in &db.collections {
            let Some(schema) = &entry.schema else { continue };
            for fk in &schema.foreign_keys {
                let referencing = db.referenced_by.entry(fk.ref_table.clone()).or_default();
                if !referencing.contains(&entry.name) {
                    referencing.push(entry.name.clone());
                }
            }
        }
        for referencing in db.referenced_by.values_mut() {
            referencing.sort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDef, ColumnType, ForeignKey};
    use tempfile::TempDir;

    fn open_catalog(temp: &TempDir) -> Catalog {
        Catalog::open(&temp.path().join("metadata.json")).unwrap()
    }

    fn teams_schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnDef::new("id", ColumnType::Int),
            ColumnDef::new("city", ColumnType::String),
        ])
        .with_primary_key("id")
    }

    fn players_schema() -> TableSchema {
        TableSchema::new(vec![
            ColumnDef::new("id", ColumnType::Int),
            ColumnDef::new("team_id", ColumnType::Int),
        ])
        .with_primary_key("id")
        .with_foreign_key(ForeignKey::new("team_id", "teams", "id"))
    }

    #[test]
    fn test_open_missing_file_starts_empty() {
        let temp = TempDir::new().unwrap();
        let catalog = open_catalog(&temp);
        assert!(catalog.list_databases().is_empty());
    }

    #[test]
    fn test_create_and_reload() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open_catalog(&temp);
        catalog.create_database("nba").unwrap();
        catalog.create_collection("nba", "players", None).unwrap();

        let reloaded = open_catalog(&temp);
        assert_eq!(reloaded.partition_count("nba", "players").unwrap(), 1);
        assert_eq!(reloaded.list_collections("nba").unwrap(), vec!["players"]);
    }

    #[test]
    fn test_duplicate_database_rejected() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open_catalog(&temp);
        catalog.create_database("nba").unwrap();
        let err = catalog.create_database("nba").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_DUPLICATE_DATABASE");
    }

    #[test]
    fn test_unknown_lookups() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open_catalog(&temp);
        catalog.create_database("nba").unwrap();

        let err = catalog.collection("nba", "nope").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_UNKNOWN_COLLECTION");
        let err = catalog.collection("mlb", "players").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_UNKNOWN_DATABASE");
    }

    #[test]
    fn test_partition_count_update() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open_catalog(&temp);
        catalog.create_database("nba").unwrap();
        catalog.create_collection("nba", "players", None).unwrap();
        catalog.set_partition_count("nba", "players", 3).unwrap();
        assert_eq!(catalog.partition_count("nba", "players").unwrap(), 3);
    }

    #[test]
    fn test_foreign_key_target_must_exist() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open_catalog(&temp);
        catalog.create_database("nba").unwrap();

        let err = catalog
            .create_collection("nba", "players", Some(players_schema()))
            .unwrap_err();
        assert_eq!(err.code().code(), "STRATA_UNKNOWN_REFERENCE");
    }

    #[test]
    fn test_reverse_reference_map_recomputed() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open_catalog(&temp);
        catalog.create_database("nba").unwrap();
        catalog
            .create_collection("nba", "teams", Some(teams_schema()))
            .unwrap();
        catalog
            .create_collection("nba", "players", Some(players_schema()))
            .unwrap();

        assert_eq!(
            catalog.referencing_tables("nba", "teams").unwrap(),
            vec!["players".to_string()]
        );

        // Dropping the referencing table clears the map
        catalog.drop_collection("nba", "players").unwrap();
        assert!(catalog.referencing_tables("nba", "teams").unwrap().is_empty());
    }

    #[test]
    fn test_drop_referenced_table_refused() {
        let temp = TempDir::new().unwrap();
        let mut catalog = open_catalog(&temp);
        catalog.create_database("nba").unwrap();
        catalog
            .create_collection("nba", "teams", Some(teams_schema()))
            .unwrap();
        catalog
            .create_collection("nba", "players", Some(players_schema()))
            .unwrap();

        let err = catalog.drop_collection("nba", "teams").unwrap_err();
        assert_eq!(err.code().code(), "STRATA_TABLE_REFERENCED");
    }

    #[test]
    fn test_corrupt_catalog_detected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("metadata.json");
        fs::write(&path, "{not json").unwrap();
        let err = Catalog::open(&path).unwrap_err();
        assert_eq!(err.code().code(), "STRATA_CATALOG_CORRUPT");
    }
}
