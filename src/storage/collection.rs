//! Document-model collections
//!
//! A collection is a sequence of partition files. Inserts land in the
//! highest-numbered partition until the configured cap (bytes or records)
//! would be exceeded, then a new partition opens and the catalog's partition
//! count is bumped. Older partitions are never reopened for insertion and
//! never merged; dropping a collection removes every partition file.

use crate::catalog::{Catalog, CatalogError};
use crate::config::{Config, PartitionMode};
use crate::error::StrataResult;
use crate::observability::Logger;

use super::partition::{partition_path, read_records, write_records};
use super::record::{matches_condition, merge_fields, serialized_size, Record};

/// Document collection operations over one catalog + data directory
pub struct CollectionStore<'a> {
    catalog: &'a mut Catalog,
    config: &'a Config,
}

impl<'a> CollectionStore<'a> {
    pub fn new(catalog: &'a mut Catalog, config: &'a Config) -> Self {
        Self { catalog, config }
    }

    /// Read access to the underlying catalog
    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    /// Creates a database entry
    pub fn create_database(&mut self, database: &str) -> StrataResult<()> {
        self.catalog.create_database(database)?;
        Logger::info("DATABASE_CREATED", &[("database", database)]);
        Ok(())
    }

    /// Drops a database entry. Collection data files are left on disk, in
    /// line with the original engine's keep-the-data behavior; drop the
    /// collections first for a full cleanup.
    pub fn drop_database(&mut self, database: &str) -> StrataResult<()> {
        self.catalog.drop_database(database)?;
        Logger::info("DATABASE_DROPPED", &[("database", database)]);
        Ok(())
    }

    /// Creates a collection with one empty partition
    pub fn create_collection(&mut self, database: &str, name: &str) -> StrataResult<()> {
        self.catalog.create_collection(database, name, None)?;
        let path = partition_path(&self.config.data_path(), database, name, 1);
        write_records(&path, &[])?;
        Logger::info(
            "COLLECTION_CREATED",
            &[("database", database), ("collection", name)],
        );
        Ok(())
    }

    /// Drops a collection and removes every partition file
    pub fn drop_collection(&mut self, database: &str, name: &str) -> StrataResult<()> {
        let entry = self.catalog.collection(database, name)?;
        if entry.is_table() {
            return Err(CatalogError::not_a_collection(name).into());
        }
        let count = entry.partition_count;

        for n in 1..=count {
            let path = partition_path(&self.config.data_path(), database, name, n);
            // A partition that never materialized is not an error on drop
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    return Err(crate::storage::StorageError::write_failed(format!(
                        "failed to remove {}: {}",
                        path.display(),
                        e
                    ))
                    .into());
                }
            }
        }
        self.catalog.drop_collection(database, name)?;
        Logger::info(
            "COLLECTION_DROPPED",
            &[("database", database), ("collection", name)],
        );
        Ok(())
    }

    /// Inserts one record, rolling to a new partition when the active one is
    /// at its cap.
    pub fn insert_one(&mut self, database: &str, name: &str, record: Record) -> StrataResult<()> {
        self.insert_many(database, name, vec![record])
    }

    /// Inserts a batch of records. The active partition is filled up to the
    /// cap; overflow continues into fresh partitions, each capped as well.
    pub fn insert_many(
        &mut self,
        database: &str,
        name: &str,
        records: Vec<Record>,
    ) -> StrataResult<()> {
        let entry = self.catalog.collection(database, name)?;
        if entry.is_table() {
            return Err(CatalogError::not_a_collection(name).into());
        }
        let mut current = entry.partition_count;
        let data_dir = self.config.data_path();

        let path = partition_path(&data_dir, database, name, current);
        let mut active = read_records(&path)?;
        let mut dirty = false;

        for record in records {
            if !active.is_empty() && self.over_cap(&active, &record) {
                // Flush the full partition and open the next one
                write_records(
                    &partition_path(&data_dir, database, name, current),
                    &active,
                )?;
                current += 1;
                active = Vec::new();
                Logger::info(
                    "PARTITION_ROLLOVER",
                    &[
                        ("database", database),
                        ("collection", name),
                        ("partition", &current.to_string()),
                    ],
                );
            }
            active.push(record);
            dirty = true;
        }

        if dirty {
            write_records(&partition_path(&data_dir, database, name, current), &active)?;
        }
        if current != self.catalog.partition_count(database, name)? {
            self.catalog.set_partition_count(database, name, current)?;
        }
        Ok(())
    }

    /// Would appending `record` push `active` past the configured cap?
    fn over_cap(&self, active: &[Record], record: &Record) -> bool {
        match self.config.partition_mode {
            PartitionMode::Records => active.len() as u64 + 1 > self.config.max_partition_records,
            PartitionMode::Bytes => {
                let record_size = serde_json::Value::Object(record.clone()).to_string().len() as u64;
                serialized_size(active) + record_size >= self.config.max_partition_bytes
            }
        }
    }

    /// Deletes the first record matching `condition`, scanning partitions in
    /// order. An empty condition deletes the first record of the collection.
    /// Returns true when something was deleted.
    pub fn delete_one(
        &mut self,
        database: &str,
        name: &str,
        condition: &Record,
    ) -> StrataResult<bool> {
        let count = self.collection_partitions(database, name)?;
        let data_dir = self.config.data_path();

        for n in 1..=count {
            let path = partition_path(&data_dir, database, name, n);
            let mut records = read_records(&path)?;
            if let Some(pos) = records.iter().position(|r| matches_condition(r, condition)) {
                records.remove(pos);
                write_records(&path, &records)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Deletes every record matching `condition` across all partitions.
    /// An empty condition empties the collection back to one empty
    /// partition. Returns the number of records removed.
    pub fn delete_many(
        &mut self,
        database: &str,
        name: &str,
        condition: &Record,
    ) -> StrataResult<usize> {
        let count = self.collection_partitions(database, name)?;
        let data_dir = self.config.data_path();
        let mut removed = 0;

        if condition.is_empty() {
            for n in 1..=count {
                let path = partition_path(&data_dir, database, name, n);
                removed += read_records(&path)?.len();
                if n == 1 {
                    write_records(&path, &[])?;
                } else {
                    std::fs::remove_file(&path).map_err(|e| {
                        crate::storage::StorageError::write_failed(format!(
                            "failed to remove {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                }
            }
            if count > 1 {
                self.catalog.set_partition_count(database, name, 1)?;
            }
            return Ok(removed);
        }

        for n in 1..=count {
            let path = partition_path(&data_dir, database, name, n);
            let records = read_records(&path)?;
            let kept: Vec<Record> = records
                .iter()
                .filter(|r| !matches_condition(r, condition))
                .cloned()
                .collect();
            if kept.len() != records.len() {
                removed += records.len() - kept.len();
                write_records(&path, &kept)?;
            }
        }
        Ok(removed)
    }

    /// Merges `new_data` into the first record matching `condition`. An
    /// empty condition updates the first record of the collection. Returns
    /// true when something was updated.
    pub fn update_one(
        &mut self,
        database: &str,
        name: &str,
        condition: &Record,
        new_data: &Record,
    ) -> StrataResult<bool> {
        let count = self.collection_partitions(database, name)?;
        let data_dir = self.config.data_path();

        for n in 1..=count {
            let path = partition_path(&data_dir, database, name, n);
            let mut records = read_records(&path)?;
            if let Some(record) = records.iter_mut().find(|r| matches_condition(r, condition)) {
                merge_fields(record, new_data);
                write_records(&path, &records)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Merges `new_data` into every record matching `condition`. An empty
    /// condition updates every record. Returns the number updated.
    pub fn update_many(
        &mut self,
        database: &str,
        name: &str,
        condition: &Record,
        new_data: &Record,
    ) -> StrataResult<usize> {
        let count = self.collection_partitions(database, name)?;
        let data_dir = self.config.data_path();
        let mut updated = 0;

        for n in 1..=count {
            let path = partition_path(&data_dir, database, name, n);
            let mut records = read_records(&path)?;
            let mut touched = false;
            for record in records.iter_mut() {
                if matches_condition(record, condition) {
                    merge_fields(record, new_data);
                    updated += 1;
                    touched = true;
                }
            }
            if touched {
                write_records(&path, &records)?;
            }
        }
        Ok(updated)
    }

    /// Resolves a document collection's partition count, rejecting tables
    fn collection_partitions(&self, database: &str, name: &str) -> StrataResult<u32> {
        let entry = self.catalog.collection(database, name)?;
        if entry.is_table() {
            return Err(CatalogError::not_a_collection(name).into());
        }
        Ok(entry.partition_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn record(value: Value) -> Record {
        value.as_object().unwrap().clone()
    }

    fn setup(temp: &TempDir, config: fn(&TempDir) -> Config) -> (Catalog, Config) {
        let config = config(temp);
        let mut catalog = Catalog::open(&config.metadata_path()).unwrap();
        {
            let mut store = CollectionStore::new(&mut catalog, &config);
            store.create_database("nba").unwrap();
            store.create_collection("nba", "players").unwrap();
        }
        (catalog, config)
    }

    fn default_config(temp: &TempDir) -> Config {
        Config::new(temp.path().to_string_lossy())
    }

    fn tiny_records_config(temp: &TempDir) -> Config {
        let mut config = Config::new(temp.path().to_string_lossy());
        config.partition_mode = PartitionMode::Records;
        config.max_partition_records = 2;
        config
    }

    #[test]
    fn test_insert_and_read_back() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp, default_config);
        let mut store = CollectionStore::new(&mut catalog, &config);

        store
            .insert_one("nba", "players", record(json!({"player": "Ann", "age": 31})))
            .unwrap();

        let path = partition_path(&config.data_path(), "nba", "players", 1);
        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["player"], json!("Ann"));
    }

    #[test]
    fn test_rollover_in_records_mode() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp, tiny_records_config);
        let mut store = CollectionStore::new(&mut catalog, &config);

        for i in 0..5 {
            store
                .insert_one("nba", "players", record(json!({"n": i})))
                .unwrap();
        }

        assert_eq!(catalog.partition_count("nba", "players").unwrap(), 3);
        let data_dir = config.data_path();
        assert_eq!(
            read_records(&partition_path(&data_dir, "nba", "players", 1))
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            read_records(&partition_path(&data_dir, "nba", "players", 3))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_rollover_in_bytes_mode() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::new(temp.path().to_string_lossy());
        config.max_partition_bytes = 40;
        let mut catalog = Catalog::open(&config.metadata_path()).unwrap();
        let mut store = CollectionStore::new(&mut catalog, &config);
        store.create_database("nba").unwrap();
        store.create_collection("nba", "players").unwrap();

        for i in 0..4 {
            store
                .insert_one("nba", "players", record(json!({"value": i})))
                .unwrap();
        }
        assert!(catalog.partition_count("nba", "players").unwrap() > 1);
    }

    #[test]
    fn test_insert_many_batch_splits() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp, tiny_records_config);
        let mut store = CollectionStore::new(&mut catalog, &config);

        let batch: Vec<Record> = (0..5).map(|i| record(json!({"n": i}))).collect();
        store.insert_many("nba", "players", batch).unwrap();

        assert_eq!(catalog.partition_count("nba", "players").unwrap(), 3);
    }

    #[test]
    fn test_delete_one_first_match() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp, default_config);
        let mut store = CollectionStore::new(&mut catalog, &config);

        store
            .insert_many(
                "nba",
                "players",
                vec![
                    record(json!({"player": "Ann"})),
                    record(json!({"player": "Bo"})),
                    record(json!({"player": "Ann"})),
                ],
            )
            .unwrap();

        let deleted = store
            .delete_one("nba", "players", &record(json!({"player": "Ann"})))
            .unwrap();
        assert!(deleted);

        let records =
            read_records(&partition_path(&config.data_path(), "nba", "players", 1)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["player"], json!("Bo"));
    }

    #[test]
    fn test_delete_many_empty_condition_truncates() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp, tiny_records_config);
        let mut store = CollectionStore::new(&mut catalog, &config);

        let batch: Vec<Record> = (0..5).map(|i| record(json!({"n": i}))).collect();
        store.insert_many("nba", "players", batch).unwrap();

        let removed = store.delete_many("nba", "players", &Record::new()).unwrap();
        assert_eq!(removed, 5);
        assert_eq!(catalog.partition_count("nba", "players").unwrap(), 1);

        let data_dir = config.data_path();
        assert!(read_records(&partition_path(&data_dir, "nba", "players", 1))
            .unwrap()
            .is_empty());
        assert!(!partition_path(&data_dir, "nba", "players", 2).exists());
    }

    #[test]
    fn test_update_one_merges_fields() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp, default_config);
        let mut store = CollectionStore::new(&mut catalog, &config);

        store
            .insert_one("nba", "players", record(json!({"player": "Ann", "age": 31})))
            .unwrap();
        let updated = store
            .update_one(
                "nba",
                "players",
                &record(json!({"player": "Ann"})),
                &record(json!({"age": 32, "tm": "BOS"})),
            )
            .unwrap();
        assert!(updated);

        let records =
            read_records(&partition_path(&config.data_path(), "nba", "players", 1)).unwrap();
        assert_eq!(records[0]["age"], json!(32));
        assert_eq!(records[0]["tm"], json!("BOS"));
    }

    #[test]
    fn test_update_many_counts() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp, default_config);
        let mut store = CollectionStore::new(&mut catalog, &config);

        store
            .insert_many(
                "nba",
                "players",
                vec![
                    record(json!({"tm": "BOS"})),
                    record(json!({"tm": "LAL"})),
                    record(json!({"tm": "BOS"})),
                ],
            )
            .unwrap();
        let updated = store
            .update_many(
                "nba",
                "players",
                &record(json!({"tm": "BOS"})),
                &record(json!({"conf": "East"})),
            )
            .unwrap();
        assert_eq!(updated, 2);
    }

    #[test]
    fn test_drop_collection_removes_files() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp, tiny_records_config);
        let mut store = CollectionStore::new(&mut catalog, &config);

        let batch: Vec<Record> = (0..5).map(|i| record(json!({"n": i}))).collect();
        store.insert_many("nba", "players", batch).unwrap();
        store.drop_collection("nba", "players").unwrap();

        let data_dir = config.data_path();
        for n in 1..=3 {
            assert!(!partition_path(&data_dir, "nba", "players", n).exists());
        }
        assert!(catalog.collection("nba", "players").is_err());
    }

    #[test]
    fn test_insert_into_missing_collection_fails() {
        let temp = TempDir::new().unwrap();
        let (mut catalog, config) = setup(&temp, default_config);
        let mut store = CollectionStore::new(&mut catalog, &config);

        let err = store
            .insert_one("nba", "games", record(json!({"a": 1})))
            .unwrap_err();
        assert_eq!(err.code(), "STRATA_UNKNOWN_COLLECTION");
    }
}
