//! Session context
//!
//! One `Session` owns the configuration, the open catalog, and the
//! currently selected database. Every call threads through the session
//! instead of process-wide state, so two sessions never share hidden
//! globals.

use crate::catalog::{Catalog, CatalogError};
use crate::config::Config;
use crate::error::StrataResult;
use crate::exec::{PipelineExecutor, QueryOutput, RowSink};
use crate::query::QueryCompiler;
use crate::storage::{CollectionStore, TableStore};

/// An open engine instance plus the selected database
pub struct Session {
    config: Config,
    catalog: Catalog,
    database: Option<String>,
}

impl Session {
    /// Opens a session: validates config and loads the catalog.
    pub fn open(config: Config) -> StrataResult<Self> {
        config.validate()?;
        let catalog = Catalog::open(&config.metadata_path())?;
        Ok(Self {
            config,
            catalog,
            database: None,
        })
    }

    /// Selects the working database; it must exist in the catalog.
    pub fn select_database(&mut self, name: &str) -> StrataResult<()> {
        self.catalog.database(name)?;
        self.database = Some(name.to_string());
        Ok(())
    }

    /// Currently selected database, if any
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Engine configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read access to the catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Document-model operations bound to this session
    pub fn collections(&mut self) -> CollectionStore<'_> {
        CollectionStore::new(&mut self.catalog, &self.config)
    }

    /// Relational-table operations bound to this session
    pub fn tables(&mut self) -> TableStore<'_> {
        TableStore::new(&mut self.catalog, &self.config)
    }

    /// Compiles and executes query text against the selected database.
    pub fn execute(&self, text: &str) -> StrataResult<QueryOutput> {
        let database = self
            .database
            .as_deref()
            .ok_or_else(CatalogError::no_database_selected)?;
        let query = QueryCompiler::compile(text)?;
        PipelineExecutor::new(&self.catalog, &self.config).execute(database, &query)
    }

    /// Compiles and executes query text, streaming rows into `sink`.
    pub fn execute_into(&self, text: &str, sink: &mut dyn RowSink) -> StrataResult<()> {
        let database = self
            .database
            .as_deref()
            .ok_or_else(CatalogError::no_database_selected)?;
        let query = QueryCompiler::compile(text)?;
        PipelineExecutor::new(&self.catalog, &self.config).execute_into(database, &query, sink)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(value: serde_json::Value) -> crate::storage::Record {
        value.as_object().unwrap().clone()
    }

    fn open_session(temp: &TempDir) -> Session {
        Session::open(Config::new(temp.path().to_string_lossy())).unwrap()
    }

    #[test]
    fn test_query_requires_selected_database() {
        let temp = TempDir::new().unwrap();
        let session = open_session(&temp);
        let err = session.execute("GET a FROM t").unwrap_err();
        assert_eq!(err.code(), "STRATA_NO_DATABASE_SELECTED");
    }

    #[test]
    fn test_select_unknown_database_rejected() {
        let temp = TempDir::new().unwrap();
        let mut session = open_session(&temp);
        let err = session.select_database("absent").unwrap_err();
        assert_eq!(err.code(), "STRATA_UNKNOWN_DATABASE");
    }

    #[test]
    fn test_end_to_end_through_session() {
        let temp = TempDir::new().unwrap();
        let mut session = open_session(&temp);

        {
            let mut collections = session.collections();
            collections.create_database("nba").unwrap();
            collections.create_collection("nba", "players").unwrap();
            collections
                .insert_many(
                    "nba",
                    "players",
                    vec![
                        record(json!({"player": "Ann", "age": 31})),
                        record(json!({"player": "Bo", "age": 25})),
                    ],
                )
                .unwrap();
        }

        session.select_database("nba").unwrap();
        let output = session
            .execute("GET player FROM players FILTER age > 30")
            .unwrap();
        assert_eq!(output.len(), 1);
        assert_eq!(output.rows[0]["player"], json!("Ann"));
    }

    #[test]
    fn test_two_sessions_share_no_state() {
        let temp_a = TempDir::new().unwrap();
        let temp_b = TempDir::new().unwrap();
        let mut a = open_session(&temp_a);
        let b = open_session(&temp_b);

        a.collections().create_database("nba").unwrap();
        a.select_database("nba").unwrap();

        assert_eq!(a.database(), Some("nba"));
        assert_eq!(b.database(), None);
        assert!(b.catalog().database("nba").is_err());
    }
}
