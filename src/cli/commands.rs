//! CLI command implementations
//!
//! Each command loads the config, opens a session, does its one thing, and
//! exits. Rows print to stdout as JSON lines; errors go to stderr via
//! main.rs.

use std::fs;

use serde_json::Value;

use crate::config::Config;
use crate::session::Session;
use crate::storage::Record;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};

/// Parses arguments and dispatches.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Dispatches one parsed command.
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Init { config } => init(&config),
        Command::Query {
            config,
            database,
            query,
        } => query_cmd(&config, &database, &query),
        Command::Insert {
            config,
            database,
            collection,
            record,
        } => insert(&config, &database, &collection, &record),
        Command::List { config, database } => list(&config, database.as_deref()),
    }
}

fn init(config_path: &std::path::Path) -> CliResult<()> {
    let config = Config::load(config_path)?;
    if config.metadata_path().exists() {
        return Err(CliError::already_initialized(format!(
            "catalog already exists at {}",
            config.metadata_path().display()
        )));
    }

    fs::create_dir_all(config.data_path())
        .map_err(|e| CliError::bad_input(format!("failed to create data dir: {}", e)))?;
    fs::create_dir_all(config.tmp_path())
        .map_err(|e| CliError::bad_input(format!("failed to create tmp dir: {}", e)))?;

    let session = Session::open(config)?;
    session.catalog().save().map_err(crate::error::StrataError::from)?;
    println!("initialized {}", session.config().data_dir);
    Ok(())
}

fn query_cmd(config_path: &std::path::Path, database: &str, text: &str) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let mut session = Session::open(config)?;
    session.select_database(database)?;

    let output = session.execute(text)?;
    for row in &output.rows {
        println!("{}", Value::Object(row.clone()));
    }
    Ok(())
}

fn insert(
    config_path: &std::path::Path,
    database: &str,
    collection: &str,
    record_text: &str,
) -> CliResult<()> {
    let value: Value = serde_json::from_str(record_text)
        .map_err(|e| CliError::bad_input(format!("invalid JSON record: {}", e)))?;
    let records: Vec<Record> = match value {
        Value::Object(record) => vec![record],
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Object(record) => records.push(record),
                    _ => {
                        return Err(CliError::bad_input(
                            "array items must be JSON objects",
                        ))
                    }
                }
            }
            records
        }
        _ => {
            return Err(CliError::bad_input(
                "record must be a JSON object or an array of objects",
            ))
        }
    };

    let config = Config::load(config_path)?;
    let mut session = Session::open(config)?;
    let mut collections = session.collections();

    if collections.catalog().database(database).is_err() {
        collections.create_database(database)?;
    }
    if collections.catalog().collection(database, collection).is_err() {
        collections.create_collection(database, collection)?;
    }
    let count = records.len();
    collections.insert_many(database, collection, records)?;
    println!("inserted {} record(s) into {}.{}", count, database, collection);
    Ok(())
}

fn list(config_path: &std::path::Path, database: Option<&str>) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let session = Session::open(config)?;

    match database {
        Some(database) => {
            let names: Vec<String> = session
                .catalog()
                .list_collections(database)
                .map_err(crate::error::StrataError::from)?
                .iter()
                .map(|s| s.to_string())
                .collect();
            for name in names {
                println!("{}", name);
            }
        }
        None => {
            for name in session.catalog().list_databases() {
                println!("{}", name);
            }
        }
    }
    Ok(())
}
