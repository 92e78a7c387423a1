//! CLI argument definitions using clap
//!
//! Commands:
//! - stratadb init --config <path>
//! - stratadb query --config <path> --database <db> <query>
//! - stratadb insert --config <path> --database <db> --collection <name> <json>
//! - stratadb list --config <path> [--database <db>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// stratadb - an embedded JSON data engine with a pipelined query language
#[derive(Parser, Debug)]
#[command(name = "stratadb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize the data directory for a configuration
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./stratadb.json")]
        config: PathBuf,
    },

    /// Execute one query and print result rows as JSON lines
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./stratadb.json")]
        config: PathBuf,

        /// Database to run against
        #[arg(long)]
        database: String,

        /// Query text, e.g. "GET player, age FROM players FILTER age > 30"
        query: String,
    },

    /// Insert a JSON record (or array of records) into a collection,
    /// creating the database and collection when missing
    Insert {
        /// Path to configuration file
        #[arg(long, default_value = "./stratadb.json")]
        config: PathBuf,

        /// Target database
        #[arg(long)]
        database: String,

        /// Target collection
        #[arg(long)]
        collection: String,

        /// Record as a JSON object, or an array of objects
        record: String,
    },

    /// List databases, or the collections of one database
    List {
        /// Path to configuration file
        #[arg(long, default_value = "./stratadb.json")]
        config: PathBuf,

        /// Database whose collections to list
        #[arg(long)]
        database: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
