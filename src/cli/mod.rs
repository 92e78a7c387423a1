//! CLI for stratadb
//!
//! Thin layer over the library:
//! - init: create the data directory layout and an empty catalog
//! - query: compile and run one query, printing rows as JSON lines
//! - insert: insert a record (or array of records) into a collection
//! - list: show databases, or the collections of one database

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
