//! stratadb - an embedded, single-process JSON data engine
//!
//! Two storage models share one query pipeline:
//! - schemaless document collections, partitioned across size-capped JSON files
//! - relational tables (one flat file each) with primary-key, unique, and
//!   foreign-key constraints
//!
//! Queries are written in a small textual language (GET / FROM / FILTER /
//! GROUP / SORT / LIMIT) and compiled into filter, aggregation, external-sort,
//! and projection stages. Stages stream records through line-delimited
//! temporary files, so a collection never has to fit in memory: sorting is an
//! external merge sort over per-partition runs, and grouped aggregation runs
//! as per-partition partials merged into a final result.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod observability;
pub mod query;
pub mod session;
pub mod storage;

pub use config::Config;
pub use error::{StrataError, StrataResult};
pub use session::Session;
