//! Observability for stratadb
//!
//! Structured logging only:
//! - one JSON object per line, one line per event
//! - deterministic key ordering (event, severity, then fields alphabetically)
//! - synchronous, unbuffered writes
//! - read-only: logging never influences execution

mod logger;

pub use logger::{Logger, Severity};
