//! stratadb CLI entry point
//!
//! Minimal by design: parse arguments, dispatch to the CLI module, print
//! errors to stderr, exit non-zero on failure. All engine logic lives in
//! the library.

use stratadb::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
