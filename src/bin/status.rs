//! repl-status entry point
//!
//! This is a minimal entrypoint that:
//! 1. Parses CLI arguments
//! 2. Dispatches to cli::run_status
//! 3. Prints errors to stderr
//! 4. Exits with non-zero on failure

use clap::Parser;

use replaudit::cli::{self, StatusArgs};

fn main() {
    let args = StatusArgs::parse();
    if let Err(e) = cli::run_status(args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
