//! repl-sdiff entry point
//!
//! This is a minimal entrypoint that:
//! 1. Parses CLI arguments
//! 2. Dispatches to cli::run_sdiff
//! 3. Prints errors to stderr
//! 4. Exits with non-zero on failure

use clap::Parser;

use replaudit::cli::{self, SdiffArgs};

fn main() {
    let args = SdiffArgs::parse();
    if let Err(e) = cli::run_sdiff(args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
