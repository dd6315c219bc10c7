//! Command-line layer
//!
//! Argument parsing, connection profiles, and the drivers behind the two
//! audit binaries. The core algorithms never inspect anything defined
//! here.

pub mod args;
pub mod commands;
pub mod config;
pub mod errors;

pub use args::{LogLevel, SdiffArgs, StatusArgs};
pub use commands::{run_sdiff, run_status};
pub use config::Profile;
pub use errors::{CliError, CliErrorCode, CliResult};
