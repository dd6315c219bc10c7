//! CLI argument definitions using clap
//!
//! Two entry points:
//! - repl-sdiff: compare entry snapshots exported from two replicas
//! - repl-status: report replication lag from a change-log dump
//!
//! The second replica's settings default to the first's, so auditing two
//! databases on one host needs only one set of flags.

use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

use crate::observability::Severity;

/// Log verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn severity(self) -> Severity {
        match self {
            LogLevel::Trace => Severity::Trace,
            LogLevel::Info => Severity::Info,
            LogLevel::Warn => Severity::Warn,
            LogLevel::Error => Severity::Error,
            LogLevel::Fatal => Severity::Fatal,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Trace => "trace",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        })
    }
}

/// Compare directory entries between two replica snapshots
#[derive(Parser, Debug)]
#[command(name = "repl-sdiff", version, about, long_about = None)]
pub struct SdiffArgs {
    /// Ordered entry snapshot exported from the first replica
    #[arg(long)]
    pub snapshot1: Option<PathBuf>,

    /// Ordered entry snapshot exported from the second replica
    #[arg(long)]
    pub snapshot2: Option<PathBuf>,

    /// Display name of the first replica (defaults to localhost)
    #[arg(long)]
    pub hostname1: Option<String>,

    /// Display name of the second replica (defaults to hostname1)
    #[arg(long)]
    pub hostname2: Option<String>,

    /// JSON profile supplying any of the above; explicit flags win
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log verbosity (defaults to error)
    #[arg(long, value_enum, default_value_t = LogLevel::Error)]
    pub log_level: LogLevel,

    /// Output CSV of differences (defaults to stdout)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Report per-consumer replication lag from a change-log dump
#[derive(Parser, Debug)]
#[command(name = "repl-status", version, about, long_about = None)]
pub struct StatusArgs {
    /// Change-log dump directory exported from the replica
    #[arg(long)]
    pub dump: Option<PathBuf>,

    /// Display name of the replica (defaults to localhost)
    #[arg(long)]
    pub hostname: Option<String>,

    /// Restrict the report to one consumer
    #[arg(long)]
    pub replica: Option<String>,

    /// Tabular CSV output instead of the narrative summary
    #[arg(long)]
    pub csv: bool,

    /// JSON profile supplying any of the above; explicit flags win
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log verbosity (defaults to error)
    #[arg(long, value_enum, default_value_t = LogLevel::Error)]
    pub log_level: LogLevel,

    /// Output destination (defaults to stdout)
    #[arg(long)]
    pub output: Option<PathBuf>,
}
