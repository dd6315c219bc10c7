//! CLI-specific error types
//!
//! Everything surfaced here is fatal for the run; soft conditions are
//! absorbed inside the audit components and never reach this layer.

use std::fmt;
use std::io;

use crate::source::SourceError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file or argument error
    ConfigError,
    /// I/O error on the output destination
    IoError,
    /// Could not reach or open a data source
    ConnectionError,
    /// A data source was reachable but reading from it failed
    QueryError,
    /// A required source produced no data
    NoData,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "REPL_CLI_CONFIG_ERROR",
            Self::IoError => "REPL_CLI_IO_ERROR",
            Self::ConnectionError => "REPL_CLI_CONNECTION_ERROR",
            Self::QueryError => "REPL_CLI_QUERY_ERROR",
            Self::NoData => "REPL_CLI_NO_DATA",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// The error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<SourceError> for CliError {
    fn from(e: SourceError) -> Self {
        let code = match &e {
            SourceError::Connection { .. } => CliErrorCode::ConnectionError,
            SourceError::NoRows { .. } => CliErrorCode::NoData,
            SourceError::Query { .. }
            | SourceError::TableMissing { .. }
            | SourceError::Malformed { .. } => CliErrorCode::QueryError,
        };
        Self::new(code, e.to_string())
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
