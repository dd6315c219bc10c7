//! # Source Errors
//!
//! Error types for the data-source boundary.
//!
//! Classification is structural, never based on matching vendor message
//! text: an adapter that can tell "table missing" apart from other query
//! failures must surface `TableMissing`, which the lag aggregator absorbs
//! as "no replication configured for this context".

use thiserror::Error;

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors surfaced by data-source adapters
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Could not reach or open the underlying source (connection-class)
    #[error("Connection to {side} failed: {detail}")]
    Connection { side: String, detail: String },

    /// The source was reachable but a read failed (query-class)
    #[error("Query failed: {detail}")]
    Query { detail: String },

    /// A per-context change-log table does not exist (structural absence)
    #[error("Change-log table {table} does not exist")]
    TableMissing { table: String },

    /// A required source produced no rows at all
    #[error("No rows returned for {side} server")]
    NoRows { side: String },

    /// A row was read but could not be interpreted
    #[error("Malformed row: {detail}")]
    Malformed { detail: String },
}

impl SourceError {
    /// True for connection-class failures (vs query-class).
    pub fn is_connection(&self) -> bool {
        matches!(self, SourceError::Connection { .. })
    }

    /// True for the soft structural-absence condition the aggregator
    /// absorbs instead of propagating.
    pub fn is_table_missing(&self) -> bool {
        matches!(self, SourceError::TableMissing { .. })
    }
}
