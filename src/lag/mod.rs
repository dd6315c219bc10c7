//! Replication lag aggregation
//!
//! Joins each consumer's last successful change against its oldest pending
//! change for one replication context, deriving per-consumer lag and queue
//! depth from change-identifier arithmetic.

mod aggregator;

pub use aggregator::Aggregator;

use chrono::{DateTime, Duration, Utc};

/// One successfully decoded change-log row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    /// Consumer the change belongs to (first RDN value of the agreement dn).
    pub consumer_id: String,
    /// Modification time recovered from the control value.
    pub modify_timestamp: DateTime<Utc>,
    /// Age of the change relative to the aggregation run's start.
    pub age: Duration,
    /// Change identifier the row was selected at.
    pub last_change_id: i64,
}

/// Replication status of one (context, consumer) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationStatus {
    pub context: String,
    pub consumer: String,
    /// Timestamp of the last successfully replicated change.
    pub successful_timestamp: DateTime<Utc>,
    /// Age of that change at aggregation time.
    pub successful_age: Duration,
    /// Timestamp of the oldest pending change; `None` when the queue is
    /// empty for this consumer.
    pub pending_timestamp: Option<DateTime<Utc>>,
    /// Age of the oldest pending change.
    pub pending_age: Option<Duration>,
    /// Changes still queued for this consumer.
    pub queue_size: Option<i64>,
}

/// Aggregation outcome for one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextReport {
    /// Per-consumer statuses for a replicated context.
    Replicated(Vec<ReplicationStatus>),
    /// No successful changes found; the context is not replicated (or its
    /// change-log table does not exist).
    NotReplicated,
}

/// Derive the consumer identifier from a replication-agreement dn: the
/// value of its first relative-name component.
///
/// `None` when the dn has no `name=value` leading component.
pub fn consumer_id(subject_dn: &str) -> Option<&str> {
    let first_rdn = subject_dn.split(',').next()?;
    let (_, value) = first_rdn.split_once('=')?;
    Some(value)
}
