//! Data-source boundary
//!
//! The audit algorithms consume typed records through the traits defined
//! here; they never see untyped row tuples. Adapters own the underlying
//! handles (snapshot files today, a database cursor in principle) and are
//! responsible for releasing them on every exit path — the core receives
//! iteration contracts, not resource handles.

mod errors;
pub mod file;
pub mod memory;

pub use errors::{SourceError, SourceResult};

use chrono::{DateTime, Utc};

/// One directory entry as reported by a replica snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    /// Distinguished name reported to users.
    pub dn: String,
    /// Possibly-shortened form of `dn` used for ordering and equality.
    pub truncation_key: String,
    /// Last modification time, when the snapshot carries one (UTC).
    pub modify_timestamp: Option<DateTime<Utc>>,
}

/// Pull-based stream of entries in non-decreasing `truncation_key` order.
///
/// Ordering is a precondition on the adapter: both replicas must export
/// under the same collation. The comparator verifies monotonicity within
/// each stream but cannot reconcile collation differences between streams.
pub trait EntryStream {
    /// Pull the next record; `Ok(None)` signals end of sequence.
    fn next_entry(&mut self) -> SourceResult<Option<EntryRecord>>;
}

/// A replication context (replicated suffix) present in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationContext {
    /// Entry id of the context root, names the change-log table.
    pub eid: i64,
    /// Suffix DN of the context.
    pub dn: String,
}

impl ReplicationContext {
    /// Name of the per-context change-log table.
    pub fn table_name(&self) -> String {
        format!("REPLCHG{}", self.eid)
    }
}

/// Which change-log row to read per consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOffset {
    /// Most recent successfully replicated change (offset 0).
    LastSuccessful,
    /// Oldest change still pending replication (offset 1).
    OldestPending,
}

impl ChangeOffset {
    /// Numeric offset added to each consumer's last-change cursor.
    pub fn as_i64(self) -> i64 {
        match self {
            ChangeOffset::LastSuccessful => 0,
            ChangeOffset::OldestPending => 1,
        }
    }
}

/// Raw change-log row, before control decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLogRow {
    /// DN of the replication-agreement entry; its first RDN value
    /// identifies the consumer.
    pub subject_dn: String,
    /// Text payload that may embed a base64 control value.
    pub control_text: String,
    /// Change identifier the row was selected at.
    pub last_change_id: i64,
}

/// Read access to one replica's per-context change logs.
pub trait ChangeLogSource {
    /// All replication contexts present in the directory.
    fn contexts(&mut self) -> SourceResult<Vec<ReplicationContext>>;

    /// Change-log rows for a context at the given per-consumer offset.
    ///
    /// Returns `SourceError::TableMissing` when the context has no
    /// change-log table at all.
    fn changes(
        &mut self,
        context: &ReplicationContext,
        offset: ChangeOffset,
    ) -> SourceResult<Vec<ChangeLogRow>>;

    /// Highest change identifier recorded for the context.
    fn max_change_id(&mut self, context: &ReplicationContext) -> SourceResult<i64>;
}
