//! In-memory source implementations
//!
//! Vec-backed implementations of the source traits. Used throughout the
//! test suites and useful for wiring the audit algorithms to any caller
//! that already has records in hand.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::{DateTime, Utc};

use super::{
    ChangeLogRow, ChangeLogSource, ChangeOffset, EntryRecord, EntryStream, ReplicationContext,
    SourceError, SourceResult,
};

/// An `EntryStream` over a pre-built record list.
#[derive(Debug, Clone)]
pub struct MemoryEntryStream {
    records: VecDeque<EntryRecord>,
}

impl MemoryEntryStream {
    /// Wrap an already-ordered record list.
    pub fn new(records: Vec<EntryRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Convenience constructor from `(dn, truncation_key, timestamp)` tuples.
    pub fn from_tuples(tuples: Vec<(&str, &str, Option<DateTime<Utc>>)>) -> Self {
        Self::new(
            tuples
                .into_iter()
                .map(|(dn, key, ts)| EntryRecord {
                    dn: dn.to_string(),
                    truncation_key: key.to_string(),
                    modify_timestamp: ts,
                })
                .collect(),
        )
    }
}

impl EntryStream for MemoryEntryStream {
    fn next_entry(&mut self) -> SourceResult<Option<EntryRecord>> {
        Ok(self.records.pop_front())
    }
}

/// A `ChangeLogSource` over pre-built per-context row sets.
#[derive(Debug, Clone, Default)]
pub struct MemoryChangeLog {
    contexts: Vec<ReplicationContext>,
    successful: BTreeMap<i64, Vec<ChangeLogRow>>,
    pending: BTreeMap<i64, Vec<ChangeLogRow>>,
    max_ids: BTreeMap<i64, i64>,
    missing_tables: BTreeSet<i64>,
}

impl MemoryChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a context with its change-log contents.
    pub fn add_context(
        &mut self,
        context: ReplicationContext,
        max_change_id: i64,
        successful: Vec<ChangeLogRow>,
        pending: Vec<ChangeLogRow>,
    ) {
        self.successful.insert(context.eid, successful);
        self.pending.insert(context.eid, pending);
        self.max_ids.insert(context.eid, max_change_id);
        self.contexts.push(context);
    }

    /// Register a context whose change-log table does not exist.
    pub fn add_missing_context(&mut self, context: ReplicationContext) {
        self.missing_tables.insert(context.eid);
        self.contexts.push(context);
    }
}

impl ChangeLogSource for MemoryChangeLog {
    fn contexts(&mut self) -> SourceResult<Vec<ReplicationContext>> {
        Ok(self.contexts.clone())
    }

    fn changes(
        &mut self,
        context: &ReplicationContext,
        offset: ChangeOffset,
    ) -> SourceResult<Vec<ChangeLogRow>> {
        if self.missing_tables.contains(&context.eid) {
            return Err(SourceError::TableMissing {
                table: context.table_name(),
            });
        }
        let rows = match offset {
            ChangeOffset::LastSuccessful => self.successful.get(&context.eid),
            ChangeOffset::OldestPending => self.pending.get(&context.eid),
        };
        Ok(rows.cloned().unwrap_or_default())
    }

    fn max_change_id(&mut self, context: &ReplicationContext) -> SourceResult<i64> {
        if self.missing_tables.contains(&context.eid) {
            return Err(SourceError::TableMissing {
                table: context.table_name(),
            });
        }
        Ok(self.max_ids.get(&context.eid).copied().unwrap_or(0))
    }
}
