//! Per-context lag aggregation over a change-log source

use chrono::{DateTime, Utc};

use crate::control::{decode_modify_timestamp, extract_control_b64};
use crate::observability::DiagnosticSink;
use crate::source::{ChangeLogSource, ChangeOffset, ReplicationContext, SourceError, SourceResult};

use super::{consumer_id, ChangeRecord, ContextReport, ReplicationStatus};

/// Aggregates replication status one context at a time.
///
/// Soft conditions (missing change-log table, rows without a control
/// marker or timestamp field) are absorbed here and logged through the
/// sink; anything else propagates and aborts the run.
pub struct Aggregator<'a> {
    source: &'a mut dyn ChangeLogSource,
    sink: &'a DiagnosticSink,
    now: DateTime<Utc>,
    consumer_filter: Option<String>,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        source: &'a mut dyn ChangeLogSource,
        sink: &'a DiagnosticSink,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            source,
            sink,
            now,
            consumer_filter: None,
        }
    }

    /// Restrict the report to one consumer.
    pub fn with_consumer_filter(mut self, consumer: Option<String>) -> Self {
        self.consumer_filter = consumer;
        self
    }

    /// Produce the replication status of every consumer of `context`.
    pub fn report_context(&mut self, context: &ReplicationContext) -> SourceResult<ContextReport> {
        let successful = match self.collect(context, ChangeOffset::LastSuccessful) {
            Ok(records) => records,
            Err(SourceError::TableMissing { table }) => {
                self.sink.info(
                    "CHANGELOG_TABLE_MISSING",
                    &[("context", &context.dn), ("table", &table)],
                );
                return Ok(ContextReport::NotReplicated);
            }
            Err(e) => return Err(e),
        };
        if successful.is_empty() {
            self.sink
                .info("CONTEXT_NOT_REPLICATED", &[("context", &context.dn)]);
            return Ok(ContextReport::NotReplicated);
        }

        let max_change_id = self.source.max_change_id(context)?;
        let pending = match self.collect(context, ChangeOffset::OldestPending) {
            Ok(records) => records,
            Err(SourceError::TableMissing { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };

        let statuses = successful
            .into_iter()
            .map(|record| {
                let matched = pending
                    .iter()
                    .find(|candidate| candidate.consumer_id == record.consumer_id);
                ReplicationStatus {
                    context: context.dn.clone(),
                    consumer: record.consumer_id,
                    successful_timestamp: record.modify_timestamp,
                    successful_age: record.age,
                    pending_timestamp: matched.map(|p| p.modify_timestamp),
                    pending_age: matched.map(|p| p.age),
                    queue_size: matched.map(|p| max_change_id - p.last_change_id),
                }
            })
            .collect();
        Ok(ContextReport::Replicated(statuses))
    }

    fn collect(
        &mut self,
        context: &ReplicationContext,
        offset: ChangeOffset,
    ) -> SourceResult<Vec<ChangeRecord>> {
        let rows = self.source.changes(context, offset)?;
        let mut records = Vec::new();
        for row in rows {
            let Some(consumer) = consumer_id(&row.subject_dn) else {
                self.sink.warn(
                    "BAD_CONSUMER_DN",
                    &[("context", &context.dn), ("dn", &row.subject_dn)],
                );
                continue;
            };
            if let Some(filter) = &self.consumer_filter {
                if consumer != filter {
                    self.sink.trace("CONSUMER_SKIPPED", &[("consumer", consumer)]);
                    continue;
                }
            }
            let Some(b64) = extract_control_b64(&row.control_text) else {
                self.sink.info(
                    "ROW_WITHOUT_CONTROL",
                    &[("context", &context.dn), ("consumer", consumer)],
                );
                continue;
            };
            let decoded = decode_modify_timestamp(&b64).map_err(|e| SourceError::Malformed {
                detail: format!("control value for consumer {}: {}", consumer, e),
            })?;
            let Some(modify_timestamp) = decoded else {
                self.sink.info(
                    "CONTROL_WITHOUT_TIMESTAMP",
                    &[("context", &context.dn), ("consumer", consumer)],
                );
                continue;
            };
            records.push(ChangeRecord {
                consumer_id: consumer.to_string(),
                modify_timestamp,
                age: self.now - modify_timestamp,
                last_change_id: row.last_change_id,
            });
        }
        Ok(records)
    }
}
