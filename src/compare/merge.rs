//! Two-pointer merge over ordered entry snapshots
//!
//! Both cursors advance in lockstep with classification; nothing is read
//! ahead speculatively, so the pulled counts correspond one-for-one with
//! records consumed. The merge is lazy, finite, and non-restartable.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::source::{EntryRecord, EntryStream, SourceError, SourceResult};

use super::{DivergenceFlags, DivergenceRecord, DivergenceStatus, SideCounts};

#[derive(Debug)]
struct Cursor<S> {
    stream: S,
    label: String,
    current: Option<EntryRecord>,
    last_key: Option<String>,
    pulled: u64,
}

impl<S: EntryStream> Cursor<S> {
    fn new(stream: S, label: &str) -> Self {
        Self {
            stream,
            label: label.to_string(),
            current: None,
            last_key: None,
            pulled: 0,
        }
    }

    fn advance(&mut self) -> SourceResult<()> {
        let next = self.stream.next_entry()?;
        if let Some(record) = &next {
            self.pulled += 1;
            if let Some(last) = &self.last_key {
                if record.truncation_key < *last {
                    return Err(SourceError::Malformed {
                        detail: format!(
                            "{}: records out of order at '{}'",
                            self.label, record.truncation_key
                        ),
                    });
                }
            }
            self.last_key = Some(record.truncation_key.clone());
        }
        self.current = next;
        Ok(())
    }
}

/// Lazy merge comparator over two ordered entry snapshots.
///
/// Construction pulls the first record from each side and fails with
/// `SourceError::NoRows` naming the empty side; a source that dries up
/// mid-stream is graceful exhaustion and handled by draining the other
/// side. Iterate to exhaustion, then read [`Comparator::counts`].
#[derive(Debug)]
pub struct Comparator<A, B> {
    side1: Cursor<A>,
    side2: Cursor<B>,
    started_at: DateTime<Utc>,
    failed: bool,
}

impl<A: EntryStream, B: EntryStream> Comparator<A, B> {
    /// Open the merge; captures the wall-clock reference for the
    /// future-timestamp flag once, here.
    pub fn new(label1: &str, stream1: A, label2: &str, stream2: B) -> SourceResult<Self> {
        let started_at = Utc::now();
        let mut side1 = Cursor::new(stream1, label1);
        let mut side2 = Cursor::new(stream2, label2);
        side1.advance()?;
        if side1.current.is_none() {
            return Err(SourceError::NoRows {
                side: side1.label.clone(),
            });
        }
        side2.advance()?;
        if side2.current.is_none() {
            return Err(SourceError::NoRows {
                side: side2.label.clone(),
            });
        }
        Ok(Self {
            side1,
            side2,
            started_at,
            failed: false,
        })
    }

    /// Records pulled from each side so far.
    pub fn counts(&self) -> SideCounts {
        SideCounts {
            side1: self.side1.pulled,
            side2: self.side2.pulled,
        }
    }

    /// Wall-clock reference captured at construction.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    fn is_future(&self, timestamp: Option<DateTime<Utc>>) -> bool {
        timestamp.is_some_and(|ts| ts > self.started_at)
    }

    fn one_sided(&self, record: &EntryRecord, status: DivergenceStatus) -> DivergenceRecord {
        let flags = DivergenceFlags {
            truncated: record.dn != record.truncation_key,
            dn_mismatch: false,
            future_timestamp: self.is_future(record.modify_timestamp),
        };
        let (timestamp1, timestamp2) = match status {
            DivergenceStatus::MissingInSecond => (record.modify_timestamp, None),
            _ => (None, record.modify_timestamp),
        };
        DivergenceRecord {
            dn: record.dn.clone(),
            timestamp1,
            timestamp2,
            status,
            flags,
        }
    }

    fn mismatch(&self, first: &EntryRecord, second: &EntryRecord) -> DivergenceRecord {
        DivergenceRecord {
            dn: first.dn.clone(),
            timestamp1: first.modify_timestamp,
            timestamp2: second.modify_timestamp,
            status: DivergenceStatus::Mismatch,
            flags: DivergenceFlags {
                truncated: first.dn != first.truncation_key || second.dn != second.truncation_key,
                dn_mismatch: first.dn != second.dn,
                future_timestamp: self.is_future(first.modify_timestamp)
                    || self.is_future(second.modify_timestamp),
            },
        }
    }

    fn step(&mut self) -> SourceResult<Option<DivergenceRecord>> {
        loop {
            match (self.side1.current.take(), self.side2.current.take()) {
                (None, None) => return Ok(None),
                (Some(first), None) => {
                    self.side1.advance()?;
                    return Ok(Some(self.one_sided(&first, DivergenceStatus::MissingInSecond)));
                }
                (None, Some(second)) => {
                    self.side2.advance()?;
                    return Ok(Some(self.one_sided(&second, DivergenceStatus::MissingInFirst)));
                }
                (Some(first), Some(second)) => {
                    match first.truncation_key.cmp(&second.truncation_key) {
                        Ordering::Equal => {
                            let emitted = (first.modify_timestamp != second.modify_timestamp)
                                .then(|| self.mismatch(&first, &second));
                            self.side1.advance()?;
                            self.side2.advance()?;
                            match emitted {
                                Some(record) => return Ok(Some(record)),
                                None => continue,
                            }
                        }
                        Ordering::Less => {
                            self.side2.current = Some(second);
                            self.side1.advance()?;
                            return Ok(Some(
                                self.one_sided(&first, DivergenceStatus::MissingInSecond),
                            ));
                        }
                        Ordering::Greater => {
                            self.side1.current = Some(first);
                            self.side2.advance()?;
                            return Ok(Some(
                                self.one_sided(&second, DivergenceStatus::MissingInFirst),
                            ));
                        }
                    }
                }
            }
        }
    }
}

impl<A: EntryStream, B: EntryStream> Iterator for Comparator<A, B> {
    type Item = SourceResult<DivergenceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.step() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::MemoryEntryStream;
    use chrono::TimeZone;

    fn ts(secs: i64) -> Option<DateTime<Utc>> {
        Some(Utc.timestamp_opt(1_680_000_000 + secs, 0).unwrap())
    }

    fn run(
        a: Vec<(&str, &str, Option<DateTime<Utc>>)>,
        b: Vec<(&str, &str, Option<DateTime<Utc>>)>,
    ) -> (Vec<DivergenceRecord>, SideCounts) {
        let mut comparator = Comparator::new(
            "ldap1",
            MemoryEntryStream::from_tuples(a),
            "ldap2",
            MemoryEntryStream::from_tuples(b),
        )
        .unwrap();
        let records: Vec<_> = (&mut comparator).map(|r| r.unwrap()).collect();
        (records, comparator.counts())
    }

    #[test]
    fn test_identical_match_emits_nothing() {
        let (records, counts) = run(
            vec![("cn=a", "cn=a", ts(0))],
            vec![("cn=a", "cn=a", ts(0))],
        );
        assert!(records.is_empty());
        assert_eq!(counts, SideCounts { side1: 1, side2: 1 });
    }

    #[test]
    fn test_timestamp_mismatch_advances_both_sides() {
        let (records, counts) = run(
            vec![("cn=a", "cn=a", ts(0)), ("cn=b", "cn=b", ts(0))],
            vec![("cn=a", "cn=a", ts(5)), ("cn=b", "cn=b", ts(0))],
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, DivergenceStatus::Mismatch);
        assert_eq!(records[0].dn, "cn=a");
        assert_eq!(counts, SideCounts { side1: 2, side2: 2 });
    }

    #[test]
    fn test_present_vs_null_timestamp_is_mismatch() {
        let (records, _) = run(
            vec![("cn=a", "cn=a", ts(0))],
            vec![("cn=a", "cn=a", None)],
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, DivergenceStatus::Mismatch);
        assert_eq!(records[0].timestamp1, ts(0));
        assert_eq!(records[0].timestamp2, None);
    }

    #[test]
    fn test_drain_reports_each_leftover_record() {
        let (records, counts) = run(
            vec![
                ("cn=a", "cn=a", ts(0)),
                ("cn=b", "cn=b", ts(1)),
                ("cn=c", "cn=c", ts(2)),
            ],
            vec![("cn=a", "cn=a", ts(0))],
        );
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].dn, "cn=b");
        assert_eq!(records[1].dn, "cn=c");
        assert!(records
            .iter()
            .all(|r| r.status == DivergenceStatus::MissingInSecond));
        assert_eq!(counts, SideCounts { side1: 3, side2: 1 });
    }

    #[test]
    fn test_empty_side_fails_fast_naming_it() {
        let err = Comparator::new(
            "ldap1",
            MemoryEntryStream::from_tuples(vec![("cn=a", "cn=a", None)]),
            "ldap2",
            MemoryEntryStream::from_tuples(vec![]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SourceError::NoRows {
                side: "ldap2".to_string()
            }
        );
    }

    #[test]
    fn test_dn_mismatch_flag_on_matched_keys() {
        let (records, _) = run(
            vec![("cn=a,o=x", "cn=a", ts(0))],
            vec![("cn=a,o=y", "cn=a", ts(1))],
        );
        assert_eq!(records.len(), 1);
        assert!(records[0].flags.dn_mismatch);
        assert!(records[0].flags.truncated);
        assert_eq!(records[0].status_code(), "1#");
    }

    #[test]
    fn test_future_timestamp_flagged() {
        let future = Some(Utc::now() + chrono::Duration::hours(1));
        let (records, _) = run(
            vec![("cn=a", "cn=a", future)],
            vec![("cn=b", "cn=b", ts(0))],
        );
        let row_a = records.iter().find(|r| r.dn == "cn=a").unwrap();
        assert!(row_a.flags.future_timestamp);
        assert_eq!(row_a.status_code(), "2*");
    }

    #[test]
    fn test_out_of_order_stream_fails() {
        let mut comparator = Comparator::new(
            "ldap1",
            MemoryEntryStream::from_tuples(vec![
                ("cn=b", "cn=b", None),
                ("cn=a", "cn=a", None),
            ]),
            "ldap2",
            MemoryEntryStream::from_tuples(vec![("cn=a", "cn=a", None)]),
        )
        .unwrap();
        let result: Result<Vec<_>, _> = comparator.by_ref().collect();
        assert!(matches!(result, Err(SourceError::Malformed { .. })));
        // A failed merge is fused.
        assert!(comparator.next().is_none());
    }
}
