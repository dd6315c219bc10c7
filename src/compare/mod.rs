//! Snapshot divergence detection
//!
//! Merges two ordered entry snapshots and classifies every non-identical
//! pair. The comparison key is the truncation key; the dn is what gets
//! reported. Identical matches (same key, same timestamp) emit nothing.

mod merge;

pub use merge::Comparator;

use chrono::{DateTime, Utc};

/// Classification of one divergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergenceStatus {
    /// Entry present on both sides with differing modify timestamps.
    Mismatch,
    /// Entry present on the first replica only.
    MissingInSecond,
    /// Entry present on the second replica only.
    MissingInFirst,
}

impl DivergenceStatus {
    /// Status code as reported to users.
    pub fn code(&self) -> &'static str {
        match self {
            DivergenceStatus::Mismatch => "1",
            DivergenceStatus::MissingInSecond => "2",
            DivergenceStatus::MissingInFirst => "3",
        }
    }
}

/// Advisory flags attached to a divergence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DivergenceFlags {
    /// A dn involved differs from its truncation key.
    pub truncated: bool,
    /// Truncation keys matched but the full dns differ.
    pub dn_mismatch: bool,
    /// A modify timestamp is later than the comparator's start time,
    /// suggesting a change still propagating.
    pub future_timestamp: bool,
}

impl DivergenceFlags {
    /// Suffix appended to the status code: `#` for truncation or dn
    /// mismatch, `*` for a future timestamp.
    pub fn suffix(&self) -> &'static str {
        match (self.truncated || self.dn_mismatch, self.future_timestamp) {
            (true, true) => "#*",
            (true, false) => "#",
            (false, true) => "*",
            (false, false) => "",
        }
    }
}

/// One reported divergence between the two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivergenceRecord {
    /// Distinguished name of the diverging entry.
    pub dn: String,
    /// Modify timestamp on the first replica, when present there.
    pub timestamp1: Option<DateTime<Utc>>,
    /// Modify timestamp on the second replica, when present there.
    pub timestamp2: Option<DateTime<Utc>>,
    /// Divergence classification.
    pub status: DivergenceStatus,
    /// Advisory flags.
    pub flags: DivergenceFlags,
}

impl DivergenceRecord {
    /// Status column value: code plus flag suffix, e.g. `2#*`.
    pub fn status_code(&self) -> String {
        format!("{}{}", self.status.code(), self.flags.suffix())
    }
}

/// Records pulled from each side over a full merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideCounts {
    pub side1: u64,
    pub side2: u64,
}
