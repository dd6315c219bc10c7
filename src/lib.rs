//! replaudit - replication health auditing for directory-service replicas
//!
//! Two independent audit paths share this crate:
//! - snapshot divergence: two ordered entry snapshots are merged and every
//!   non-identical pair is classified (`compare`);
//! - replication lag: change-log rows are decoded through their embedded
//!   BER control values and joined into per-consumer lag and queue-depth
//!   statistics (`control`, `lag`).
//!
//! Everything else is plumbing around those two algorithms: typed source
//! adapters (`source`), report rendering (`report`), diagnostics
//! (`observability`), and the CLI layer (`cli`).

pub mod cli;
pub mod compare;
pub mod control;
pub mod lag;
pub mod observability;
pub mod report;
pub mod source;
