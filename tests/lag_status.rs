//! Lag Aggregator Tests
//!
//! Queue-depth arithmetic, the empty-queue and not-replicated cases, and
//! the rendered status reports in both output modes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{TimeZone, Utc};

use replaudit::control::CONTROL_MARKER;
use replaudit::lag::{Aggregator, ContextReport};
use replaudit::observability::{DiagnosticSink, Severity};
use replaudit::report::StatusReport;
use replaudit::source::memory::MemoryChangeLog;
use replaudit::source::{ChangeLogRow, ReplicationContext};

// =============================================================================
// Fixtures
// =============================================================================

fn control_text(stamp: &str) -> String {
    fn octet_string(content: &[u8]) -> Vec<u8> {
        let mut out = vec![0x04, content.len() as u8];
        out.extend_from_slice(content);
        out
    }
    fn constructed(tag: u8, children: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = children.iter().flatten().copied().collect();
        let mut out = vec![tag, body.len() as u8];
        out.extend_from_slice(&body);
        out
    }
    let root = constructed(
        0x30,
        &[constructed(
            0x30,
            &[
                octet_string(b"modifyTimestamp"),
                constructed(0x31, &[octet_string(stamp.as_bytes())]),
            ],
        )],
    );
    format!("{}{}", CONTROL_MARKER, STANDARD.encode(root))
}

fn row(consumer: &str, change_id: i64, stamp: &str) -> ChangeLogRow {
    ChangeLogRow {
        subject_dn: format!("cn={},ibm-replicaGroup=default,o=example", consumer),
        control_text: control_text(stamp),
        last_change_id: change_id,
    }
}

fn context() -> ReplicationContext {
    ReplicationContext {
        eid: 100,
        dn: "o=example".to_string(),
    }
}

fn sink() -> DiagnosticSink {
    DiagnosticSink::new(Severity::Fatal)
}

// =============================================================================
// Aggregation scenarios
// =============================================================================

/// maxChangeId 100 against a pending entry at 97 queues 3 changes.
#[test]
fn test_queue_size_arithmetic() {
    let mut log = MemoryChangeLog::new();
    log.add_context(
        context(),
        100,
        vec![row("replica2", 95, "20230401100000.000000Z")],
        vec![row("replica2", 97, "20230401100500.000000Z")],
    );
    let sink = sink();
    let mut aggregator = Aggregator::new(&mut log, &sink, Utc::now());
    let ContextReport::Replicated(statuses) = aggregator.report_context(&context()).unwrap()
    else {
        panic!("expected replicated context");
    };
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].consumer, "replica2");
    assert_eq!(statuses[0].queue_size, Some(3));
}

/// A consumer without a pending entry reports a null queue.
#[test]
fn test_no_pending_entries_reports_null_queue() {
    let mut log = MemoryChangeLog::new();
    log.add_context(
        context(),
        100,
        vec![row("replica2", 100, "20230401100000.000000Z")],
        vec![row("replica3", 98, "20230401100500.000000Z")],
    );
    let sink = sink();
    let mut aggregator = Aggregator::new(&mut log, &sink, Utc::now());
    let ContextReport::Replicated(statuses) = aggregator.report_context(&context()).unwrap()
    else {
        panic!("expected replicated context");
    };
    let replica2 = statuses.iter().find(|s| s.consumer == "replica2").unwrap();
    assert_eq!(replica2.queue_size, None);
    assert_eq!(replica2.pending_timestamp, None);
}

/// No successful entries at all means the context is not replicated.
#[test]
fn test_context_without_successful_entries() {
    let mut log = MemoryChangeLog::new();
    log.add_context(context(), 10, vec![], vec![]);
    let sink = sink();
    let mut aggregator = Aggregator::new(&mut log, &sink, Utc::now());
    assert_eq!(
        aggregator.report_context(&context()).unwrap(),
        ContextReport::NotReplicated
    );
}

/// A missing change-log table is absorbed, not propagated.
#[test]
fn test_missing_table_absorbed() {
    let mut log = MemoryChangeLog::new();
    log.add_missing_context(context());
    let sink = sink();
    let mut aggregator = Aggregator::new(&mut log, &sink, Utc::now());
    assert_eq!(
        aggregator.report_context(&context()).unwrap(),
        ContextReport::NotReplicated
    );
}

/// Ages are measured against the aggregation run's reference time.
#[test]
fn test_age_relative_to_run_start() {
    let now = Utc.with_ymd_and_hms(2023, 4, 1, 11, 0, 0).unwrap();
    let mut log = MemoryChangeLog::new();
    log.add_context(
        context(),
        50,
        vec![row("replica2", 50, "20230401100000.000000Z")],
        vec![],
    );
    let sink = sink();
    let mut aggregator = Aggregator::new(&mut log, &sink, now);
    let ContextReport::Replicated(statuses) = aggregator.report_context(&context()).unwrap()
    else {
        panic!("expected replicated context");
    };
    assert_eq!(statuses[0].successful_age, chrono::Duration::hours(1));
}

// =============================================================================
// Rendered reports
// =============================================================================

fn reports() -> Vec<(String, ContextReport)> {
    let mut log = MemoryChangeLog::new();
    log.add_context(
        context(),
        100,
        vec![row("replica2", 95, "20230401100000.000000Z")],
        vec![row("replica2", 97, "20230401100500.000000Z")],
    );
    let other = ReplicationContext {
        eid: 200,
        dn: "o=unreplicated".to_string(),
    };
    log.add_missing_context(other.clone());

    let sink = sink();
    let now = Utc.with_ymd_and_hms(2023, 4, 1, 11, 0, 0).unwrap();
    let mut aggregator = Aggregator::new(&mut log, &sink, now);
    [context(), other]
        .into_iter()
        .map(|ctx| {
            let report = aggregator.report_context(&ctx).unwrap();
            (ctx.dn, report)
        })
        .collect()
}

#[test]
fn test_csv_report_rows() {
    let mut report = StatusReport::csv(Vec::new());
    report.begin().unwrap();
    for (dn, context_report) in reports() {
        report.write_context(&dn, &context_report).unwrap();
    }
    report.finish().unwrap();
    let text = String::from_utf8(report.into_inner()).unwrap();

    assert!(text.contains("Legend for output:"));
    assert!(text.contains("context,consumer,successfulTimestamp,pendingTimestamp,queueSize\n"));
    assert!(text.contains(
        "o=example,replica2,2023-04-01 10:00:00.000000,2023-04-01 10:05:00.000000,3\n"
    ));
    assert!(!text.contains("o=unreplicated"));
}

#[test]
fn test_narrative_report() {
    let mut report = StatusReport::narrative(Vec::new());
    report.begin().unwrap();
    for (dn, context_report) in reports() {
        report.write_context(&dn, &context_report).unwrap();
    }
    report.finish().unwrap();
    let text = String::from_utf8(report.into_inner()).unwrap();

    assert!(text.contains("o=example replication status:"));
    assert!(text.contains("replica2 last successful change's modifyTimestamp age is 01:00:00.000000"));
    assert!(text.contains("(queue size: 3)"));
    assert!(text.contains("o=unreplicated replication status:"));
    assert!(text.contains("  No replication data found."));
}
