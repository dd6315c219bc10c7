//! CLI command implementations
//!
//! Wires arguments and profiles to the audit components: resolves
//! settings (flag, then profile, then default), opens the sources and the
//! output destination, and drives the comparator or aggregator to
//! completion. Soft conditions never reach this layer; any error returned
//! here aborts the run without a partial report being trusted.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;

use crate::compare::Comparator;
use crate::lag::Aggregator;
use crate::observability::DiagnosticSink;
use crate::report::{SdiffReport, StatusReport};
use crate::source::file::{FileChangeLogSource, FileEntryStream};
use crate::source::ChangeLogSource;

use super::args::{SdiffArgs, StatusArgs};
use super::config::Profile;
use super::errors::{CliError, CliResult};

const DEFAULT_HOSTNAME: &str = "localhost";

fn open_output(path: Option<&Path>) -> CliResult<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                CliError::io_error(format!("cannot create {}: {}", path.display(), e))
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

fn require_path(
    flag: Option<PathBuf>,
    profile_value: Option<PathBuf>,
    name: &str,
) -> CliResult<PathBuf> {
    flag.or(profile_value).ok_or_else(|| {
        CliError::config_error(format!("{} is required (flag or profile)", name))
    })
}

/// Run the snapshot divergence comparison.
pub fn run_sdiff(args: SdiffArgs) -> CliResult<()> {
    let started = Instant::now();
    let sink = DiagnosticSink::new(args.log_level.severity());
    let profile = Profile::load_optional(args.config.as_deref())?;

    let snapshot1 = require_path(args.snapshot1, profile.snapshot1, "--snapshot1")?;
    let snapshot2 = require_path(args.snapshot2, profile.snapshot2, "--snapshot2")?;
    let hostname1 = args
        .hostname1
        .or(profile.hostname1)
        .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string());
    let hostname2 = args
        .hostname2
        .or(profile.hostname2)
        .unwrap_or_else(|| hostname1.clone());

    sink.info(
        "SDIFF_START",
        &[("hostname1", &hostname1), ("hostname2", &hostname2)],
    );

    let stream1 = FileEntryStream::open(&snapshot1, &hostname1)?;
    let stream2 = FileEntryStream::open(&snapshot2, &hostname2)?;

    let mut report = SdiffReport::new(open_output(args.output.as_deref())?);
    report.begin(&hostname1, &hostname2)?;

    let mut comparator = Comparator::new(&hostname1, stream1, &hostname2, stream2)?;
    let mut divergences: u64 = 0;
    for item in comparator.by_ref() {
        let record = item?;
        if sink.enabled(crate::observability::Severity::Trace) {
            sink.trace(
                "DIVERGENCE",
                &[("dn", &record.dn), ("status", &record.status_code())],
            );
        }
        report.write_divergence(&record)?;
        divergences += 1;
    }
    let counts = comparator.counts();
    report.finish(&hostname1, &hostname2, counts)?;

    sink.info(
        "SDIFF_COMPLETE",
        &[
            ("divergences", &divergences.to_string()),
            ("entries1", &counts.side1.to_string()),
            ("entries2", &counts.side2.to_string()),
            ("elapsed_ms", &started.elapsed().as_millis().to_string()),
        ],
    );
    Ok(())
}

/// Run the replication lag report.
pub fn run_status(args: StatusArgs) -> CliResult<()> {
    let started = Instant::now();
    let sink = DiagnosticSink::new(args.log_level.severity());
    let profile = Profile::load_optional(args.config.as_deref())?;

    let dump = require_path(args.dump, profile.dump, "--dump")?;
    let hostname = args
        .hostname
        .or(profile.hostname)
        .unwrap_or_else(|| DEFAULT_HOSTNAME.to_string());

    sink.info("STATUS_START", &[("hostname", &hostname)]);

    let mut source = FileChangeLogSource::open(&dump, &hostname)?;
    let contexts = source.contexts()?;

    let out = open_output(args.output.as_deref())?;
    let mut report = if args.csv {
        StatusReport::csv(out)
    } else {
        StatusReport::narrative(out)
    };
    report.begin()?;

    let mut aggregator =
        Aggregator::new(&mut source, &sink, Utc::now()).with_consumer_filter(args.replica);
    for context in &contexts {
        let context_report = aggregator.report_context(context)?;
        report.write_context(&context.dn, &context_report)?;
    }
    report.finish()?;

    sink.info(
        "STATUS_COMPLETE",
        &[
            ("contexts", &contexts.len().to_string()),
            ("elapsed_ms", &started.elapsed().as_millis().to_string()),
        ],
    );
    Ok(())
}
