//! Replication status report rendering
//!
//! Tabular (CSV) or narrative output, selected by the caller. Narrative
//! mode is the operator-facing summary; CSV is for downstream tooling.

use std::io::{self, Write};

use crate::lag::{ContextReport, ReplicationStatus};

use super::{format_age, format_opt_timestamp, format_timestamp, CsvWriter};

enum Mode {
    Csv,
    Narrative,
}

/// Renders per-context replication status.
pub struct StatusReport<W: Write> {
    csv: CsvWriter<W>,
    mode: Mode,
}

impl<W: Write> StatusReport<W> {
    pub fn csv(out: W) -> Self {
        Self {
            csv: CsvWriter::new(out),
            mode: Mode::Csv,
        }
    }

    pub fn narrative(out: W) -> Self {
        Self {
            csv: CsvWriter::new(out),
            mode: Mode::Narrative,
        }
    }

    /// Write the legend (CSV) or the report banner (narrative), then the
    /// column header when tabular.
    pub fn begin(&mut self) -> io::Result<()> {
        match self.mode {
            Mode::Csv => {
                let out = self.csv.inner_mut();
                writeln!(out, "Legend for output:")?;
                writeln!(
                    out,
                    "  context - suffix or context present in server (may or may not be replicated)."
                )?;
                writeln!(
                    out,
                    "  consumer - hostname or ip address of server data is being replicated to."
                )?;
                writeln!(
                    out,
                    "  successfulTimestamp - last successful change that was replicated."
                )?;
                writeln!(
                    out,
                    "  pendingTimestamp - last pending change that needs to be replicated."
                )?;
                writeln!(
                    out,
                    "  queueSize - number of objects pending in replication queue."
                )?;
                writeln!(out)?;
                writeln!(out, "Note: Timestamps are provided in UTC timezone.")?;
                writeln!(out)?;
                self.csv.write_record(&[
                    "context",
                    "consumer",
                    "successfulTimestamp",
                    "pendingTimestamp",
                    "queueSize",
                ])
            }
            Mode::Narrative => {
                let out = self.csv.inner_mut();
                writeln!(
                    out,
                    "Reporting last successful change / oldest pending changes for all contexts"
                )?;
                writeln!(
                    out,
                    "--------------------------------------------------------------------------"
                )
            }
        }
    }

    /// Write one context's report.
    pub fn write_context(&mut self, context: &str, report: &ContextReport) -> io::Result<()> {
        match self.mode {
            Mode::Csv => self.write_csv(report),
            Mode::Narrative => self.write_narrative(context, report),
        }
    }

    pub fn finish(&mut self) -> io::Result<()> {
        self.csv.flush()
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.csv.into_inner()
    }

    fn write_csv(&mut self, report: &ContextReport) -> io::Result<()> {
        let ContextReport::Replicated(statuses) = report else {
            // Unreplicated contexts carry no rows in tabular output.
            return Ok(());
        };
        for status in statuses {
            let queue_size = status
                .queue_size
                .map(|n| n.to_string())
                .unwrap_or_default();
            self.csv.write_record(&[
                &status.context,
                &status.consumer,
                &format_timestamp(&status.successful_timestamp),
                &format_opt_timestamp(&status.pending_timestamp),
                &queue_size,
            ])?;
        }
        Ok(())
    }

    fn write_narrative(&mut self, context: &str, report: &ContextReport) -> io::Result<()> {
        let out = self.csv.inner_mut();
        writeln!(out)?;
        writeln!(out, "{} replication status:", context)?;
        match report {
            ContextReport::NotReplicated => {
                writeln!(out, "  No replication data found.")
            }
            ContextReport::Replicated(statuses) => {
                for status in statuses {
                    write_narrative_status(out, status)?;
                }
                Ok(())
            }
        }
    }
}

fn write_narrative_status<W: Write>(out: &mut W, status: &ReplicationStatus) -> io::Result<()> {
    writeln!(
        out,
        "  {} last successful change's modifyTimestamp age is {}",
        status.consumer,
        format_age(&status.successful_age)
    )?;
    match (&status.pending_age, status.queue_size) {
        (Some(age), Some(queue_size)) => writeln!(
            out,
            "  {} oldest pending change's modifyTimestamp age is {} (queue size: {})",
            status.consumer,
            format_age(age),
            queue_size
        ),
        _ => writeln!(out, "  Congratulations! No pending replication entries found."),
    }
}
