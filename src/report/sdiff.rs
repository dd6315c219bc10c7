//! Divergence report rendering

use std::io::{self, Write};

use crate::compare::{DivergenceRecord, SideCounts};

use super::{format_opt_timestamp, CsvWriter};

/// CSV divergence report: legend, header, one row per divergence, totals.
pub struct SdiffReport<W: Write> {
    csv: CsvWriter<W>,
}

impl<W: Write> SdiffReport<W> {
    pub fn new(out: W) -> Self {
        Self {
            csv: CsvWriter::new(out),
        }
    }

    /// Write the legend explaining status codes, then the column header.
    pub fn begin(&mut self, hostname1: &str, hostname2: &str) -> io::Result<()> {
        let out = self.csv.inner_mut();
        writeln!(out, "Legend for output:")?;
        writeln!(
            out,
            "  dn - distinguished name of the object that is out of sync or missing."
        )?;
        writeln!(
            out,
            "  modifyTimestamp1 - dn's object last modified on server: {}.",
            hostname1
        )?;
        writeln!(
            out,
            "  modifyTimestamp2 - dn's object last modified on server: {}.",
            hostname2
        )?;
        writeln!(out, "  status - the following are what the values mean:")?;
        writeln!(
            out,
            "    1: Object detected in both servers but modify timestamps are different indicating mis-match."
        )?;
        writeln!(
            out,
            "    2: Object found in {} but missing in {}.",
            hostname1, hostname2
        )?;
        writeln!(
            out,
            "    3: Object found in {} but missing in {}.",
            hostname2, hostname1
        )?;
        writeln!(
            out,
            "    #: Detecting truncation of DN, further comparison of object recommended."
        )?;
        writeln!(
            out,
            "    *: Detecting Modify Timestamp more recent than when this audit started,"
        )?;
        writeln!(
            out,
            "       further comparison of object recommended (replication may fix mis-match)."
        )?;
        writeln!(out)?;
        writeln!(out, "Note: Timestamps are provided in UTC timezone.")?;
        writeln!(out)?;
        self.csv
            .write_record(&["dn", "modifyTimestamp1", "modifyTimestamp2", "status"])
    }

    /// Write one divergence row.
    pub fn write_divergence(&mut self, record: &DivergenceRecord) -> io::Result<()> {
        self.csv.write_record(&[
            &record.dn,
            &format_opt_timestamp(&record.timestamp1),
            &format_opt_timestamp(&record.timestamp2),
            &record.status_code(),
        ])
    }

    /// Write the per-side totals after the table.
    pub fn finish(
        &mut self,
        hostname1: &str,
        hostname2: &str,
        counts: SideCounts,
    ) -> io::Result<()> {
        let out = self.csv.inner_mut();
        writeln!(out)?;
        writeln!(out, "Total Entries in {}: {}", hostname1, counts.side1)?;
        writeln!(out, "Total Entries in {}: {}", hostname2, counts.side2)?;
        self.csv.flush()
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.csv.into_inner()
    }
}
