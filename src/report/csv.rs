//! Minimal CSV writing
//!
//! Distinguished names routinely contain commas, so every field goes
//! through RFC 4180 quoting: fields containing a comma, quote, or newline
//! are wrapped in double quotes with embedded quotes doubled.

use std::io::{self, Write};

/// Line-at-a-time CSV writer.
pub struct CsvWriter<W: Write> {
    out: W,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write one record.
    pub fn write_record(&mut self, fields: &[&str]) -> io::Result<()> {
        let mut line = String::new();
        for (idx, field) in fields.iter().enumerate() {
            if idx > 0 {
                line.push(',');
            }
            push_field(&mut line, field);
        }
        line.push('\n');
        self.out.write_all(line.as_bytes())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Borrow the underlying writer, for free-text lines around a table.
    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

fn push_field(line: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        line.push('"');
        for c in field.chars() {
            if c == '"' {
                line.push('"');
            }
            line.push(c);
        }
        line.push('"');
    } else {
        line.push_str(field);
    }
}
