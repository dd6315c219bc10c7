//! Report rendering
//!
//! CSV and narrative sinks for the two audit reports. All timestamps are
//! rendered in UTC; each report is preceded by a human-readable legend.

mod csv;
mod sdiff;
mod status;

pub use csv::CsvWriter;
pub use sdiff::SdiffReport;
pub use status::StatusReport;

use chrono::{DateTime, Duration, Utc};

/// Render a timestamp for report output (UTC, microsecond precision).
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn format_opt_timestamp(timestamp: &Option<DateTime<Utc>>) -> String {
    timestamp.as_ref().map(format_timestamp).unwrap_or_default()
}

/// Render an age as `[-][Nd ]HH:MM:SS.ffffff`.
///
/// Ages can go negative when a replica's clock runs ahead of the auditing
/// host; the sign is kept rather than clamped.
pub fn format_age(age: &Duration) -> String {
    let negative = *age < Duration::zero();
    let abs = if negative { -*age } else { *age };
    let days = abs.num_days();
    let hours = abs.num_hours() % 24;
    let minutes = abs.num_minutes() % 60;
    let seconds = abs.num_seconds() % 60;
    let micros = abs.num_microseconds().map(|us| us % 1_000_000).unwrap_or(0);
    let sign = if negative { "-" } else { "" };
    if days > 0 {
        format!(
            "{}{}d {:02}:{:02}:{:02}.{:06}",
            sign, days, hours, minutes, seconds, micros
        )
    } else {
        format!("{}{:02}:{:02}:{:02}.{:06}", sign, hours, minutes, seconds, micros)
    }
}
