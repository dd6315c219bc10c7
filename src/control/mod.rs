//! Control-value decoding
//!
//! Change-log rows carry replication metadata as a base64-wrapped BER
//! structure behind a fixed marker inside the row's text payload. This
//! module extracts the wrapped value, decodes it, and recovers the
//! `modifyTimestamp` attribute the lag aggregator needs.
//!
//! Absence at every level (no marker in the payload, no timestamp field in
//! the tree) is a normal outcome, not an error.

pub mod ber;
mod errors;

pub use ber::{find_field, parse, BerNode};
pub use errors::{ControlError, ControlResult};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Marker preceding the base64 control value in a change-log payload.
pub const CONTROL_MARKER: &str = "control: 1.3.18.0.2.10.19 false:: ";

/// Field holding the change's modification time.
pub const TIMESTAMP_FIELD: &[u8] = b"modifyTimestamp";

/// Wire format of the timestamp field's textual value (UTC, trailing `Z`).
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%.fZ";

/// Extract the base64 control value from a change-log text payload.
///
/// Takes everything after the first marker occurrence and joins LDIF line
/// continuations. `None` when the payload carries no marker, meaning the
/// row has no decodable change.
pub fn extract_control_b64(text: &str) -> Option<String> {
    let (_, rest) = text.split_once(CONTROL_MARKER)?;
    Some(rest.replace("\n ", ""))
}

/// Parse the timestamp field's textual value.
pub fn parse_control_timestamp(text: &str) -> ControlResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| ControlError::BadTimestamp {
            text: text.to_string(),
        })
}

/// Decode a base64 control value and recover its `modifyTimestamp`.
///
/// `Ok(None)` when the decoded tree carries no timestamp field.
pub fn decode_modify_timestamp(b64: &str) -> ControlResult<Option<DateTime<Utc>>> {
    let raw = STANDARD
        .decode(b64.trim())
        .map_err(|e| ControlError::Base64(e.to_string()))?;
    let tree = parse(&raw)?;
    match find_field(&tree, TIMESTAMP_FIELD) {
        Some(text) => parse_control_timestamp(&text).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_takes_remainder_after_marker() {
        let text = format!("replicaLastChangeId: 12\n{}QUJD", CONTROL_MARKER);
        assert_eq!(extract_control_b64(&text), Some("QUJD".to_string()));
    }

    #[test]
    fn test_extract_joins_line_continuations() {
        let text = format!("{}QUJD\n RUZH", CONTROL_MARKER);
        assert_eq!(extract_control_b64(&text), Some("QUJDRUZH".to_string()));
    }

    #[test]
    fn test_extract_without_marker_is_none() {
        assert_eq!(extract_control_b64("no control in this row"), None);
    }

    #[test]
    fn test_parse_control_timestamp_with_fraction() {
        let ts = parse_control_timestamp("20230401102030.123456Z").unwrap();
        assert_eq!(ts.to_string(), "2023-04-01 10:20:30.123456 UTC");
    }

    #[test]
    fn test_parse_control_timestamp_rejects_garbage() {
        let err = parse_control_timestamp("yesterday").unwrap_err();
        assert_eq!(
            err,
            ControlError::BadTimestamp {
                text: "yesterday".to_string()
            }
        );
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let err = decode_modify_timestamp("!!!not base64!!!").unwrap_err();
        assert!(matches!(err, ControlError::Base64(_)));
    }
}
