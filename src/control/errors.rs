//! # Control Errors
//!
//! Error types for control-value decoding. Field absence is not an error
//! anywhere in this module; these cover genuinely undecodable input.

use thiserror::Error;

/// Result type for control decoding
pub type ControlResult<T> = Result<T, ControlError>;

/// Control-value decoding errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControlError {
    /// The base64 wrapper could not be decoded
    #[error("Invalid base64 in control value: {0}")]
    Base64(String),

    /// The binary encoding is not well-formed
    #[error("Malformed control encoding: {0}")]
    Malformed(String),

    /// The timestamp field was present but not in the expected format
    #[error("Bad timestamp '{text}' in control value")]
    BadTimestamp { text: String },
}
