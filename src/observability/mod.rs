//! Diagnostics for the audit tools
//!
//! One structured JSON line per event, written synchronously to stderr so
//! that reports own stdout. There is no process-global logger: the CLI
//! layer builds a [`DiagnosticSink`] once at startup and hands it to each
//! component that emits diagnostics.

mod logger;

pub use logger::{DiagnosticSink, Severity};
