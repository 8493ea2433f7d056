//! Domain types for the anser analysis-server client.
//!
//! This crate contains pure domain types with no IO and no async: the
//! diagnostic model reported by the analysis server, the per-file
//! diagnostics store an editor frontend reads from, and the client
//! configuration. Everything here can be used from any layer.

mod config;
mod diagnostic;
mod store;

pub use config::AnalyzerConfig;
pub use diagnostic::{Diagnostic, Severity, SourceLocation};
pub use store::{DiagnosticsSnapshot, DiagnosticsStore};
