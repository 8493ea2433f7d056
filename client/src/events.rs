//! Events delivered to the embedding editor layer.
//!
//! One bounded channel carries every notification sink: the consumer
//! matches on the kind. Diagnostics arrive already converted to the
//! domain model; the other payloads are the decoded wire types.

use std::path::PathBuf;

use anser_types::Diagnostic;

use crate::protocol::{AnalysisNavigationParams, CompletionResultsParams, SearchResultsParams};

/// An unsolicited server message routed to the editor layer.
#[derive(Debug)]
pub enum AnalysisEvent {
    /// Diagnostics updated for one file. An empty `items` means the
    /// server cleared that file's diagnostics.
    Diagnostics {
        file: PathBuf,
        items: Vec<Diagnostic>,
    },
    /// Navigation regions for a file.
    Navigation(AnalysisNavigationParams),
    /// Completion suggestions for an in-flight completion request.
    Completions(CompletionResultsParams),
    /// Results for a top-level-declarations search, keyed by search id.
    SearchResults(SearchResultsParams),
    /// Free-form server status text for the status bar.
    Status { message: String },
    /// The server process went away.
    ServerStopped { reason: StopReason },
}

/// Why the server stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    Exited,
    Failed(String),
}
