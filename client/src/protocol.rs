//! Wire message types for the analysis-server protocol.
//!
//! Outbound: `{"id": <token>, "method": <string>, "params": {...}}`.
//! Inbound: `{"id": <token>, "result": {...}}` for responses and
//! `{"event": <string>, "params": {...}}` for notifications.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use anser_types::{Diagnostic, Severity, SourceLocation};

/// A pending outbound protocol call.
#[derive(Debug, Serialize)]
pub(crate) struct Request {
    pub id: String,
    pub method: &'static str,
    pub params: serde_json::Value,
}

impl Request {
    pub fn new(id: String, method: &'static str, params: serde_json::Value) -> Self {
        Self { id, method, params }
    }

    pub fn into_value(self) -> serde_json::Value {
        // Serialization of a Value-bearing struct cannot fail.
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// An edit-overlay description for one file in a "content update" call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentChange {
    /// Use `content` instead of the filesystem contents for this file.
    Add { content: String },
    /// Drop the overlay and fall back to the filesystem contents.
    Remove,
}

pub(crate) fn set_analysis_roots(
    token: String,
    included: &[PathBuf],
    excluded: &[PathBuf],
) -> Request {
    Request::new(
        token,
        "analysis.setAnalysisRoots",
        serde_json::json!({
            "included": included,
            "excluded": excluded,
        }),
    )
}

pub(crate) fn update_content(token: String, files: HashMap<String, ContentChange>) -> Request {
    Request::new(
        token,
        "analysis.updateContent",
        serde_json::json!({ "files": files }),
    )
}

pub(crate) fn find_top_level_declarations(token: String, pattern: &str) -> Request {
    Request::new(
        token,
        "search.findTopLevelDeclarations",
        serde_json::json!({ "pattern": pattern }),
    )
}

pub(crate) fn server_get_version(token: String) -> Request {
    Request::new(token, "server.getVersion", serde_json::json!({}))
}

/// The closed set of notification events the client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Errors,
    Navigation,
    Completions,
    SearchResults,
    Status,
}

impl NotificationKind {
    #[must_use]
    pub fn from_event(event: &str) -> Option<Self> {
        match event {
            "analysis.errors" => Some(Self::Errors),
            "analysis.navigation" => Some(Self::Navigation),
            "completion.results" => Some(Self::Completions),
            "search.results" => Some(Self::SearchResults),
            "server.status" => Some(Self::Status),
            _ => None,
        }
    }
}

/// `analysis.errors` notification payload.
#[derive(Debug, Deserialize)]
pub struct AnalysisErrorsParams {
    pub file: PathBuf,
    pub errors: Vec<WireError>,
}

/// One error as the server reports it.
#[derive(Debug, Deserialize)]
pub struct WireError {
    pub severity: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: WireLocation,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLocation {
    pub file: PathBuf,
    pub offset: u32,
    pub length: u32,
    pub start_line: u32,
    pub start_column: u32,
}

impl WireError {
    /// Convert to the domain diagnostic. Unknown severities degrade to
    /// warnings rather than dropping the diagnostic.
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(
            Severity::from_wire(&self.severity).unwrap_or(Severity::Warning),
            self.kind.clone(),
            self.message.clone(),
            SourceLocation::new(
                self.location.file.clone(),
                self.location.offset,
                self.location.length,
                self.location.start_line,
                self.location.start_column,
            ),
        )
    }
}

/// `analysis.navigation` notification payload.
#[derive(Debug, Deserialize)]
pub struct AnalysisNavigationParams {
    pub file: PathBuf,
    pub regions: Vec<NavigationRegion>,
}

#[derive(Debug, Deserialize)]
pub struct NavigationRegion {
    pub offset: u32,
    pub length: u32,
}

/// `completion.results` notification payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResultsParams {
    pub id: String,
    pub replacement_offset: u32,
    pub replacement_length: u32,
    pub results: Vec<CompletionSuggestion>,
    pub is_last: bool,
}

#[derive(Debug, Deserialize)]
pub struct CompletionSuggestion {
    pub completion: String,
    #[serde(default)]
    pub kind: Option<String>,
}

/// `search.results` notification payload. The `id` is the token the
/// server assigned to the search, which may differ from the token the
/// request was issued under after a reassignment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultsParams {
    pub id: String,
    pub results: Vec<SearchResult>,
    pub is_last: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchResult {
    pub location: WireLocation,
}

/// `server.status` notification payload.
#[derive(Debug, Deserialize)]
pub struct ServerStatusParams {
    pub status: StatusMessage,
}

#[derive(Debug, Deserialize)]
pub struct StatusMessage {
    pub message: String,
}
