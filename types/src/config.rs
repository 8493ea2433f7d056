//! Client configuration, deserialized by the embedding editor layer.

use std::path::PathBuf;

use serde::Deserialize;

fn default_root_markers() -> Vec<String> {
    vec!["pubspec.yaml".to_string()]
}

/// Configuration for one analysis-server instance.
///
/// The embedder hands this to the client already parsed; the client never
/// reads settings storage itself.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Server executable: a bare name resolved on `PATH`, or a full path.
    pub executable: String,
    /// Arguments passed before the `--sdk=` flag (e.g. the path to an
    /// analysis snapshot when `executable` is a VM).
    #[serde(default)]
    pub args: Vec<String>,
    /// SDK root directory. Passed as `--sdk=<path>` and used as the
    /// child's working directory for the spawn.
    pub sdk_path: PathBuf,
    /// Files that mark a project root (e.g. `["pubspec.yaml"]`).
    #[serde(default = "default_root_markers")]
    pub root_markers: Vec<String>,
    /// Directories excluded from every "set analysis roots" call.
    #[serde(default)]
    pub excluded_roots: Vec<PathBuf>,
}
