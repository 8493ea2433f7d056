//! Root-set manager — the project directories registered with the server.
//!
//! The set only grows for the lifetime of one client session; roots are
//! never removed. Registration is idempotent: two paths resolving to the
//! same candidate root produce exactly one "set roots" call.

use std::path::{Path, PathBuf};

/// The ordered collection of analysis roots, partitioned into included
/// and excluded directories.
pub(crate) struct RootSet {
    included: Vec<PathBuf>,
    excluded: Vec<PathBuf>,
}

impl RootSet {
    pub fn new(excluded: Vec<PathBuf>) -> Self {
        Self {
            included: Vec::new(),
            excluded,
        }
    }

    /// Resolve `path` to the root directory it belongs to.
    ///
    /// Searches upward for a project-manifest file named in `markers`;
    /// the manifest's directory wins. Without a manifest the path itself
    /// is the candidate (its parent if it is a file). Empty paths have
    /// no candidate.
    pub fn candidate_for(path: &Path, markers: &[String]) -> Option<PathBuf> {
        if path.as_os_str().is_empty() {
            return None;
        }

        let start = if path.is_file() { path.parent()? } else { path };

        for dir in start.ancestors() {
            for marker in markers {
                if dir.join(marker).is_file() {
                    return Some(dir.to_path_buf());
                }
            }
        }
        Some(start.to_path_buf())
    }

    /// Add the root `path` resolves to.
    ///
    /// Returns whether the set changed; a "set roots" call with the full
    /// included list is due exactly when it did. Already-registered
    /// candidates (and paths with no candidate) change nothing.
    pub fn add(&mut self, path: &Path, markers: &[String]) -> bool {
        let Some(candidate) = Self::candidate_for(path, markers) else {
            return false;
        };
        if self.included.contains(&candidate) {
            tracing::debug!(root = %candidate.display(), "root already known");
            return false;
        }
        tracing::debug!(root = %candidate.display(), "adding analysis root");
        self.included.push(candidate);
        true
    }

    pub fn included(&self) -> &[PathBuf] {
        &self.included
    }

    pub fn excluded(&self) -> &[PathBuf] {
        &self.excluded
    }
}
