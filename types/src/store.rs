//! Diagnostics store — accumulates per-file diagnostics from the server.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::diagnostic::{Diagnostic, Severity};

/// Per-file diagnostics keyed by the file named in each `analysis.errors`
/// notification.
///
/// Clearing is always keyed by that file, never by which document currently
/// has UI focus: an empty list removes exactly the entry for that file.
#[derive(Debug, Default)]
pub struct DiagnosticsStore {
    data: HashMap<PathBuf, Vec<Diagnostic>>,
}

impl DiagnosticsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the diagnostics for `file`. An empty `items` clears the entry.
    pub fn update(&mut self, file: PathBuf, items: Vec<Diagnostic>) {
        if items.is_empty() {
            self.data.remove(&file);
        } else {
            self.data.insert(file, items);
        }
    }

    /// Immutable snapshot suitable for UI rendering.
    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let mut files: Vec<(PathBuf, Vec<Diagnostic>)> = self
            .data
            .iter()
            .map(|(file, items)| (file.clone(), items.clone()))
            .collect();

        // Sort: files with errors first, then alphabetically
        files.sort_by(|a, b| {
            let a_has_errors = a.1.iter().any(|d| d.severity().is_error());
            let b_has_errors = b.1.iter().any(|d| d.severity().is_error());
            b_has_errors.cmp(&a_has_errors).then_with(|| a.0.cmp(&b.0))
        });

        DiagnosticsSnapshot { files }
    }
}

/// Immutable snapshot of all diagnostics.
///
/// Counts are computed from the canonical source (`files`), so there is no
/// cached count to keep in sync.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsSnapshot {
    /// Per-file diagnostics, sorted with error-containing files first.
    files: Vec<(PathBuf, Vec<Diagnostic>)>,
}

impl DiagnosticsSnapshot {
    #[must_use]
    pub fn files(&self) -> &[(PathBuf, Vec<Diagnostic>)] {
        &self.files
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn count_by_severity(&self, severity: Severity) -> usize {
        self.files
            .iter()
            .flat_map(|(_, items)| items)
            .filter(|d| d.severity() == severity)
            .count()
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count_by_severity(Severity::Error)
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.count_by_severity(Severity::Warning)
    }

    /// Total diagnostic count across all files.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.files.iter().map(|(_, items)| items.len()).sum()
    }

    /// Format a compact status string like "E:3 W:5".
    #[must_use]
    pub fn status_string(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        format!("E:{} W:{}", self.error_count(), self.warning_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::SourceLocation;

    fn make_diag(severity: Severity, msg: &str, line: u32) -> Diagnostic {
        Diagnostic::new(
            severity,
            "TEST".to_string(),
            msg.to_string(),
            SourceLocation::new(PathBuf::from("x.dart"), 0, 1, line, 1),
        )
    }

    #[test]
    fn test_empty_snapshot() {
        let store = DiagnosticsStore::new();
        let snap = store.snapshot();
        assert!(snap.is_empty());
        assert_eq!(snap.error_count(), 0);
        assert_eq!(snap.warning_count(), 0);
        assert_eq!(snap.status_string(), "");
    }

    #[test]
    fn test_update_and_snapshot() {
        let mut store = DiagnosticsStore::new();
        let file = PathBuf::from("lib/main.dart");
        store.update(
            file.clone(),
            vec![
                make_diag(Severity::Error, "expected ';'", 10),
                make_diag(Severity::Warning, "unused import", 1),
            ],
        );

        let snap = store.snapshot();
        assert_eq!(snap.error_count(), 1);
        assert_eq!(snap.warning_count(), 1);
        assert_eq!(snap.files().len(), 1);
        assert_eq!(snap.files()[0].0, file);
    }

    #[test]
    fn test_empty_update_clears_only_that_file() {
        let mut store = DiagnosticsStore::new();
        store.update(
            PathBuf::from("a.dart"),
            vec![make_diag(Severity::Error, "err", 1)],
        );
        store.update(
            PathBuf::from("b.dart"),
            vec![make_diag(Severity::Warning, "warn", 1)],
        );

        store.update(PathBuf::from("a.dart"), vec![]);

        let snap = store.snapshot();
        assert_eq!(snap.files().len(), 1);
        assert_eq!(snap.files()[0].0, PathBuf::from("b.dart"));
    }

    #[test]
    fn test_errors_first_sorting() {
        let mut store = DiagnosticsStore::new();
        store.update(
            PathBuf::from("b.dart"),
            vec![make_diag(Severity::Warning, "warn", 1)],
        );
        store.update(
            PathBuf::from("a.dart"),
            vec![make_diag(Severity::Error, "err", 1)],
        );
        store.update(
            PathBuf::from("c.dart"),
            vec![make_diag(Severity::Error, "err", 1)],
        );

        let snap = store.snapshot();
        assert_eq!(snap.files()[0].0, PathBuf::from("a.dart"));
        assert_eq!(snap.files()[1].0, PathBuf::from("c.dart"));
        assert_eq!(snap.files()[2].0, PathBuf::from("b.dart"));
    }

    #[test]
    fn test_replace_overwrites_previous() {
        let mut store = DiagnosticsStore::new();
        let file = PathBuf::from("main.dart");
        store.update(
            file.clone(),
            vec![
                make_diag(Severity::Error, "err1", 1),
                make_diag(Severity::Error, "err2", 2),
            ],
        );
        assert_eq!(store.snapshot().error_count(), 2);

        store.update(file, vec![make_diag(Severity::Error, "err1", 1)]);
        assert_eq!(store.snapshot().error_count(), 1);
    }

    #[test]
    fn test_status_string_counts() {
        let mut store = DiagnosticsStore::new();
        store.update(
            PathBuf::from("a.dart"),
            vec![
                make_diag(Severity::Error, "e", 1),
                make_diag(Severity::Warning, "w", 2),
                make_diag(Severity::Warning, "w2", 3),
            ],
        );
        assert_eq!(store.snapshot().status_string(), "E:1 W:2");
    }
}
