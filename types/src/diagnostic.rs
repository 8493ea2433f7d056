//! The diagnostic model reported by the analysis server.

use std::path::{Path, PathBuf};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Convert from the wire representation (`"ERROR"`, `"WARNING"`, `"INFO"`).
    ///
    /// Returns `None` for values outside the protocol-defined set.
    /// Callers (boundary code) decide the fallback policy.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "ERROR" => Some(Self::Error),
            "WARNING" => Some(Self::Warning),
            "INFO" => Some(Self::Info),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_error(self) -> bool {
        self == Self::Error
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// Where in a source file a diagnostic applies.
///
/// Line and column are 1-indexed, as the server reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    file: PathBuf,
    offset: u32,
    length: u32,
    line: u32,
    column: u32,
}

impl SourceLocation {
    #[must_use]
    pub fn new(file: PathBuf, offset: u32, length: u32, line: u32, column: u32) -> Self {
        Self {
            file,
            offset,
            length,
            line,
            column,
        }
    }

    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[must_use]
    pub fn length(&self) -> u32 {
        self.length
    }

    /// 1-indexed line number.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-indexed column.
    #[must_use]
    pub fn column(&self) -> u32 {
        self.column
    }
}

/// A single diagnostic from the analysis server.
///
/// Fields are private; construction goes through [`Diagnostic::new`] and
/// external consumers read via accessors.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    /// Server-assigned category (e.g. `"COMPILE_TIME_ERROR"`, `"HINT"`).
    kind: String,
    message: String,
    location: SourceLocation,
}

impl Diagnostic {
    #[must_use]
    pub fn new(severity: Severity, kind: String, message: String, location: SourceLocation) -> Self {
        Self {
            severity,
            kind,
            message,
            location,
        }
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Format as `path:line:col: severity: message`.
    #[must_use]
    pub fn display(&self) -> String {
        format!(
            "{}:{}:{}: {}: {}",
            self.location.file().display(),
            self.location.line(),
            self.location.column(),
            self.severity.label(),
            self.message,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wire_known_values() {
        assert_eq!(Severity::from_wire("ERROR"), Some(Severity::Error));
        assert_eq!(Severity::from_wire("WARNING"), Some(Severity::Warning));
        assert_eq!(Severity::from_wire("INFO"), Some(Severity::Info));
    }

    #[test]
    fn test_from_wire_unknown_returns_none() {
        assert_eq!(Severity::from_wire(""), None);
        assert_eq!(Severity::from_wire("error"), None);
        assert_eq!(Severity::from_wire("FATAL"), None);
    }

    #[test]
    fn test_is_error() {
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
        assert!(!Severity::Info.is_error());
    }

    #[test]
    fn test_display_format() {
        let diag = Diagnostic::new(
            Severity::Error,
            "COMPILE_TIME_ERROR".to_string(),
            "expected ';'".to_string(),
            SourceLocation::new(PathBuf::from("lib/main.dart"), 120, 1, 11, 6),
        );
        assert_eq!(diag.display(), "lib/main.dart:11:6: error: expected ';'");
    }
}
