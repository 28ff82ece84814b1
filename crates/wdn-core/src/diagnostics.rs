//! Validation and diagnostic reporting.
//!
//! Importers and validators push issues into a [`Diagnostics`] collection
//! instead of aborting on first error; callers decide whether errors are
//! fatal (they are for malformed topology) while warnings are reported and
//! carried along.

use serde::Serialize;

/// Severity of a diagnostic issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// A single diagnostic finding with a category tag (e.g. "structure",
/// "geometry", "parse") and a human-readable message.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticIssue {
    pub severity: Severity,
    pub category: String,
    pub message: String,
}

/// Accumulates diagnostics across a validation or import pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    issues: Vec<DiagnosticIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, category: &str, message: &str) {
        self.issues.push(DiagnosticIssue {
            severity: Severity::Warning,
            category: category.to_string(),
            message: message.to_string(),
        });
    }

    pub fn add_error(&mut self, category: &str, message: &str) {
        self.issues.push(DiagnosticIssue {
            severity: Severity::Error,
            category: category.to_string(),
            message: message.to_string(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
    }

    pub fn issues(&self) -> &[DiagnosticIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} error(s), {} warning(s)",
            self.errors().count(),
            self.warnings().count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_errors() {
        let diag = Diagnostics::new();
        assert!(!diag.has_errors());
        assert!(diag.is_empty());
    }

    #[test]
    fn test_error_and_warning_separation() {
        let mut diag = Diagnostics::new();
        diag.add_warning("parse", "unknown section [FOO]");
        diag.add_error("structure", "pipe 'P9' references missing node 'X'");

        assert!(diag.has_errors());
        assert_eq!(diag.errors().count(), 1);
        assert_eq!(diag.warnings().count(), 1);
        assert_eq!(diag.summary(), "1 error(s), 1 warning(s)");
    }
}
