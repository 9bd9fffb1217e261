// Issue Model
//
// Records handed to the host: issues found by checks and diagnostics about
// checks that failed at runtime.

use std::fmt;

use serde::Serialize;

use crate::common::types::Span;

/// Default severity of a check, passed through into its issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    Blocker,
    Critical,
    Major,
    Minor,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Severity::Blocker => "BLOCKER",
            Severity::Critical => "CRITICAL",
            Severity::Major => "MAJOR",
            Severity::Minor => "MINOR",
            Severity::Info => "INFO",
        };
        f.pad(name)
    }
}

/// A source range an issue points at, optionally with its own message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueLocation {
    pub span: Span,
    pub message: Option<String>,
}

impl IssueLocation {
    pub fn new(span: Span, message: Option<String>) -> Self {
        IssueLocation { span, message }
    }

    pub fn line(&self) -> usize {
        self.span.start.line
    }

    pub fn column(&self) -> usize {
        self.span.start.column
    }
}

/// A defect reported by a check.
///
/// Locations are relative to the analyzed unit; the file an issue belongs to
/// is the `name` of the [`UnitReport`](crate::analyzer::UnitReport) holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub check_key: &'static str,
    pub severity: Severity,
    /// Classification tags of the check, e.g. "bug"
    pub tags: &'static [&'static str],
    pub message: String,
    pub primary: IssueLocation,
    /// Supporting locations, in the order the check attached them
    pub secondary: Vec<IssueLocation>,
    /// Fixed remediation cost of the check, e.g. "2min"
    pub remediation: &'static str,
}

/// A check failed while inspecting a node and was disabled for the rest of
/// the unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckDiagnostic {
    pub check_key: &'static str,
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for CheckDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "check {} failed at line {}, column {}: {}",
            self.check_key, self.line, self.column, self.message
        )
    }
}
