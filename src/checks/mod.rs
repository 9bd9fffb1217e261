// Check Module
//
// The check engine, the issue model and the built-in checks.

pub mod check;
pub mod comparison_with_null;
pub mod engine;
pub mod error;
pub mod identical_expression;
pub mod issue;

pub use check::{Check, CheckContext, CheckMetadata, CheckRegistration, IssueBuilder};
pub use comparison_with_null::ComparisonWithNullCheck;
pub use engine::{CheckEngine, ScanOutcome};
pub use error::{CheckError, CheckResult};
pub use identical_expression::IdenticalExpressionCheck;
pub use issue::{CheckDiagnostic, Issue, IssueLocation, Severity};

/// The built-in checks, in registration order
pub fn all_checks() -> Vec<Box<dyn Check>> {
    vec![
        Box::new(IdenticalExpressionCheck),
        Box::new(ComparisonWithNullCheck),
    ]
}
