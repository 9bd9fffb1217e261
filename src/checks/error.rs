// Check Error Types
//
// Errors raised by a check while it inspects a node. They never abort the
// traversal: the engine disables the failing check for the rest of the unit
// and records a diagnostic.

use thiserror::Error;

use crate::parser::NodeKind;

/// Check runtime errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckError {
    #[error("{node} at line {line} has no {expected} child")]
    MissingChild {
        node: NodeKind,
        expected: &'static str,
        line: usize,
    },

    #[error("{0}")]
    Failed(String),

    #[error("check panicked: {0}")]
    Panicked(String),
}

/// Result type for check callbacks
pub type CheckResult<T> = Result<T, CheckError>;
