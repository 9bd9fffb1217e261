// PL/SQL Static Analyzer
//
// Tokenizes and parses PL/SQL into an AST and runs structural checks over it.

pub mod analyzer;
pub mod checks;
pub mod common;
pub mod parser;

// Re-export key items for convenient access
pub use analyzer::{AnalysisError, Analyzer, AnalyzerConfig, SourceUnit, UnitReport};
pub use checks::{Check, CheckEngine, Issue, ScanOutcome};
pub use parser::{equal_nodes, AstNode, GrammarRule, Parser};
