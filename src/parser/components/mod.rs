// PL/SQL Parser Components
//
// This module contains the separate components of the parser.
// Each component handles one area of the grammar.

// Core parser component
pub mod parser_core;
pub mod parser_expressions;
pub mod parser_statements;
pub mod parser_declarations;
pub mod parser_dml;

// Re-export frequently used items
pub use parser_core::{DEFAULT_MAX_NESTING_DEPTH, DEFAULT_STACK_BUDGET, ParseError, ParseResult, Parser};
