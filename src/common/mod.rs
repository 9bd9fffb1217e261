// Common definitions shared by the lexer, parser and check engine

pub mod types;

pub use types::{Position, Span};
