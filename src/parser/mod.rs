// PL/SQL Parser Module
//
// This module is responsible for tokenizing PL/SQL source text and parsing it
// into an abstract syntax tree (AST).

pub mod ast;
mod components;
pub mod grammar;
pub mod lexer;

// Export key types
pub use self::ast::{equal_nodes, same_token_text, AstNode, Descendants};
pub use self::components::{DEFAULT_MAX_NESTING_DEPTH, DEFAULT_STACK_BUDGET, ParseError, ParseResult, Parser};
pub use self::grammar::{GrammarRule, NodeKind};
pub use self::lexer::{tokenize, LexError, LexResult, Lexer, Token, TokenType, Trivia, TriviaKind};

