// PL/SQL Lexer Implementation
//
// This module implements a lexer that breaks PL/SQL source text into tokens.
// Whitespace and comments are kept as trivia attached to the following token,
// so the token stream covers the whole input.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::Serialize;
use thiserror::Error;

use crate::common::types::{Position, Span};

/// PL/SQL token types
///
/// Only reserved words get their own variant. Non-reserved keywords such as
/// `NOWAIT` or `REVERSE` are lexed as identifiers and matched by the grammar
/// as literal words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    // Reserved words
    ALL,
    AND,
    AS,
    BEGIN,
    BETWEEN,
    BY,
    COMMIT,
    DECLARE,
    DEFAULT,
    DELETE,
    DISTINCT,
    ELSE,
    ELSIF,
    END,
    EXCEPTION,
    EXIT,
    FALSE,
    FOR,
    FROM,
    GROUP,
    IF,
    IN,
    INSERT,
    INTO,
    IS,
    LIKE,
    LOOP,
    NOT,
    NULL,
    OF,
    OR,
    ORDER,
    RETURN,
    ROLLBACK,
    SELECT,
    SET,
    THEN,
    TRUE,
    UPDATE,
    VALUES,
    WHEN,
    WHERE,
    WHILE,

    // Identifiers
    IDENTIFIER,
    QuotedIdentifier,

    // Literals
    NUMBER,
    STRING,

    // Operators
    EQUALS,         // =
    NotEqual,       // <> != ~= ^=
    LessThan,       // <
    GreaterThan,    // >
    LessEqual,      // <=
    GreaterEqual,   // >=
    PLUS,           // +
    MINUS,          // -
    MULTIPLY,       // *
    DIVIDE,         // /
    Exponent,       // **
    Concat,         // ||
    Assign,         // :=
    Association,    // =>
    Range,          // ..
    LabelStart,     // <<
    LabelEnd,       // >>

    // Punctuation
    SEMICOLON,      // ;
    COMMA,          // ,
    LeftParen,      // (
    RightParen,     // )
    DOT,            // .
    COLON,          // :
    PERCENT,        // %
    AT,             // @

    // Special
    EOF,
}

impl TokenType {
    pub fn is_keyword(&self) -> bool {
        (*self as u8) <= (TokenType::WHILE as u8)
    }

    /// Whether two literals of this token type compare case-insensitively
    pub fn is_case_insensitive(&self) -> bool {
        !matches!(self, TokenType::QuotedIdentifier | TokenType::STRING)
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            TokenType::IDENTIFIER => "identifier",
            TokenType::QuotedIdentifier => "quoted identifier",
            TokenType::NUMBER => "numeric literal",
            TokenType::STRING => "string literal",
            TokenType::EQUALS => "=",
            TokenType::NotEqual => "<>",
            TokenType::LessThan => "<",
            TokenType::GreaterThan => ">",
            TokenType::LessEqual => "<=",
            TokenType::GreaterEqual => ">=",
            TokenType::PLUS => "+",
            TokenType::MINUS => "-",
            TokenType::MULTIPLY => "*",
            TokenType::DIVIDE => "/",
            TokenType::Exponent => "**",
            TokenType::Concat => "||",
            TokenType::Assign => ":=",
            TokenType::Association => "=>",
            TokenType::Range => "..",
            TokenType::LabelStart => "<<",
            TokenType::LabelEnd => ">>",
            TokenType::SEMICOLON => ";",
            TokenType::COMMA => ",",
            TokenType::LeftParen => "(",
            TokenType::RightParen => ")",
            TokenType::DOT => ".",
            TokenType::COLON => ":",
            TokenType::PERCENT => "%",
            TokenType::AT => "@",
            TokenType::EOF => "end of input",
            keyword => return write!(f, "{:?}", keyword),
        };
        f.write_str(symbol)
    }
}

static KEYWORDS: Lazy<HashMap<&'static str, TokenType>> = Lazy::new(|| {
    use TokenType::*;
    [
        ("ALL", ALL), ("AND", AND), ("AS", AS), ("BEGIN", BEGIN), ("BETWEEN", BETWEEN),
        ("BY", BY), ("COMMIT", COMMIT), ("DECLARE", DECLARE), ("DEFAULT", DEFAULT),
        ("DELETE", DELETE), ("DISTINCT", DISTINCT), ("ELSE", ELSE), ("ELSIF", ELSIF),
        ("END", END), ("EXCEPTION", EXCEPTION), ("EXIT", EXIT), ("FALSE", FALSE),
        ("FOR", FOR), ("FROM", FROM), ("GROUP", GROUP), ("IF", IF), ("IN", IN),
        ("INSERT", INSERT), ("INTO", INTO), ("IS", IS), ("LIKE", LIKE), ("LOOP", LOOP),
        ("NOT", NOT), ("NULL", NULL), ("OF", OF), ("OR", OR), ("ORDER", ORDER),
        ("RETURN", RETURN), ("ROLLBACK", ROLLBACK), ("SELECT", SELECT), ("SET", SET),
        ("THEN", THEN), ("TRUE", TRUE), ("UPDATE", UPDATE), ("VALUES", VALUES),
        ("WHEN", WHEN), ("WHERE", WHERE), ("WHILE", WHILE),
    ]
    .into_iter()
    .collect()
});

// Longest operators first
const OPERATORS: &[(&str, TokenType)] = &[
    (":=", TokenType::Assign),
    ("=>", TokenType::Association),
    ("..", TokenType::Range),
    ("||", TokenType::Concat),
    ("<<", TokenType::LabelStart),
    (">>", TokenType::LabelEnd),
    ("<=", TokenType::LessEqual),
    (">=", TokenType::GreaterEqual),
    ("<>", TokenType::NotEqual),
    ("!=", TokenType::NotEqual),
    ("~=", TokenType::NotEqual),
    ("^=", TokenType::NotEqual),
    ("**", TokenType::Exponent),
    ("=", TokenType::EQUALS),
    ("<", TokenType::LessThan),
    (">", TokenType::GreaterThan),
    ("+", TokenType::PLUS),
    ("-", TokenType::MINUS),
    ("*", TokenType::MULTIPLY),
    ("/", TokenType::DIVIDE),
    ("(", TokenType::LeftParen),
    (")", TokenType::RightParen),
    (",", TokenType::COMMA),
    (";", TokenType::SEMICOLON),
    (".", TokenType::DOT),
    (":", TokenType::COLON),
    ("%", TokenType::PERCENT),
    ("@", TokenType::AT),
];

/// Lexical errors. Any of them is fatal for the source unit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unexpected character '{ch}' at line {line}, column {column}")]
    UnexpectedCharacter { ch: char, line: usize, column: usize },
    #[error("Unterminated string literal starting at line {line}, column {column}")]
    UnterminatedString { line: usize, column: usize },
    #[error("Unterminated quoted identifier starting at line {line}, column {column}")]
    UnterminatedQuotedIdentifier { line: usize, column: usize },
    #[error("Unterminated comment starting at line {line}, column {column}")]
    UnterminatedComment { line: usize, column: usize },
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { line, .. }
            | LexError::UnterminatedString { line, .. }
            | LexError::UnterminatedQuotedIdentifier { line, .. }
            | LexError::UnterminatedComment { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { column, .. }
            | LexError::UnterminatedString { column, .. }
            | LexError::UnterminatedQuotedIdentifier { column, .. }
            | LexError::UnterminatedComment { column, .. } => *column,
        }
    }
}

/// Result type for lexing operations
pub type LexResult<T> = Result<T, LexError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TriviaKind {
    Whitespace,
    LineComment,
    BlockComment,
}

/// Whitespace or a comment preceding a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub text: String,
    pub span: Span,
}

/// A Token represents a lexical unit of the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub literal: String,
    pub span: Span,
    /// Leading trivia. The EOF token carries the trailing trivia of the unit.
    pub trivia: Vec<Trivia>,
}

impl Token {
    pub fn line(&self) -> usize {
        self.span.start.line
    }

    pub fn column(&self) -> usize {
        self.span.start.column
    }

    /// Case-insensitive comparison against a keyword or word
    pub fn is_word(&self, word: &str) -> bool {
        matches!(self.token_type, TokenType::IDENTIFIER) && self.literal.eq_ignore_ascii_case(word)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}({})", self.token_type, self.literal)
    }
}

/// PL/SQL Lexer for breaking source text into tokens
pub struct Lexer<'a> {
    input: &'a str,
    offset: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer over the given source text
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            offset: 0,
            line: 1,
            column: 0,
        }
    }

    /// Consume the lexer and produce the full token stream, EOF included
    pub fn tokenize(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.token_type == TokenType::EOF;
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> LexResult<Token> {
        let trivia = self.read_trivia()?;
        let start = self.position();

        let token_type = match self.peek() {
            None => TokenType::EOF,
            Some('\'') => {
                self.read_string(start)?;
                TokenType::STRING
            }
            Some('"') => {
                self.read_quoted_identifier(start)?;
                TokenType::QuotedIdentifier
            }
            Some(ch) if ch.is_ascii_digit() => {
                self.read_number();
                TokenType::NUMBER
            }
            Some('.') if self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number();
                TokenType::NUMBER
            }
            Some(ch) if is_letter(ch) => match self.string_prefix() {
                Some((prefix_len, alternative)) => {
                    for _ in 0..prefix_len {
                        self.read_char();
                    }
                    if alternative {
                        self.read_alternative_string(start)?;
                    } else {
                        self.read_string(start)?;
                    }
                    TokenType::STRING
                }
                None => {
                    let identifier = self.read_identifier();
                    lookup_identifier(identifier)
                }
            },
            Some(ch) => self.read_operator(ch, start)?,
        };

        Ok(Token {
            token_type,
            literal: self.input[start.offset..self.offset].to_string(),
            span: Span::new(start, self.position()),
            trivia,
        })
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    fn rest(&self) -> &'a str {
        &self.input[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    /// Read the next character from the input
    fn read_char(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Collect whitespace and comments up to the next token
    fn read_trivia(&mut self) -> LexResult<Vec<Trivia>> {
        let mut trivia = Vec::new();
        loop {
            let start = self.position();
            let kind = match (self.peek(), self.peek_nth(1)) {
                (Some(ch), _) if ch.is_whitespace() => {
                    while self.peek().is_some_and(char::is_whitespace) {
                        self.read_char();
                    }
                    TriviaKind::Whitespace
                }
                (Some('-'), Some('-')) => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.read_char();
                    }
                    TriviaKind::LineComment
                }
                (Some('/'), Some('*')) => {
                    self.read_char();
                    self.read_char();
                    loop {
                        match self.read_char() {
                            Some('*') if self.peek() == Some('/') => {
                                self.read_char();
                                break;
                            }
                            Some(_) => {}
                            None => {
                                return Err(LexError::UnterminatedComment {
                                    line: start.line,
                                    column: start.column,
                                });
                            }
                        }
                    }
                    TriviaKind::BlockComment
                }
                _ => return Ok(trivia),
            };
            trivia.push(Trivia {
                kind,
                text: self.input[start.offset..self.offset].to_string(),
                span: Span::new(start, self.position()),
            });
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> &'a str {
        let start = self.offset;
        while self.peek().is_some_and(is_identifier_char) {
            self.read_char();
        }
        &self.input[start..self.offset]
    }

    /// Read a numeric literal: digits, optional fraction, exponent and suffix
    fn read_number(&mut self) {
        self.read_digits();
        if self.peek() == Some('.') && self.peek_nth(1) != Some('.') {
            self.read_char();
            self.read_digits();
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent_digit = match self.peek_nth(1) {
                Some('+' | '-') => self.peek_nth(2),
                other => other,
            };
            if exponent_digit.is_some_and(|c| c.is_ascii_digit()) {
                self.read_char();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.read_char();
                }
                self.read_digits();
            }
        }

        if matches!(self.peek(), Some('f' | 'F' | 'd' | 'D'))
            && !self.peek_nth(1).is_some_and(is_identifier_char)
        {
            self.read_char();
        }
    }

    fn read_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.read_char();
        }
    }

    /// Detect `n'`, `q'` and `nq'` string prefixes. Returns the prefix length
    /// and whether the literal uses alternative quoting.
    fn string_prefix(&self) -> Option<(usize, bool)> {
        let mut chars = self.rest().chars().map(|c| c.to_ascii_lowercase());
        match (chars.next(), chars.next(), chars.next()) {
            (Some('n'), Some('q'), Some('\'')) => Some((2, true)),
            (Some('q'), Some('\''), _) => Some((1, true)),
            (Some('n'), Some('\''), _) => Some((1, false)),
            _ => None,
        }
    }

    /// Read a string literal enclosed in single quotes; `''` is an escaped quote
    fn read_string(&mut self, start: Position) -> LexResult<()> {
        self.read_char();
        loop {
            match self.read_char() {
                Some('\'') if self.peek() == Some('\'') => {
                    self.read_char();
                }
                Some('\'') => return Ok(()),
                Some(_) => {}
                None => {
                    return Err(LexError::UnterminatedString {
                        line: start.line,
                        column: start.column,
                    });
                }
            }
        }
    }

    /// Read a `q'X...X'` literal; bracket delimiters close with their pair
    fn read_alternative_string(&mut self, start: Position) -> LexResult<()> {
        let unterminated = LexError::UnterminatedString {
            line: start.line,
            column: start.column,
        };
        self.read_char();
        let closing = match self.read_char().ok_or_else(|| unterminated.clone())? {
            '[' => ']',
            '{' => '}',
            '(' => ')',
            '<' => '>',
            other => other,
        };
        loop {
            match self.read_char() {
                Some(ch) if ch == closing && self.peek() == Some('\'') => {
                    self.read_char();
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(unterminated),
            }
        }
    }

    fn read_quoted_identifier(&mut self, start: Position) -> LexResult<()> {
        self.read_char();
        loop {
            match self.read_char() {
                Some('"') => return Ok(()),
                Some('\n') | None => {
                    return Err(LexError::UnterminatedQuotedIdentifier {
                        line: start.line,
                        column: start.column,
                    });
                }
                Some(_) => {}
            }
        }
    }

    fn read_operator(&mut self, ch: char, start: Position) -> LexResult<TokenType> {
        let rest = self.rest();
        let (symbol, token_type) = OPERATORS
            .iter()
            .find(|(symbol, _)| rest.starts_with(symbol))
            .ok_or(LexError::UnexpectedCharacter {
                ch,
                line: start.line,
                column: start.column,
            })?;
        for _ in 0..symbol.len() {
            self.read_char();
        }
        Ok(*token_type)
    }
}

/// Tokenize a complete source text
pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    Lexer::new(input).tokenize()
}

/// Get the token type for an identifier (could be a reserved word)
fn lookup_identifier(ident: &str) -> TokenType {
    KEYWORDS
        .get(ident.to_ascii_uppercase().as_str())
        .copied()
        .unwrap_or(TokenType::IDENTIFIER)
}

/// Check if a character may start an identifier
fn is_letter(ch: char) -> bool {
    ch.is_alphabetic()
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '$' | '#')
}
