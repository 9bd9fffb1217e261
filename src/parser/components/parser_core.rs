// Core Parser Implementation
//
// This module implements the parser state and the combinators the grammar
// rules are written with: sequence (plain `?` chaining inside a rule),
// ordered choice, optional and repetition. A failed rule restores the token
// position, so no partial node survives a mismatch.

use std::fmt;

use thiserror::Error;

use crate::common::types::Span;
use crate::parser::ast::AstNode;
use crate::parser::grammar::GrammarRule;
use crate::parser::lexer::{LexResult, Lexer, Token, TokenType};

use super::parser_declarations::*;
use super::parser_dml::*;
use super::parser_expressions::*;
use super::parser_statements::*;

/// Default bound on grammar-rule nesting while parsing one unit
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 512;

/// Default bound on the native stack a parse may use, in bytes. It fits the
/// 2 MiB stack of spawned threads with room left for the caller.
///
/// Unoptimized builds need up to about 16 KiB of stack per nesting level of
/// statements or nested calls, so parsing up to [`DEFAULT_MAX_NESTING_DEPTH`]
/// needs about 8 MiB. Run deep inputs on a thread with that much stack and
/// raise the budget with [`Parser::with_stack_budget`].
pub const DEFAULT_STACK_BUDGET: usize = 1536 * 1024;

/// PL/SQL parsing errors. Both are fatal for the source unit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No grammar alternative matched; reported at the furthest position reached
    #[error("Syntax error at line {line}, column {column}: expected {expected}, found {found}")]
    Syntax {
        line: usize,
        column: usize,
        expected: String,
        found: String,
        rule_stack: Vec<GrammarRule>,
    },
    #[error("Nesting deeper than {limit} grammar rules at line {line}, column {column}")]
    NestingTooDeep {
        limit: usize,
        line: usize,
        column: usize,
    },
    #[error("Nesting needs more than {budget} bytes of parser stack at line {line}, column {column}")]
    StackBudgetExceeded {
        budget: usize,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::Syntax { line, .. }
            | ParseError::NestingTooDeep { line, .. }
            | ParseError::StackBudgetExceeded { line, .. } => *line,
        }
    }

    pub fn column(&self) -> usize {
        match self {
            ParseError::Syntax { column, .. }
            | ParseError::NestingTooDeep { column, .. }
            | ParseError::StackBudgetExceeded { column, .. } => *column,
        }
    }

    /// Rules that were active at the failure point, outermost first
    pub fn rule_path(&self) -> String {
        match self {
            ParseError::Syntax { rule_stack, .. } => rule_stack
                .iter()
                .map(GrammarRule::name)
                .collect::<Vec<_>>()
                .join(" > "),
            ParseError::NestingTooDeep { .. } | ParseError::StackBudgetExceeded { .. } => String::new(),
        }
    }
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Why a rule application produced no node
#[derive(Debug)]
pub enum Failure {
    /// The rule does not match here; the caller may try something else
    Mismatch,
    /// Parsing of the unit must stop
    Fatal(ParseError),
}

/// Result type of a single rule application
pub type RuleResult<T> = Result<T, Failure>;

/// An alternative of an ordered choice
pub type Alternative = fn(&mut Parser) -> RuleResult<AstNode>;

struct FurthestFailure {
    pos: usize,
    expected: Vec<String>,
    rule_stack: Vec<GrammarRule>,
}

/// PL/SQL Parser for constructing an AST from tokens
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    max_depth: usize,
    stack_budget: usize,
    /// Stack address at the start of the current parse
    stack_base: usize,
    rule_stack: Vec<GrammarRule>,
    furthest: Option<FurthestFailure>,
}

impl Parser {
    /// Create a new parser from PL/SQL source text
    pub fn new(input: &str) -> LexResult<Self> {
        Ok(Self::from_tokens(Lexer::new(input).tokenize()?))
    }

    /// Create a parser from a token stream. An EOF token is appended when the
    /// stream does not end with one.
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.token_type != TokenType::EOF) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or_default();
            tokens.push(Token {
                token_type: TokenType::EOF,
                literal: String::new(),
                span: Span::empty(end),
                trivia: Vec::new(),
            });
        }

        Parser {
            tokens,
            pos: 0,
            max_depth: DEFAULT_MAX_NESTING_DEPTH,
            stack_budget: DEFAULT_STACK_BUDGET,
            stack_base: stack_position(),
            rule_stack: Vec::new(),
            furthest: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Bound the native stack the parse may use. Must stay below the stack
    /// size of the thread that parses.
    pub fn with_stack_budget(mut self, bytes: usize) -> Self {
        self.stack_budget = bytes;
        self
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Parse a complete compilation unit
    pub fn parse(&mut self) -> ParseResult<AstNode> {
        self.parse_rule(GrammarRule::FileInput)
    }

    /// Parse the whole input with `root` as the root rule
    pub fn parse_rule(&mut self, root: GrammarRule) -> ParseResult<AstNode> {
        self.pos = 0;
        self.rule_stack.clear();
        self.furthest = None;
        self.stack_base = stack_position();

        match parse_root(self, root) {
            Ok(node) if self.check(TokenType::EOF) => Ok(node),
            Ok(_) => {
                self.record_failure(TokenType::EOF);
                Err(self.syntax_error())
            }
            Err(Failure::Mismatch) => Err(self.syntax_error()),
            Err(Failure::Fatal(error)) => Err(error),
        }
    }

    /// Whether the whole of `input` matches `root`
    pub fn matches(input: &str, root: GrammarRule) -> bool {
        Parser::new(input).is_ok_and(|mut parser| parser.parse_rule(root).is_ok())
    }

    // Rule application

    /// Apply `rule`: run `body` to collect the children and wrap them in a
    /// node tagged with the rule
    pub fn rule<F>(&mut self, rule: GrammarRule, body: F) -> RuleResult<AstNode>
    where
        F: FnOnce(&mut Parser, &mut Vec<AstNode>) -> RuleResult<()>,
    {
        let start = self.pos;
        let mut children = Vec::new();
        self.within(rule, |p| body(p, &mut children))?;
        Ok(AstNode::rule(rule, children, self.tokens[start].span.start))
    }

    /// Like [`Parser::rule`], but a node with a single child is replaced by
    /// that child
    pub fn rule_skip_single<F>(&mut self, rule: GrammarRule, body: F) -> RuleResult<AstNode>
    where
        F: FnOnce(&mut Parser, &mut Vec<AstNode>) -> RuleResult<()>,
    {
        Ok(self.rule(rule, body)?.into_single_child())
    }

    /// Run `f` with `rule` on the rule stack. Enforces the nesting bounds and
    /// restores the position when `f` fails.
    pub fn within<T>(
        &mut self,
        rule: GrammarRule,
        f: impl FnOnce(&mut Parser) -> RuleResult<T>,
    ) -> RuleResult<T> {
        self.ensure_depth(1)?;

        let start = self.pos;
        self.rule_stack.push(rule);
        let result = f(self);
        self.rule_stack.pop();
        if result.is_err() {
            self.pos = start;
        }
        result
    }

    /// Build a node from already parsed children
    pub fn node(&self, rule: GrammarRule, children: Vec<AstNode>) -> AstNode {
        AstNode::rule(rule, children, self.current().span.start)
    }

    /// Fail with `NestingTooDeep` when `extra` more levels would exceed the
    /// rule bound, or with `StackBudgetExceeded` when the parse has already
    /// used its stack budget
    pub fn ensure_depth(&self, extra: usize) -> RuleResult<()> {
        let token = self.current();
        if self.rule_stack.len() + extra > self.max_depth {
            return Err(Failure::Fatal(ParseError::NestingTooDeep {
                limit: self.max_depth,
                line: token.line(),
                column: token.column(),
            }));
        }
        if self.stack_used() > self.stack_budget {
            return Err(Failure::Fatal(ParseError::StackBudgetExceeded {
                budget: self.stack_budget,
                line: token.line(),
                column: token.column(),
            }));
        }
        Ok(())
    }

    fn stack_used(&self) -> usize {
        self.stack_base.abs_diff(stack_position())
    }

    // Combinators

    /// Zero-or-one: `None` (and the position restored) when `f` does not match
    pub fn optional<T>(
        &mut self,
        f: impl FnOnce(&mut Parser) -> RuleResult<T>,
    ) -> RuleResult<Option<T>> {
        let start = self.pos;
        match f(self) {
            Ok(value) => Ok(Some(value)),
            Err(Failure::Mismatch) => {
                self.pos = start;
                Ok(None)
            }
            Err(fatal) => Err(fatal),
        }
    }

    /// Zero-or-one group appending to `children`; returns whether it matched
    pub fn optional_into(
        &mut self,
        children: &mut Vec<AstNode>,
        f: impl FnOnce(&mut Parser, &mut Vec<AstNode>) -> RuleResult<()>,
    ) -> RuleResult<bool> {
        let start = self.pos;
        let mark = children.len();
        match f(self, children) {
            Ok(()) => Ok(true),
            Err(Failure::Mismatch) => {
                self.pos = start;
                children.truncate(mark);
                Ok(false)
            }
            Err(fatal) => Err(fatal),
        }
    }

    /// Zero-or-more, greedy. Stops at the first mismatching iteration or at
    /// an iteration that consumed nothing.
    pub fn zero_or_more(
        &mut self,
        children: &mut Vec<AstNode>,
        mut f: impl FnMut(&mut Parser, &mut Vec<AstNode>) -> RuleResult<()>,
    ) -> RuleResult<()> {
        loop {
            let start = self.pos;
            if !self.optional_into(children, &mut f)? || self.pos == start {
                return Ok(());
            }
        }
    }

    /// Ordered choice: the first matching alternative wins
    pub fn first_of(&mut self, alternatives: &[Alternative]) -> RuleResult<AstNode> {
        for alternative in alternatives {
            if let Some(node) = self.optional(*alternative)? {
                return Ok(node);
            }
        }
        Err(Failure::Mismatch)
    }

    // Terminals

    pub fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub fn peek_nth(&self, n: usize) -> &Token {
        let index = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub fn check(&self, token_type: TokenType) -> bool {
        self.current().token_type == token_type
    }

    pub fn check_nth(&self, n: usize, token_type: TokenType) -> bool {
        self.peek_nth(n).token_type == token_type
    }

    pub fn check_word(&self, word: &str) -> bool {
        self.current().is_word(word)
    }

    pub fn check_identifier(&self) -> bool {
        is_identifier(self.current())
    }

    /// Consume the current token as a leaf. EOF is never consumed.
    pub fn advance(&mut self) -> AstNode {
        let token = self.current().clone();
        if token.token_type != TokenType::EOF {
            self.pos += 1;
        }
        AstNode::leaf(token)
    }

    pub fn expect(&mut self, token_type: TokenType) -> RuleResult<AstNode> {
        if self.check(token_type) {
            Ok(self.advance())
        } else {
            self.mismatch(token_type)
        }
    }

    /// Match any of the given token types
    pub fn expect_any(&mut self, token_types: &[TokenType], description: &str) -> RuleResult<AstNode> {
        if token_types.contains(&self.current().token_type) {
            Ok(self.advance())
        } else {
            self.mismatch(description)
        }
    }

    /// Match a non-reserved keyword, case-insensitively
    pub fn expect_word(&mut self, word: &'static str) -> RuleResult<AstNode> {
        if self.check_word(word) {
            Ok(self.advance())
        } else {
            self.mismatch(word)
        }
    }

    /// Match a plain or quoted identifier
    pub fn expect_identifier(&mut self) -> RuleResult<AstNode> {
        if self.check_identifier() {
            Ok(self.advance())
        } else {
            self.mismatch("identifier")
        }
    }

    /// Record what was expected at the current position and fail
    pub fn mismatch<T>(&mut self, expected: impl fmt::Display) -> RuleResult<T> {
        self.record_failure(expected);
        Err(Failure::Mismatch)
    }

    // Diagnostics

    fn record_failure(&mut self, expected: impl fmt::Display) {
        if let Some(furthest) = &mut self.furthest {
            if furthest.pos > self.pos {
                return;
            }
            if furthest.pos == self.pos {
                let expected = expected.to_string();
                if !furthest.expected.contains(&expected) {
                    furthest.expected.push(expected);
                }
                return;
            }
        }
        self.furthest = Some(FurthestFailure {
            pos: self.pos,
            expected: vec![expected.to_string()],
            rule_stack: self.rule_stack.clone(),
        });
    }

    fn syntax_error(&self) -> ParseError {
        let (pos, expected, rule_stack) = match &self.furthest {
            Some(furthest) => (
                furthest.pos,
                furthest.expected.join(" or "),
                furthest.rule_stack.clone(),
            ),
            None => (self.pos, TokenType::EOF.to_string(), Vec::new()),
        };
        let token = &self.tokens[pos.min(self.tokens.len() - 1)];
        let found = match token.token_type {
            TokenType::EOF => TokenType::EOF.to_string(),
            _ => format!("'{}'", token.literal),
        };

        ParseError::Syntax {
            line: token.line(),
            column: token.column(),
            expected,
            found,
            rule_stack,
        }
    }
}

pub fn is_identifier(token: &Token) -> bool {
    matches!(
        token.token_type,
        TokenType::IDENTIFIER | TokenType::QuotedIdentifier
    )
}

/// Require the node produced by `parse` to be tagged with `rule`
fn strict(p: &mut Parser, rule: GrammarRule, parse: Alternative) -> RuleResult<AstNode> {
    let node = parse(p)?;
    if node.is(rule) {
        Ok(node)
    } else {
        p.mismatch(rule)
    }
}

/// Dispatch a root rule to its rule function.
///
/// Operator levels that pass a lone operand through (`OR_EXPRESSION`,
/// `ADDITIVE_EXPRESSION`, ...) accept any input their production matches.
fn parse_root(p: &mut Parser, root: GrammarRule) -> RuleResult<AstNode> {
    use GrammarRule as R;
    match root {
        R::FileInput => parse_file_input(p),
        R::BlockStatement => parse_block_statement(p),
        R::DeclareSection => parse_declare_section(p),
        R::VariableDeclaration => parse_variable_declaration(p),
        R::ExceptionDeclaration => parse_exception_declaration(p),
        R::CursorDeclaration => parse_cursor_declaration(p),
        R::Datatype => parse_datatype(p),
        R::ExceptionHandler => parse_exception_handler(p),
        R::Label => parse_label(p),
        R::NullStatement => parse_null_statement(p),
        R::AssignmentStatement => parse_assignment_statement(p),
        R::CallStatement => parse_call_statement(p),
        R::IfStatement => parse_if_statement(p),
        R::ElsifClause => parse_elsif_clause(p),
        R::ElseClause => parse_else_clause(p),
        R::LoopStatement => parse_loop_statement(p),
        R::WhileStatement => parse_while_statement(p),
        R::ForStatement => parse_for_statement(p),
        R::ExitStatement => parse_exit_statement(p),
        R::ContinueStatement => parse_continue_statement(p),
        R::ReturnStatement => parse_return_statement(p),
        R::RaiseStatement => parse_raise_statement(p),
        R::CommitStatement => parse_commit_statement(p),
        R::RollbackStatement => parse_rollback_statement(p),
        R::SelectStatement => parse_select_statement(p),
        R::SelectExpression => parse_select_expression(p),
        R::SelectColumn => parse_select_column(p),
        R::IntoClause => parse_into_clause(p),
        R::FromClause => parse_from_clause(p),
        R::TableReference => parse_table_reference(p),
        R::WhereClause => parse_where_clause(p),
        R::GroupByClause => parse_group_by_clause(p),
        R::OrderByClause => parse_order_by_clause(p),
        R::ForUpdateClause => parse_for_update_clause(p),
        R::ColumnReference => parse_column_reference(p),
        R::InsertStatement => parse_insert_statement(p),
        R::UpdateStatement => parse_update_statement(p),
        R::SetClause => parse_set_clause(p),
        R::DeleteStatement => parse_delete_statement(p),
        R::OrExpression => parse_or_expression(p),
        R::AndExpression => parse_and_expression(p),
        R::NotExpression => parse_not_expression(p),
        R::ComparisonExpression => parse_comparison_expression(p),
        R::RelationalOperator => parse_relational_operator(p),
        R::IsNullExpression | R::LikeExpression | R::BetweenExpression | R::InExpression => {
            strict(p, root, parse_comparison_level)
        }
        R::ConcatenationExpression => parse_concatenation_expression(p),
        R::AdditiveExpression => parse_additive_expression(p),
        R::MultiplicativeExpression => parse_multiplicative_expression(p),
        R::UnaryExpression => parse_unary_expression(p),
        R::ExponentiationExpression => parse_exponentiation_expression(p),
        R::BracketedExpression => parse_bracketed_expression(p),
        R::NumericLiteral | R::CharacterLiteral | R::BooleanLiteral | R::NullLiteral => {
            strict(p, root, parse_literal)
        }
        R::BindVariable => parse_bind_variable(p),
        R::VariableName => parse_variable_name(p),
        R::MemberExpression | R::MethodCall | R::AttributeExpression => {
            strict(p, root, parse_postfix_expression)
        }
        R::Arguments => parse_arguments(p),
        R::Argument => parse_argument(p),
    }
}

/// Approximate address of the current stack frame
#[inline(never)]
fn stack_position() -> usize {
    let marker = 0u8;
    std::hint::black_box(&marker) as *const u8 as usize
}
