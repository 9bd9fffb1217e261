// PL/SQL Statement Parser Implementation
//
// This module implements the compilation unit, blocks and the procedural
// statements. Statement alternatives are tried in declaration order; the
// first one that matches wins.

use crate::parser::ast::{same_token_text, AstNode};
use crate::parser::grammar::GrammarRule;
use crate::parser::lexer::{Token, TokenType};

use super::parser_core::{Alternative, Parser, RuleResult};
use super::parser_declarations::parse_declare_section;
use super::parser_dml::{
    parse_commit_statement, parse_delete_statement, parse_insert_statement,
    parse_rollback_statement, parse_select_expression, parse_select_statement,
    parse_update_statement,
};
use super::parser_expressions::{parse_expression, parse_postfix_expression};

const STATEMENTS: &[Alternative] = &[
    parse_block_statement,
    parse_null_statement,
    parse_if_statement,
    parse_loop_statement,
    parse_while_statement,
    parse_for_statement,
    parse_exit_statement,
    parse_continue_statement,
    parse_return_statement,
    parse_raise_statement,
    parse_commit_statement,
    parse_rollback_statement,
    parse_select_statement,
    parse_insert_statement,
    parse_update_statement,
    parse_delete_statement,
    parse_assignment_statement,
    parse_call_statement,
];

/// Statements and SQL*Plus `/` terminators up to the end of input
pub fn parse_file_input(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::FileInput, |p, c| {
        p.zero_or_more(c, |p, c| {
            if p.check(TokenType::DIVIDE) {
                c.push(p.advance());
            } else {
                c.push(parse_statement(p)?);
            }
            Ok(())
        })?;
        c.push(p.expect(TokenType::EOF)?);
        Ok(())
    })
}

pub fn parse_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.first_of(STATEMENTS)
}

fn parse_statements(p: &mut Parser, c: &mut Vec<AstNode>, at_least_one: bool) -> RuleResult<()> {
    if at_least_one {
        c.push(parse_statement(p)?);
    }
    p.zero_or_more(c, |p, c| {
        c.push(parse_statement(p)?);
        Ok(())
    })
}

/// `<<name>>`
pub fn parse_label(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::Label, |p, c| {
        c.push(p.expect(TokenType::LabelStart)?);
        c.push(p.expect_identifier()?);
        c.push(p.expect(TokenType::LabelEnd)?);
        Ok(())
    })
}

/// Optional leading label; returns the label name token
fn parse_optional_label(p: &mut Parser, c: &mut Vec<AstNode>) -> RuleResult<Option<Token>> {
    if !p.check(TokenType::LabelStart) {
        return Ok(None);
    }
    let label = parse_label(p)?;
    let name = label.child(1).and_then(AstNode::token).cloned();
    c.push(label);
    Ok(name)
}

/// Optional label after `END LOOP`. It has to repeat the opening label.
fn parse_end_label(p: &mut Parser, c: &mut Vec<AstNode>, opening: Option<&Token>) -> RuleResult<()> {
    if !p.check_identifier() {
        return Ok(());
    }
    match opening {
        Some(label) if same_token_text(label, p.current()) => {
            c.push(p.advance());
            Ok(())
        }
        Some(label) => p.mismatch(format!("label {}", label.literal)),
        None => p.mismatch(TokenType::SEMICOLON),
    }
}

/// `LOOP statement* END LOOP [label] ;`
fn parse_loop_body(p: &mut Parser, c: &mut Vec<AstNode>, opening: Option<&Token>) -> RuleResult<()> {
    c.push(p.expect(TokenType::LOOP)?);
    parse_statements(p, c, false)?;
    c.push(p.expect(TokenType::END)?);
    c.push(p.expect(TokenType::LOOP)?);
    parse_end_label(p, c, opening)?;
    c.push(p.expect(TokenType::SEMICOLON)?);
    Ok(())
}

/// `[<<label>>] [DECLARE declarations] BEGIN statements [EXCEPTION handlers] END [name] ;`
pub fn parse_block_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::BlockStatement, |p, c| {
        parse_optional_label(p, c)?;
        if p.check(TokenType::DECLARE) {
            c.push(parse_declare_section(p)?);
        }
        c.push(p.expect(TokenType::BEGIN)?);
        parse_statements(p, c, true)?;
        if p.check(TokenType::EXCEPTION) {
            c.push(p.advance());
            c.push(parse_exception_handler(p)?);
            p.zero_or_more(c, |p, c| {
                c.push(parse_exception_handler(p)?);
                Ok(())
            })?;
        }
        c.push(p.expect(TokenType::END)?);
        if p.check_identifier() {
            c.push(p.advance());
        }
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

/// `WHEN name [OR name]* THEN statements`
pub fn parse_exception_handler(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::ExceptionHandler, |p, c| {
        c.push(p.expect(TokenType::WHEN)?);
        c.push(parse_postfix_expression(p)?);
        p.zero_or_more(c, |p, c| {
            c.push(p.expect(TokenType::OR)?);
            c.push(parse_postfix_expression(p)?);
            Ok(())
        })?;
        c.push(p.expect(TokenType::THEN)?);
        parse_statements(p, c, true)
    })
}

pub fn parse_null_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::NullStatement, |p, c| {
        c.push(p.expect(TokenType::NULL)?);
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

pub fn parse_assignment_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::AssignmentStatement, |p, c| {
        c.push(parse_postfix_expression(p)?);
        c.push(p.expect(TokenType::Assign)?);
        c.push(parse_expression(p)?);
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

/// Procedure call, with or without arguments
pub fn parse_call_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::CallStatement, |p, c| {
        c.push(parse_postfix_expression(p)?);
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

pub fn parse_if_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::IfStatement, |p, c| {
        c.push(p.expect(TokenType::IF)?);
        c.push(parse_expression(p)?);
        c.push(p.expect(TokenType::THEN)?);
        parse_statements(p, c, true)?;
        p.zero_or_more(c, |p, c| {
            c.push(parse_elsif_clause(p)?);
            Ok(())
        })?;
        if p.check(TokenType::ELSE) {
            c.push(parse_else_clause(p)?);
        }
        c.push(p.expect(TokenType::END)?);
        c.push(p.expect(TokenType::IF)?);
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

pub fn parse_elsif_clause(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::ElsifClause, |p, c| {
        c.push(p.expect(TokenType::ELSIF)?);
        c.push(parse_expression(p)?);
        c.push(p.expect(TokenType::THEN)?);
        parse_statements(p, c, true)
    })
}

pub fn parse_else_clause(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::ElseClause, |p, c| {
        c.push(p.expect(TokenType::ELSE)?);
        parse_statements(p, c, true)
    })
}

/// `[<<label>>] LOOP statement* END LOOP [label] ;`
pub fn parse_loop_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::LoopStatement, |p, c| {
        let opening = parse_optional_label(p, c)?;
        parse_loop_body(p, c, opening.as_ref())
    })
}

/// `[<<label>>] WHILE condition LOOP statement* END LOOP [label] ;`
pub fn parse_while_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::WhileStatement, |p, c| {
        let opening = parse_optional_label(p, c)?;
        c.push(p.expect(TokenType::WHILE)?);
        c.push(parse_expression(p)?);
        parse_loop_body(p, c, opening.as_ref())
    })
}

/// Numeric `FOR i IN [REVERSE] low .. high` loops and cursor loops over a
/// subquery or a cursor
pub fn parse_for_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::ForStatement, |p, c| {
        let opening = parse_optional_label(p, c)?;
        c.push(p.expect(TokenType::FOR)?);
        c.push(p.expect_identifier()?);
        c.push(p.expect(TokenType::IN)?);

        let subquery = p.optional_into(c, |p, c| {
            c.push(p.expect(TokenType::LeftParen)?);
            c.push(parse_select_expression(p)?);
            c.push(p.expect(TokenType::RightParen)?);
            Ok(())
        })?;
        let range = subquery
            || p.optional_into(c, |p, c| {
                if p.check_word("REVERSE") {
                    c.push(p.advance());
                }
                c.push(parse_expression(p)?);
                c.push(p.expect(TokenType::Range)?);
                c.push(parse_expression(p)?);
                Ok(())
            })?;
        if !range {
            c.push(parse_postfix_expression(p)?);
        }

        parse_loop_body(p, c, opening.as_ref())
    })
}

/// Shared shape of EXIT and CONTINUE: `[label] [WHEN condition] ;`
fn parse_exit_tail(p: &mut Parser, c: &mut Vec<AstNode>) -> RuleResult<()> {
    if p.check_identifier() {
        c.push(p.advance());
    }
    if p.check(TokenType::WHEN) {
        c.push(p.advance());
        c.push(parse_expression(p)?);
    }
    c.push(p.expect(TokenType::SEMICOLON)?);
    Ok(())
}

pub fn parse_exit_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::ExitStatement, |p, c| {
        c.push(p.expect(TokenType::EXIT)?);
        parse_exit_tail(p, c)
    })
}

pub fn parse_continue_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::ContinueStatement, |p, c| {
        c.push(p.expect_word("CONTINUE")?);
        parse_exit_tail(p, c)
    })
}

pub fn parse_return_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::ReturnStatement, |p, c| {
        c.push(p.expect(TokenType::RETURN)?);
        if let Some(value) = p.optional(parse_expression)? {
            c.push(value);
        }
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

pub fn parse_raise_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::RaiseStatement, |p, c| {
        c.push(p.expect_word("RAISE")?);
        if let Some(name) = p.optional(parse_postfix_expression)? {
            c.push(name);
        }
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}
