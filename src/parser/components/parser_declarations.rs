// Declaration Parser Implementation
//
// Declarations of the DECLARE section of a block.

use crate::parser::ast::AstNode;
use crate::parser::grammar::GrammarRule;
use crate::parser::lexer::TokenType;

use super::parser_core::{Alternative, Parser, RuleResult};
use super::parser_dml::parse_select_expression;
use super::parser_expressions::parse_expression;

const DECLARATIONS: &[Alternative] = &[
    parse_exception_declaration,
    parse_cursor_declaration,
    parse_variable_declaration,
];

/// `DECLARE declaration*`
pub fn parse_declare_section(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::DeclareSection, |p, c| {
        c.push(p.expect(TokenType::DECLARE)?);
        p.zero_or_more(c, |p, c| {
            c.push(p.first_of(DECLARATIONS)?);
            Ok(())
        })
    })
}

/// `name EXCEPTION ;`
pub fn parse_exception_declaration(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::ExceptionDeclaration, |p, c| {
        c.push(p.expect_identifier()?);
        c.push(p.expect(TokenType::EXCEPTION)?);
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

/// `CURSOR name IS select ;`
pub fn parse_cursor_declaration(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::CursorDeclaration, |p, c| {
        c.push(p.expect_word("CURSOR")?);
        c.push(p.expect_identifier()?);
        c.push(p.expect(TokenType::IS)?);
        c.push(parse_select_expression(p)?);
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

/// `name [CONSTANT] datatype [NOT NULL] [:= | DEFAULT expression] ;`
pub fn parse_variable_declaration(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::VariableDeclaration, |p, c| {
        c.push(p.expect_identifier()?);
        if p.check_word("CONSTANT") {
            c.push(p.advance());
        }
        c.push(parse_datatype(p)?);
        if p.check(TokenType::NOT) {
            c.push(p.advance());
            c.push(p.expect(TokenType::NULL)?);
        }
        if p.check(TokenType::Assign) || p.check(TokenType::DEFAULT) {
            c.push(p.advance());
            c.push(parse_expression(p)?);
        }
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

/// `name[(precision[, scale] [CHAR|BYTE])]` or an anchored `name%TYPE` /
/// `name%ROWTYPE`
pub fn parse_datatype(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::Datatype, |p, c| {
        c.push(p.expect_identifier()?);
        p.zero_or_more(c, |p, c| {
            c.push(p.expect(TokenType::DOT)?);
            c.push(p.expect_identifier()?);
            Ok(())
        })?;

        if p.check(TokenType::PERCENT) {
            c.push(p.advance());
            if p.check_word("ROWTYPE") {
                c.push(p.advance());
            } else {
                c.push(p.expect_word("TYPE")?);
            }
        } else if p.check(TokenType::LeftParen) {
            c.push(p.advance());
            c.push(p.expect(TokenType::NUMBER)?);
            if p.check(TokenType::COMMA) {
                c.push(p.advance());
                c.push(p.expect(TokenType::NUMBER)?);
            }
            if p.check_word("CHAR") || p.check_word("BYTE") {
                c.push(p.advance());
            }
            c.push(p.expect(TokenType::RightParen)?);
        }
        Ok(())
    })
}
