// SQL Statement Parser Implementation
//
// This module implements the embedded SQL subset: queries, the three DML
// statements and transaction control.

use crate::parser::ast::AstNode;
use crate::parser::grammar::GrammarRule;
use crate::parser::lexer::TokenType;

use super::parser_core::{Parser, RuleResult};
use super::parser_expressions::{parse_expression, parse_postfix_expression};

/// Append `, item` repetitions after a first item
fn parse_comma_list(
    p: &mut Parser,
    c: &mut Vec<AstNode>,
    item: fn(&mut Parser) -> RuleResult<AstNode>,
) -> RuleResult<()> {
    c.push(item(p)?);
    p.zero_or_more(c, |p, c| {
        c.push(p.expect(TokenType::COMMA)?);
        c.push(item(p)?);
        Ok(())
    })
}

/// `[. name]*` after a leading name
fn parse_dotted_tail(p: &mut Parser, c: &mut Vec<AstNode>) -> RuleResult<()> {
    p.zero_or_more(c, |p, c| {
        c.push(p.expect(TokenType::DOT)?);
        c.push(p.expect_identifier()?);
        Ok(())
    })
}

/// `COMMIT [WORK] ;`
pub fn parse_commit_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::CommitStatement, |p, c| {
        c.push(p.expect(TokenType::COMMIT)?);
        if p.check_word("WORK") {
            c.push(p.advance());
        }
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

/// `ROLLBACK [WORK] ;`
pub fn parse_rollback_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::RollbackStatement, |p, c| {
        c.push(p.expect(TokenType::ROLLBACK)?);
        if p.check_word("WORK") {
            c.push(p.advance());
        }
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

pub fn parse_select_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::SelectStatement, |p, c| {
        c.push(parse_select_expression(p)?);
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

/// A query: `SELECT [DISTINCT|ALL] columns [INTO ...] FROM ... [WHERE ...]
/// [GROUP BY ...] [ORDER BY ...] [FOR UPDATE ...]`
pub fn parse_select_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::SelectExpression, |p, c| {
        c.push(p.expect(TokenType::SELECT)?);
        if p.check(TokenType::DISTINCT) || p.check(TokenType::ALL) {
            c.push(p.advance());
        }
        if p.check(TokenType::MULTIPLY) {
            c.push(p.advance());
        } else {
            parse_comma_list(p, c, parse_select_column)?;
        }

        if p.check(TokenType::INTO) {
            c.push(parse_into_clause(p)?);
        }
        c.push(parse_from_clause(p)?);
        if p.check(TokenType::WHERE) {
            c.push(parse_where_clause(p)?);
        }
        if p.check(TokenType::GROUP) {
            c.push(parse_group_by_clause(p)?);
        }
        if p.check(TokenType::ORDER) {
            c.push(parse_order_by_clause(p)?);
        }
        if let Some(clause) = p.optional(parse_for_update_clause)? {
            c.push(clause);
        }
        Ok(())
    })
}

/// `expression [[AS] alias]`
pub fn parse_select_column(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::SelectColumn, |p, c| {
        c.push(parse_expression(p)?);
        if p.check(TokenType::AS) {
            c.push(p.advance());
            c.push(p.expect_identifier()?);
        } else if p.check_identifier() {
            c.push(p.advance());
        }
        Ok(())
    })
}

/// `INTO target [, target]*`
pub fn parse_into_clause(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::IntoClause, |p, c| {
        c.push(p.expect(TokenType::INTO)?);
        parse_comma_list(p, c, parse_postfix_expression)
    })
}

/// `FROM table [, table]*`
pub fn parse_from_clause(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::FromClause, |p, c| {
        c.push(p.expect(TokenType::FROM)?);
        parse_comma_list(p, c, parse_table_reference)
    })
}

/// `schema.table[@dblink] [alias]` or `(subquery) [alias]`
pub fn parse_table_reference(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::TableReference, |p, c| {
        if p.check(TokenType::LeftParen) {
            c.push(p.advance());
            c.push(parse_select_expression(p)?);
            c.push(p.expect(TokenType::RightParen)?);
        } else {
            c.push(p.expect_identifier()?);
            parse_dotted_tail(p, c)?;
            if p.check(TokenType::AT) {
                c.push(p.advance());
                c.push(p.expect_identifier()?);
            }
        }
        if p.check_identifier() {
            c.push(p.advance());
        }
        Ok(())
    })
}

pub fn parse_where_clause(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::WhereClause, |p, c| {
        c.push(p.expect(TokenType::WHERE)?);
        c.push(parse_expression(p)?);
        Ok(())
    })
}

pub fn parse_group_by_clause(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::GroupByClause, |p, c| {
        c.push(p.expect(TokenType::GROUP)?);
        c.push(p.expect(TokenType::BY)?);
        parse_comma_list(p, c, parse_expression)
    })
}

/// `ORDER BY expression [ASC|DESC] [, ...]`
pub fn parse_order_by_clause(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::OrderByClause, |p, c| {
        c.push(p.expect(TokenType::ORDER)?);
        c.push(p.expect(TokenType::BY)?);
        let mut first = true;
        p.zero_or_more(c, |p, c| {
            if !first {
                c.push(p.expect(TokenType::COMMA)?);
            }
            c.push(parse_expression(p)?);
            if p.check_word("ASC") || p.check_word("DESC") {
                c.push(p.advance());
            }
            first = false;
            Ok(())
        })?;
        if first {
            return p.mismatch("expression");
        }
        Ok(())
    })
}

/// `FOR UPDATE [OF column [, column]*] [NOWAIT | WAIT n | SKIP LOCKED]`
pub fn parse_for_update_clause(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::ForUpdateClause, |p, c| {
        c.push(p.expect(TokenType::FOR)?);
        c.push(p.expect(TokenType::UPDATE)?);
        p.optional_into(c, |p, c| {
            c.push(p.expect(TokenType::OF)?);
            parse_comma_list(p, c, parse_column_reference)
        })?;
        p.optional_into(c, |p, c| {
            if p.check_word("NOWAIT") {
                c.push(p.advance());
            } else if p.check_word("WAIT") {
                c.push(p.advance());
                c.push(p.expect(TokenType::NUMBER)?);
            } else {
                c.push(p.expect_word("SKIP")?);
                c.push(p.expect_word("LOCKED")?);
            }
            Ok(())
        })?;
        Ok(())
    })
}

/// `name [. name [. name]]`
pub fn parse_column_reference(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::ColumnReference, |p, c| {
        c.push(p.expect_identifier()?);
        for _ in 0..2 {
            let qualified = p.optional_into(c, |p, c| {
                c.push(p.expect(TokenType::DOT)?);
                c.push(p.expect_identifier()?);
                Ok(())
            })?;
            if !qualified {
                break;
            }
        }
        Ok(())
    })
}

/// `INSERT INTO table [(column, ...)] {VALUES (expression, ...) | query} ;`
pub fn parse_insert_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::InsertStatement, |p, c| {
        c.push(p.expect(TokenType::INSERT)?);
        c.push(p.expect(TokenType::INTO)?);
        c.push(parse_table_reference(p)?);
        p.optional_into(c, |p, c| {
            c.push(p.expect(TokenType::LeftParen)?);
            parse_comma_list(p, c, parse_column_reference)?;
            c.push(p.expect(TokenType::RightParen)?);
            Ok(())
        })?;
        if p.check(TokenType::VALUES) {
            c.push(p.advance());
            c.push(p.expect(TokenType::LeftParen)?);
            parse_comma_list(p, c, parse_expression)?;
            c.push(p.expect(TokenType::RightParen)?);
        } else {
            c.push(parse_select_expression(p)?);
        }
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

/// `UPDATE table SET column = expression [, ...] [WHERE ...] ;`
pub fn parse_update_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::UpdateStatement, |p, c| {
        c.push(p.expect(TokenType::UPDATE)?);
        c.push(parse_table_reference(p)?);
        c.push(p.expect(TokenType::SET)?);
        parse_comma_list(p, c, parse_set_clause)?;
        if p.check(TokenType::WHERE) {
            c.push(parse_where_clause(p)?);
        }
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}

pub fn parse_set_clause(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::SetClause, |p, c| {
        c.push(parse_column_reference(p)?);
        c.push(p.expect(TokenType::EQUALS)?);
        c.push(parse_expression(p)?);
        Ok(())
    })
}

/// `DELETE [FROM] table [WHERE ...] ;`
pub fn parse_delete_statement(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::DeleteStatement, |p, c| {
        c.push(p.expect(TokenType::DELETE)?);
        if p.check(TokenType::FROM) {
            c.push(p.advance());
        }
        c.push(parse_table_reference(p)?);
        if p.check(TokenType::WHERE) {
            c.push(parse_where_clause(p)?);
        }
        c.push(p.expect(TokenType::SEMICOLON)?);
        Ok(())
    })
}
