// Expression Parser Implementation
//
// Precedence levels, loosest first: OR, AND, NOT, comparisons, ||, additive,
// multiplicative, unary sign, **, then primaries with their postfix chains.
// Binary levels only produce a node when an operator is present.

use crate::parser::ast::AstNode;
use crate::parser::grammar::GrammarRule;
use crate::parser::lexer::TokenType;

use super::parser_core::{is_identifier, Parser, RuleResult};
use super::parser_dml::parse_select_expression;

const RELATIONAL_OPERATORS: &[TokenType] = &[
    TokenType::EQUALS,
    TokenType::NotEqual,
    TokenType::LessThan,
    TokenType::GreaterThan,
    TokenType::LessEqual,
    TokenType::GreaterEqual,
];

/// Tail of a comparison-level expression: the rule it forms and the children
/// following the left operand
type ComparisonTail = fn(&mut Parser) -> RuleResult<(GrammarRule, Vec<AstNode>)>;

const COMPARISON_TAILS: &[ComparisonTail] = &[
    relational_tail,
    collection_tail,
    is_null_tail,
    like_tail,
    between_tail,
    in_tail,
];

/// Parse a full expression
pub fn parse_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    parse_or_expression(parser)
}

pub fn parse_or_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule_skip_single(GrammarRule::OrExpression, |p, c| {
        c.push(parse_and_expression(p)?);
        p.zero_or_more(c, |p, c| {
            c.push(p.expect(TokenType::OR)?);
            c.push(parse_and_expression(p)?);
            Ok(())
        })
    })
}

pub fn parse_and_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule_skip_single(GrammarRule::AndExpression, |p, c| {
        c.push(parse_not_expression(p)?);
        p.zero_or_more(c, |p, c| {
            c.push(p.expect(TokenType::AND)?);
            c.push(parse_not_expression(p)?);
            Ok(())
        })
    })
}

pub fn parse_not_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    if !parser.check(TokenType::NOT) {
        return parse_comparison_level(parser);
    }
    parser.rule(GrammarRule::NotExpression, |p, c| {
        c.push(p.expect(TokenType::NOT)?);
        c.push(parse_not_expression(p)?);
        Ok(())
    })
}

/// A comparison: two operands joined by a relational operator or a
/// collection operator (`MEMBER OF`, `SUBMULTISET OF`)
pub fn parse_comparison_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    let node = parse_comparison_level(parser)?;
    if node.is(GrammarRule::ComparisonExpression) {
        Ok(node)
    } else {
        parser.mismatch(GrammarRule::RelationalOperator)
    }
}

/// An operand optionally followed by one comparison-like tail, tried in order
pub fn parse_comparison_level(parser: &mut Parser) -> RuleResult<AstNode> {
    let left = parse_concatenation_expression(parser)?;
    for tail in COMPARISON_TAILS {
        if let Some((rule, rest)) = parser.optional(*tail)? {
            let mut children = Vec::with_capacity(rest.len() + 1);
            children.push(left);
            children.extend(rest);
            return Ok(parser.node(rule, children));
        }
    }
    Ok(left)
}

pub fn parse_relational_operator(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::RelationalOperator, |p, c| {
        c.push(p.expect_any(RELATIONAL_OPERATORS, "relational operator")?);
        Ok(())
    })
}

fn relational_tail(parser: &mut Parser) -> RuleResult<(GrammarRule, Vec<AstNode>)> {
    parser.within(GrammarRule::ComparisonExpression, |p| {
        let operator = parse_relational_operator(p)?;
        let right = parse_concatenation_expression(p)?;
        Ok((GrammarRule::ComparisonExpression, vec![operator, right]))
    })
}

fn collection_tail(parser: &mut Parser) -> RuleResult<(GrammarRule, Vec<AstNode>)> {
    parser.within(GrammarRule::ComparisonExpression, |p| {
        let mut c = Vec::new();
        if p.check(TokenType::NOT) {
            c.push(p.advance());
        }
        if p.check_word("MEMBER") {
            c.push(p.advance());
        } else {
            c.push(p.expect_word("SUBMULTISET")?);
        }
        if p.check(TokenType::OF) {
            c.push(p.advance());
        }
        c.push(parse_concatenation_expression(p)?);
        Ok((GrammarRule::ComparisonExpression, c))
    })
}

fn is_null_tail(parser: &mut Parser) -> RuleResult<(GrammarRule, Vec<AstNode>)> {
    parser.within(GrammarRule::IsNullExpression, |p| {
        let mut c = vec![p.expect(TokenType::IS)?];
        if p.check(TokenType::NOT) {
            c.push(p.advance());
        }
        c.push(p.expect(TokenType::NULL)?);
        Ok((GrammarRule::IsNullExpression, c))
    })
}

fn like_tail(parser: &mut Parser) -> RuleResult<(GrammarRule, Vec<AstNode>)> {
    parser.within(GrammarRule::LikeExpression, |p| {
        let mut c = Vec::new();
        if p.check(TokenType::NOT) {
            c.push(p.advance());
        }
        c.push(p.expect(TokenType::LIKE)?);
        c.push(parse_concatenation_expression(p)?);
        p.optional_into(&mut c, |p, c| {
            c.push(p.expect_word("ESCAPE")?);
            c.push(parse_concatenation_expression(p)?);
            Ok(())
        })?;
        Ok((GrammarRule::LikeExpression, c))
    })
}

fn between_tail(parser: &mut Parser) -> RuleResult<(GrammarRule, Vec<AstNode>)> {
    parser.within(GrammarRule::BetweenExpression, |p| {
        let mut c = Vec::new();
        if p.check(TokenType::NOT) {
            c.push(p.advance());
        }
        c.push(p.expect(TokenType::BETWEEN)?);
        c.push(parse_concatenation_expression(p)?);
        c.push(p.expect(TokenType::AND)?);
        c.push(parse_concatenation_expression(p)?);
        Ok((GrammarRule::BetweenExpression, c))
    })
}

fn in_tail(parser: &mut Parser) -> RuleResult<(GrammarRule, Vec<AstNode>)> {
    parser.within(GrammarRule::InExpression, |p| {
        let mut c = Vec::new();
        if p.check(TokenType::NOT) {
            c.push(p.advance());
        }
        c.push(p.expect(TokenType::IN)?);
        c.push(p.expect(TokenType::LeftParen)?);
        if p.check(TokenType::SELECT) {
            c.push(parse_select_expression(p)?);
        } else {
            c.push(parse_expression(p)?);
            p.zero_or_more(&mut c, |p, c| {
                c.push(p.expect(TokenType::COMMA)?);
                c.push(parse_expression(p)?);
                Ok(())
            })?;
        }
        c.push(p.expect(TokenType::RightParen)?);
        Ok((GrammarRule::InExpression, c))
    })
}

pub fn parse_concatenation_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule_skip_single(GrammarRule::ConcatenationExpression, |p, c| {
        c.push(parse_additive_expression(p)?);
        p.zero_or_more(c, |p, c| {
            c.push(p.expect(TokenType::Concat)?);
            c.push(parse_additive_expression(p)?);
            Ok(())
        })
    })
}

pub fn parse_additive_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule_skip_single(GrammarRule::AdditiveExpression, |p, c| {
        c.push(parse_multiplicative_expression(p)?);
        p.zero_or_more(c, |p, c| {
            c.push(p.expect_any(&[TokenType::PLUS, TokenType::MINUS], "'+' or '-'")?);
            c.push(parse_multiplicative_expression(p)?);
            Ok(())
        })
    })
}

pub fn parse_multiplicative_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule_skip_single(GrammarRule::MultiplicativeExpression, |p, c| {
        c.push(parse_unary_expression(p)?);
        p.zero_or_more(c, |p, c| {
            if p.check_word("MOD") {
                c.push(p.advance());
            } else {
                c.push(p.expect_any(&[TokenType::MULTIPLY, TokenType::DIVIDE], "'*' or '/'")?);
            }
            c.push(parse_unary_expression(p)?);
            Ok(())
        })
    })
}

pub fn parse_unary_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    if !parser.check(TokenType::PLUS) && !parser.check(TokenType::MINUS) {
        return parse_exponentiation_expression(parser);
    }
    parser.rule(GrammarRule::UnaryExpression, |p, c| {
        c.push(p.advance());
        c.push(parse_unary_expression(p)?);
        Ok(())
    })
}

pub fn parse_exponentiation_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule_skip_single(GrammarRule::ExponentiationExpression, |p, c| {
        c.push(parse_primary_expression(p)?);
        p.zero_or_more(c, |p, c| {
            c.push(p.expect(TokenType::Exponent)?);
            c.push(parse_primary_expression(p)?);
            Ok(())
        })
    })
}

/// Literals, bracketed expressions and name-based expressions
pub fn parse_primary_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    match parser.current().token_type {
        TokenType::NUMBER
        | TokenType::STRING
        | TokenType::TRUE
        | TokenType::FALSE
        | TokenType::NULL => parse_literal(parser),
        TokenType::LeftParen => parse_bracketed_expression(parser),
        _ => parse_postfix_expression(parser),
    }
}

pub fn parse_literal(parser: &mut Parser) -> RuleResult<AstNode> {
    let rule = match parser.current().token_type {
        TokenType::NUMBER => GrammarRule::NumericLiteral,
        TokenType::STRING => GrammarRule::CharacterLiteral,
        TokenType::TRUE | TokenType::FALSE => GrammarRule::BooleanLiteral,
        TokenType::NULL => GrammarRule::NullLiteral,
        _ => return parser.mismatch("literal"),
    };
    parser.rule(rule, |p, c| {
        c.push(p.advance());
        Ok(())
    })
}

/// `( expression )` or a parenthesized subquery
pub fn parse_bracketed_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::BracketedExpression, |p, c| {
        c.push(p.expect(TokenType::LeftParen)?);
        if p.check(TokenType::SELECT) {
            c.push(parse_select_expression(p)?);
        } else {
            c.push(parse_expression(p)?);
        }
        c.push(p.expect(TokenType::RightParen)?);
        Ok(())
    })
}

pub fn parse_variable_name(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::VariableName, |p, c| {
        c.push(p.expect_identifier()?);
        Ok(())
    })
}

/// `:name` host variable
pub fn parse_bind_variable(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::BindVariable, |p, c| {
        c.push(p.expect(TokenType::COLON)?);
        c.push(p.expect_any(
            &[TokenType::IDENTIFIER, TokenType::QuotedIdentifier, TokenType::NUMBER],
            "bind variable name",
        )?);
        Ok(())
    })
}

/// A variable or bind variable followed by any chain of `.member`,
/// `(arguments)` and `%attribute`
pub fn parse_postfix_expression(parser: &mut Parser) -> RuleResult<AstNode> {
    let mut node = if parser.check(TokenType::COLON) {
        parse_bind_variable(parser)?
    } else {
        parse_variable_name(parser)?
    };

    let mut links = 0;
    loop {
        let token_type = parser.current().token_type;
        let member_follows = is_member_name(parser, 1);
        let rule = match token_type {
            TokenType::DOT if member_follows => GrammarRule::MemberExpression,
            TokenType::PERCENT if member_follows => GrammarRule::AttributeExpression,
            TokenType::LeftParen => GrammarRule::MethodCall,
            _ => return Ok(node),
        };

        links += 1;
        parser.ensure_depth(links)?;
        let children = match rule {
            GrammarRule::MethodCall => vec![node, parse_arguments(parser)?],
            _ => vec![node, parser.advance(), parser.advance()],
        };
        node = parser.node(rule, children);
    }
}

/// Identifiers and keywords are both valid member names (`tab.delete`)
fn is_member_name(parser: &Parser, n: usize) -> bool {
    let token = parser.peek_nth(n);
    is_identifier(token) || token.token_type.is_keyword()
}

pub fn parse_arguments(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::Arguments, |p, c| {
        c.push(p.expect(TokenType::LeftParen)?);
        if !p.check(TokenType::RightParen) {
            c.push(parse_argument(p)?);
            p.zero_or_more(c, |p, c| {
                c.push(p.expect(TokenType::COMMA)?);
                c.push(parse_argument(p)?);
                Ok(())
            })?;
        }
        c.push(p.expect(TokenType::RightParen)?);
        Ok(())
    })
}

/// `expression`, `name => expression`, or `*` as in `count(*)`
pub fn parse_argument(parser: &mut Parser) -> RuleResult<AstNode> {
    parser.rule(GrammarRule::Argument, |p, c| {
        if p.check(TokenType::MULTIPLY) {
            c.push(p.advance());
            return Ok(());
        }
        if p.check_identifier() && p.check_nth(1, TokenType::Association) {
            c.push(p.advance());
            c.push(p.advance());
        }
        c.push(parse_expression(p)?);
        Ok(())
    })
}
