use anyhow::Result;
use plsql_analyzer::parser::{equal_nodes, GrammarRule, TokenType};

#[path = "../common/mod.rs"]
mod common;
use common::parse_rule;

fn operands_equal(input: &str) -> Result<bool> {
    let node = parse_rule(GrammarRule::ComparisonExpression, input)?;
    let left = node.first_child().expect("left operand");
    let right = node.last_child().expect("right operand");
    Ok(equal_nodes(left, right))
}

#[test]
fn test_equality_ignores_position_and_layout() -> Result<()> {
    assert!(operands_equal("a+b*c = a +\n  b * c")?);
    assert!(operands_equal("f(x, 'y') = f( x ,'y' )")?);
    assert!(operands_equal("t.col%type = t.col%type")?);
    Ok(())
}

#[test]
fn test_equality_case_rules() -> Result<()> {
    // Plain identifiers and keywords are case-insensitive
    assert!(operands_equal("Total = TOTAL")?);
    assert!(operands_equal("NULL = null")?);
    assert!(operands_equal("1E3 = 1e3")?);
    // Quoted identifiers and strings are not
    assert!(!operands_equal("\"Total\" = \"TOTAL\"")?);
    assert!(!operands_equal("'abc' = 'ABC'")?);
    Ok(())
}

#[test]
fn test_equality_is_structural() -> Result<()> {
    assert!(!operands_equal("a + b = b + a")?);
    assert!(!operands_equal("(a) = a")?);
    assert!(!operands_equal("f(a) = f(a, b)")?);
    assert!(!operands_equal("x = :x")?);
    Ok(())
}

#[test]
fn test_spans_cover_source_text() -> Result<()> {
    let input = "begin\n  x := a + b;\nend;";
    let root = parse_rule(GrammarRule::FileInput, input)?;

    for node in root.descendants() {
        let span = node.span();
        assert!(span.start <= span.end);
        assert!(span.end.offset <= input.len());
    }

    let additive = root
        .descendants()
        .find(|node| node.is(GrammarRule::AdditiveExpression))
        .expect("additive expression");
    let span = additive.span();
    assert_eq!(&input[span.start.offset..span.end.offset], "a + b");
    assert_eq!((span.start.line, span.start.column), (2, 7));
    Ok(())
}

#[test]
fn test_navigation() -> Result<()> {
    let root = parse_rule(
        GrammarRule::FileInput,
        "if a then null; elsif b then null; elsif c then null; else null; end if;",
    )?;
    let statement = root.first_child().expect("if statement");
    assert!(statement.is(GrammarRule::IfStatement));
    assert_eq!(statement.children_of(GrammarRule::ElsifClause).count(), 2);
    assert!(statement.has_direct_child(GrammarRule::ElseClause));
    assert!(statement.first_child().is_some_and(|n| n.is(TokenType::IF)));
    assert_eq!(statement.token_value(), Some("if"));

    let words: Vec<&str> = statement
        .tokens()
        .filter(|token| token.token_type == TokenType::IDENTIFIER)
        .map(|token| token.literal.as_str())
        .collect();
    assert_eq!(words, vec!["a", "b", "c"]);
    Ok(())
}
