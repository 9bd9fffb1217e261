use anyhow::{anyhow, Result};
use plsql_analyzer::checks::{all_checks, CheckEngine, ScanOutcome};
use plsql_analyzer::parser::{AstNode, GrammarRule, Parser};

// Assert that the whole input matches the rule
#[allow(dead_code)]
pub fn assert_matches(rule: GrammarRule, input: &str) {
    assert!(Parser::matches(input, rule), "{} should match: {:?}", rule, input);
}

// Assert that the input does not match the rule
#[allow(dead_code)]
pub fn assert_not_matches(rule: GrammarRule, input: &str) {
    assert!(!Parser::matches(input, rule), "{} should not match: {:?}", rule, input);
}

// Parse the input starting at the given rule
#[allow(dead_code)]
pub fn parse_rule(rule: GrammarRule, input: &str) -> Result<AstNode> {
    let mut parser = Parser::new(input).map_err(|e| anyhow!("Lex error: {}", e))?;
    parser.parse_rule(rule).map_err(|e| anyhow!("Parse error: {}", e))
}

// Parse a compilation unit and run the built-in checks over it
#[allow(dead_code)]
pub fn scan(input: &str) -> Result<ScanOutcome> {
    let root = parse_rule(GrammarRule::FileInput, input)?;
    Ok(CheckEngine::with_checks(all_checks()).scan(&root))
}
