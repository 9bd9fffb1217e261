use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use plsql_analyzer::checks::{
    all_checks, Check, CheckContext, CheckEngine, CheckError, CheckMetadata, CheckRegistration,
    CheckResult, IdenticalExpressionCheck, Severity,
};
use plsql_analyzer::parser::{AstNode, GrammarRule};

#[path = "../common/mod.rs"]
mod common;
use common::{parse_rule, scan};

#[test]
fn test_identical_expression_in_comparison() -> Result<()> {
    let root = parse_rule(GrammarRule::ComparisonExpression, "x = x")?;
    let mut engine = CheckEngine::new();
    engine.register(Box::new(IdenticalExpressionCheck));
    let outcome = engine.scan(&root);

    assert_eq!(outcome.issues.len(), 1);
    let issue = &outcome.issues[0];
    assert_eq!(issue.check_key, "IdenticalExpression");
    assert_eq!(issue.severity, Severity::Blocker);
    assert_eq!(issue.remediation, "2min");
    assert_eq!(issue.tags, &["bug"]);
    assert!(issue.message.contains("\"=\""));

    // Primary at the left `x`, secondary at the right one
    assert_eq!(issue.primary.span.start.offset, 0);
    assert_eq!(issue.primary.span.end.offset, 1);
    assert_eq!(issue.secondary.len(), 1);
    assert_eq!(issue.secondary[0].span.start.offset, 4);
    assert_eq!(issue.secondary[0].message.as_deref(), Some("Original"));

    let root = parse_rule(GrammarRule::ComparisonExpression, "x = y")?;
    assert!(engine.scan(&root).issues.is_empty());
    Ok(())
}

#[test]
fn test_checks_on_the_same_node_run_in_registration_order() -> Result<()> {
    let outcome = scan("if null = null then null; end if;")?;
    let keys: Vec<&str> = outcome.issues.iter().map(|issue| issue.check_key).collect();
    assert_eq!(keys, vec!["IdenticalExpression", "ComparisonWithNull"]);
    Ok(())
}

#[test]
fn test_issues_follow_traversal_order() -> Result<()> {
    let outcome = scan(
        "begin
           if a = a then
             b := c <> c;
           end if;
           while d >= d loop null; end loop;
         end;",
    )?;
    let lines: Vec<usize> = outcome.issues.iter().map(|issue| issue.primary.line()).collect();
    assert_eq!(lines, vec![2, 3, 5]);
    Ok(())
}

#[test]
fn test_scan_is_deterministic() -> Result<()> {
    let source = "declare x number; begin x := 1; if x = x or y = null then null; end if; end;";
    let first = serde_json::to_string(&scan(source)?)?;
    for _ in 0..5 {
        assert_eq!(serde_json::to_string(&scan(source)?)?, first);
    }
    Ok(())
}

#[test]
fn test_engine_is_reusable_across_units() -> Result<()> {
    let mut engine = CheckEngine::with_checks(all_checks());
    let one = parse_rule(GrammarRule::FileInput, "x := a = a;")?;
    let two = parse_rule(GrammarRule::FileInput, "x := a = b;")?;

    assert_eq!(engine.scan(&one).issues.len(), 1);
    assert!(engine.scan(&two).issues.is_empty());
    assert_eq!(engine.scan(&one).issues.len(), 1);
    Ok(())
}

static COUNTER: CheckMetadata = CheckMetadata {
    key: "Counter",
    name: "Counts visited nodes",
    message_template: "{0} visited {1} time(s), left {2} time(s)",
    severity: Severity::Info,
    tags: &[],
    remediation: "0min",
};

/// Counts enter and leave events per node and reports the totals at the end
/// of the unit
#[derive(Default)]
struct Counter {
    entered: usize,
    left: usize,
}

impl Check for Counter {
    fn metadata(&self) -> &'static CheckMetadata {
        &COUNTER
    }

    fn init(&mut self, registration: &mut CheckRegistration) {
        registration.subscribe_to([GrammarRule::VariableName]);
    }

    fn visit_file(&mut self, _root: &AstNode, _ctx: &mut CheckContext<'_>) -> CheckResult<()> {
        self.entered = 0;
        self.left = 0;
        Ok(())
    }

    fn visit_node(&mut self, _node: &AstNode, _ctx: &mut CheckContext<'_>) -> CheckResult<()> {
        self.entered += 1;
        Ok(())
    }

    fn leave_node(&mut self, _node: &AstNode, _ctx: &mut CheckContext<'_>) -> CheckResult<()> {
        self.left += 1;
        Ok(())
    }

    fn leave_file(&mut self, root: &AstNode, ctx: &mut CheckContext<'_>) -> CheckResult<()> {
        ctx.add_issue(root, &[&"VARIABLE_NAME", &self.entered, &self.left]);
        Ok(())
    }
}

#[test]
fn test_every_subscribed_node_is_visited_once() -> Result<()> {
    let source = "begin a := b + c; for i in 1 .. n loop d(e, f.g); end loop; end;";
    let root = parse_rule(GrammarRule::FileInput, source)?;
    let expected = root
        .descendants()
        .filter(|node| node.is(GrammarRule::VariableName))
        .count();

    let mut engine = CheckEngine::new();
    engine.register(Box::new(Counter::default()));
    let outcome = engine.scan(&root);

    assert_eq!(outcome.issues.len(), 1);
    assert_eq!(
        outcome.issues[0].message,
        format!("VARIABLE_NAME visited {} time(s), left {} time(s)", expected, expected)
    );
    Ok(())
}

static FAILING: CheckMetadata = CheckMetadata {
    key: "Failing",
    name: "Fails on the second comparison",
    message_template: "comparison",
    severity: Severity::Minor,
    tags: &[],
    remediation: "1min",
};

#[derive(Default)]
struct FailOnSecond {
    seen: usize,
}

impl Check for FailOnSecond {
    fn metadata(&self) -> &'static CheckMetadata {
        &FAILING
    }

    fn init(&mut self, registration: &mut CheckRegistration) {
        registration.subscribe_to([GrammarRule::ComparisonExpression]);
    }

    fn visit_file(&mut self, _root: &AstNode, _ctx: &mut CheckContext<'_>) -> CheckResult<()> {
        self.seen = 0;
        Ok(())
    }

    fn visit_node(&mut self, node: &AstNode, ctx: &mut CheckContext<'_>) -> CheckResult<()> {
        self.seen += 1;
        ctx.add_issue(node, &[]);
        if self.seen == 2 {
            return Err(CheckError::Failed("unexpected comparison".to_string()));
        }
        Ok(())
    }
}

#[test]
fn test_failing_check_is_isolated() -> Result<()> {
    let root = parse_rule(
        GrammarRule::FileInput,
        "x := a = a;\nx := b = b;\nx := c = c;",
    )?;
    let mut engine = CheckEngine::new();
    engine.register(Box::new(FailOnSecond::default()));
    engine.register(Box::new(IdenticalExpressionCheck));
    let outcome = engine.scan(&root);

    // One issue before the failure; the one reported by the failing call is dropped
    let failing: Vec<_> = outcome.issues.iter().filter(|i| i.check_key == "Failing").collect();
    assert_eq!(failing.len(), 1);
    assert_eq!(failing[0].primary.line(), 1);

    // The other check keeps running over the whole unit
    let identical = outcome
        .issues
        .iter()
        .filter(|i| i.check_key == "IdenticalExpression")
        .count();
    assert_eq!(identical, 3);

    assert_eq!(outcome.diagnostics.len(), 1);
    let diagnostic = &outcome.diagnostics[0];
    assert_eq!(diagnostic.check_key, "Failing");
    assert_eq!(diagnostic.line, 2);
    assert_eq!(diagnostic.message, "unexpected comparison");

    // The check is enabled again for the next unit
    let outcome = engine.scan(&root);
    assert_eq!(outcome.diagnostics.len(), 1);
    Ok(())
}

/// Random expression over a small vocabulary
fn random_expression(rng: &mut StdRng, depth: usize) -> String {
    if depth == 0 || rng.gen_bool(0.3) {
        return match rng.gen_range(0..4) {
            0 => format!("v{}", rng.gen_range(0..3)),
            1 => rng.gen_range(0..10).to_string(),
            2 => format!("'s{}'", rng.gen_range(0..3)),
            _ => format!("f(v{})", rng.gen_range(0..3)),
        };
    }
    let operator = ["+", "-", "*", "/", "||"][rng.gen_range(0..5)];
    let left = random_expression(rng, depth - 1);
    let right = random_expression(rng, depth - 1);
    if rng.gen_bool(0.5) {
        format!("({} {} {})", left, operator, right)
    } else {
        format!("{} {} {}", left, operator, right)
    }
}

#[test]
fn test_identical_random_expressions_are_flagged() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let expression = random_expression(&mut rng, 4);
        let other = random_expression(&mut rng, 4);

        let same = scan(&format!("x := {} = {};", expression, expression))?;
        assert_eq!(same.issues.len(), 1, "not flagged: {}", expression);

        let different = scan(&format!("x := {} = {};", expression, other))?;
        let flagged = !different.issues.is_empty();
        assert_eq!(flagged, expression.replace(' ', "") == other.replace(' ', ""));
    }
    Ok(())
}
