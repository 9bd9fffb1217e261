use anyhow::Result;
use plsql_analyzer::parser::{GrammarRule, ParseError, Parser, DEFAULT_MAX_NESTING_DEPTH};

#[path = "../common/mod.rs"]
mod common;
use common::{assert_matches, assert_not_matches, parse_rule};

#[test]
fn test_for_update_clause() {
    for input in [
        "for update",
        "for update of col",
        "for update of sch.tab.col",
        "for update of col, col2, col3",
        "for update nowait",
        "for update wait 1",
        "for update skip locked",
        "for update of col skip locked",
        "FOR UPDATE OF Col NOWAIT",
    ] {
        assert_matches(GrammarRule::ForUpdateClause, input);
    }

    for input in [
        "for update of",
        "for update of col,",
        "for update wait",
        "for update skip",
        "for update of a.b.c.d",
    ] {
        assert_not_matches(GrammarRule::ForUpdateClause, input);
    }
}

#[test]
fn test_while_statement() {
    assert_matches(GrammarRule::WhileStatement, "while true loop null; end loop;");
    assert_matches(
        GrammarRule::WhileStatement,
        "while true loop while true loop null; end loop; end loop;",
    );
    assert_matches(
        GrammarRule::WhileStatement,
        "<<foo>> while true loop null; end loop foo;",
    );
    assert_matches(
        GrammarRule::WhileStatement,
        "<<foo>> while true loop null; end loop FOO;",
    );
    assert_matches(GrammarRule::WhileStatement, "while x < 10 loop x := x + 1; end loop;");
    assert_matches(GrammarRule::WhileStatement, "while done loop end loop;");

    assert_not_matches(
        GrammarRule::WhileStatement,
        "<<foo>> while true loop null; end loop bar;",
    );
    assert_not_matches(GrammarRule::WhileStatement, "while true loop null; end loop foo;");
    assert_not_matches(GrammarRule::WhileStatement, "while true loop null; end loop");
    assert_not_matches(GrammarRule::WhileStatement, "while loop null; end loop;");
}

fn nested(open: &str, inner: &str, close: &str, depth: usize) -> String {
    format!("{}{}{}", open.repeat(depth), inner, close.repeat(depth))
}

fn is_resource_failure(error: &ParseError) -> bool {
    matches!(
        error,
        ParseError::NestingTooDeep { .. } | ParseError::StackBudgetExceeded { .. }
    )
}

#[test]
fn test_deeply_nested_loops() {
    let input = nested("while true loop ", "null;", " end loop;", 40);
    assert_matches(GrammarRule::WhileStatement, &input);
}

#[test]
fn test_deep_nesting_fails_before_stack_overflow() -> Result<()> {
    let near = DEFAULT_MAX_NESTING_DEPTH - 8;
    let beyond = 4 * DEFAULT_MAX_NESTING_DEPTH;
    let calls = |depth| format!("x := {};", nested("f(", "1", ")", depth));
    let cases = vec![
        ("while", nested("while a loop ", "null;", " end loop;", near), false),
        ("if", nested("if a then ", "null;", " end if;", near), false),
        ("call", calls(DEFAULT_MAX_NESTING_DEPTH / 8 - 2), false),
        ("while", nested("while a loop ", "null;", " end loop;", beyond), true),
        ("if", nested("if a then ", "null;", " end if;", beyond), true),
        ("call", calls(beyond), true),
    ];

    // The default stack size of spawned threads
    let outcomes = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || {
            cases
                .into_iter()
                .map(|(shape, input, too_deep)| {
                    let result = Parser::new(&input).map(|mut parser| parser.parse().map(|_| ()));
                    (shape, too_deep, result)
                })
                .collect::<Vec<_>>()
        })?
        .join()
        .map_err(|_| anyhow::anyhow!("parser thread panicked"))?;

    for (shape, too_deep, result) in outcomes {
        match result? {
            Ok(()) => assert!(!too_deep, "nested {} parsed past the nesting bound", shape),
            Err(error) => assert!(is_resource_failure(&error), "{}: {}", shape, error),
        }
    }
    Ok(())
}

#[test]
fn test_nesting_within_stack_budget_parses() {
    for input in [
        nested("while a loop ", "null;", " end loop;", 60),
        nested("if a then ", "null;", " end if;", 60),
        format!("x := {};", nested("f(", "1", ")", 10)),
    ] {
        let mut parser = Parser::new(&input).unwrap();
        assert!(parser.parse().is_ok(), "{}", input);
    }
}

#[test]
fn test_comparison_expression() {
    for input in [
        "x = x",
        "a != b",
        "a <> b",
        "a ~= b",
        "a ^= b",
        "a < b",
        "a <= b",
        "a > b",
        "a >= b",
        "a + 1 = f(b) || 'x'",
        "t member of tabs",
        "t not submultiset of tabs",
    ] {
        assert_matches(GrammarRule::ComparisonExpression, input);
    }

    assert_not_matches(GrammarRule::ComparisonExpression, "x");
    assert_not_matches(GrammarRule::ComparisonExpression, "x =");
    assert_not_matches(GrammarRule::ComparisonExpression, "x is null");
}

#[test]
fn test_other_conditions() {
    assert_matches(GrammarRule::IsNullExpression, "x is not null");
    assert_matches(GrammarRule::LikeExpression, "name like 'A%' escape '\\'");
    assert_matches(GrammarRule::BetweenExpression, "x not between 1 and 10");
    assert_matches(GrammarRule::InExpression, "x in (1, 2, 3)");
    assert_matches(GrammarRule::InExpression, "x not in (select id from t)");
    assert_matches(GrammarRule::OrExpression, "a = 1 or not b and c > 2");
}

#[test]
fn test_statements() {
    for input in [
        "begin null; end;",
        "<<outer>> declare x number := 1; begin x := x + 1; end outer;",
        "begin null; exception when no_data_found or too_many_rows then null; when others then raise; end;",
        "if a then null; elsif b then null; else null; end if;",
        "loop exit when done; end loop;",
        "<<l>> loop continue l when skip; end loop l;",
        "for i in 1 .. 10 loop null; end loop;",
        "for i in reverse 1..n loop null; end loop;",
        "for r in (select * from emp) loop null; end loop;",
        "for r in c_emp loop null; end loop;",
        "select a into b from t where c = 1 for update;",
        "pkg.proc(1, p_name => 'x');",
        "return;",
        "begin null; end;\n/\nbegin null; end;\n/",
    ] {
        assert_matches(GrammarRule::FileInput, input);
    }

    for input in [
        "begin end;",
        "if a then null; end;",
        "<<l>> loop null; end loop m;",
        "for i in 1 .. loop null; end loop;",
        "x := ;",
    ] {
        assert_not_matches(GrammarRule::FileInput, input);
    }
}

#[test]
fn test_syntax_error_reports_furthest_failure() -> Result<()> {
    let mut parser = Parser::new("begin\n  x := (1 + ;\nend;")?;
    let error = parser.parse().unwrap_err();

    match &error {
        ParseError::Syntax {
            line,
            column,
            found,
            rule_stack,
            ..
        } => {
            assert_eq!(*line, 2);
            assert_eq!(*column, 12);
            assert_eq!(found, "';'");
            assert_eq!(rule_stack.first(), Some(&GrammarRule::FileInput));
            assert!(rule_stack.contains(&GrammarRule::AssignmentStatement));
        }
        other => panic!("Expected a syntax error, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_comparison_tree_shape() -> Result<()> {
    let node = parse_rule(GrammarRule::ComparisonExpression, "x = y")?;
    assert!(node.is(GrammarRule::ComparisonExpression));
    assert_eq!(node.number_of_children(), 3);
    assert!(node.first_child().is_some_and(|n| n.is(GrammarRule::VariableName)));
    assert!(node.child(1).is_some_and(|n| n.is(GrammarRule::RelationalOperator)));
    assert_eq!(node.child(1).and_then(|n| n.token_value()), Some("="));
    assert!(node.last_child().is_some_and(|n| n.is(GrammarRule::VariableName)));
    Ok(())
}
