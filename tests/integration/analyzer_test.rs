use anyhow::Result;
use plsql_analyzer::parser::ParseError;
use plsql_analyzer::{AnalysisError, Analyzer, AnalyzerConfig, SourceUnit};

fn analyzer(threads: usize) -> Analyzer {
    Analyzer::new(AnalyzerConfig {
        threads,
        ..AnalyzerConfig::default()
    })
}

fn units(count: usize) -> Vec<SourceUnit> {
    (0..count)
        .map(|i| {
            let text = if i % 5 == 3 {
                format!("begin x := {} +; end;", i)
            } else {
                // Unit i holds i identical comparisons
                "x := a = a;\n".repeat(i)
            };
            SourceUnit::new(format!("unit_{}.sql", i), text)
        })
        .collect()
}

#[test]
fn test_parallel_analysis_matches_sequential() -> Result<()> {
    let units = units(40);
    let sequential = analyzer(1).analyze_all(&units);
    let parallel = analyzer(8).analyze_all(&units);

    assert_eq!(sequential.len(), units.len());
    assert_eq!(parallel.len(), units.len());
    for (i, (s, p)) in sequential.iter().zip(&parallel).enumerate() {
        assert_eq!(s.name, units[i].name);
        assert_eq!(p.name, units[i].name);
        assert_eq!(s.is_failure(), p.is_failure());
        assert_eq!(s.issues(), p.issues());
        assert_eq!(
            serde_json::to_string(s.issues())?,
            serde_json::to_string(p.issues())?
        );
    }
    Ok(())
}

#[test]
fn test_unit_failures_are_reported_per_unit() {
    let units = units(10);
    let reports = analyzer(3).analyze_all(&units);

    for (i, report) in reports.iter().enumerate() {
        if i % 5 == 3 {
            match &report.outcome {
                Err(error @ AnalysisError::Parse(_)) => {
                    assert_eq!(error.position().map(|(line, _)| line), Some(1));
                }
                other => panic!("{}: expected a parse failure, got {:?}", report.name, other),
            }
        } else {
            assert_eq!(report.issues().len(), i, "{}", report.name);
        }
    }
}

#[test]
fn test_empty_input() {
    assert!(analyzer(4).analyze_all(&[]).is_empty());

    let report = analyzer(1).analyze(&SourceUnit::new("empty.sql", "  -- nothing here\n"));
    assert!(report.outcome.is_ok());
    assert!(report.issues().is_empty());
}

#[test]
fn test_deep_units_on_workers() {
    let whiles = |depth: usize| {
        format!(
            "{}x := a = a;{}",
            "while a loop ".repeat(depth),
            " end loop;".repeat(depth)
        )
    };
    let units = vec![
        SourceUnit::new("whiles.sql", whiles(400)),
        SourceUnit::new("calls.sql", format!("x := {}1{};", "f(".repeat(50), ")".repeat(50))),
        SourceUnit::new("too_deep.sql", whiles(2000)),
    ];

    for threads in [1, 3] {
        let reports = analyzer(threads).analyze_all(&units);
        assert_eq!(reports[0].issues().len(), 1);
        assert!(reports[1].outcome.is_ok());
        assert!(matches!(
            reports[2].outcome,
            Err(AnalysisError::Parse(
                ParseError::NestingTooDeep { .. } | ParseError::StackBudgetExceeded { .. }
            ))
        ));
    }
}

#[test]
fn test_worker_stack_size_bounds_parsing() {
    let text = format!("{}null;{}", "while a loop ".repeat(400), " end loop;".repeat(400));
    let analyzer = Analyzer::new(AnalyzerConfig {
        threads: 1,
        worker_stack_size: 512 * 1024,
        ..AnalyzerConfig::default()
    });
    let reports = analyzer.analyze_all(&[SourceUnit::new("deep.sql", text)]);
    assert!(matches!(
        reports[0].outcome,
        Err(AnalysisError::Parse(ParseError::StackBudgetExceeded { budget, .. })) if budget == 384 * 1024
    ));
}
