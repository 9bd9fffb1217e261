use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use plsql_analyzer::checks::{all_checks, Issue};
use plsql_analyzer::parser::DEFAULT_MAX_NESTING_DEPTH;
use plsql_analyzer::analyzer::DEFAULT_WORKER_STACK_SIZE;
use plsql_analyzer::{Analyzer, AnalyzerConfig, SourceUnit, UnitReport};

#[derive(Parser)]
#[command(author, version, about = "Static analysis for PL/SQL source files")]
struct Cli {
    /// Number of worker threads (defaults to the number of CPUs)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Maximum grammar nesting depth before a file is rejected
    #[arg(long, default_value_t = DEFAULT_MAX_NESTING_DEPTH)]
    max_depth: usize,

    /// Stack size of each worker thread in MiB. Deeply nested files need
    /// more stack before they reach the nesting depth.
    #[arg(long, default_value_t = DEFAULT_WORKER_STACK_SIZE >> 20)]
    stack_mib: usize,

    /// List the available checks and exit
    #[arg(long)]
    list_checks: bool,

    /// Source files to analyze
    #[arg(required_unless_present = "list_checks")]
    files: Vec<PathBuf>,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.list_checks {
        for check in all_checks() {
            let metadata = check.metadata();
            println!(
                "{:<24} {:<8} {:<6} {} [{}]",
                metadata.key,
                metadata.severity,
                metadata.remediation,
                metadata.name,
                metadata.tags.join(", ")
            );
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = AnalyzerConfig {
        max_nesting_depth: cli.max_depth,
        worker_stack_size: cli.stack_mib.saturating_mul(1024 * 1024),
        ..AnalyzerConfig::default()
    };
    if let Some(threads) = cli.threads {
        config.threads = threads;
    }

    let units = cli
        .files
        .iter()
        .map(|path| {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(SourceUnit::new(path.display().to_string(), text))
        })
        .collect::<Result<Vec<_>>>()?;

    let reports = Analyzer::new(config).analyze_all(&units);

    let mut failed = false;
    for report in &reports {
        failed |= print_report(report);
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Print one unit's findings; returns whether the unit failed
fn print_report(report: &UnitReport) -> bool {
    match &report.outcome {
        Ok(outcome) => {
            for issue in &outcome.issues {
                print_issue(&report.name, issue);
            }
            for diagnostic in &outcome.diagnostics {
                eprintln!("{}: warning: {}", report.name, diagnostic);
            }
            false
        }
        Err(e) => {
            eprintln!("{}: error: {}", report.name, e);
            true
        }
    }
}

fn print_issue(file: &str, issue: &Issue) {
    // Columns are shown 1-based, like compilers and editors do
    println!(
        "{}:{}:{}: {} [{}] {}",
        file,
        issue.primary.line(),
        issue.primary.column() + 1,
        issue.severity,
        issue.check_key,
        issue.message
    );
    for secondary in &issue.secondary {
        println!(
            "    {}:{}:{}: {}",
            file,
            secondary.line(),
            secondary.column() + 1,
            secondary.message.as_deref().unwrap_or_default()
        );
    }
}
