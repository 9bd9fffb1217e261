// Analyzer Implementation
//
// Runs the per-unit pipeline (lex, parse, scan) and fans independent units
// out over worker threads. Every worker owns its own check engine, so units
// never share mutable state.
//
// Parsing is recursive and unoptimized builds need up to about 16 KiB of
// stack per nesting level. Workers are spawned with `worker_stack_size` and
// parse with three quarters of it as their stack budget. Units analyzed on
// the caller's thread get `DEFAULT_STACK_BUDGET`, which fits a 2 MiB thread.

use crossbeam::channel;
use log::{debug, warn};
use parking_lot::Mutex;
use thiserror::Error;

use crate::checks::{all_checks, Check, CheckEngine, Issue, ScanOutcome};
use crate::parser::{
    AstNode, LexError, ParseError, Parser, DEFAULT_MAX_NESTING_DEPTH, DEFAULT_STACK_BUDGET,
};

/// Default stack size of analysis workers, enough to parse up to
/// [`DEFAULT_MAX_NESTING_DEPTH`] in unoptimized builds
pub const DEFAULT_WORKER_STACK_SIZE: usize = 16 * 1024 * 1024;

/// Unit-level failures. They end the analysis of that unit only.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),

    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),

    #[error("analysis worker terminated unexpectedly")]
    WorkerFailed,
}

impl AnalysisError {
    /// Source position of the failure, when it has one
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            AnalysisError::Lex(e) => Some((e.line(), e.column())),
            AnalysisError::Parse(e) => Some((e.line(), e.column())),
            AnalysisError::WorkerFailed => None,
        }
    }
}

/// Analyzer configuration
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Maximum grammar-rule nesting while parsing
    pub max_nesting_depth: usize,
    /// Number of worker threads used by [`Analyzer::analyze_all`]
    pub threads: usize,
    /// Stack size of each worker thread, in bytes
    pub worker_stack_size: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            worker_stack_size: DEFAULT_WORKER_STACK_SIZE,
        }
    }
}

/// One source file (or any other independent piece of source text)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub name: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        SourceUnit {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Result of analyzing one unit
#[derive(Debug)]
pub struct UnitReport {
    pub name: String,
    pub outcome: Result<ScanOutcome, AnalysisError>,
}

impl UnitReport {
    /// Issues of a successful unit; empty when the unit failed
    pub fn issues(&self) -> &[Issue] {
        match &self.outcome {
            Ok(outcome) => &outcome.issues,
            Err(_) => &[],
        }
    }

    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}

/// Builds the checks for one engine
pub type CheckFactory = fn() -> Vec<Box<dyn Check>>;

pub struct Analyzer {
    config: AnalyzerConfig,
    checks: CheckFactory,
}

impl Analyzer {
    /// Create an analyzer running the built-in checks
    pub fn new(config: AnalyzerConfig) -> Self {
        Self::with_checks(config, all_checks)
    }

    pub fn with_checks(config: AnalyzerConfig, checks: CheckFactory) -> Self {
        Analyzer { config, checks }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// A fresh engine with this analyzer's checks registered
    pub fn engine(&self) -> CheckEngine {
        CheckEngine::with_checks((self.checks)())
    }

    /// Parse a whole unit on the calling thread with the configured nesting
    /// bound and [`DEFAULT_STACK_BUDGET`]
    pub fn parse(&self, text: &str) -> Result<AstNode, AnalysisError> {
        self.parse_within(text, DEFAULT_STACK_BUDGET)
    }

    fn parse_within(&self, text: &str, stack_budget: usize) -> Result<AstNode, AnalysisError> {
        let mut parser = Parser::new(text)?
            .with_max_depth(self.config.max_nesting_depth)
            .with_stack_budget(stack_budget);
        debug!("Lexed {} token(s)", parser.tokens().len());
        Ok(parser.parse()?)
    }

    /// Stack budget of a parse running on a worker thread
    fn worker_stack_budget(&self) -> usize {
        self.config.worker_stack_size / 4 * 3
    }

    pub fn analyze(&self, unit: &SourceUnit) -> UnitReport {
        let mut engine = self.engine();
        self.analyze_with(&mut engine, unit)
    }

    /// Analyze `unit` on the calling thread with an existing engine. The
    /// engine can be reused for any number of units.
    pub fn analyze_with(&self, engine: &mut CheckEngine, unit: &SourceUnit) -> UnitReport {
        self.run(engine, unit, DEFAULT_STACK_BUDGET)
    }

    fn run(&self, engine: &mut CheckEngine, unit: &SourceUnit, stack_budget: usize) -> UnitReport {
        debug!("Analyzing {}", unit.name);
        let outcome = self.parse_within(&unit.text, stack_budget).map(|root| {
            debug!("{}: {} node(s)", unit.name, root.descendants().count());
            engine.scan(&root)
        });
        match &outcome {
            Ok(scan) => debug!("{}: {} issue(s)", unit.name, scan.issues.len()),
            Err(e) => warn!("Analysis of {} failed: {}", unit.name, e),
        }
        UnitReport {
            name: unit.name.clone(),
            outcome,
        }
    }

    /// Analyze independent units on worker threads. Reports come back in
    /// the order of `units`.
    pub fn analyze_all(&self, units: &[SourceUnit]) -> Vec<UnitReport> {
        let workers = self.config.threads.clamp(1, units.len().max(1));
        let stack_budget = self.worker_stack_budget();

        let slots: Vec<Mutex<Option<UnitReport>>> = units.iter().map(|_| Mutex::new(None)).collect();
        let (sender, receiver) = channel::unbounded();
        for index in 0..units.len() {
            // The receiver is still held here, so sending cannot fail
            let _ = sender.send(index);
        }
        drop(sender);

        debug!("Analyzing {} unit(s) on {} worker(s)", units.len(), workers);
        let result = crossbeam::scope(|scope| {
            for id in 0..workers {
                let receiver = receiver.clone();
                let slots = &slots;
                let spawned = scope
                    .builder()
                    .name(format!("analyzer-{}", id))
                    .stack_size(self.config.worker_stack_size)
                    .spawn(move |_| {
                        let mut engine = self.engine();
                        for index in receiver.iter() {
                            let report = self.run(&mut engine, &units[index], stack_budget);
                            *slots[index].lock() = Some(report);
                        }
                    });
                if let Err(e) = spawned {
                    warn!("Failed to spawn analysis worker {}: {}", id, e);
                }
            }
        });
        if result.is_err() {
            warn!("An analysis worker panicked");
        }

        slots
            .into_iter()
            .zip(units)
            .map(|(slot, unit)| {
                slot.into_inner().unwrap_or_else(|| UnitReport {
                    name: unit.name.clone(),
                    outcome: Err(AnalysisError::WorkerFailed),
                })
            })
            .collect()
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}
