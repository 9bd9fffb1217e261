// Check Engine Implementation
//
// The engine walks the AST of one unit depth-first and pre-order. At each
// node it calls the checks subscribed to the node's kind, in registration
// order. Leave events fire after the node's subtree, in reverse registration
// order. The walk uses an explicit stack so deeply nested trees cannot
// overflow the call stack.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use log::{debug, warn};
use serde::Serialize;

use crate::parser::{AstNode, NodeKind};

use super::check::{Check, CheckContext, CheckMetadata, CheckRegistration};
use super::error::{CheckError, CheckResult};
use super::issue::{CheckDiagnostic, Issue};

/// Everything one scan produced, in traversal order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub issues: Vec<Issue>,
    pub diagnostics: Vec<CheckDiagnostic>,
}

#[derive(Clone, Copy)]
enum Hook {
    VisitFile,
    Enter,
    Leave,
    LeaveFile,
}

enum Event<'a> {
    Enter(&'a AstNode),
    Leave(&'a AstNode),
}

/// Per-scan state. Built fresh for every unit.
struct ScanState {
    outcome: ScanOutcome,
    disabled: Vec<bool>,
}

/// Dispatches AST nodes to the registered checks
#[derive(Default)]
pub struct CheckEngine {
    checks: Vec<Box<dyn Check>>,
    subscriptions: HashMap<NodeKind, Vec<usize>>,
}

impl CheckEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with `checks` registered in order
    pub fn with_checks(checks: Vec<Box<dyn Check>>) -> Self {
        let mut engine = Self::new();
        for check in checks {
            engine.register(check);
        }
        engine
    }

    /// Register a check. Its subscriptions are read once, here.
    pub fn register(&mut self, mut check: Box<dyn Check>) -> &mut Self {
        let mut registration = CheckRegistration::default();
        check.init(&mut registration);

        let index = self.checks.len();
        for &kind in registration.kinds() {
            self.subscriptions.entry(kind).or_default().push(index);
        }
        debug!(
            "Registered check {} for {} node kind(s)",
            check.metadata().key,
            registration.kinds().len()
        );
        self.checks.push(check);
        self
    }

    /// Metadata of the registered checks, in registration order
    pub fn checks(&self) -> impl Iterator<Item = &'static CheckMetadata> + '_ {
        self.checks.iter().map(|check| check.metadata())
    }

    pub fn is_subscribed(&self, kind: impl Into<NodeKind>) -> bool {
        self.subscriptions.contains_key(&kind.into())
    }

    /// Run all checks over one unit.
    ///
    /// The result depends only on the tree and the registered checks. A check
    /// that fails is disabled for the rest of the scan; its failure becomes a
    /// diagnostic and the issues it reported during the failing callback are
    /// discarded.
    pub fn scan(&mut self, root: &AstNode) -> ScanOutcome {
        let mut state = ScanState {
            outcome: ScanOutcome::default(),
            disabled: vec![false; self.checks.len()],
        };
        let all: Vec<usize> = (0..self.checks.len()).collect();

        run_hook(&mut self.checks, &all, root, Hook::VisitFile, &mut state);

        let mut stack = vec![Event::Enter(root)];
        while let Some(event) = stack.pop() {
            match event {
                Event::Enter(node) => {
                    if let Some(subscribers) = self.subscriptions.get(&node.kind()) {
                        run_hook(&mut self.checks, subscribers, node, Hook::Enter, &mut state);
                        stack.push(Event::Leave(node));
                    }
                    stack.extend(node.children().iter().rev().map(Event::Enter));
                }
                Event::Leave(node) => {
                    if let Some(subscribers) = self.subscriptions.get(&node.kind()) {
                        run_hook(&mut self.checks, subscribers, node, Hook::Leave, &mut state);
                    }
                }
            }
        }

        run_hook(&mut self.checks, &all, root, Hook::LeaveFile, &mut state);

        debug!(
            "Scan finished: {} issue(s), {} check failure(s)",
            state.outcome.issues.len(),
            state.outcome.diagnostics.len()
        );
        state.outcome
    }
}

fn run_hook(
    checks: &mut [Box<dyn Check>],
    subscribers: &[usize],
    node: &AstNode,
    hook: Hook,
    state: &mut ScanState,
) {
    let order: Box<dyn Iterator<Item = &usize>> = match hook {
        Hook::Leave | Hook::LeaveFile => Box::new(subscribers.iter().rev()),
        Hook::VisitFile | Hook::Enter => Box::new(subscribers.iter()),
    };

    for &index in order {
        if state.disabled[index] {
            continue;
        }
        let check = &mut checks[index];
        let metadata = check.metadata();
        let mark = state.outcome.issues.len();

        let result = {
            let mut ctx = CheckContext::new(metadata, &mut state.outcome.issues);
            // A panicking check is treated like one that returned an error
            panic::catch_unwind(AssertUnwindSafe(|| call(check.as_mut(), node, hook, &mut ctx)))
                .unwrap_or_else(|payload| Err(CheckError::Panicked(panic_message(payload))))
        };

        if let Err(error) = result {
            state.outcome.issues.truncate(mark);
            state.disabled[index] = true;
            let position = node.span().start;
            warn!(
                "Check {} disabled for the rest of the unit: {}",
                metadata.key, error
            );
            state.outcome.diagnostics.push(CheckDiagnostic {
                check_key: metadata.key,
                message: error.to_string(),
                line: position.line,
                column: position.column,
            });
        }
    }
}

fn call(check: &mut dyn Check, node: &AstNode, hook: Hook, ctx: &mut CheckContext<'_>) -> CheckResult<()> {
    match hook {
        Hook::VisitFile => check.visit_file(node, ctx),
        Hook::Enter => check.visit_node(node, ctx),
        Hook::Leave => check.leave_node(node, ctx),
        Hook::LeaveFile => check.leave_file(node, ctx),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_string(),
            Err(_) => "unknown panic payload".to_string(),
        },
    }
}

/// Error for a node that lacks a child the check relies on
pub fn missing_child(node: &AstNode, expected: &'static str) -> CheckError {
    CheckError::MissingChild {
        node: node.kind(),
        expected,
        line: node.span().start.line,
    }
}
