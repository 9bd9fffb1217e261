// Check Contract
//
// A check advertises its metadata, subscribes to node kinds once at
// registration and is then called back by the engine for every matching node
// of each unit it scans.

use std::fmt;

use crate::parser::{AstNode, NodeKind};

use super::error::CheckResult;
use super::issue::{Issue, IssueLocation, Severity};

/// Catalog entry of a check. The engine copies these values into issues
/// without interpreting them.
#[derive(Debug)]
pub struct CheckMetadata {
    /// Stable identifier, e.g. "IdenticalExpression"
    pub key: &'static str,
    pub name: &'static str,
    /// Issue message with positional `{0}`, `{1}`, ... placeholders
    pub message_template: &'static str,
    pub severity: Severity,
    pub tags: &'static [&'static str],
    pub remediation: &'static str,
}

/// Node kinds a check subscribes to, filled in by [`Check::init`]
#[derive(Debug, Default)]
pub struct CheckRegistration {
    kinds: Vec<NodeKind>,
}

impl CheckRegistration {
    pub fn subscribe_to<K: Into<NodeKind>>(&mut self, kinds: impl IntoIterator<Item = K>) -> &mut Self {
        for kind in kinds {
            let kind = kind.into();
            if !self.kinds.contains(&kind) {
                self.kinds.push(kind);
            }
        }
        self
    }

    pub fn kinds(&self) -> &[NodeKind] {
        &self.kinds
    }
}

pub trait Check: Send {
    fn metadata(&self) -> &'static CheckMetadata;

    /// Declare the subscribed node kinds. Called once when the check is
    /// registered.
    fn init(&mut self, registration: &mut CheckRegistration);

    /// Start of a unit. Checks holding state reset it here.
    fn visit_file(&mut self, _root: &AstNode, _ctx: &mut CheckContext<'_>) -> CheckResult<()> {
        Ok(())
    }

    /// Enter event for a node of a subscribed kind
    fn visit_node(&mut self, node: &AstNode, ctx: &mut CheckContext<'_>) -> CheckResult<()>;

    /// Leave event for a node of a subscribed kind, after all of its
    /// descendants
    fn leave_node(&mut self, _node: &AstNode, _ctx: &mut CheckContext<'_>) -> CheckResult<()> {
        Ok(())
    }

    fn leave_file(&mut self, _root: &AstNode, _ctx: &mut CheckContext<'_>) -> CheckResult<()> {
        Ok(())
    }
}

/// Issue-reporting handle passed to check callbacks
pub struct CheckContext<'a> {
    metadata: &'static CheckMetadata,
    issues: &'a mut Vec<Issue>,
}

impl<'a> CheckContext<'a> {
    pub(crate) fn new(metadata: &'static CheckMetadata, issues: &'a mut Vec<Issue>) -> Self {
        CheckContext { metadata, issues }
    }

    /// Report an issue anchored at `node`. The message is the check's
    /// template with `args` substituted.
    pub fn add_issue(&mut self, node: &AstNode, args: &[&dyn fmt::Display]) -> IssueBuilder<'_> {
        let message = format_message(self.metadata.message_template, args);
        self.add_issue_with_message(node, message)
    }

    /// Report an issue with an explicit message instead of the template
    pub fn add_issue_with_message(&mut self, node: &AstNode, message: impl Into<String>) -> IssueBuilder<'_> {
        self.issues.push(Issue {
            check_key: self.metadata.key,
            severity: self.metadata.severity,
            tags: self.metadata.tags,
            message: message.into(),
            primary: IssueLocation::new(node.span(), None),
            secondary: Vec::new(),
            remediation: self.metadata.remediation,
        });
        let index = self.issues.len() - 1;
        IssueBuilder {
            issue: &mut self.issues[index],
        }
    }
}

/// Attaches secondary locations to a freshly reported issue
pub struct IssueBuilder<'a> {
    issue: &'a mut Issue,
}

impl<'a> IssueBuilder<'a> {
    pub fn secondary(self, node: &AstNode, message: impl Into<String>) -> Self {
        self.issue
            .secondary
            .push(IssueLocation::new(node.span(), Some(message.into())));
        self
    }
}

/// Substitute `{0}`, `{1}`, ... in `template`
pub fn format_message(template: &str, args: &[&dyn fmt::Display]) -> String {
    args.iter()
        .enumerate()
        .fold(template.to_string(), |message, (index, arg)| {
            message.replace(&format!("{{{}}}", index), &arg.to_string())
        })
}
