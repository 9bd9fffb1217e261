// Comparison With NULL Check
//
// A relational comparison with NULL never evaluates to TRUE. The condition
// has to use IS [NOT] NULL instead.

use crate::parser::{AstNode, GrammarRule};

use super::check::{Check, CheckContext, CheckMetadata, CheckRegistration};
use super::error::CheckResult;
use super::issue::Severity;

pub const CHECK_KEY: &str = "ComparisonWithNull";

static METADATA: CheckMetadata = CheckMetadata {
    key: CHECK_KEY,
    name: "Comparisons with NULL should use IS NULL",
    message_template: "Fix this comparison or change to \"IS NULL\".",
    severity: Severity::Blocker,
    tags: &["bug"],
    remediation: "5min",
};

#[derive(Debug, Default)]
pub struct ComparisonWithNullCheck;

impl Check for ComparisonWithNullCheck {
    fn metadata(&self) -> &'static CheckMetadata {
        &METADATA
    }

    fn init(&mut self, registration: &mut CheckRegistration) {
        registration.subscribe_to([GrammarRule::ComparisonExpression]);
    }

    fn visit_node(&mut self, node: &AstNode, ctx: &mut CheckContext<'_>) -> CheckResult<()> {
        if !node.has_direct_child(GrammarRule::RelationalOperator) {
            return Ok(());
        }

        let operands = [node.first_child(), node.last_child()];
        if operands
            .iter()
            .flatten()
            .any(|operand| operand.is(GrammarRule::NullLiteral))
        {
            ctx.add_issue(node, &[]);
        }
        Ok(())
    }
}
