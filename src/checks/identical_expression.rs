// Identical Expression Check
//
// Flags comparisons whose two operands are structurally identical, such as
// `x = x`. Such a condition is constant and usually a typo.

use crate::parser::{equal_nodes, AstNode, GrammarRule};

use super::check::{Check, CheckContext, CheckMetadata, CheckRegistration};
use super::engine::missing_child;
use super::error::CheckResult;
use super::issue::Severity;

pub const CHECK_KEY: &str = "IdenticalExpression";

static METADATA: CheckMetadata = CheckMetadata {
    key: CHECK_KEY,
    name: "Identical expressions should not be used on both sides of a binary operator",
    message_template: "Identical sub-expressions on both sides of operator \"{0}\".",
    severity: Severity::Blocker,
    tags: &["bug"],
    remediation: "2min",
};

#[derive(Debug, Default)]
pub struct IdenticalExpressionCheck;

impl Check for IdenticalExpressionCheck {
    fn metadata(&self) -> &'static CheckMetadata {
        &METADATA
    }

    fn init(&mut self, registration: &mut CheckRegistration) {
        registration.subscribe_to([GrammarRule::ComparisonExpression]);
    }

    fn visit_node(&mut self, node: &AstNode, ctx: &mut CheckContext<'_>) -> CheckResult<()> {
        // Collection comparisons (MEMBER OF, SUBMULTISET) have no relational operator
        let Some(operator) = node.first_child_of(GrammarRule::RelationalOperator) else {
            return Ok(());
        };

        let left = node.first_child().ok_or_else(|| missing_child(node, "left operand"))?;
        let right = node.last_child().ok_or_else(|| missing_child(node, "right operand"))?;

        if equal_nodes(left, right) {
            let symbol = operator.token_value().unwrap_or_default();
            ctx.add_issue(left, &[&symbol]).secondary(right, "Original");
        }
        Ok(())
    }
}
