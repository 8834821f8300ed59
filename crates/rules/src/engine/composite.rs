//! AND / OR groups and conditional (switch) groups.

use serde_json::Value;
use tracing::debug;

use crate::combiner::MessageCombiner;
use crate::outcome::{MessageMap, MessageValue, ValidationOutcome};
use crate::schema::{GroupType, RuleConfiguration};

use super::{merge_failures, Result, ValidationEngine};

/// Header placed above the merged sub-messages of a failed OR group.
pub const OR_FAILURE_HEADER: &str = "at least one of these conditions must match";
pub const OR_HEADER_KEY: &str = "condition";
pub const OR_MESSAGES_KEY: &str = "messages";

impl ValidationEngine {
    pub(super) fn evaluate_composite(
        &self,
        rule: &RuleConfiguration,
        group: GroupType,
        sub_rules: &[RuleConfiguration],
        conditional: bool,
        context: &Value,
        depth: usize,
    ) -> Result<ValidationOutcome> {
        if conditional {
            return self.evaluate_switch(sub_rules, context, depth);
        }

        let outcomes =
            self.map_ordered(sub_rules, |sub_rule| self.evaluate_node(sub_rule, context, depth + 1))?;

        match group {
            // Failures stay itemised under each sub-rule's own keys.
            GroupType::And => Ok(merge_failures(outcomes)),
            GroupType::Or => {
                if outcomes.iter().any(ValidationOutcome::is_valid) {
                    return Ok(ValidationOutcome::valid());
                }
                debug!(rule_target = %rule.target, branches = outcomes.len(), "every OR branch failed");
                let merged =
                    MessageCombiner::or().combine(outcomes.into_iter().map(ValidationOutcome::into_messages));
                Ok(or_failure(&rule.target, merged))
            }
        }
    }

    /// If / else-if chain: the first sub-rule whose condition holds is the
    /// only one evaluated. Later branches are not touched, not even their
    /// conditions. No matching branch is a pass.
    fn evaluate_switch(
        &self,
        sub_rules: &[RuleConfiguration],
        context: &Value,
        depth: usize,
    ) -> Result<ValidationOutcome> {
        for (branch, sub_rule) in sub_rules.iter().enumerate() {
            if self.condition_holds(sub_rule, context)? {
                debug!(branch, rule_target = %sub_rule.display_name(), "conditional branch selected");
                return self.dispatch(sub_rule, context, depth + 1);
            }
        }
        debug!(branches = sub_rules.len(), "no conditional branch matched");
        Ok(ValidationOutcome::valid())
    }
}

/// `{ target: { "condition": header, "messages": merged } }`
fn or_failure(target: &str, merged: MessageMap) -> ValidationOutcome {
    let mut body = MessageMap::new();
    body.insert(OR_HEADER_KEY.to_string(), MessageValue::from(OR_FAILURE_HEADER));
    body.insert(OR_MESSAGES_KEY.to_string(), MessageValue::Map(merged));
    ValidationOutcome::single(target, MessageValue::Map(body))
}
