//! Array rules: validate each element of a sequence with a referenced config.

use serde_json::Value;
use tracing::debug;

use crate::expression::type_name;
use crate::outcome::ValidationOutcome;
use crate::schema::RuleConfiguration;

use super::{merge_failures, EngineError, Result, ValidationEngine};

impl ValidationEngine {
    /// Load the element config, resolve `target` to a sequence and evaluate
    /// the element config once per element with the element as context.
    ///
    /// Element failures are re-keyed `{target}[{index}].{key}` and AND-merged.
    pub(super) fn evaluate_array(
        &self,
        rule: &RuleConfiguration,
        element_config: &str,
        context: &Value,
        depth: usize,
    ) -> Result<ValidationOutcome> {
        let element_rule = self
            .source
            .load(element_config)
            .map_err(|source| EngineError::Load {
                target: rule.target.clone(),
                source,
            })?;

        let elements = self.resolve_elements(&rule.target, context)?;
        debug!(
            rule_target = %rule.target,
            reference = %element_config,
            elements = elements.len(),
            "validating array elements"
        );

        let outcomes = self.map_ordered(&elements, |element| {
            self.evaluate_node(&element_rule, element, depth + 1)
        })?;

        Ok(merge_failures(
            outcomes
                .into_iter()
                .enumerate()
                .filter(|(_, outcome)| !outcome.is_valid())
                .map(|(index, outcome)| outcome.prefixed(&format!("{}[{index}].", rule.target))),
        ))
    }

    fn resolve_elements(&self, target: &str, context: &Value) -> Result<Vec<Value>> {
        let resolved = self
            .evaluator
            .evaluate(target, context)
            .map_err(|e| EngineError::TargetResolution {
                target: target.to_string(),
                reason: e.to_string(),
            })?;

        match resolved {
            Value::Array(elements) => Ok(elements),
            other => Err(EngineError::TargetResolution {
                target: target.to_string(),
                reason: format!("expected an array, got {}", type_name(&other)),
            }),
        }
    }
}
