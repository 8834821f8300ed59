//! Recursive validation engine.
//!
//! Walks a [`RuleConfiguration`] tree top-down against a JSON context:
//! each node is first gated on its optional condition, then dispatched by
//! variant. Basic nodes evaluate their expression, composite nodes recurse
//! into their sub-rules with the same context, array nodes load their
//! element config and recurse once per element. Failures are merged
//! bottom-up with the [`MessageCombiner`].
//!
//! Business-level failures come back as an invalid [`ValidationOutcome`];
//! configuration and expression defects abort the walk with an
//! [`EngineError`].

mod array;
mod composite;
mod error;


use std::sync::Arc;

use rayon::prelude::*;
use rulecheck_core::config::DEFAULT_MAX_DEPTH;
use rulecheck_core::EngineConfig;
use serde_json::Value;
use tracing::debug;

use crate::combiner::MessageCombiner;
use crate::expression::ExpressionEvaluator;
use crate::loader::RuleSource;
use crate::outcome::ValidationOutcome;
use crate::schema::{RuleConfiguration, RuleKind};

pub use self::composite::{OR_FAILURE_HEADER, OR_HEADER_KEY, OR_MESSAGES_KEY};
pub use self::error::{EngineError, Result};

// ── Options ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Maximum nesting of composite and array levels below the root.
    pub max_depth: usize,
    /// Evaluate composite siblings and array elements on the rayon pool.
    pub parallel: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            parallel: false,
        }
    }
}

impl From<&EngineConfig> for EngineOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_depth: config.max_depth.max(1),
            parallel: config.parallel,
        }
    }
}

// ── Engine ──────────────────────────────────────────────────────────

pub struct ValidationEngine {
    evaluator: Arc<dyn ExpressionEvaluator>,
    source: Arc<dyn RuleSource>,
    options: EngineOptions,
}

impl ValidationEngine {
    pub fn new(evaluator: Arc<dyn ExpressionEvaluator>, source: Arc<dyn RuleSource>) -> Self {
        Self {
            evaluator,
            source,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Evaluate `rule` against `context`.
    ///
    /// The same tree and context always produce the same outcome.
    pub fn evaluate(&self, rule: &RuleConfiguration, context: &Value) -> Result<ValidationOutcome> {
        self.evaluate_node(rule, context, 0)
    }

    /// Gate, then dispatch.
    fn evaluate_node(
        &self,
        rule: &RuleConfiguration,
        context: &Value,
        depth: usize,
    ) -> Result<ValidationOutcome> {
        if !self.condition_holds(rule, context)? {
            debug!(rule_target = %rule.display_name(), depth, "condition false, node skipped");
            return Ok(ValidationOutcome::valid());
        }
        self.dispatch(rule, context, depth)
    }

    /// Evaluate the node's condition; a node without one always holds.
    fn condition_holds(&self, rule: &RuleConfiguration, context: &Value) -> Result<bool> {
        let Some(condition) = rule.condition.as_deref() else {
            return Ok(true);
        };
        self.evaluator
            .evaluate_bool(condition, context)
            .map_err(|source| EngineError::Condition {
                target_name: rule.display_name().to_string(),
                expression: condition.to_string(),
                source,
            })
    }

    /// Evaluate the node's own semantics, ignoring its condition.
    fn dispatch(
        &self,
        rule: &RuleConfiguration,
        context: &Value,
        depth: usize,
    ) -> Result<ValidationOutcome> {
        if depth > self.options.max_depth {
            return Err(EngineError::DepthExceeded {
                target: rule.display_name().to_string(),
                max_depth: self.options.max_depth,
            });
        }
        rule.check_node()?;

        match &rule.kind {
            RuleKind::Basic {
                expression,
                message,
            } => self.evaluate_basic(rule, expression, message, context),
            RuleKind::Array { element_config } => {
                self.evaluate_array(rule, element_config, context, depth)
            }
            RuleKind::Composite {
                group,
                sub_rules,
                conditional,
            } => self.evaluate_composite(rule, *group, sub_rules, *conditional, context, depth),
        }
    }

    fn evaluate_basic(
        &self,
        rule: &RuleConfiguration,
        expression: &str,
        message: &str,
        context: &Value,
    ) -> Result<ValidationOutcome> {
        let passed = self
            .evaluator
            .evaluate_bool(expression, context)
            .map_err(|source| EngineError::Expression {
                target: rule.target.clone(),
                expression: expression.to_string(),
                source,
            })?;

        if passed {
            Ok(ValidationOutcome::valid())
        } else {
            debug!(rule_target = %rule.target, expression, "basic rule failed");
            Ok(ValidationOutcome::single(rule.target.as_str(), message))
        }
    }

    /// Apply `f` to every item, keeping input order in the result.
    ///
    /// With `parallel` set the items are spread over the rayon pool; the
    /// first error in completion order is returned.
    fn map_ordered<T, F>(&self, items: &[T], f: F) -> Result<Vec<ValidationOutcome>>
    where
        T: Sync,
        F: Fn(&T) -> Result<ValidationOutcome> + Sync + Send,
    {
        if self.options.parallel && items.len() > 1 {
            items.par_iter().map(f).collect()
        } else {
            items.iter().map(f).collect()
        }
    }
}

/// AND-merge the failing outcomes; passing ones contribute nothing.
fn merge_failures<I>(outcomes: I) -> ValidationOutcome
where
    I: IntoIterator<Item = ValidationOutcome>,
{
    let mut failed = outcomes
        .into_iter()
        .filter(|outcome| !outcome.is_valid())
        .peekable();
    if failed.peek().is_none() {
        return ValidationOutcome::valid();
    }
    ValidationOutcome::invalid(
        MessageCombiner::and().combine(failed.map(ValidationOutcome::into_messages)),
    )
}
