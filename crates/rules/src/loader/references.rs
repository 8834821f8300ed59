//! Load-time format check across array element references.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::schema::RuleConfiguration;

use super::error::{LoadError, Result};
use super::source::RuleSource;

/// Load `reference` and every document reachable from it through array
/// element configs, format-checking each one once.
///
/// Shared and self-referencing element configs are visited a single time,
/// so recursive schemas terminate here; evaluation itself is bounded by the
/// engine's depth limit. Returns the root tree.
pub fn check_references<S>(source: &S, reference: &str) -> Result<Arc<RuleConfiguration>>
where
    S: RuleSource + ?Sized,
{
    let root = source.load(reference)?;
    root.check_format()?;

    let mut visited: HashSet<String> = HashSet::from([reference.to_string()]);
    let mut pending = element_configs(&root);

    while let Some((target, next)) = pending.pop() {
        if visited.contains(&next) {
            continue;
        }
        let rule = source
            .load(&next)
            .and_then(|rule| {
                rule.check_format()?;
                Ok(rule)
            })
            .map_err(|e| LoadError::ElementConfig {
                target,
                reference: next.clone(),
                source: Box::new(e),
            })?;
        pending.extend(element_configs(&rule));
        visited.insert(next);
    }

    debug!(reference = %reference, documents = visited.len(), "rule references checked");
    Ok(root)
}

fn element_configs(rule: &RuleConfiguration) -> Vec<(String, String)> {
    rule.array_nodes()
        .into_iter()
        .map(|(target, reference)| (target.to_string(), reference.to_string()))
        .collect()
}
