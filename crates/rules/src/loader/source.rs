//! The loading seam used by the engine and the validator.

use std::sync::Arc;

use crate::schema::RuleConfiguration;

use super::error::Result;

/// Loads a rule tree by reference.
///
/// Implementations return trees that already passed the format check.
pub trait RuleSource: Send + Sync {
    fn load(&self, reference: &str) -> Result<Arc<RuleConfiguration>>;
}

impl<S: RuleSource + ?Sized> RuleSource for Arc<S> {
    fn load(&self, reference: &str) -> Result<Arc<RuleConfiguration>> {
        (**self).load(reference)
    }
}
