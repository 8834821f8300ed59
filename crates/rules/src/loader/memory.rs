//! Map-backed [`RuleSource`] for embedding rule trees in code and for tests.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::schema::RuleConfiguration;

use super::error::{LoadError, Result};
use super::format::DocumentFormat;
use super::source::RuleSource;

#[derive(Debug, Default)]
pub struct InMemoryRules {
    documents: RwLock<HashMap<String, Arc<RuleConfiguration>>>,
}

impl InMemoryRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(self, reference: impl Into<String>, rule: RuleConfiguration) -> Result<Self> {
        self.insert(reference, rule)?;
        Ok(self)
    }

    /// Register a tree under `reference`, replacing any previous one.
    ///
    /// The tree is format-checked first, as file-backed documents are.
    pub fn insert(&self, reference: impl Into<String>, rule: RuleConfiguration) -> Result<()> {
        rule.check_format()?;
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(reference.into(), Arc::new(rule));
        Ok(())
    }

    /// Parse and register a document given as text.
    pub fn insert_document(
        &self,
        reference: impl Into<String>,
        format: DocumentFormat,
        contents: &str,
    ) -> Result<()> {
        let rule = format.parse(contents)?;
        self.insert(reference, rule)
    }

    pub fn remove(&self, reference: &str) -> Option<Arc<RuleConfiguration>> {
        self.documents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(reference)
    }

    pub fn len(&self) -> usize {
        self.documents.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RuleSource for InMemoryRules {
    fn load(&self, reference: &str) -> Result<Arc<RuleConfiguration>> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(reference)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(reference.to_string()))
    }
}
