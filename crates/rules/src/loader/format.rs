//! Document formats accepted by the loaders.

use std::fmt;
use std::path::Path;

use crate::schema::{RawRuleConfiguration, RuleConfiguration};

use super::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Format implied by the file extension, if supported.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(DocumentFormat::Json),
            Some("yml") | Some("yaml") => Some(DocumentFormat::Yaml),
            _ => None,
        }
    }

    /// Parse a document into a checked rule tree.
    ///
    /// Two passes: the raw shape first (syntax errors surface as
    /// [`Json`](super::LoadError::Json) / [`Yaml`](super::LoadError::Yaml)),
    /// then the variant check of every node
    /// ([`Format`](super::LoadError::Format)).
    pub fn parse(self, contents: &str) -> Result<RuleConfiguration> {
        let raw: RawRuleConfiguration = match self {
            DocumentFormat::Json => serde_json::from_str(contents)?,
            DocumentFormat::Yaml => serde_yaml::from_str(contents)?,
        };
        Ok(RuleConfiguration::try_from(raw)?)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Json => write!(f, "json"),
            DocumentFormat::Yaml => write!(f, "yaml"),
        }
    }
}
