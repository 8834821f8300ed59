//! Group types for composite rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a composite node combines its sub-rule outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupType {
    #[serde(alias = "and")]
    And,
    #[serde(alias = "or")]
    Or,
}

impl fmt::Display for GroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupType::And => write!(f, "AND"),
            GroupType::Or => write!(f, "OR"),
        }
    }
}

/// Group type as written in rule documents.
///
/// `CONDITION` is the older spelling of a conditional AND group and is
/// normalised to [`GroupType::And`] with the conditional flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RawGroupType {
    #[serde(alias = "and")]
    And,
    #[serde(alias = "or")]
    Or,
    #[serde(alias = "condition")]
    Condition,
}

impl RawGroupType {
    /// Split into the normalised group type and whether it implies a conditional group.
    pub fn normalise(self) -> (GroupType, bool) {
        match self {
            RawGroupType::And => (GroupType::And, false),
            RawGroupType::Or => (GroupType::Or, false),
            RawGroupType::Condition => (GroupType::And, true),
        }
    }
}

impl From<GroupType> for RawGroupType {
    fn from(group: GroupType) -> Self {
        match group {
            GroupType::And => RawGroupType::And,
            GroupType::Or => RawGroupType::Or,
        }
    }
}
