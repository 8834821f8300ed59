//! Typed rule tree.

use serde::{Deserialize, Serialize};

use super::{FormatError, GroupType, RawGroupType, RawRuleConfiguration};

/// One node of a rule tree.
///
/// The fields shared by every variant live here; the variant-specific ones
/// live in [`RuleKind`]. Deserializing goes through [`RawRuleConfiguration`]
/// and fails with a [`FormatError`] for any node that is not exactly one
/// variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRuleConfiguration", into = "RawRuleConfiguration")]
pub struct RuleConfiguration {
    /// Path of the value under test; also the key of its failure message.
    pub target: String,
    /// Display name used when attributing condition errors.
    pub target_name: Option<String>,
    /// Gate expression; when it evaluates to `false` the node is skipped.
    pub condition: Option<String>,
    pub kind: RuleKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// A single boolean expression with its failure message.
    Basic { expression: String, message: String },
    /// Validate each element of the `target` sequence with another document.
    Array { element_config: String },
    /// AND/OR group of sub-rules.
    ///
    /// A conditional AND group is an if/else-if chain: only the first
    /// sub-rule whose condition holds is evaluated.
    Composite {
        group: GroupType,
        sub_rules: Vec<RuleConfiguration>,
        conditional: bool,
    },
}

impl RuleConfiguration {
    pub fn basic(
        target: impl Into<String>,
        expression: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::with_kind(
            target,
            RuleKind::Basic {
                expression: expression.into(),
                message: message.into(),
            },
        )
    }

    pub fn array(target: impl Into<String>, element_config: impl Into<String>) -> Self {
        Self::with_kind(
            target,
            RuleKind::Array {
                element_config: element_config.into(),
            },
        )
    }

    /// AND group. Failures are reported under each failing sub-rule's own target.
    pub fn all(sub_rules: Vec<RuleConfiguration>) -> Self {
        Self::with_kind(
            "",
            RuleKind::Composite {
                group: GroupType::And,
                sub_rules,
                conditional: false,
            },
        )
    }

    /// OR group. Total failure is reported under `target`.
    pub fn any(target: impl Into<String>, sub_rules: Vec<RuleConfiguration>) -> Self {
        Self::with_kind(
            target,
            RuleKind::Composite {
                group: GroupType::Or,
                sub_rules,
                conditional: false,
            },
        )
    }

    /// Conditional AND group (if / else-if chain over the sub-rules' conditions).
    pub fn switch(sub_rules: Vec<RuleConfiguration>) -> Self {
        Self::with_kind(
            "",
            RuleKind::Composite {
                group: GroupType::And,
                sub_rules,
                conditional: true,
            },
        )
    }

    fn with_kind(target: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            target: target.into(),
            target_name: None,
            condition: None,
            kind,
        }
    }

    /// Gate this node on `condition`.
    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn named(mut self, target_name: impl Into<String>) -> Self {
        self.target_name = Some(target_name.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// `target_name` if set, otherwise `target`.
    pub fn display_name(&self) -> &str {
        self.target_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.target)
    }

    pub fn is_basic(&self) -> bool {
        matches!(self.kind, RuleKind::Basic { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, RuleKind::Array { .. })
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, RuleKind::Composite { .. })
    }

    /// Re-check a tree built in code with the same rules applied at load time.
    pub fn check_format(&self) -> Result<(), FormatError> {
        self.check_node()?;
        if let RuleKind::Composite { sub_rules, .. } = &self.kind {
            for sub_rule in sub_rules {
                sub_rule.check_format()?;
            }
        }
        Ok(())
    }

    /// Shape check for this node only.
    pub fn check_node(&self) -> Result<(), FormatError> {
        let blank = |s: &str| s.trim().is_empty();
        match &self.kind {
            RuleKind::Basic { expression, .. } if blank(expression) => Err(FormatError::new(
                self.target.as_str(),
                "basic rule requires a ruleExpression",
            )),
            RuleKind::Array { element_config } if blank(element_config) => Err(FormatError::new(
                self.target.as_str(),
                "array rule requires an arrayElementConfig",
            )),
            RuleKind::Composite { sub_rules, .. } if sub_rules.is_empty() => Err(FormatError::new(
                self.target.as_str(),
                "composite rule requires at least one sub-rule",
            )),
            RuleKind::Composite {
                group: GroupType::Or,
                conditional: true,
                ..
            } => Err(FormatError::new(
                self.target.as_str(),
                "isConditional is only allowed on AND groups",
            )),
            RuleKind::Composite {
                group: GroupType::And,
                ..
            } => Ok(()),
            _ if blank(&self.target) => Err(FormatError::new(
                "",
                "basic, array and OR rules require a target",
            )),
            _ => Ok(()),
        }
    }

    /// Element-config references of every array node in this tree, in document order.
    pub fn array_references(&self) -> Vec<&str> {
        self.array_nodes()
            .into_iter()
            .map(|(_, reference)| reference)
            .collect()
    }

    /// `(target, element config)` of every array node in this tree, in document order.
    pub fn array_nodes(&self) -> Vec<(&str, &str)> {
        let mut nodes = Vec::new();
        self.collect_array_nodes(&mut nodes);
        nodes
    }

    fn collect_array_nodes<'a>(&'a self, nodes: &mut Vec<(&'a str, &'a str)>) {
        match &self.kind {
            RuleKind::Basic { .. } => {}
            RuleKind::Array { element_config } => {
                nodes.push((self.target.as_str(), element_config.as_str()))
            }
            RuleKind::Composite { sub_rules, .. } => {
                for sub_rule in sub_rules {
                    sub_rule.collect_array_nodes(nodes);
                }
            }
        }
    }
}

impl TryFrom<RawRuleConfiguration> for RuleConfiguration {
    type Error = FormatError;

    fn try_from(raw: RawRuleConfiguration) -> Result<Self, Self::Error> {
        raw.check_node()?;

        let target = raw.target.clone().unwrap_or_default();
        let kind = if raw.is_basic() {
            let expression = raw.rule_expression.unwrap_or_default();
            let message = match raw.message {
                Some(message) if !message.trim().is_empty() => message,
                _ => default_message(&target, raw.target_name.as_deref()),
            };
            RuleKind::Basic {
                expression,
                message,
            }
        } else if raw.is_array() {
            RuleKind::Array {
                element_config: raw.array_element_config.unwrap_or_default(),
            }
        } else {
            let (group, conditional) = raw
                .group()
                .ok_or_else(|| FormatError::new(target.clone(), "composite rule requires groupType"))?;
            let sub_rules = raw
                .sub_rules
                .unwrap_or_default()
                .into_iter()
                .map(RuleConfiguration::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            RuleKind::Composite {
                group,
                sub_rules,
                conditional,
            }
        };

        Ok(Self {
            target,
            target_name: raw.target_name.filter(|name| !name.trim().is_empty()),
            condition: raw.condition.filter(|c| !c.trim().is_empty()),
            kind,
        })
    }
}

fn default_message(target: &str, target_name: Option<&str>) -> String {
    let name = target_name.filter(|n| !n.trim().is_empty()).unwrap_or(target);
    format!("{name} is invalid")
}

impl From<RuleConfiguration> for RawRuleConfiguration {
    fn from(rule: RuleConfiguration) -> Self {
        let mut raw = RawRuleConfiguration {
            target: Some(rule.target).filter(|t| !t.is_empty()),
            target_name: rule.target_name,
            condition: rule.condition,
            ..Default::default()
        };
        match rule.kind {
            RuleKind::Basic {
                expression,
                message,
            } => {
                raw.rule_expression = Some(expression);
                raw.message = Some(message);
            }
            RuleKind::Array { element_config } => {
                raw.array_element_config = Some(element_config);
            }
            RuleKind::Composite {
                group,
                sub_rules,
                conditional,
            } => {
                raw.group_type = Some(RawGroupType::from(group));
                raw.sub_rules = Some(sub_rules.into_iter().map(RawRuleConfiguration::from).collect());
                raw.is_conditional = conditional.then_some(true);
            }
        }
        raw
    }
}
