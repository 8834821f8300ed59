//! Persisted rule document shape and its variant predicates.

use serde::{Deserialize, Serialize};

use super::{FormatError, GroupType, RawGroupType};

/// A rule node exactly as written in a JSON/YAML document.
///
/// Every field is optional; a well-formed node populates exactly one of the
/// three variant shapes (basic, array, composite). Older documents spell some
/// fields differently (`fieldName`, `ruleName`, `arrayElementConfigPath`,
/// `combineType`), which are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RawRuleConfiguration {
    #[serde(default, alias = "fieldName", skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, alias = "ruleName", skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_array: Option<bool>,
    #[serde(
        default,
        alias = "arrayElementConfigPath",
        skip_serializing_if = "Option::is_none"
    )]
    pub array_element_config: Option<String>,
    #[serde(default, alias = "combineType", skip_serializing_if = "Option::is_none")]
    pub group_type: Option<RawGroupType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_rules: Option<Vec<RawRuleConfiguration>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_conditional: Option<bool>,
}

/// Non-blank string.
pub(crate) fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl RawRuleConfiguration {
    fn array_fields_absent(&self) -> bool {
        self.is_array != Some(true) && !present(&self.array_element_config)
    }

    fn group_fields_absent(&self) -> bool {
        self.group_type.is_none() && self.sub_rules.is_none() && self.is_conditional != Some(true)
    }

    /// Only `ruleExpression` is populated.
    pub fn is_basic(&self) -> bool {
        present(&self.rule_expression) && self.array_fields_absent() && self.group_fields_absent()
    }

    /// Only `arrayElementConfig` is populated (with `isArray` absent or `true`).
    pub fn is_array(&self) -> bool {
        !present(&self.rule_expression)
            && present(&self.array_element_config)
            && self.is_array != Some(false)
            && self.group_fields_absent()
    }

    /// Only `groupType` + a non-empty `subRules` are populated.
    pub fn is_composite(&self) -> bool {
        !present(&self.rule_expression)
            && self.array_fields_absent()
            && self.group_type.is_some()
            && self.sub_rules.as_ref().is_some_and(|rules| !rules.is_empty())
    }

    /// Normalised group type and conditional flag, when this is a composite.
    pub fn group(&self) -> Option<(GroupType, bool)> {
        self.group_type.map(|raw| {
            let (group, implied) = raw.normalise();
            (group, implied || self.is_conditional == Some(true))
        })
    }

    pub(crate) fn target_or_empty(&self) -> &str {
        self.target.as_deref().unwrap_or("")
    }

    /// Check this node and every nested sub-rule.
    ///
    /// Fails unless exactly one of [`is_basic`](Self::is_basic),
    /// [`is_array`](Self::is_array), [`is_composite`](Self::is_composite)
    /// holds, and the populated variant carries what it needs to key its
    /// messages.
    pub fn check_format(&self) -> Result<(), FormatError> {
        self.check_node()?;
        if let Some(sub_rules) = &self.sub_rules {
            for sub_rule in sub_rules {
                sub_rule.check_format()?;
            }
        }
        Ok(())
    }

    /// Shape check for this node only.
    pub(crate) fn check_node(&self) -> Result<(), FormatError> {
        let matched = [self.is_basic(), self.is_array(), self.is_composite()]
            .iter()
            .filter(|m| **m)
            .count();
        if matched != 1 {
            return Err(FormatError::new(
                self.target_or_empty(),
                "rule must be exactly one of basic (ruleExpression), array (arrayElementConfig) \
                 or composite (groupType + subRules)",
            ));
        }

        if self.is_basic() || self.is_array() {
            if !present(&self.target) {
                return Err(FormatError::new("", "basic and array rules require a target"));
            }
            return Ok(());
        }

        match self.group() {
            Some((GroupType::Or, true)) => Err(FormatError::new(
                self.target_or_empty(),
                "isConditional is only allowed on AND groups",
            )),
            Some((GroupType::Or, false)) if !present(&self.target) => Err(FormatError::new(
                "",
                "OR groups require a target to key their failure message",
            )),
            _ => Ok(()),
        }
    }
}
