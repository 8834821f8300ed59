//! Validation outcome: pass/fail plus a path-keyed message map.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Insertion-ordered map from target path to message.
pub type MessageMap = IndexMap<String, MessageValue>;

/// A message entry: a single string, a list of messages, or a nested map
/// (OR-group failures nest their sub-messages under the group's target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageValue {
    Text(String),
    List(Vec<MessageValue>),
    Map(MessageMap),
}

impl MessageValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[MessageValue]> {
        match self {
            MessageValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MessageMap> {
        match self {
            MessageValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for MessageValue {
    fn from(text: &str) -> Self {
        MessageValue::Text(text.to_string())
    }
}

impl From<String> for MessageValue {
    fn from(text: String) -> Self {
        MessageValue::Text(text)
    }
}

impl From<MessageMap> for MessageValue {
    fn from(map: MessageMap) -> Self {
        MessageValue::Map(map)
    }
}

impl fmt::Display for MessageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageValue::Text(text) => write!(f, "{text}"),
            other => match serde_json::to_string(other) {
                Ok(json) => write!(f, "{json}"),
                Err(_) => write!(f, "{other:?}"),
            },
        }
    }
}

/// Result of evaluating a rule tree against a context.
///
/// A valid outcome never carries messages.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    is_valid: bool,
    messages: MessageMap,
}

impl ValidationOutcome {
    /// The passing outcome (no messages, no allocation).
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            messages: MessageMap::new(),
        }
    }

    /// A failing outcome. An empty map still means "invalid".
    pub fn invalid(messages: MessageMap) -> Self {
        Self {
            is_valid: false,
            messages,
        }
    }

    /// A failing outcome with one `key: message` entry.
    pub fn single(key: impl Into<String>, message: impl Into<MessageValue>) -> Self {
        let mut messages = MessageMap::new();
        messages.insert(key.into(), message.into());
        Self::invalid(messages)
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn messages(&self) -> &MessageMap {
        &self.messages
    }

    pub fn into_messages(self) -> MessageMap {
        self.messages
    }

    /// Rewrite every top-level key as `{prefix}{key}`.
    ///
    /// Used to keep array element failures addressable from the root
    /// context, e.g. `age` becomes `employees[1].age`.
    pub fn prefixed(self, prefix: &str) -> Self {
        if self.is_valid {
            return self;
        }
        let messages = self
            .messages
            .into_iter()
            .map(|(key, value)| (format!("{prefix}{key}"), value))
            .collect();
        Self::invalid(messages)
    }
}

impl Default for ValidationOutcome {
    fn default() -> Self {
        Self::valid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_outcome_has_no_messages() {
        let outcome = ValidationOutcome::valid();
        assert!(outcome.is_valid());
        assert!(outcome.messages().is_empty());
        assert_eq!(outcome, ValidationOutcome::default());

        let outcome = outcome.prefixed("employees[0].");
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"isValid": true, "messages": {}})
        );
    }

    #[test]
    fn serializes_with_camel_case_and_untagged_messages() {
        let mut nested = MessageMap::new();
        nested.insert("condition".into(), "at least one".into());
        let mut messages = MessageMap::new();
        messages.insert("age".into(), "must be adult".into());
        messages.insert(
            "tags".into(),
            MessageValue::List(vec!["a".into(), "b".into()]),
        );
        messages.insert("contact".into(), MessageValue::Map(nested));

        let json = serde_json::to_value(ValidationOutcome::invalid(messages)).unwrap();
        assert_eq!(
            json,
            json!({
                "isValid": false,
                "messages": {
                    "age": "must be adult",
                    "tags": ["a", "b"],
                    "contact": {"condition": "at least one"}
                }
            })
        );
    }

    #[test]
    fn message_order_is_insertion_order() {
        let mut messages = MessageMap::new();
        for key in ["z", "a", "m"] {
            messages.insert(key.into(), key.into());
        }
        let outcome = ValidationOutcome::invalid(messages);
        let keys: Vec<&str> = outcome.messages().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn prefixed_rewrites_only_top_level_keys() {
        let mut inner = MessageMap::new();
        inner.insert("phone".into(), "required".into());
        let mut messages = MessageMap::new();
        messages.insert("age".into(), "must be adult".into());
        messages.insert("contact".into(), MessageValue::Map(inner.clone()));

        let outcome = ValidationOutcome::invalid(messages).prefixed("employees[1].");
        assert_eq!(
            outcome.messages().get("employees[1].age"),
            Some(&MessageValue::from("must be adult"))
        );
        assert_eq!(
            outcome.messages().get("employees[1].contact"),
            Some(&MessageValue::Map(inner))
        );
        assert_eq!(ValidationOutcome::valid().prefixed("x."), ValidationOutcome::valid());
    }

    #[test]
    fn display_renders_text_plainly_and_structures_as_json() {
        assert_eq!(MessageValue::from("plain").to_string(), "plain");
        let list = MessageValue::List(vec!["a".into(), "b".into()]);
        assert_eq!(list.to_string(), r#"["a","b"]"#);
    }
}
