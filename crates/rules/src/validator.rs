//! Validate payloads against rule documents by reference.
//!
//! Loads and format-checks the referenced document (and every element
//! config it reaches), evaluates it, and turns the result into
//! `Ok(())` / [`ValidateError::Rejected`] / [`ValidateError::Defect`].

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::engine::{EngineError, ValidationEngine};
use crate::loader::{check_references, LoadError, RuleSource};
use crate::outcome::MessageMap;

/// Message key used when the rule document itself cannot be resolved.
pub const RULE_KEY: &str = "rule";
pub const RULE_NOT_FOUND_MESSAGE: &str = "invalid rule or rule not found";
pub const ARRAY_CONFIG_MESSAGE: &str = "invalid array element config or target not found";

#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    /// The payload (or the reference it was validated against) was rejected.
    #[error("validation failed: {}", summarize(.messages))]
    Rejected { messages: MessageMap },

    /// The rule document is broken or failed to load for a reason other
    /// than not existing.
    #[error("rule document '{reference}' could not be loaded: {source}")]
    Rule {
        reference: String,
        #[source]
        source: LoadError,
    },

    /// The payload could not be represented as JSON.
    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),

    /// The validator is broken: bad expression, bad tree, runaway recursion.
    #[error(transparent)]
    Defect(#[from] EngineError),
}

impl ValidateError {
    fn rejected(key: &str, message: &str) -> Self {
        let mut messages = MessageMap::new();
        messages.insert(key.to_string(), message.into());
        ValidateError::Rejected { messages }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, ValidateError::Rejected { .. })
    }

    /// Rejection messages, if this is a rejection.
    pub fn messages(&self) -> Option<&MessageMap> {
        match self {
            ValidateError::Rejected { messages } => Some(messages),
            _ => None,
        }
    }
}

fn summarize(messages: &MessageMap) -> String {
    messages
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

pub struct Validator {
    engine: Arc<ValidationEngine>,
    source: Arc<dyn RuleSource>,
}

impl Validator {
    pub fn new(engine: Arc<ValidationEngine>, source: Arc<dyn RuleSource>) -> Self {
        Self { engine, source }
    }

    /// Validate `payload` against the document at `reference`.
    pub fn validate(&self, reference: &str, payload: &Value) -> Result<(), ValidateError> {
        let rule = match check_references(self.source.as_ref(), reference) {
            Ok(rule) => rule,
            Err(e) if e.is_not_found() => {
                warn!(reference = %reference, error = %e, "rule document not found");
                return Err(ValidateError::rejected(RULE_KEY, RULE_NOT_FOUND_MESSAGE));
            }
            Err(LoadError::ElementConfig {
                target,
                reference: element_config,
                source,
            }) => {
                warn!(
                    reference = %reference,
                    rule_target = %target,
                    element_config = %element_config,
                    error = %source,
                    "array element config could not be loaded"
                );
                return Err(ValidateError::rejected(&target, ARRAY_CONFIG_MESSAGE));
            }
            Err(source) => {
                return Err(ValidateError::Rule {
                    reference: reference.to_string(),
                    source,
                })
            }
        };

        match self.engine.evaluate(&rule, payload) {
            Ok(outcome) if outcome.is_valid() => {
                debug!(reference = %reference, "payload valid");
                Ok(())
            }
            Ok(outcome) => {
                debug!(reference = %reference, failures = outcome.messages().len(), "payload rejected");
                Err(ValidateError::Rejected {
                    messages: outcome.into_messages(),
                })
            }
            Err(e) if e.is_user_facing() => {
                warn!(reference = %reference, error = %e, "array rule could not be applied");
                Err(ValidateError::rejected(e.target(), ARRAY_CONFIG_MESSAGE))
            }
            Err(e) => Err(ValidateError::Defect(e)),
        }
    }

    /// Serialize a typed payload and validate it.
    pub fn validate_value<T: Serialize>(&self, reference: &str, payload: &T) -> Result<(), ValidateError> {
        let payload = serde_json::to_value(payload)?;
        self.validate(reference, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ExprEvaluator;
    use crate::loader::InMemoryRules;
    use crate::outcome::MessageValue;
    use crate::schema::RuleConfiguration;
    use serde_json::json;

    #[derive(Serialize)]
    struct Employee {
        name: Option<String>,
        age: u32,
    }

    fn validator() -> Validator {
        let rules = InMemoryRules::new()
            .with(
                "employee",
                RuleConfiguration::all(vec![
                    RuleConfiguration::basic("name", "name != null", "name is required"),
                    RuleConfiguration::basic("age", "age >= 18", "must be adult"),
                ]),
            )
            .unwrap()
            .with("staff", RuleConfiguration::array("employees", "employee"))
            .unwrap()
            .with("dangling", RuleConfiguration::array("employees", "missing"))
            .unwrap()
            .with("broken", RuleConfiguration::basic("age", "age >", "m"))
            .unwrap()
            .with(
                "gated-dangling",
                RuleConfiguration::all(vec![
                    RuleConfiguration::basic("name", "name != null", "name is required"),
                    RuleConfiguration::array("employees", "missing").when("employees != null"),
                ]),
            )
            .unwrap()
            .with("team", RuleConfiguration::array("members", "dangling"))
            .unwrap();
        let source: Arc<dyn RuleSource> = Arc::new(rules);
        let engine = Arc::new(ValidationEngine::new(Arc::new(ExprEvaluator::new()), Arc::clone(&source)));
        Validator::new(engine, source)
    }

    #[test]
    fn valid_payload_passes() {
        let validator = validator();
        assert!(validator
            .validate("employee", &json!({"name": "Ada", "age": 36}))
            .is_ok());
    }

    #[test]
    fn invalid_payload_is_rejected_with_messages() {
        let err = validator()
            .validate("staff", &json!({"employees": [{"name": null, "age": 40}]}))
            .unwrap_err();
        let messages = err.messages().unwrap();
        assert_eq!(messages["employees[0].name"], MessageValue::from("name is required"));
        assert!(err.to_string().contains("employees[0].name: name is required"));
    }

    #[test]
    fn typed_payloads_are_serialized() {
        let err = validator()
            .validate_value("employee", &Employee { name: Some("Bo".into()), age: 12 })
            .unwrap_err();
        assert_eq!(err.messages().unwrap()["age"], MessageValue::from("must be adult"));
    }

    #[test]
    fn unknown_rule_is_rejected_not_a_defect() {
        let err = validator().validate("nope", &json!({})).unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(err.messages().unwrap()[RULE_KEY], MessageValue::from(RULE_NOT_FOUND_MESSAGE));
    }

    #[test]
    fn missing_element_config_is_keyed_by_the_array_target() {
        let err = validator().validate("dangling", &json!({"employees": []})).unwrap_err();
        let messages = err.messages().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages["employees"], MessageValue::from(ARRAY_CONFIG_MESSAGE));
        assert!(!messages.contains_key(RULE_KEY));
    }

    #[test]
    fn element_config_failures_name_the_referring_array() {
        let err = validator()
            .validate("gated-dangling", &json!({"name": "x"}))
            .unwrap_err();
        assert_eq!(
            err.messages().unwrap()["employees"],
            MessageValue::from(ARRAY_CONFIG_MESSAGE)
        );

        let err = validator().validate("team", &json!({"members": []})).unwrap_err();
        assert_eq!(
            err.messages().unwrap()["employees"],
            MessageValue::from(ARRAY_CONFIG_MESSAGE)
        );
    }

    struct Unreadable;

    impl RuleSource for Unreadable {
        fn load(&self, _reference: &str) -> crate::loader::Result<Arc<RuleConfiguration>> {
            Err(LoadError::Io(std::io::Error::other("permission denied")))
        }
    }

    #[test]
    fn unreadable_rule_document_is_not_a_rejection() {
        let source: Arc<dyn RuleSource> = Arc::new(Unreadable);
        let engine = Arc::new(ValidationEngine::new(Arc::new(ExprEvaluator::new()), Arc::clone(&source)));
        let err = Validator::new(engine, source).validate("org", &json!({})).unwrap_err();
        assert!(matches!(err, ValidateError::Rule { ref reference, .. } if reference == "org"));
        assert!(!err.is_rejection());
    }

    #[test]
    fn unresolvable_array_target_is_rejected() {
        let err = validator().validate("staff", &json!({"employees": 3})).unwrap_err();
        assert_eq!(err.messages().unwrap()["employees"], MessageValue::from(ARRAY_CONFIG_MESSAGE));
    }

    #[test]
    fn broken_expression_is_a_defect() {
        let err = validator().validate("broken", &json!({"age": 3})).unwrap_err();
        assert!(matches!(err, ValidateError::Defect(EngineError::Expression { .. })));
        assert!(!err.is_rejection());
    }
}
