//! End-to-end validation against the rule documents shipped in `data/rules`.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use rulecheck_rules::engine::{OR_FAILURE_HEADER, OR_HEADER_KEY, OR_MESSAGES_KEY};
use rulecheck_rules::loader::LoadStatus;
use rulecheck_rules::{
    check_references, EngineOptions, ExprEvaluator, MessageValue, RuleLoader, RuleSource, ValidateError,
    ValidationEngine, Validator,
};

const ORGANIZATION: &str = "validation/organization.json";

fn rules_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/rules")
}

fn validator_with(options: EngineOptions) -> Validator {
    let source: Arc<dyn RuleSource> = Arc::new(RuleLoader::new(rules_dir()));
    let engine = ValidationEngine::new(Arc::new(ExprEvaluator::new()), Arc::clone(&source)).with_options(options);
    Validator::new(Arc::new(engine), source)
}

fn validator() -> Validator {
    validator_with(EngineOptions::default())
}

fn organization() -> Value {
    json!({
        "orgName": "Acme",
        "orgCode": "ACM-0042",
        "taxCode": "0123456789",
        "address": "1 Main Street",
        "phoneNumber": null,
        "departments": [
            {
                "name": "Engineering",
                "maxSize": 3,
                "employees": [
                    {"name": "Ada", "age": 36, "email": "ada@example.com"},
                    {"name": "Linus", "age": 28}
                ]
            },
            {"name": "Sales", "employees": []}
        ]
    })
}

fn rejected(result: Result<(), ValidateError>) -> rulecheck_rules::MessageMap {
    match result {
        Err(ValidateError::Rejected { messages }) => messages,
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[test]
fn every_fixture_document_loads() {
    let loader = RuleLoader::new(rules_dir());
    let results = loader.load_all().unwrap();
    assert!(results.len() >= 3);
    for result in &results {
        assert!(
            matches!(result.status, LoadStatus::Loaded { .. }),
            "{} -> {:?}",
            result.path.display(),
            result.status
        );
    }
    assert!(check_references(&loader, ORGANIZATION).is_ok());
}

#[test]
fn well_formed_organization_passes() {
    assert!(validator().validate(ORGANIZATION, &organization()).is_ok());
}

#[test]
fn nested_employee_failure_is_addressed_from_the_root() {
    let mut org = organization();
    org["departments"][0]["employees"][1]["age"] = json!(16);

    let messages = rejected(validator().validate(ORGANIZATION, &org));
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages["departments[0].employees[1].age"],
        MessageValue::from("must be adult")
    );
}

#[test]
fn department_size_and_employee_failures_are_itemised() {
    let mut org = organization();
    org["departments"][0]["maxSize"] = json!(1);
    org["departments"][0]["employees"][0]["email"] = json!("not-an-email");
    org["departments"][1]["name"] = json!("");

    let messages = rejected(validator().validate(ORGANIZATION, &org));
    let keys: Vec<&str> = messages.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "departments[0].employees",
            "departments[0].employees[0].email",
            "departments[1].name",
        ]
    );
}

#[test]
fn missing_contact_details_fail_the_or_group() {
    let mut org = organization();
    org["address"] = json!("   ");
    org["phoneNumber"] = json!("12");

    let messages = rejected(validator().validate(ORGANIZATION, &org));
    let contact = messages["contact"].as_map().unwrap();
    assert_eq!(contact[OR_HEADER_KEY], MessageValue::from(OR_FAILURE_HEADER));
    let inner = contact[OR_MESSAGES_KEY].as_map().unwrap();
    assert_eq!(inner["phoneNumber"], MessageValue::from("a valid phone number is required"));
    assert_eq!(inner["address"], MessageValue::from("an address is required"));
}

#[test]
fn tax_code_rules_switch_on_organization_kind() {
    let mut org = organization();
    org["orgCode"] = json!("GOV-0001");
    let messages = rejected(validator().validate(ORGANIZATION, &org));
    assert_eq!(
        messages["taxCode"],
        MessageValue::from("government organizations have no tax code")
    );

    org["taxCode"] = Value::Null;
    assert!(validator().validate(ORGANIZATION, &org).is_ok());

    let mut private = organization();
    private["taxCode"] = json!("12");
    let messages = rejected(validator().validate(ORGANIZATION, &private));
    assert_eq!(messages["taxCode"], MessageValue::from("tax code must have 10 digits"));
}

#[test]
fn organization_without_departments_skips_the_array_rule() {
    let mut org = organization();
    org.as_object_mut().unwrap().remove("departments");
    assert!(validator().validate(ORGANIZATION, &org).is_ok());
}

#[test]
fn non_array_departments_are_rejected_as_unresolvable() {
    let mut org = organization();
    org["departments"] = json!({"name": "oops"});
    let messages = rejected(validator().validate(ORGANIZATION, &org));
    assert!(messages.contains_key("departments"));
}

#[test]
fn parallel_engine_agrees_with_sequential() {
    let mut org = organization();
    org["orgName"] = Value::Null;
    org["departments"][0]["employees"][0]["age"] = json!(3);
    org["departments"][1]["employees"] = json!([{"name": null, "age": 50}]);

    let sequential = validator().validate(ORGANIZATION, &org).unwrap_err();
    let parallel = validator_with(EngineOptions {
        parallel: true,
        ..EngineOptions::default()
    })
    .validate(ORGANIZATION, &org)
    .unwrap_err();
    assert_eq!(sequential.messages(), parallel.messages());
}

#[test]
fn unknown_document_is_rejected_with_rule_key() {
    let messages = rejected(validator().validate("validation/nope.json", &json!({})));
    assert!(messages.contains_key("rule"));
}
