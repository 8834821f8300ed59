//! Tests for schema types.

use super::*;

const ORGANIZATION_JSON: &str = r#"
{
  "groupType": "AND",
  "subRules": [
    {
      "target": "orgName",
      "targetName": "Organization name",
      "ruleExpression": "orgName != null && orgName.length() > 0",
      "message": "organization name is required"
    },
    {
      "target": "contact",
      "groupType": "OR",
      "subRules": [
        { "target": "phoneNumber", "ruleExpression": "phoneNumber != null", "message": "phone required" },
        { "target": "address", "ruleExpression": "address != null", "message": "address required" }
      ]
    },
    {
      "target": "departments",
      "condition": "departments != null",
      "arrayElementConfig": "validation/department.json"
    }
  ]
}
"#;

const LEGACY_YAML: &str = r#"
ruleName: Employee checks
combineType: CONDITION
subRules:
  - fieldName: age
    condition: "type == 'adult'"
    ruleExpression: "age >= 18"
    message: must be adult
  - fieldName: employees
    isArray: true
    arrayElementConfigPath: validation/employee.yml
"#;

fn raw(json: serde_json::Value) -> RawRuleConfiguration {
    serde_json::from_value(json).unwrap()
}

#[test]
fn parse_typed_tree_from_json() {
    let rule: RuleConfiguration = serde_json::from_str(ORGANIZATION_JSON).unwrap();

    let RuleKind::Composite {
        group,
        sub_rules,
        conditional,
    } = &rule.kind
    else {
        panic!("expected composite root, got {:?}", rule.kind);
    };
    assert_eq!(*group, GroupType::And);
    assert!(!conditional);
    assert_eq!(sub_rules.len(), 3);

    assert!(sub_rules[0].is_basic());
    assert_eq!(sub_rules[0].display_name(), "Organization name");
    assert!(sub_rules[1].is_composite());
    assert!(sub_rules[2].is_array());
    assert_eq!(sub_rules[2].condition.as_deref(), Some("departments != null"));
    assert_eq!(rule.array_references(), vec!["validation/department.json"]);
    assert_eq!(
        rule.array_nodes(),
        vec![("departments", "validation/department.json")]
    );
}

#[test]
fn legacy_field_names_and_condition_group() {
    let rule: RuleConfiguration = serde_yaml::from_str(LEGACY_YAML).unwrap();

    assert_eq!(rule.display_name(), "Employee checks");
    match &rule.kind {
        RuleKind::Composite {
            group,
            sub_rules,
            conditional,
        } => {
            assert_eq!(*group, GroupType::And);
            assert!(*conditional);
            assert_eq!(sub_rules[0].target, "age");
            assert_eq!(
                sub_rules[1].kind,
                RuleKind::Array {
                    element_config: "validation/employee.yml".to_string()
                }
            );
        }
        other => panic!("expected composite, got {other:?}"),
    }
}

#[test]
fn exactly_one_variant_predicate_holds() {
    let basic = raw(serde_json::json!({"target": "age", "ruleExpression": "age >= 18"}));
    assert!(basic.is_basic() && !basic.is_array() && !basic.is_composite());
    assert!(basic.check_format().is_ok());

    let array = raw(serde_json::json!({"target": "items", "arrayElementConfig": "item.json"}));
    assert!(!array.is_basic() && array.is_array() && !array.is_composite());
    assert!(array.check_format().is_ok());

    let composite = raw(serde_json::json!({
        "groupType": "AND",
        "subRules": [{"target": "a", "ruleExpression": "true"}]
    }));
    assert!(!composite.is_basic() && !composite.is_array() && composite.is_composite());
    assert!(composite.check_format().is_ok());
}

#[test]
fn mixed_or_empty_shapes_fail_format() {
    let cases = [
        serde_json::json!({"target": "x"}),
        serde_json::json!({"target": "x", "ruleExpression": "   "}),
        serde_json::json!({"target": "x", "ruleExpression": "true", "arrayElementConfig": "a.json"}),
        serde_json::json!({"target": "x", "ruleExpression": "true", "groupType": "AND",
                           "subRules": [{"target": "y", "ruleExpression": "true"}]}),
        serde_json::json!({"target": "x", "arrayElementConfig": "a.json", "groupType": "OR",
                           "subRules": [{"target": "y", "ruleExpression": "true"}]}),
        serde_json::json!({"target": "x", "groupType": "AND", "subRules": []}),
        serde_json::json!({"target": "x", "groupType": "AND"}),
        serde_json::json!({"target": "x", "isArray": true}),
        serde_json::json!({"target": "x", "isArray": false, "arrayElementConfig": "a.json"}),
    ];

    for case in cases {
        let node = raw(case.clone());
        let err = node.check_format().unwrap_err();
        assert_eq!(err.target, "x", "case {case}");
    }
}

#[test]
fn targets_required_where_messages_are_keyed() {
    let basic = raw(serde_json::json!({"ruleExpression": "true"}));
    assert!(basic.check_format().is_err());

    let or_group = raw(serde_json::json!({
        "groupType": "OR",
        "subRules": [{"target": "a", "ruleExpression": "true"}]
    }));
    assert!(or_group.check_format().is_err());

    let and_group = raw(serde_json::json!({
        "groupType": "AND",
        "subRules": [{"target": "a", "ruleExpression": "true"}]
    }));
    assert!(and_group.check_format().is_ok());
}

#[test]
fn conditional_flag_only_on_and_groups() {
    let or_group = raw(serde_json::json!({
        "target": "g",
        "groupType": "OR",
        "isConditional": true,
        "subRules": [{"target": "a", "ruleExpression": "true"}]
    }));
    let err = or_group.check_format().unwrap_err();
    assert!(err.reason.contains("AND"));

    let basic = raw(serde_json::json!({"target": "a", "ruleExpression": "true", "isConditional": true}));
    assert!(basic.check_format().is_err());
}

#[test]
fn nested_format_error_names_the_offending_node() {
    let err = serde_json::from_value::<RuleConfiguration>(serde_json::json!({
        "groupType": "AND",
        "subRules": [
            {"target": "ok", "ruleExpression": "true"},
            {"target": "broken", "ruleExpression": "true", "arrayElementConfig": "x.json"}
        ]
    }))
    .unwrap_err();
    assert!(err.to_string().contains("'broken'"), "{err}");

    let raw_root = raw(serde_json::json!({
        "groupType": "AND",
        "subRules": [{"target": "broken"}]
    }));
    assert_eq!(raw_root.check_format().unwrap_err().target, "broken");
}

#[test]
fn unknown_fields_are_rejected() {
    let result = serde_json::from_value::<RawRuleConfiguration>(serde_json::json!({
        "target": "a",
        "ruleExpresion": "true"
    }));
    assert!(result.is_err());
}

#[test]
fn missing_message_defaults_to_display_name() {
    let rule: RuleConfiguration = serde_json::from_value(serde_json::json!({
        "target": "age",
        "targetName": "Age",
        "ruleExpression": "age > 0"
    }))
    .unwrap();
    assert_eq!(
        rule.kind,
        RuleKind::Basic {
            expression: "age > 0".to_string(),
            message: "Age is invalid".to_string()
        }
    );
}

#[test]
fn typed_tree_serializes_back_to_document_shape() {
    let rule = RuleConfiguration::switch(vec![
        RuleConfiguration::basic("age", "age >= 18", "must be adult").when("kind == 'adult'"),
        RuleConfiguration::array("children", "child.json"),
    ]);

    let json = serde_json::to_value(&rule).unwrap();
    assert_eq!(json["groupType"], "AND");
    assert_eq!(json["isConditional"], true);
    assert!(json.get("target").is_none());
    assert_eq!(json["subRules"][0]["ruleExpression"], "age >= 18");
    assert_eq!(json["subRules"][1]["arrayElementConfig"], "child.json");

    let back: RuleConfiguration = serde_json::from_value(json).unwrap();
    assert_eq!(back, rule);
}

#[test]
fn built_trees_are_checked_with_load_time_rules() {
    assert!(RuleConfiguration::all(vec![RuleConfiguration::basic("a", "true", "m")])
        .check_format()
        .is_ok());
    assert!(RuleConfiguration::all(vec![]).check_format().is_err());
    assert!(RuleConfiguration::any("", vec![RuleConfiguration::basic("a", "true", "m")])
        .check_format()
        .is_err());
    assert!(RuleConfiguration::basic("a", "", "m").check_format().is_err());
}
