#![cfg(feature = "serde")]

use segrule::{Registry, RuleConfig, RuleNode};

#[test]
fn deserialize_nested_form_payload() {
    let json = r#"{
        "operator": "not",
        "field": "visits",
        "operation": "between",
        "argument0": 2,
        "argument1": "12",
        "condition": "or",
        "child": {
            "field": "duration",
            "operation": "greater_than",
            "argument0": 1.5,
            "condition": "with",
            "child": { "field": "returning", "argument0": true }
        }
    }"#;

    let config: RuleConfig = serde_json::from_str(json).unwrap();
    assert!(config.is_negated());
    assert_eq!(config.arguments.get(&0).map(String::as_str), Some("2"));
    assert_eq!(config.arguments.get(&1).map(String::as_str), Some("12"));

    let mut node = RuleNode::new(Registry::builtin());
    node.build(&config);
    assert_eq!(
        node.to_expr(),
        "not visits:between(2, 12) + duration:greater_than(15e-1)\nreturning:is(true)"
    );
}

#[test]
fn non_argument_keys_and_nulls_are_ignored() {
    let json = r#"{
        "field": "country",
        "argument0": "US",
        "argument1": null,
        "argumentX": "skip",
        "label": "Country",
        "child": null
    }"#;

    let config: RuleConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.arguments.len(), 1);
    assert!(config.child.is_none());
}

#[test]
fn serialize_round_trip() {
    let config = RuleConfig::new()
        .field("country")
        .argument(0, "FR")
        .and(RuleConfig::new().field("city").operation("contains").argument(0, "Saint"));

    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["field"], "country");
    assert_eq!(json["argument0"], "FR");
    assert_eq!(json["condition"], "and");
    assert_eq!(json["child"]["argument0"], "Saint");
    assert!(json.get("operator").is_none());

    let back: RuleConfig = serde_json::from_value(json).unwrap();
    assert_eq!(back, config);
}
