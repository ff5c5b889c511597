use proptest::prelude::*;
use scenario_forge::document::candidate::DocumentCandidate;
use scenario_forge::validation::{RuleKind, Severity, validate, validate_raw, validate_value};
use serde_json::{Value, json};

mod common;

use common::{login_value, login_with, with_step_count};

fn assert_valid(doc: &Value) {
    let result = validate_value(doc, false);
    assert!(result.is_valid(), "expected valid, got:\n{}", result.feedback());
}

// ============================================================================
// Baseline
// ============================================================================

#[test]
fn login_fixture_is_valid_in_both_modes() {
    assert!(validate_value(&login_value(), false).is_valid());
    assert!(validate_value(&login_value(), true).is_valid());
}

#[test]
fn app_type_may_be_omitted() {
    let doc = login_with(|d| {
        d["environment"].as_object_mut().unwrap().remove("app_type");
    });
    assert_valid(&doc);
}

#[test]
fn variables_may_be_omitted_when_nothing_is_referenced() {
    let doc = login_with(|d| {
        d.as_object_mut().unwrap().remove("variables");
        d["steps"][2]["value"] = json!("qa@example.com");
        d["steps"][3]["value"] = json!("s3cret!");
    });
    assert_valid(&doc);
}

// ============================================================================
// Bounds
// ============================================================================

#[test]
fn step_count_boundaries() {
    assert_valid(&with_step_count(4));
    assert_valid(&with_step_count(12));

    for count in [3, 13] {
        let result = validate_value(&with_step_count(count), false);
        assert!(!result.is_valid(), "{} steps should be rejected", count);
        assert!(result.has_path("steps"));
        assert!(result.has_rule(RuleKind::Bounds));
    }
}

#[test]
fn design_decisions_sentence_boundary() {
    let five = login_with(|d| d["design_decisions"] = json!("One. Two. Three. Four. Five."));
    assert_valid(&five);

    let six = login_with(|d| d["design_decisions"] = json!("One. Two. Three. Four. Five. Six."));
    let result = validate_value(&six, false);
    assert!(!result.is_valid());
    assert!(result.has_path("design_decisions"));
}

#[test]
fn title_and_description_lengths() {
    let doc = login_with(|d| {
        d["title"] = json!("Log");
        d["description"] = json!("Too short");
    });
    let result = validate_value(&doc, false);
    assert!(result.has_path("title"));
    assert!(result.has_path("description"));
}

#[test]
fn empty_tag_list_is_rejected() {
    let doc = login_with(|d| d["tags"] = json!([]));
    let result = validate_value(&doc, false);
    assert!(result.has_path("tags"));
}

// ============================================================================
// Rule scenarios
// ============================================================================

#[test]
fn non_kebab_tag_names_its_index() {
    let doc = login_with(|d| d["tags"] = json!(["Auth"]));
    let result = validate_value(&doc, false);
    assert!(!result.is_valid());
    let v = result.errors().find(|v| v.rule == RuleKind::TagFormat).unwrap();
    assert_eq!(v.path, "tags[0]");
}

#[test]
fn xpath_selector_type_is_rejected() {
    let doc = login_with(|d| d["steps"][4]["selector_type"] = json!("xpath"));
    let result = validate_value(&doc, false);
    assert!(!result.is_valid());
    let v = result.errors().find(|v| v.rule == RuleKind::SelectorType).unwrap();
    assert_eq!(v.path, "steps[4].selector_type");
}

#[test]
fn selector_without_selector_type_on_navigate_is_rejected() {
    let doc = login_with(|d| d["steps"][0]["selector"] = json!("#main"));
    let result = validate_value(&doc, false);
    assert!(result.has_rule(RuleKind::SelectorType));
}

#[test]
fn non_string_selector_type_on_navigate_is_rejected() {
    for bad in [json!(5), json!(true), json!([])] {
        let doc = login_with(|d| {
            d["steps"][0]["selector"] = json!("#a");
            d["steps"][0]["selector_type"] = bad.clone();
        });
        let result = validate_value(&doc, false);
        assert!(!result.is_valid(), "selector_type {} should be rejected", bad);
        let v = result.errors().find(|v| v.rule == RuleKind::SelectorType).unwrap();
        assert_eq!(v.path, "steps[0].selector_type");
    }
}

#[test]
fn non_string_selector_type_on_click_is_reported_once() {
    let doc = login_with(|d| d["steps"][4]["selector_type"] = json!(5));
    let result = validate_value(&doc, false);
    let hits: Vec<_> = result
        .errors()
        .filter(|v| v.path == "steps[4].selector_type")
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].rule, RuleKind::FieldType);
}

#[test]
fn undeclared_variable_is_named() {
    let doc = login_with(|d| {
        d["variables"] = json!([{ "name": "userPassword", "value": "s3cret!" }]);
    });
    let result = validate_value(&doc, false);
    assert!(!result.is_valid());
    let v = result
        .errors()
        .find(|v| v.rule == RuleKind::VariableReference)
        .unwrap();
    assert_eq!(v.path, "steps[2].value");
    assert!(v.message.contains("userEmail"));
}

#[test]
fn unknown_action_lists_vocabulary() {
    let doc = login_with(|d| d["steps"][4]["action"] = json!("double_click"));
    let result = validate_value(&doc, false);
    let v = result.errors().find(|v| v.rule == RuleKind::StepAction).unwrap();
    assert_eq!(v.path, "steps[4].action");
    assert!(v.message.contains("assert_element_text"));
}

#[test]
fn bad_match_mode_is_rejected() {
    let doc = login_with(|d| d["steps"][5]["match"] = json!("startsWith"));
    let result = validate_value(&doc, false);
    assert!(result.has_path("steps[5].match"));
    assert!(result.has_rule(RuleKind::MatchMode));
}

#[test]
fn match_on_other_action_is_rejected() {
    let doc = login_with(|d| d["steps"][4]["match"] = json!("equals"));
    let result = validate_value(&doc, false);
    assert!(result.has_path("steps[4].match"));
}

#[test]
fn wrong_schema_version_is_rejected() {
    let doc = login_with(|d| d["schema_version"] = json!("rf-2.0"));
    let result = validate_value(&doc, false);
    assert!(result.has_rule(RuleKind::SchemaVersion));
}

#[test]
fn non_web_app_type_is_rejected() {
    let doc = login_with(|d| d["environment"]["app_type"] = json!("mobile"));
    let result = validate_value(&doc, false);
    assert!(result.has_path("environment.app_type"));
}

#[test]
fn zero_timeout_is_rejected() {
    let doc = login_with(|d| d["steps"][1]["timeout_seconds"] = json!(0));
    let result = validate_value(&doc, false);
    assert!(result.has_path("steps[1].timeout_seconds"));
}

#[test]
fn wrong_field_type_is_a_violation_not_a_panic() {
    let doc = login_with(|d| d["steps"][2]["value"] = json!(42));
    let result = validate_value(&doc, false);
    let v = result.errors().find(|v| v.path == "steps[2].value").unwrap();
    assert_eq!(v.rule, RuleKind::FieldType);
}

#[test]
fn duplicate_variable_is_only_a_warning() {
    let doc = login_with(|d| {
        d["variables"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "name": "userEmail", "value": "other@example.com" }));
    });
    let result = validate_value(&doc, false);
    assert!(result.is_valid());
    let w = result.warnings().next().unwrap();
    assert_eq!(w.severity, Severity::Warning);
    assert_eq!(w.path, "variables[2].name");
}

#[test]
fn all_violations_are_reported_together() {
    let doc = login_with(|d| {
        d["tags"] = json!(["Auth"]);
        d["steps"][4]["selector_type"] = json!("xpath");
        d["design_decisions"] = json!("1. 2. 3. 4. 5. 6.");
    });
    let result = validate_value(&doc, false);
    assert!(result.has_path("tags[0]"));
    assert!(result.has_path("steps[4].selector_type"));
    assert!(result.has_path("design_decisions"));
    assert_eq!(result.feedback().lines().count(), result.errors().count());
}

// ============================================================================
// Required fields
// ============================================================================

#[test]
fn missing_required_field_is_named() {
    let doc = login_with(|d| {
        d["steps"][2].as_object_mut().unwrap().remove("value");
    });
    let result = validate_value(&doc, false);
    let v = result.errors().find(|v| v.path == "steps[2].value").unwrap();
    assert_eq!(v.rule, RuleKind::RequiredField);
}

#[test]
fn missing_top_level_fields_are_all_named() {
    let result = validate_value(&json!({ "schema_version": "rf-1.0" }), false);
    for path in ["title", "description", "tags", "environment", "steps", "final_result", "design_decisions"] {
        assert!(result.has_path(path), "missing violation for {}", path);
    }
}

#[test]
fn null_is_treated_as_absent() {
    let doc = login_with(|d| d["final_result"] = Value::Null);
    let result = validate_value(&doc, false);
    let v = result.errors().find(|v| v.path == "final_result").unwrap();
    assert_eq!(v.rule, RuleKind::RequiredField);
}

// ============================================================================
// Strict mode
// ============================================================================

#[test]
fn unknown_top_level_field_only_fails_strict() {
    let doc = login_with(|d| d["priority"] = json!("high"));
    assert!(validate_value(&doc, false).is_valid());

    let strict = validate_value(&doc, true);
    assert!(!strict.is_valid());
    assert!(strict.has_path("priority"));
    assert!(strict.has_rule(RuleKind::UnknownField));
}

#[test]
fn unknown_step_field_only_fails_strict() {
    let doc = login_with(|d| d["steps"][0]["timeout_seconds"] = json!(5));
    assert!(validate_value(&doc, false).is_valid());
    assert!(validate_value(&doc, true).has_path("steps[0].timeout_seconds"));
}

// ============================================================================
// Raw text entry point
// ============================================================================

#[test]
fn raw_text_with_fence_is_accepted() {
    let raw = common::fenced(&common::login_json());
    let (_, result) = validate_raw(&raw, false).unwrap();
    assert!(result.is_valid());
}

#[test]
fn non_json_raw_text_is_a_parse_error() {
    assert!(validate_raw("Sure! Here is your test case.", false).is_err());
    assert!(validate_raw("[1, 2, 3]", false).is_err());
}

// ============================================================================
// Properties
// ============================================================================

fn optional_extras() -> impl Strategy<Value = (bool, bool, bool)> {
    (any::<bool>(), any::<bool>(), any::<bool>())
}

proptest! {
    /// Whatever strict mode accepts, lenient mode accepts too.
    #[test]
    fn strict_accepts_subset_of_lenient((top, step, app) in optional_extras()) {
        let doc = login_with(|d| {
            if top { d["notes"] = json!("extra"); }
            if step { d["steps"][4]["timeout_seconds"] = json!(3); }
            if app { d["environment"].as_object_mut().unwrap().remove("app_type"); }
        });
        let candidate = DocumentCandidate::from_value(doc).unwrap();
        let strict = validate(&candidate, true);
        let lenient = validate(&candidate, false);
        if strict.is_valid() {
            prop_assert!(lenient.is_valid());
        }
        prop_assert!(lenient.is_valid());
        prop_assert!(strict.violations.len() >= lenient.violations.len());
    }

    /// A missing required field is always named, whatever else is missing.
    #[test]
    fn missing_required_field_always_named(drop_selector in any::<bool>(), drop_expected in any::<bool>()) {
        let doc = login_with(|d| {
            let step = d["steps"][5].as_object_mut().unwrap();
            step.remove("value");
            if drop_selector { step.remove("selector"); }
            if drop_expected { step.remove("expected_result"); }
        });
        let result = validate_value(&doc, false);
        prop_assert!(result.has_path("steps[5].value"));
    }

    #[test]
    fn step_count_bounds_hold(count in 0usize..20) {
        let result = validate_value(&with_step_count(count), false);
        prop_assert_eq!(result.is_valid(), (4..=12).contains(&count));
    }
}
