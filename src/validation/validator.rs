use std::collections::{BTreeSet, HashSet};
use std::ops::RangeInclusive;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::document::candidate::{DocumentCandidate, json_type_name, parse_candidate};
use crate::document::document_model::{
    APP_TYPE_WEB, ActionKind, MatchMode, SCHEMA_VERSION, TestDocument,
};
use crate::document::placeholder::placeholders;
use crate::error::ForgeError;
use crate::validation::violation::{RuleKind, ValidationResult, Violation};

pub const TITLE_CHARS: RangeInclusive<usize> = 5..=120;
pub const DESCRIPTION_CHARS: RangeInclusive<usize> = 20..=400;
pub const STEP_COUNT: RangeInclusive<usize> = 4..=12;
pub const MAX_DESIGN_SENTENCES: usize = 5;

pub const KNOWN_TOP_LEVEL_FIELDS: [&str; 9] = [
    "schema_version",
    "title",
    "description",
    "tags",
    "environment",
    "variables",
    "steps",
    "final_result",
    "design_decisions",
];

/// Fields every step may carry regardless of action.
const STEP_COMMON_FIELDS: [&str; 2] = ["action", "expected_result"];

static KEBAB_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("kebab pattern is valid"));

// ============================================================================
// Entry points
// ============================================================================

/// Validate a parsed candidate. Pure and deterministic; every applicable rule
/// runs and all violations are collected.
///
/// Rule order:
/// 1. schema version literal
/// 2. length/count bounds
/// 3. tag format
/// 4. environment
/// 5. per-step action, required fields, selector type, match mode
/// 6. variable-reference closure
/// 7. (strict only) unknown top-level and per-step fields
pub fn validate(candidate: &DocumentCandidate, strict: bool) -> ValidationResult {
    let mut result = ValidationResult::new(strict);
    let root = candidate.root();

    check_schema_version(root, &mut result);
    check_bounds(root, &mut result);
    check_tag_format(root, &mut result);
    check_environment(root, &mut result);
    let declared = check_variables(root, &mut result);
    check_steps(root, &mut result);
    check_variable_references(root, &declared, &mut result);

    if strict {
        check_unknown_top_level_fields(root, &mut result);
        check_unknown_step_fields(root, &mut result);
    }

    result
}

/// Validate an arbitrary JSON value. A non-object yields a single violation.
pub fn validate_value(value: &Value, strict: bool) -> ValidationResult {
    match DocumentCandidate::from_value(value.clone()) {
        Ok(candidate) => validate(&candidate, strict),
        Err(_) => {
            let mut result = ValidationResult::new(strict);
            result.push(Violation::error(
                "$",
                RuleKind::FieldType,
                format!("document must be an object, found {}", json_type_name(value)),
            ));
            result
        }
    }
}

/// Re-validate a typed document, e.g. one assembled by hand.
pub fn validate_document(document: &TestDocument, strict: bool) -> ValidationResult {
    match serde_json::to_value(document) {
        Ok(value) => validate_value(&value, strict),
        Err(e) => {
            let mut result = ValidationResult::new(strict);
            result.push(Violation::error("$", RuleKind::FieldType, e.to_string()));
            result
        }
    }
}

/// Parse raw text and validate it. Parse failures are returned as errors;
/// schema problems are returned inside the result.
pub fn validate_raw(
    raw: &str,
    strict: bool,
) -> Result<(DocumentCandidate, ValidationResult), ForgeError> {
    let candidate = parse_candidate(raw)?;
    let result = validate(&candidate, strict);
    Ok((candidate, result))
}

/// Count sentences as terminal punctuation marks (`.`, `!`, `?`).
///
/// Decimal points and abbreviations count too; accepted documents depend on
/// this exact rule.
pub fn count_sentences(text: &str) -> usize {
    text.chars().filter(|c| matches!(c, '.' | '!' | '?')).count()
}

pub fn is_kebab_case(tag: &str) -> bool {
    KEBAB_CASE.is_match(tag)
}

// ============================================================================
// Field access helpers
// ============================================================================

/// A present, non-null field. Null is treated as absent.
fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// Look up a required string field, recording a violation when it is missing
/// or has the wrong type.
fn required_str<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
    path: &str,
    result: &mut ValidationResult,
) -> Option<&'a str> {
    match field(obj, key) {
        None => {
            result.push(Violation::error(path, RuleKind::RequiredField, "field is required"));
            None
        }
        Some(Value::String(s)) => Some(s.as_str()),
        Some(other) => {
            result.push(Violation::error(
                path,
                RuleKind::FieldType,
                format!("must be a string, found {}", json_type_name(other)),
            ));
            None
        }
    }
}

fn check_char_bounds(
    value: &str,
    bounds: &RangeInclusive<usize>,
    path: &str,
    result: &mut ValidationResult,
) {
    let len = value.chars().count();
    if !bounds.contains(&len) {
        result.push(Violation::error(
            path,
            RuleKind::Bounds,
            format!(
                "must be between {} and {} characters (found {})",
                bounds.start(),
                bounds.end(),
                len
            ),
        ));
    }
}

fn check_not_blank(value: &str, path: &str, result: &mut ValidationResult) {
    if value.trim().is_empty() {
        result.push(Violation::error(path, RuleKind::Bounds, "must not be empty"));
    }
}

fn step_objects(root: &Map<String, Value>) -> impl Iterator<Item = (usize, &Map<String, Value>)> {
    root.get("steps")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .enumerate()
        .filter_map(|(i, step)| step.as_object().map(|obj| (i, obj)))
}

// ============================================================================
// Rule 1: schema version
// ============================================================================

fn check_schema_version(root: &Map<String, Value>, result: &mut ValidationResult) {
    if let Some(version) = required_str(root, "schema_version", "schema_version", result) {
        if version != SCHEMA_VERSION {
            result.push(Violation::error(
                "schema_version",
                RuleKind::SchemaVersion,
                format!("must be '{}' (found '{}')", SCHEMA_VERSION, version),
            ));
        }
    }
}

// ============================================================================
// Rule 2: length and count bounds
// ============================================================================

fn check_bounds(root: &Map<String, Value>, result: &mut ValidationResult) {
    if let Some(title) = required_str(root, "title", "title", result) {
        check_char_bounds(title, &TITLE_CHARS, "title", result);
    }

    if let Some(description) = required_str(root, "description", "description", result) {
        check_char_bounds(description, &DESCRIPTION_CHARS, "description", result);
    }

    match field(root, "tags") {
        None => result.push(Violation::error("tags", RuleKind::RequiredField, "field is required")),
        Some(Value::Array(tags)) if tags.is_empty() => result.push(Violation::error(
            "tags",
            RuleKind::Bounds,
            "must contain at least one tag",
        )),
        Some(Value::Array(_)) => {}
        Some(other) => result.push(Violation::error(
            "tags",
            RuleKind::FieldType,
            format!("must be an array, found {}", json_type_name(other)),
        )),
    }

    match field(root, "steps") {
        None => result.push(Violation::error("steps", RuleKind::RequiredField, "field is required")),
        Some(Value::Array(steps)) => {
            if !STEP_COUNT.contains(&steps.len()) {
                result.push(Violation::error(
                    "steps",
                    RuleKind::Bounds,
                    format!(
                        "must contain between {} and {} steps (found {})",
                        STEP_COUNT.start(),
                        STEP_COUNT.end(),
                        steps.len()
                    ),
                ));
            }
        }
        Some(other) => result.push(Violation::error(
            "steps",
            RuleKind::FieldType,
            format!("must be an array, found {}", json_type_name(other)),
        )),
    }

    if let Some(final_result) = required_str(root, "final_result", "final_result", result) {
        check_not_blank(final_result, "final_result", result);
    }

    if let Some(decisions) = required_str(root, "design_decisions", "design_decisions", result) {
        check_not_blank(decisions, "design_decisions", result);
        let sentences = count_sentences(decisions);
        if sentences > MAX_DESIGN_SENTENCES {
            result.push(Violation::error(
                "design_decisions",
                RuleKind::Bounds,
                format!(
                    "must be at most {} sentences (found {})",
                    MAX_DESIGN_SENTENCES, sentences
                ),
            ));
        }
    }
}

// ============================================================================
// Rule 3: tag format
// ============================================================================

fn check_tag_format(root: &Map<String, Value>, result: &mut ValidationResult) {
    let Some(Value::Array(tags)) = field(root, "tags") else {
        return;
    };

    for (i, tag) in tags.iter().enumerate() {
        let path = format!("tags[{}]", i);
        match tag {
            Value::String(tag) if is_kebab_case(tag) => {}
            Value::String(tag) => result.push(Violation::error(
                path,
                RuleKind::TagFormat,
                format!(
                    "tag '{}' must be kebab-case (lowercase alphanumerics separated by single hyphens)",
                    tag
                ),
            )),
            other => result.push(Violation::error(
                path,
                RuleKind::FieldType,
                format!("must be a string, found {}", json_type_name(other)),
            )),
        }
    }
}

// ============================================================================
// Rule 4: environment
// ============================================================================

fn check_environment(root: &Map<String, Value>, result: &mut ValidationResult) {
    let env = match field(root, "environment") {
        None => {
            result.push(Violation::error(
                "environment",
                RuleKind::RequiredField,
                "field is required",
            ));
            return;
        }
        Some(Value::Object(env)) => env,
        Some(other) => {
            result.push(Violation::error(
                "environment",
                RuleKind::FieldType,
                format!("must be an object, found {}", json_type_name(other)),
            ));
            return;
        }
    };

    // app_type defaults to "web" when omitted
    match field(env, "app_type") {
        None => {}
        Some(Value::String(app_type)) if app_type == APP_TYPE_WEB => {}
        Some(Value::String(app_type)) => result.push(Violation::error(
            "environment.app_type",
            RuleKind::Environment,
            format!("must be '{}' (found '{}')", APP_TYPE_WEB, app_type),
        )),
        Some(other) => result.push(Violation::error(
            "environment.app_type",
            RuleKind::FieldType,
            format!("must be a string, found {}", json_type_name(other)),
        )),
    }

    if let Some(base_url) = required_str(env, "base_url", "environment.base_url", result) {
        if base_url.trim().is_empty() {
            result.push(Violation::error(
                "environment.base_url",
                RuleKind::Environment,
                "must not be empty",
            ));
        }
    }
}

// ============================================================================
// Variables
// ============================================================================

/// Check variable entries and return the set of declared names.
fn check_variables(root: &Map<String, Value>, result: &mut ValidationResult) -> HashSet<String> {
    let mut declared = HashSet::new();

    let vars = match field(root, "variables") {
        None => return declared,
        Some(Value::Array(vars)) => vars,
        Some(other) => {
            result.push(Violation::error(
                "variables",
                RuleKind::FieldType,
                format!("must be an array, found {}", json_type_name(other)),
            ));
            return declared;
        }
    };

    for (i, var) in vars.iter().enumerate() {
        let Some(obj) = var.as_object() else {
            result.push(Violation::error(
                format!("variables[{}]", i),
                RuleKind::FieldType,
                format!("must be an object, found {}", json_type_name(var)),
            ));
            continue;
        };

        let name_path = format!("variables[{}].name", i);
        let value_path = format!("variables[{}].value", i);
        let name = required_str(obj, "name", &name_path, result);
        let value = required_str(obj, "value", &value_path, result);

        if value.is_some_and(str::is_empty) {
            result.push(Violation::error(value_path, RuleKind::Variable, "must not be empty"));
        }

        match name {
            Some("") => {
                result.push(Violation::error(name_path, RuleKind::Variable, "must not be empty"))
            }
            Some(name) => {
                if !declared.insert(name.to_string()) {
                    result.push(Violation::warning(
                        name_path,
                        RuleKind::Variable,
                        format!("variable '{}' is declared more than once", name),
                    ));
                }
            }
            None => {}
        }
    }

    declared
}

// ============================================================================
// Rule 5: per-step checks
// ============================================================================

fn check_steps(root: &Map<String, Value>, result: &mut ValidationResult) {
    let Some(Value::Array(steps)) = field(root, "steps") else {
        return;
    };

    for (i, step) in steps.iter().enumerate() {
        let Some(obj) = step.as_object() else {
            result.push(Violation::error(
                format!("steps[{}]", i),
                RuleKind::FieldType,
                format!("must be an object, found {}", json_type_name(step)),
            ));
            continue;
        };
        check_step(i, obj, result);
    }
}

fn check_step(index: usize, step: &Map<String, Value>, result: &mut ValidationResult) {
    let path = |key: &str| format!("steps[{}].{}", index, key);

    let action = required_str(step, "action", &path("action"), result);
    let kind = action.and_then(|name| {
        let kind = ActionKind::parse(name);
        if kind.is_none() {
            result.push(Violation::error(
                path("action"),
                RuleKind::StepAction,
                format!(
                    "unknown action '{}'; expected one of: {}",
                    name,
                    ActionKind::vocabulary()
                ),
            ));
        }
        kind
    });

    if let Some(expected) = required_str(step, "expected_result", &path("expected_result"), result)
    {
        check_not_blank(expected, &path("expected_result"), result);
    }

    let required: &[&str] = kind.map(ActionKind::required_fields).unwrap_or(&[]);

    if let Some(kind) = kind {
        for &name in required {
            match field(step, name) {
                None => result.push(Violation::error(
                    path(name),
                    RuleKind::RequiredField,
                    format!("'{}' is required for action '{}'", name, kind.as_str()),
                )),
                Some(value) => check_step_field_type(name, value, &path(name), result),
            }
        }
    }

    // selector_type must be css whenever a selector is present
    if field(step, "selector").is_some() {
        match field(step, "selector_type") {
            Some(Value::String(t)) if t == "css" => {}
            Some(Value::String(t)) => result.push(Violation::error(
                path("selector_type"),
                RuleKind::SelectorType,
                format!("selector_type must be 'css' when selector is present (found '{}')", t),
            )),
            // required selector_type already got a field-type violation
            Some(_) if required.contains(&"selector_type") => {}
            Some(other) => result.push(Violation::error(
                path("selector_type"),
                RuleKind::SelectorType,
                format!(
                    "selector_type must be 'css' when selector is present (found {})",
                    json_type_name(other)
                ),
            )),
            None if required.contains(&"selector_type") => {}
            None => result.push(Violation::error(
                path("selector_type"),
                RuleKind::SelectorType,
                "selector_type must be 'css' when selector is present (missing)",
            )),
        }
    }

    if let Some(match_value) = field(step, "match") {
        match kind {
            Some(ActionKind::AssertElementText) => {
                if let Value::String(mode) = match_value {
                    if MatchMode::parse(mode).is_none() {
                        result.push(Violation::error(
                            path("match"),
                            RuleKind::MatchMode,
                            format!(
                                "match must be one of {} (found '{}')",
                                MatchMode::ALL.join(", "),
                                mode
                            ),
                        ));
                    }
                }
            }
            Some(other) => result.push(Violation::error(
                path("match"),
                RuleKind::MatchMode,
                format!(
                    "match is only allowed on assert_element_text, not '{}'",
                    other.as_str()
                ),
            )),
            None => {}
        }
    }
}

/// Type checks for action-specific fields that are present.
fn check_step_field_type(name: &str, value: &Value, path: &str, result: &mut ValidationResult) {
    match name {
        "timeout_seconds" => {
            if !value.as_u64().is_some_and(|n| n > 0) {
                result.push(Violation::error(
                    path,
                    RuleKind::FieldType,
                    format!("must be a positive integer, found {}", value),
                ));
            }
        }
        "target" | "selector" => match value {
            Value::String(s) if !s.trim().is_empty() => {}
            Value::String(_) => {
                result.push(Violation::error(path, RuleKind::Bounds, "must not be empty"))
            }
            other => result.push(Violation::error(
                path,
                RuleKind::FieldType,
                format!("must be a string, found {}", json_type_name(other)),
            )),
        },
        _ => {
            if !value.is_string() {
                result.push(Violation::error(
                    path,
                    RuleKind::FieldType,
                    format!("must be a string, found {}", json_type_name(value)),
                ));
            }
        }
    }
}

// ============================================================================
// Rule 6: variable-reference closure
// ============================================================================

fn check_variable_references(
    root: &Map<String, Value>,
    declared: &HashSet<String>,
    result: &mut ValidationResult,
) {
    for (i, step) in step_objects(root) {
        for (key, value) in step {
            let Value::String(text) = value else {
                continue;
            };

            let undeclared: BTreeSet<&str> = placeholders(text)
                .into_iter()
                .filter(|name| !declared.contains(*name))
                .collect();

            for name in undeclared {
                result.push(Violation::error(
                    format!("steps[{}].{}", i, key),
                    RuleKind::VariableReference,
                    format!("variable '{}' is used but not declared in variables", name),
                ));
            }
        }
    }
}

// ============================================================================
// Rule 7: strict-only unknown fields
// ============================================================================

fn check_unknown_top_level_fields(root: &Map<String, Value>, result: &mut ValidationResult) {
    for key in root.keys() {
        if !KNOWN_TOP_LEVEL_FIELDS.contains(&key.as_str()) {
            result.push(Violation::error(
                key.clone(),
                RuleKind::UnknownField,
                format!("unknown top-level field '{}'", key),
            ));
        }
    }
}

fn check_unknown_step_fields(root: &Map<String, Value>, result: &mut ValidationResult) {
    for (i, step) in step_objects(root) {
        let Some(kind) = step
            .get("action")
            .and_then(Value::as_str)
            .and_then(ActionKind::parse)
        else {
            continue;
        };

        let allowed = kind.required_fields();
        for (key, value) in step {
            if value.is_null()
                || STEP_COMMON_FIELDS.contains(&key.as_str())
                || allowed.contains(&key.as_str())
            {
                continue;
            }
            result.push(Violation::error(
                format!("steps[{}].{}", i, key),
                RuleKind::UnknownField,
                format!("unexpected field '{}' for action '{}'", key, kind.as_str()),
            ));
        }
    }
}
