use serde_json::{Map, Value};

use crate::document::document_model::TestDocument;
use crate::error::ForgeError;
use crate::validation::violation::{RuleKind, Violation};

// ============================================================================
// DocumentCandidate: parsed model output that has not been validated yet
// ============================================================================

/// A JSON object parsed from raw model text. The validator reads it field by
/// field so that wrong types and missing fields surface as violations instead
/// of aborting deserialization.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentCandidate {
    root: Map<String, Value>,
}

impl DocumentCandidate {
    pub fn from_value(value: Value) -> Result<Self, ForgeError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(ForgeError::Parse(format!(
                "expected a JSON object at the top level, found {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Force `environment.base_url` to a caller-supplied URL. Creates the
    /// environment object when the model omitted it.
    pub fn apply_base_url_override(&mut self, base_url: &str) {
        let env = self
            .root
            .entry("environment")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(env) = env {
            env.insert("base_url".to_string(), Value::String(base_url.to_string()));
        }
    }
}

/// Strip a surrounding markdown code fence (```` ``` ```` or ```` ```json ````)
/// from model output. Text without a fence is only trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }

    let text = text.trim_end();
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// Parse raw model text into a candidate document.
///
/// Fails with `ForgeError::Parse` when the fence-stripped text is not JSON or
/// is JSON but not an object. Semantic problems are left to the validator.
pub fn parse_candidate(raw: &str) -> Result<DocumentCandidate, ForgeError> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(ForgeError::Parse("empty response".to_string()));
    }

    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| ForgeError::Parse(format!("invalid JSON: {}", e)))?;
    DocumentCandidate::from_value(value)
}

impl TestDocument {
    /// Build the typed document from a candidate that passed validation.
    ///
    /// Fields tolerated by lenient validation but unknown to the model are
    /// dropped. A candidate that never passed validation may still fail here;
    /// the failure is reported as a schema violation on the document root.
    pub fn from_candidate(candidate: &DocumentCandidate) -> Result<TestDocument, ForgeError> {
        let mut value = Value::Object(candidate.root.clone());
        strip_nulls(&mut value);

        serde_json::from_value(value).map_err(|e| ForgeError::Schema {
            violations: vec![Violation::error(
                "$",
                RuleKind::FieldType,
                format!("document does not match the typed model: {}", e),
            )],
        })
    }

    /// Parse raw text (fences allowed) straight into a typed document without
    /// running the validator. Used when re-reading native output.
    pub fn from_json_str(raw: &str) -> Result<TestDocument, ForgeError> {
        let candidate = parse_candidate(raw)?;
        TestDocument::from_candidate(&candidate)
    }
}

/// Remove null-valued object entries at every depth; null means absent.
fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fence_with_whitespace() {
        let raw = "  \n```\n{\"a\": 1}\n```  \n";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fences(" {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn single_line_fence() {
        assert_eq!(strip_code_fences("```json{\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn non_object_is_parse_error() {
        let err = parse_candidate("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ForgeError::Parse(_)));
    }

    #[test]
    fn malformed_is_parse_error() {
        let err = parse_candidate("```json\n{\"title\": \n```").unwrap_err();
        assert!(matches!(err, ForgeError::Parse(_)));
    }

    #[test]
    fn base_url_override_creates_environment() {
        let mut candidate = parse_candidate("{}").unwrap();
        candidate.apply_base_url_override("https://override.test");
        assert_eq!(
            candidate.get("environment").and_then(|e| e.get("base_url")),
            Some(&Value::String("https://override.test".into()))
        );
    }
}
