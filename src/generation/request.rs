use std::collections::BTreeMap;

use crate::adapters::registry::FormatId;

/// Everything the caller asks for in one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Plain-English scenario
    pub scenario: String,
    pub format: FormatId,

    /// Forces `environment.base_url` on the generated document
    pub base_url: Option<String>,

    /// Tags the model should include
    pub tags: Vec<String>,

    /// Variables the model may reference as `{{name}}`
    pub variables: BTreeMap<String, String>,

    pub strict: bool,
}

impl GenerationRequest {
    pub fn new(scenario: impl Into<String>, format: FormatId) -> Self {
        Self {
            scenario: scenario.into(),
            format,
            base_url: None,
            tags: vec![],
            variables: BTreeMap::new(),
            strict: false,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// Split a comma-separated tag list, dropping blanks.
pub fn parse_tag_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `name=value` pairs.
pub fn parse_variable(pair: &str) -> Option<(String, String)> {
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}
