use std::fmt;
use std::str::FromStr;

use crate::adapters::FormatAdapter;
use crate::adapters::brief::BriefPromptAdapter;
use crate::adapters::cypress::CypressAdapter;
use crate::adapters::gherkin::GherkinAdapter;
use crate::adapters::native::NativeAdapter;
use crate::adapters::prompt::PromptAdapter;
use crate::error::ForgeError;

/// Every supported output format. Each identifier maps to exactly one adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatId {
    /// The document itself as pretty JSON
    Native,
    /// Cypress spec file
    Cypress,
    /// Gherkin feature file
    Gherkin,
    /// Terse human-language prompt (up to 6 steps)
    Prompt,
    /// Most condensed prompt (up to 4 steps)
    PromptBrief,
}

impl FormatId {
    pub const ALL: [FormatId; 5] = [
        FormatId::Native,
        FormatId::Cypress,
        FormatId::Gherkin,
        FormatId::Prompt,
        FormatId::PromptBrief,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormatId::Native => "native",
            FormatId::Cypress => "cypress",
            FormatId::Gherkin => "gherkin",
            FormatId::Prompt => "prompt",
            FormatId::PromptBrief => "prompt-brief",
        }
    }

    /// Format-specific hint appended to the generation prompt.
    pub fn prompt_guidance(self) -> &'static str {
        match self {
            FormatId::Native => "The JSON is delivered as-is, so fill every field carefully.",
            FormatId::Cypress => {
                "Steps become Cypress commands: prefer stable [data-test='...'] CSS selectors and concrete values."
            }
            FormatId::Gherkin => {
                "Steps become Given/When/Then lines: write expected_result values as short readable sentences."
            }
            FormatId::Prompt | FormatId::PromptBrief => {
                "Steps are condensed for a human tester: keep the flow linear and use data-test selectors when possible."
            }
        }
    }

    pub fn adapter(self) -> &'static dyn FormatAdapter {
        match self {
            FormatId::Native => &NativeAdapter,
            FormatId::Cypress => &CypressAdapter,
            FormatId::Gherkin => &GherkinAdapter,
            FormatId::Prompt => &PromptAdapter,
            FormatId::PromptBrief => &BriefPromptAdapter,
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatId {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        FormatId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| ForgeError::UnsupportedFormat {
                requested: s.to_string(),
                available: available_formats(),
            })
    }
}

/// Sorted list of every format identifier.
pub fn available_formats() -> Vec<&'static str> {
    let mut ids: Vec<&'static str> = FormatId::ALL.iter().map(|id| id.as_str()).collect();
    ids.sort_unstable();
    ids
}

/// Look up the adapter for a format identifier. Unknown identifiers fail
/// with `UnsupportedFormat` naming the valid set.
pub fn resolve(format_id: &str) -> Result<&'static dyn FormatAdapter, ForgeError> {
    let id: FormatId = format_id.parse()?;
    Ok(id.adapter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identifiers_are_unique() {
        let ids: HashSet<&str> = FormatId::ALL.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids.len(), FormatId::ALL.len());
    }

    #[test]
    fn each_adapter_reports_its_own_id() {
        for id in FormatId::ALL {
            assert_eq!(id.adapter().format_id(), id);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Gherkin".parse::<FormatId>().unwrap(), FormatId::Gherkin);
    }
}
