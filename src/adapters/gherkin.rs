use crate::adapters::FormatAdapter;
use crate::adapters::registry::FormatId;
use crate::document::document_model::{ActionCategory, MatchMode, TestDocument, TestStep};

// ============================================================================
// Gherkin adapter: narrative feature file
// ============================================================================

/// Emits a Gherkin feature: tags, title and description, a Background that
/// binds the base URL, then one Given/When/Then line per step.
///
/// Placeholders such as `{{userEmail}}` are written verbatim; the output is
/// read by people, not executed.
pub struct GherkinAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Given,
    When,
    Then,
}

impl Keyword {
    pub fn for_category(category: ActionCategory) -> Self {
        match category {
            ActionCategory::Setup => Keyword::Given,
            ActionCategory::Interaction => Keyword::When,
            ActionCategory::Assertion => Keyword::Then,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Given => "Given",
            Keyword::When => "When",
            Keyword::Then => "Then",
        }
    }
}

impl FormatAdapter for GherkinAdapter {
    fn format_id(&self) -> FormatId {
        FormatId::Gherkin
    }

    fn convert(&self, document: &TestDocument) -> String {
        let mut lines: Vec<String> = Vec::new();

        if !document.tags.is_empty() {
            let tags: Vec<String> = document.tags.iter().map(|t| format!("@{}", t)).collect();
            lines.push(tags.join(" "));
        }

        lines.push(format!("Feature: {}", document.title));
        for line in document.description.lines() {
            if line.trim().is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("  {}", line.trim_end()));
            }
        }
        lines.push(String::new());
        lines.push("  Background:".to_string());
        lines.push(format!(
            "    Given the application is running at \"{}\"",
            document.environment.base_url
        ));
        lines.push(String::new());
        lines.push(format!("  Scenario: {}", document.title));

        let keywords: Vec<Keyword> = document
            .steps
            .iter()
            .map(|s| Keyword::for_category(s.kind().category()))
            .collect();

        let mut previous: Option<Keyword> = None;
        for (step, &keyword) in document.steps.iter().zip(&keywords) {
            let lead = if previous == Some(keyword) {
                "And"
            } else {
                keyword.as_str()
            };
            lines.push(format!("    {} {}", lead, step_sentence(step)));
            previous = Some(keyword);
        }

        // close with the overall outcome unless an assertion already ends the scenario
        let tail_asserts = keywords.iter().rev().take(2).any(|k| *k == Keyword::Then);
        if !tail_asserts {
            let lead = if previous == Some(Keyword::Then) { "And" } else { "Then" };
            lines.push(format!("    {} {}", lead, document.final_result));
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn file_extension(&self) -> &'static str {
        ".feature"
    }
}

/// The sentence that follows the keyword for one step.
pub fn step_sentence(step: &TestStep) -> String {
    match step {
        TestStep::Navigate { target, .. } => format!("I navigate to \"{}\"", target),
        TestStep::WaitForElement { selector, timeout_seconds, .. } => format!(
            "I wait {} seconds for element \"{}\" to appear",
            timeout_seconds, selector
        ),
        TestStep::Type { selector, value, .. } => {
            format!("I type \"{}\" into \"{}\"", value, selector)
        }
        TestStep::Click { selector, .. } => format!("I click on \"{}\"", selector),
        TestStep::AssertElementText { selector, match_mode, value, .. } => match match_mode {
            MatchMode::Equals => {
                format!("the element \"{}\" should have text \"{}\"", selector, value)
            }
            MatchMode::Contains => {
                format!("the element \"{}\" should contain text \"{}\"", selector, value)
            }
            MatchMode::Regex => {
                format!("the element \"{}\" should match pattern \"{}\"", selector, value)
            }
        },
        TestStep::AssertElementVisible { selector, .. } => {
            format!("the element \"{}\" should be visible", selector)
        }
        TestStep::AssertNoNavigation { .. } => "I should remain on the current page".to_string(),
        TestStep::OpenNewTab { target, .. } => format!("I open \"{}\" in a new tab", target),
        TestStep::SwitchToNewTab { .. } => "I switch to the new tab".to_string(),
    }
}
