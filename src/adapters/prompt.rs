use crate::adapters::FormatAdapter;
use crate::adapters::registry::FormatId;
use crate::adapters::selector_names::human_name;
use crate::document::document_model::{MatchMode, TestDocument, TestStep};

/// Upper bound on consolidated steps in the terse prompt.
pub const MAX_PROMPT_STEPS: usize = 6;

/// Terse human-language prompt for a manual or AI tester. Related steps are
/// merged so the whole test fits in a handful of lines.
pub struct PromptAdapter;

impl FormatAdapter for PromptAdapter {
    fn format_id(&self) -> FormatId {
        FormatId::Prompt
    }

    fn convert(&self, document: &TestDocument) -> String {
        let mut parts: Vec<String> = vec![
            format!("Create a test: {}", document.title),
            format!("Goal: {}", document.final_result),
            format!("Site: {}", document.environment.base_url),
            String::new(),
        ];

        if !document.variables.is_empty() {
            parts.push("Data:".to_string());
            for var in &document.variables {
                parts.push(format!("- {{{{{}}}}} = {}", var.name, var.value));
            }
            parts.push(String::new());
        }

        parts.push("Steps:".to_string());
        for (i, line) in consolidate_steps(&document.steps).iter().enumerate() {
            parts.push(format!("{}. {}", i + 1, line));
        }
        parts.push(String::new());
        parts.push("Use data-test selectors when possible.".to_string());
        parts.push("Include clear validation for each step.".to_string());

        let mut out = parts.join("\n");
        out.push('\n');
        out
    }

    fn file_extension(&self) -> &'static str {
        ".txt"
    }
}

/// Merge detailed steps into at most `MAX_PROMPT_STEPS` instructions.
///
/// A wait right after a navigation is implied by the navigation; consecutive
/// `type` steps become one form-fill line.
pub fn consolidate_steps(steps: &[TestStep]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < steps.len() && out.len() < MAX_PROMPT_STEPS {
        match &steps[i] {
            TestStep::Navigate { target, .. } => {
                out.push(format!("Go to {}", target));
                if matches!(steps.get(i + 1), Some(TestStep::WaitForElement { .. })) {
                    i += 1;
                }
            }
            TestStep::Type { .. } => {
                let mut entries = Vec::new();
                while let Some(TestStep::Type { selector, value, .. }) = steps.get(i) {
                    entries.push(format!("enter '{}' in {}", value, human_name(selector)));
                    i += 1;
                }
                out.push(format!("Fill form: {}", entries.join(", ")));
                continue;
            }
            TestStep::Click { selector, .. } => out.push(format!("Click {}", human_name(selector))),
            TestStep::WaitForElement { selector, .. } => {
                out.push(format!("Wait for {} to appear", human_name(selector)))
            }
            TestStep::AssertElementText { selector, match_mode, value, .. } => {
                let name = human_name(selector);
                out.push(match match_mode {
                    MatchMode::Equals => format!("Verify {} shows exactly '{}'", name, value),
                    MatchMode::Contains => format!("Verify {} contains '{}'", name, value),
                    MatchMode::Regex => format!("Verify {} matches the pattern '{}'", name, value),
                });
            }
            TestStep::AssertElementVisible { selector, .. } => {
                out.push(format!("Confirm {} is visible", human_name(selector)))
            }
            TestStep::AssertNoNavigation { .. } => {
                out.push("Confirm the page does not navigate away".to_string())
            }
            TestStep::OpenNewTab { target, .. } => out.push(format!("Open {} in a new tab", target)),
            TestStep::SwitchToNewTab { .. } => out.push("Switch to the new tab".to_string()),
        }
        i += 1;
    }

    out
}
