use crate::adapters::FormatAdapter;
use crate::adapters::registry::FormatId;
use crate::adapters::selector_names::human_name;
use crate::document::document_model::{ActionCategory, TestDocument, TestStep};

pub const MAX_BRIEF_STEPS: usize = 4;

/// Shortest prompt variant: where to go, what to enter, what to press, what
/// to check.
pub struct BriefPromptAdapter;

impl FormatAdapter for BriefPromptAdapter {
    fn format_id(&self) -> FormatId {
        FormatId::PromptBrief
    }

    fn convert(&self, document: &TestDocument) -> String {
        let steps = brief_steps(document);
        let numbered: Vec<String> = steps
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, s))
            .collect();

        format!(
            "Test: {}\n\nSite: {}\n\nSteps:\n{}\n\nExpected: {}\n",
            document.title,
            document.environment.base_url,
            numbered.join("\n"),
            document.final_result
        )
    }

    fn file_extension(&self) -> &'static str {
        ".txt"
    }
}

/// Pick the essential steps, in document order: the first navigation, all
/// typing folded into one line, the submitting click and the first assertion.
pub fn brief_steps(document: &TestDocument) -> Vec<String> {
    let steps = &document.steps;
    let mut picked: Vec<(usize, String)> = Vec::new();

    if let Some((i, TestStep::Navigate { target, .. })) = steps
        .iter()
        .enumerate()
        .find(|(_, s)| matches!(s, TestStep::Navigate { .. }))
    {
        picked.push((i, format!("Go to {}", target)));
    }

    let fields: Vec<(usize, String)> = steps
        .iter()
        .enumerate()
        .filter_map(|(i, s)| match s {
            TestStep::Type { selector, .. } => Some((i, human_name(selector))),
            _ => None,
        })
        .collect();
    if let Some((first, _)) = fields.first() {
        let mut names: Vec<String> = Vec::new();
        for (_, name) in &fields {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        picked.push((*first, format!("Fill in {}", join_names(&names))));
    }

    let clicks: Vec<(usize, &str)> = steps
        .iter()
        .enumerate()
        .filter_map(|(i, s)| match s {
            TestStep::Click { selector, .. } => Some((i, selector.as_str())),
            _ => None,
        })
        .collect();
    let submit = clicks
        .iter()
        .find(|(_, sel)| sel.to_lowercase().contains("submit"))
        .or_else(|| clicks.last());
    if let Some((i, selector)) = submit {
        picked.push((*i, format!("Click {}", human_name(selector))));
    }

    if let Some((i, step)) = steps
        .iter()
        .enumerate()
        .find(|(_, s)| s.kind().category() == ActionCategory::Assertion)
    {
        picked.push((i, format!("Check: {}", step.expected_result())));
    }

    picked.sort_by_key(|(i, _)| *i);
    let mut out: Vec<String> = picked.into_iter().map(|(_, line)| line).collect();

    if out.is_empty() || !out[0].starts_with("Go to") {
        out.insert(0, format!("Go to {}", document.environment.base_url));
    }
    out.truncate(MAX_BRIEF_STEPS);
    out
}

fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}
