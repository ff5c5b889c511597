use crate::document::document_model::{ActionKind, SCHEMA_VERSION};
use crate::error::AttemptFailure;
use crate::generation::model_client::Prompt;
use crate::generation::request::GenerationRequest;
use crate::validation::validator::{DESCRIPTION_CHARS, MAX_DESIGN_SENTENCES, STEP_COUNT, TITLE_CHARS};

/// Instructions that never change between requests: the document schema and
/// the closed action vocabulary.
pub fn system_prompt() -> String {
    let actions = ActionKind::ALL
        .iter()
        .map(|kind| {
            let mut fields: Vec<&str> = vec!["action"];
            fields.extend_from_slice(kind.required_fields());
            fields.push("expected_result");
            format!("  - {}: {}", kind.as_str(), fields.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You write structured web UI test cases. Respond with ONE JSON object and nothing else: no prose, no markdown.

SCHEMA:
{{
  "schema_version": "{version}",
  "title": "{title_min}-{title_max} characters",
  "description": "{desc_min}-{desc_max} characters",
  "tags": ["kebab-case", "at-least-one"],
  "environment": {{ "app_type": "web", "base_url": "https://..." }},
  "variables": [{{ "name": "userEmail", "value": "qa@example.com" }}],
  "steps": [ {step_min}-{step_max} step objects ],
  "final_result": "what the whole test proves",
  "design_decisions": "at most {sentences} sentences"
}}

ALLOWED ACTIONS (each step has exactly these fields):
{actions}

RULES:
- selector_type is always "css" when a selector is present.
- match is one of equals, contains, regex and only appears on assert_element_text.
- timeout_seconds is a positive integer.
- Reference variables as {{{{name}}}} and declare every referenced name in "variables"."#,
        version = SCHEMA_VERSION,
        title_min = TITLE_CHARS.start(),
        title_max = TITLE_CHARS.end(),
        desc_min = DESCRIPTION_CHARS.start(),
        desc_max = DESCRIPTION_CHARS.end(),
        step_min = STEP_COUNT.start(),
        step_max = STEP_COUNT.end(),
        sentences = MAX_DESIGN_SENTENCES,
        actions = actions,
    )
}

/// The scenario plus caller hints and target-format guidance.
pub fn user_prompt(request: &GenerationRequest) -> String {
    let base_url = request.base_url.as_deref().unwrap_or("None specified");
    let tags = if request.tags.is_empty() {
        "(none)".to_string()
    } else {
        request.tags.join(",")
    };
    let variables = if request.variables.is_empty() {
        "None".to_string()
    } else {
        request
            .variables
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "SCENARIO:\n{scenario}\n\nBase URL: {base_url}\nRequired tags: {tags}\nAvailable variables: {variables}\n\nTarget format: {format}. {guidance}\n\nReturn the JSON object now.",
        scenario = request.scenario.trim(),
        base_url = base_url,
        tags = tags,
        variables = variables,
        format = request.format.as_str(),
        guidance = request.format.prompt_guidance(),
    )
}

pub fn initial_prompt(request: &GenerationRequest) -> Prompt {
    Prompt::new(system_prompt(), user_prompt(request))
}

/// Continue the previous conversation with the rejected reply and an
/// itemized list of everything wrong with it.
pub fn corrective_prompt(previous: &Prompt, raw_response: &str, failure: &AttemptFailure) -> Prompt {
    let feedback = format!(
        "Your previous reply was rejected. Fix every problem below:\n{}\n\nReturn the full JSON object again with all required fields. No prose.",
        failure.itemized()
    );
    previous.followed_by(raw_response, feedback)
}
