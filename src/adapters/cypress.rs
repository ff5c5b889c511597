use std::collections::BTreeMap;

use crate::adapters::FormatAdapter;
use crate::adapters::registry::FormatId;
use crate::document::document_model::{MatchMode, TestDocument, TestStep};
use crate::document::placeholder::substitute;

// ============================================================================
// Cypress adapter: executable spec file
// ============================================================================

/// Emits a Cypress spec: a `beforeEach` that visits the base URL, then one
/// commented statement group per step inside a single `it` block.
///
/// `{{name}}` placeholders are replaced with the declared values because the
/// generated JavaScript has no such templating.
pub struct CypressAdapter;

/// How long `assert_no_navigation` waits before re-reading the URL.
const NO_NAVIGATION_SETTLE_MS: u64 = 500;

impl FormatAdapter for CypressAdapter {
    fn format_id(&self) -> FormatId {
        FormatId::Cypress
    }

    fn convert(&self, document: &TestDocument) -> String {
        let vars = document.variable_map();
        let text = |s: &str| substitute(s, &vars);
        let base_url = text(&document.environment.base_url);

        let mut out = String::new();
        out.push_str("// Generated by scenario-forge\n");
        out.push_str(&format!("// {}\n", single_line(&text(&document.title))));
        out.push_str(&format!("// {}\n", single_line(&text(&document.description))));
        out.push_str(&format!("// Tags: {}\n\n", document.tags.join(", ")));

        out.push_str(&format!("describe({}, () => {{\n", js_str(&text(&document.title))));
        out.push_str("  beforeEach(() => {\n");
        out.push_str(&format!("    cy.visit({});\n", js_str(&base_url)));
        out.push_str("  });\n\n");
        out.push_str(&format!("  it({}, () => {{\n", js_str(&text(&document.final_result))));

        let groups: Vec<String> = document
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| render_step(i + 1, step, &base_url, &vars))
            .collect();
        out.push_str(&groups.join("\n"));

        out.push_str("  });\n");
        out.push_str("});\n");
        out
    }

    fn file_extension(&self) -> &'static str {
        ".cy.js"
    }
}

/// Render one step as a comment line plus its statements, indented for the
/// body of the `it` block.
fn render_step(
    number: usize,
    step: &TestStep,
    base_url: &str,
    vars: &BTreeMap<String, String>,
) -> String {
    let text = |s: &str| substitute(s, vars);
    let get = |selector: &str| format!("cy.get({})", js_str(&text(selector)));

    let statements: Vec<String> = match step {
        TestStep::Navigate { target, .. } => {
            vec![format!("cy.visit({});", js_str(&join_url(base_url, &text(target))))]
        }
        TestStep::WaitForElement { selector, timeout_seconds, .. } => vec![format!(
            "cy.get({}, {{ timeout: {} }}).should('exist');",
            js_str(&text(selector)),
            timeout_seconds.saturating_mul(1000)
        )],
        TestStep::Type { selector, value, .. } => vec![format!(
            "{}.clear().type({});",
            get(selector),
            js_str(&text(value))
        )],
        TestStep::Click { selector, .. } => vec![format!("{}.click();", get(selector))],
        TestStep::AssertElementText { selector, match_mode, value, .. } => {
            let value = text(value);
            let assertion = match match_mode {
                MatchMode::Equals => format!(".should('have.text', {})", js_str(&value)),
                MatchMode::Contains => format!(".should('contain.text', {})", js_str(&value)),
                MatchMode::Regex => {
                    format!(".invoke('text').should('match', {})", js_regex(&value))
                }
            };
            vec![format!("{}{};", get(selector), assertion)]
        }
        TestStep::AssertElementVisible { selector, .. } => {
            vec![format!("{}.should('be.visible');", get(selector))]
        }
        TestStep::AssertNoNavigation { .. } => vec![
            "cy.url().then((urlBefore) => {".to_string(),
            format!("  cy.wait({});", NO_NAVIGATION_SETTLE_MS),
            "  cy.url().should('eq', urlBefore);".to_string(),
            "});".to_string(),
        ],
        TestStep::OpenNewTab { target, .. } => vec![
            "// Cypress drives a single tab, so the new tab's URL is opened in place".to_string(),
            format!("cy.visit({});", js_str(&join_url(base_url, &text(target)))),
        ],
        TestStep::SwitchToNewTab { .. } => {
            vec!["cy.log('Continuing in the opened tab');".to_string()]
        }
    };

    let mut out = format!(
        "    // Step {}: {}\n",
        number,
        single_line(&text(step.expected_result()))
    );
    for statement in statements {
        out.push_str("    ");
        out.push_str(&statement);
        out.push('\n');
    }
    out
}

/// Resolve a step target against the base URL. Absolute URLs pass through.
pub fn join_url(base_url: &str, target: &str) -> String {
    if target.starts_with("http://") || target.starts_with("https://") {
        return target.to_string();
    }
    if base_url.is_empty() {
        return target.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        target.trim_start_matches('/')
    )
}

/// Single-quoted JavaScript string literal.
pub fn js_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// JavaScript regex literal. Forward slashes and line terminators are
/// escaped; the pattern is otherwise used verbatim. An empty pattern becomes
/// `/(?:)/` and a dangling trailing backslash is matched literally.
pub fn js_regex(pattern: &str) -> String {
    if pattern.is_empty() {
        return "/(?:)/".to_string();
    }
    let mut out = String::from("/");
    let mut escaped = false;
    for c in pattern.chars() {
        let lead = if escaped { "" } else { "\\" };
        match c {
            '/' if !escaped => out.push_str("\\/"),
            '\n' => out.push_str(&format!("{}n", lead)),
            '\r' => out.push_str(&format!("{}r", lead)),
            '\u{2028}' => out.push_str(&format!("{}u2028", lead)),
            '\u{2029}' => out.push_str(&format!("{}u2029", lead)),
            _ => out.push(c),
        }
        escaped = c == '\\' && !escaped;
    }
    if escaped {
        out.push('\\');
    }
    out.push('/');
    out
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_str_escapes_quotes() {
        assert_eq!(js_str("[data-test='email']"), r"'[data-test=\'email\']'");
        assert_eq!(js_str("a\\b"), r"'a\\b'");
    }

    #[test]
    fn js_regex_escapes_slashes() {
        assert_eq!(js_regex(r"^\d+/items$"), r"/^\d+\/items$/");
        assert_eq!(js_regex(r"a\/b"), r"/a\/b/");
    }

    #[test]
    fn js_regex_edge_patterns_stay_well_formed() {
        assert_eq!(js_regex(""), "/(?:)/");
        assert_eq!(js_regex(r"ends\"), r"/ends\\/");
        assert_eq!(js_regex(r"a\\"), r"/a\\/");
        assert_eq!(js_regex("a\r\nb"), r"/a\r\nb/");
        assert_eq!(js_regex("a\\\nb"), r"/a\nb/");
    }

    #[test]
    fn join_url_handles_slashes() {
        assert_eq!(join_url("https://x.test/", "/login"), "https://x.test/login");
        assert_eq!(join_url("https://x.test", "login"), "https://x.test/login");
        assert_eq!(join_url("https://x.test", "https://y.test/a"), "https://y.test/a");
    }
}
