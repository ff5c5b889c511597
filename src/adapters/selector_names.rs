use std::sync::LazyLock;

use regex::Regex;

static DATA_TEST_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"data-(?:test|testid|test-id|cy)\s*=\s*['"]?([^'"\]]+)"#)
        .expect("data-test pattern is valid")
});

/// Keyword -> readable name, checked in order.
const KEYWORD_NAMES: [(&str, &str); 7] = [
    ("login", "login button"),
    ("submit", "submit button"),
    ("email", "email field"),
    ("password", "password field"),
    ("error", "error message"),
    ("button", "button"),
    ("input", "input field"),
];

/// Turn a CSS selector into a name a human tester understands.
///
/// `[data-test='first-name']` becomes `first name`; otherwise well-known
/// keywords are mapped, falling back to `element`.
pub fn human_name(selector: &str) -> String {
    if let Some(caps) = DATA_TEST_ATTR.captures(selector) {
        let raw = caps[1].trim();
        if !raw.is_empty() {
            return raw.replace(['-', '_'], " ");
        }
    }

    let lower = selector.to_lowercase();
    KEYWORD_NAMES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| "element".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_test_attribute_wins() {
        assert_eq!(human_name("[data-test='first-name']"), "first name");
        assert_eq!(human_name("form [data-testid=\"submit_order\"]"), "submit order");
    }

    #[test]
    fn keyword_fallbacks() {
        assert_eq!(human_name("#login-btn"), "login button");
        assert_eq!(human_name("input[type=password]"), "password field");
        assert_eq!(human_name(".flash.error"), "error message");
        assert_eq!(human_name("div > span"), "element");
    }
}
