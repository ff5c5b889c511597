use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The only schema version this crate reads and writes.
pub const SCHEMA_VERSION: &str = "rf-1.0";

/// The only application type a document may target.
pub const APP_TYPE_WEB: &str = "web";

/// A complete test case. Built from model output after it passes validation,
/// then handed read-only to the format adapters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestDocument {
    pub schema_version: String,

    /// Human-readable name for this test (5-120 chars)
    pub title: String,

    /// What the test covers (20-400 chars)
    pub description: String,

    /// Kebab-case tags, at least one
    pub tags: Vec<String>,

    pub environment: Environment,

    /// Declared variables referenced as `{{name}}` in step fields
    #[serde(default)]
    pub variables: Vec<Variable>,

    /// Ordered list of steps (4-12)
    pub steps: Vec<TestStep>,

    /// Outcome the whole test verifies
    pub final_result: String,

    /// Short rationale, at most five sentences
    pub design_decisions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Environment {
    #[serde(default = "default_app_type")]
    pub app_type: String,
    pub base_url: String,
}

fn default_app_type() -> String {
    APP_TYPE_WEB.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

/// Selector dialects. Only CSS is accepted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SelectorType {
    Css,
}

/// How `assert_element_text` compares the element text to its value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Equals,
    Contains,
    Regex,
}

impl MatchMode {
    pub const ALL: [&'static str; 3] = ["equals", "contains", "regex"];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "equals" => Some(MatchMode::Equals),
            "contains" => Some(MatchMode::Contains),
            "regex" => Some(MatchMode::Regex),
            _ => None,
        }
    }
}

/// A single step. Each variant owns exactly the fields its action requires.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Load a URL or path in the current tab
    Navigate {
        target: String,
        expected_result: String,
    },

    /// Wait until an element exists
    WaitForElement {
        selector_type: SelectorType,
        selector: String,
        timeout_seconds: u64,
        expected_result: String,
    },

    /// Type text into an input
    Type {
        selector_type: SelectorType,
        selector: String,
        value: String,
        expected_result: String,
    },

    Click {
        selector_type: SelectorType,
        selector: String,
        expected_result: String,
    },

    /// Compare an element's text using the chosen match mode
    AssertElementText {
        selector_type: SelectorType,
        selector: String,
        #[serde(rename = "match")]
        match_mode: MatchMode,
        value: String,
        expected_result: String,
    },

    AssertElementVisible {
        selector_type: SelectorType,
        selector: String,
        expected_result: String,
    },

    /// The page must not navigate away
    AssertNoNavigation { expected_result: String },

    OpenNewTab {
        target: String,
        expected_result: String,
    },

    SwitchToNewTab { expected_result: String },
}

/// The closed action vocabulary, independent of any step payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Navigate,
    WaitForElement,
    Type,
    Click,
    AssertElementText,
    AssertElementVisible,
    AssertNoNavigation,
    OpenNewTab,
    SwitchToNewTab,
}

/// How a step reads in a narrative rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    /// Navigation and setup
    Setup,
    /// User interaction
    Interaction,
    Assertion,
}

impl ActionKind {
    pub const ALL: [ActionKind; 9] = [
        ActionKind::Navigate,
        ActionKind::WaitForElement,
        ActionKind::Type,
        ActionKind::Click,
        ActionKind::AssertElementText,
        ActionKind::AssertElementVisible,
        ActionKind::AssertNoNavigation,
        ActionKind::OpenNewTab,
        ActionKind::SwitchToNewTab,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Navigate => "navigate",
            ActionKind::WaitForElement => "wait_for_element",
            ActionKind::Type => "type",
            ActionKind::Click => "click",
            ActionKind::AssertElementText => "assert_element_text",
            ActionKind::AssertElementVisible => "assert_element_visible",
            ActionKind::AssertNoNavigation => "assert_no_navigation",
            ActionKind::OpenNewTab => "open_new_tab",
            ActionKind::SwitchToNewTab => "switch_to_new_tab",
        }
    }

    /// Fields the action requires besides `action` and `expected_result`.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            ActionKind::Navigate | ActionKind::OpenNewTab => &["target"],
            ActionKind::WaitForElement => &["selector_type", "selector", "timeout_seconds"],
            ActionKind::Type => &["selector_type", "selector", "value"],
            ActionKind::Click | ActionKind::AssertElementVisible => &["selector_type", "selector"],
            ActionKind::AssertElementText => &["selector_type", "selector", "match", "value"],
            ActionKind::AssertNoNavigation | ActionKind::SwitchToNewTab => &[],
        }
    }

    pub fn category(self) -> ActionCategory {
        match self {
            ActionKind::Navigate
            | ActionKind::WaitForElement
            | ActionKind::OpenNewTab
            | ActionKind::SwitchToNewTab => ActionCategory::Setup,
            ActionKind::Type | ActionKind::Click => ActionCategory::Interaction,
            ActionKind::AssertElementText
            | ActionKind::AssertElementVisible
            | ActionKind::AssertNoNavigation => ActionCategory::Assertion,
        }
    }

    /// Comma-separated list of every action name, for messages and prompts.
    pub fn vocabulary() -> String {
        Self::ALL
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl TestStep {
    pub fn kind(&self) -> ActionKind {
        match self {
            TestStep::Navigate { .. } => ActionKind::Navigate,
            TestStep::WaitForElement { .. } => ActionKind::WaitForElement,
            TestStep::Type { .. } => ActionKind::Type,
            TestStep::Click { .. } => ActionKind::Click,
            TestStep::AssertElementText { .. } => ActionKind::AssertElementText,
            TestStep::AssertElementVisible { .. } => ActionKind::AssertElementVisible,
            TestStep::AssertNoNavigation { .. } => ActionKind::AssertNoNavigation,
            TestStep::OpenNewTab { .. } => ActionKind::OpenNewTab,
            TestStep::SwitchToNewTab { .. } => ActionKind::SwitchToNewTab,
        }
    }

    pub fn expected_result(&self) -> &str {
        match self {
            TestStep::Navigate { expected_result, .. }
            | TestStep::WaitForElement { expected_result, .. }
            | TestStep::Type { expected_result, .. }
            | TestStep::Click { expected_result, .. }
            | TestStep::AssertElementText { expected_result, .. }
            | TestStep::AssertElementVisible { expected_result, .. }
            | TestStep::AssertNoNavigation { expected_result }
            | TestStep::OpenNewTab { expected_result, .. }
            | TestStep::SwitchToNewTab { expected_result } => expected_result,
        }
    }

    /// The CSS selector, for actions that target an element.
    pub fn selector(&self) -> Option<&str> {
        match self {
            TestStep::WaitForElement { selector, .. }
            | TestStep::Type { selector, .. }
            | TestStep::Click { selector, .. }
            | TestStep::AssertElementText { selector, .. }
            | TestStep::AssertElementVisible { selector, .. } => Some(selector),
            _ => None,
        }
    }
}

impl TestDocument {
    /// Declared variables as a name -> value map. Later duplicates win.
    pub fn variable_map(&self) -> BTreeMap<String, String> {
        self.variables
            .iter()
            .map(|v| (v.name.clone(), v.value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_names_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ActionKind::parse("hover"), None);
    }

    #[test]
    fn step_is_tagged_by_action() {
        let step: TestStep = serde_json::from_value(json!({
            "action": "assert_element_text",
            "selector_type": "css",
            "selector": "#msg",
            "match": "regex",
            "value": "^ok$",
            "expected_result": "Message matches"
        }))
        .unwrap();
        assert_eq!(step.kind(), ActionKind::AssertElementText);
        assert_eq!(step.selector(), Some("#msg"));
        assert_eq!(step.expected_result(), "Message matches");

        let back = serde_json::to_value(&step).unwrap();
        assert_eq!(back["action"], "assert_element_text");
        assert_eq!(back["match"], "regex");
    }

    #[test]
    fn categories_drive_gherkin_keywords() {
        assert_eq!(ActionKind::Navigate.category(), ActionCategory::Setup);
        assert_eq!(ActionKind::Type.category(), ActionCategory::Interaction);
        assert_eq!(ActionKind::AssertNoNavigation.category(), ActionCategory::Assertion);
    }
}
