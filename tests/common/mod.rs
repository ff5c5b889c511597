#![allow(dead_code)]

use scenario_forge::document::document_model::TestDocument;
use serde_json::{Value, json};

pub const LOGIN_SCENARIO: &str =
    "A registered user logs in with a valid email and password and sees the dashboard";

/// A valid login document with two declared variables and six steps.
pub fn login_value() -> Value {
    json!({
        "schema_version": "rf-1.0",
        "title": "User logs in with valid credentials",
        "description": "Verifies that a registered user can sign in and reach the dashboard.",
        "tags": ["auth", "smoke-test"],
        "environment": { "app_type": "web", "base_url": "https://shop.example.com" },
        "variables": [
            { "name": "userEmail", "value": "qa@example.com" },
            { "name": "userPassword", "value": "s3cret!" }
        ],
        "steps": [
            {
                "action": "navigate",
                "target": "/login",
                "expected_result": "Login page is displayed"
            },
            {
                "action": "wait_for_element",
                "selector_type": "css",
                "selector": "[data-test='email']",
                "timeout_seconds": 10,
                "expected_result": "Email field is ready"
            },
            {
                "action": "type",
                "selector_type": "css",
                "selector": "[data-test='email']",
                "value": "{{userEmail}}",
                "expected_result": "Email is entered"
            },
            {
                "action": "type",
                "selector_type": "css",
                "selector": "[data-test='password']",
                "value": "{{userPassword}}",
                "expected_result": "Password is entered"
            },
            {
                "action": "click",
                "selector_type": "css",
                "selector": "[data-test='login-button']",
                "expected_result": "Login form is submitted"
            },
            {
                "action": "assert_element_text",
                "selector_type": "css",
                "selector": "[data-test='welcome-message']",
                "match": "contains",
                "value": "Welcome",
                "expected_result": "Welcome message is shown"
            }
        ],
        "final_result": "User is signed in and sees the dashboard",
        "design_decisions": "Uses data-test selectors for stability. Waits for the form before typing."
    })
}

pub fn login_json() -> String {
    serde_json::to_string_pretty(&login_value()).unwrap()
}

pub fn login_document() -> TestDocument {
    serde_json::from_value(login_value()).unwrap()
}

/// The login document with its steps replaced by `count` visibility checks.
pub fn with_step_count(count: usize) -> Value {
    let steps: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "action": "assert_element_visible",
                "selector_type": "css",
                "selector": format!("[data-test='item-{}']", i),
                "expected_result": format!("Item {} is visible", i)
            })
        })
        .collect();
    let mut doc = login_value();
    doc["steps"] = Value::Array(steps);
    doc
}

/// Apply `edit` to a fresh copy of the login document.
pub fn login_with(edit: impl FnOnce(&mut Value)) -> Value {
    let mut doc = login_value();
    edit(&mut doc);
    doc
}

/// Model output wrapped in a markdown fence, the way chat models often reply.
pub fn fenced(json: &str) -> String {
    format!("```json\n{}\n```", json)
}
