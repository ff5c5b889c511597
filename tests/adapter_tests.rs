use scenario_forge::adapters::FormatAdapter;
use scenario_forge::adapters::brief::BriefPromptAdapter;
use scenario_forge::adapters::cypress::CypressAdapter;
use scenario_forge::adapters::gherkin::GherkinAdapter;
use scenario_forge::adapters::native::NativeAdapter;
use scenario_forge::adapters::prompt::{MAX_PROMPT_STEPS, PromptAdapter};
use scenario_forge::adapters::registry::{FormatId, available_formats, resolve};
use scenario_forge::document::document_model::TestDocument;
use scenario_forge::error::ForgeError;
use serde_json::json;

mod common;

use common::{login_document, login_with, with_step_count};

fn document(value: serde_json::Value) -> TestDocument {
    serde_json::from_value(value).unwrap()
}

// ============================================================================
// All adapters
// ============================================================================

#[test]
fn every_adapter_is_deterministic() {
    let doc = login_document();
    for id in FormatId::ALL {
        let adapter = id.adapter();
        assert_eq!(adapter.convert(&doc), adapter.convert(&doc), "{} differs", id);
    }
}

#[test]
fn extensions_per_format() {
    assert_eq!(NativeAdapter.file_extension(), ".json");
    assert_eq!(CypressAdapter.file_extension(), ".cy.js");
    assert_eq!(GherkinAdapter.file_extension(), ".feature");
    assert_eq!(PromptAdapter.file_extension(), ".txt");
    assert_eq!(BriefPromptAdapter.file_extension(), ".txt");
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn registry_lists_formats_sorted() {
    assert_eq!(
        available_formats(),
        vec!["cypress", "gherkin", "native", "prompt", "prompt-brief"]
    );
}

#[test]
fn registry_resolves_known_format() {
    let adapter = resolve("prompt-brief").unwrap();
    assert_eq!(adapter.format_id(), FormatId::PromptBrief);
}

#[test]
fn registry_rejects_unknown_format() {
    let err = resolve("xml").err().unwrap();
    match &err {
        ForgeError::UnsupportedFormat { requested, available } => {
            assert_eq!(requested, "xml");
            assert!(available.contains(&"gherkin"));
        }
        other => panic!("Expected UnsupportedFormat, got {:?}", other),
    }
    assert!(err.to_string().contains("cypress, gherkin, native, prompt, prompt-brief"));
}

// ============================================================================
// Native
// ============================================================================

#[test]
fn native_round_trips() {
    let doc = login_document();
    let json = NativeAdapter.convert(&doc);
    let back = TestDocument::from_json_str(&json).unwrap();
    assert_eq!(back, doc);
}

#[test]
fn native_keeps_field_order_and_indent() {
    let json = NativeAdapter.convert(&login_document());
    assert!(json.starts_with("{\n  \"schema_version\": \"rf-1.0\",\n  \"title\""));
    assert!(json.contains("\"action\": \"assert_element_text\""));
    assert!(json.contains("\"match\": \"contains\""));
}

// ============================================================================
// Cypress
// ============================================================================

#[test]
fn cypress_emits_commands_for_login() {
    let out = CypressAdapter.convert(&login_document());
    assert!(out.contains("describe('User logs in with valid credentials', () => {"));
    assert!(out.contains("cy.visit('https://shop.example.com');"));
    assert!(out.contains("cy.visit('https://shop.example.com/login');"));
    assert!(out.contains(r"cy.get('[data-test=\'email\']', { timeout: 10000 }).should('exist');"));
    assert!(out.contains(r"cy.get('[data-test=\'email\']').clear().type('qa@example.com');"));
    assert!(out.contains(r"cy.get('[data-test=\'login-button\']').click();"));
    assert!(out.contains(
        r"cy.get('[data-test=\'welcome-message\']').should('contain.text', 'Welcome');"
    ));
    assert!(out.contains("// Step 6: Welcome message is shown"));
}

#[test]
fn cypress_substitutes_every_placeholder() {
    let out = CypressAdapter.convert(&login_document());
    assert!(!out.contains("{{"), "placeholder leaked:\n{}", out);
    assert!(out.contains("'s3cret!'"));
}

#[test]
fn cypress_text_match_modes() {
    let equals = document(login_with(|d| d["steps"][5]["match"] = json!("equals")));
    assert!(CypressAdapter.convert(&equals).contains(".should('have.text', 'Welcome');"));

    let regex = document(login_with(|d| {
        d["steps"][5]["match"] = json!("regex");
        d["steps"][5]["value"] = json!("^Welcome, .+/home$");
    }));
    assert!(CypressAdapter
        .convert(&regex)
        .contains(r".invoke('text').should('match', /^Welcome, .+\/home$/);"));
}

#[test]
fn cypress_no_navigation_compares_urls() {
    let doc = document(login_with(|d| {
        d["steps"][5] = json!({
            "action": "assert_no_navigation",
            "expected_result": "User stays on the login page"
        });
    }));
    let out = CypressAdapter.convert(&doc);
    assert!(out.contains("cy.url().then((urlBefore) => {"));
    assert!(out.contains("cy.url().should('eq', urlBefore);"));
}

// ============================================================================
// Gherkin
// ============================================================================

#[test]
fn gherkin_uses_keywords_and_and() {
    let out = GherkinAdapter.convert(&login_document());
    let expected = "\
@auth @smoke-test
Feature: User logs in with valid credentials
  Verifies that a registered user can sign in and reach the dashboard.

  Background:
    Given the application is running at \"https://shop.example.com\"

  Scenario: User logs in with valid credentials
    Given I navigate to \"/login\"
    And I wait 10 seconds for element \"[data-test='email']\" to appear
    When I type \"{{userEmail}}\" into \"[data-test='email']\"
    And I type \"{{userPassword}}\" into \"[data-test='password']\"
    And I click on \"[data-test='login-button']\"
    Then the element \"[data-test='welcome-message']\" should contain text \"Welcome\"
";
    assert_eq!(out, expected);
}

#[test]
fn gherkin_appends_final_result_without_trailing_assertion() {
    let doc = document(login_with(|d| {
        d["steps"].as_array_mut().unwrap().pop();
    }));
    let out = GherkinAdapter.convert(&doc);
    assert!(out.ends_with(
        "    And I click on \"[data-test='login-button']\"\n    Then User is signed in and sees the dashboard\n"
    ));
}

#[test]
fn gherkin_indents_every_description_line() {
    let doc = document(login_with(|d| {
        d["description"] = json!("Signs in with a registered account.\n\nLands on the dashboard.");
    }));
    let out = GherkinAdapter.convert(&doc);
    assert!(out.contains(
        "Feature: User logs in with valid credentials\n  Signs in with a registered account.\n\n  Lands on the dashboard.\n\n  Background:\n"
    ));
}

// ============================================================================
// Prompt formats
// ============================================================================

#[test]
fn prompt_consolidates_login_flow() {
    let out = PromptAdapter.convert(&login_document());
    assert!(out.starts_with(
        "Create a test: User logs in with valid credentials\nGoal: User is signed in and sees the dashboard\nSite: https://shop.example.com\n"
    ));
    assert!(out.contains("- {{userEmail}} = qa@example.com"));
    assert!(out.contains(
        "Steps:\n\
         1. Go to /login\n\
         2. Fill form: enter '{{userEmail}}' in email, enter '{{userPassword}}' in password\n\
         3. Click login button\n\
         4. Verify welcome message contains 'Welcome'\n"
    ));
}

#[test]
fn prompt_caps_step_count() {
    let out = PromptAdapter.convert(&document(with_step_count(12)));
    let numbered = out.lines().filter(|l| l.starts_with(char::is_numeric)).count();
    assert_eq!(numbered, MAX_PROMPT_STEPS);
}

#[test]
fn brief_prompt_keeps_four_essentials() {
    let out = BriefPromptAdapter.convert(&login_document());
    let expected = "\
Test: User logs in with valid credentials

Site: https://shop.example.com

Steps:
1. Go to /login
2. Fill in email and password
3. Click login button
4. Check: Welcome message is shown

Expected: User is signed in and sees the dashboard
";
    assert_eq!(out, expected);
}

#[test]
fn brief_prompt_without_navigation_starts_at_base_url() {
    let out = BriefPromptAdapter.convert(&document(with_step_count(5)));
    assert!(out.contains("1. Go to https://shop.example.com\n2. Check: Item 0 is visible\n"));
}
