pub mod brief;
pub mod cypress;
pub mod gherkin;
pub mod native;
pub mod prompt;
pub mod registry;
pub mod selector_names;

use crate::document::document_model::TestDocument;
use crate::adapters::registry::FormatId;

// ============================================================================
// FormatAdapter trait: one projection per output format
// ============================================================================

/// Projects a validated `TestDocument` into one textual format.
///
/// Implementations are stateless: `convert` reads the document, never
/// mutates it, and returns byte-identical output for identical input.
pub trait FormatAdapter: Sync {
    fn format_id(&self) -> FormatId;

    fn convert(&self, document: &TestDocument) -> String;

    /// Extension including the leading dot, e.g. `.cy.js`.
    fn file_extension(&self) -> &'static str;
}
