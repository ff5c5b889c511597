use crate::adapters::FormatAdapter;
use crate::adapters::registry::FormatId;
use crate::document::document_model::TestDocument;

/// Emits the document itself: pretty JSON, two-space indent, fields in
/// declaration order.
pub struct NativeAdapter;

impl FormatAdapter for NativeAdapter {
    fn format_id(&self) -> FormatId {
        FormatId::Native
    }

    fn convert(&self, document: &TestDocument) -> String {
        // plain data with string keys always serializes
        serde_json::to_string_pretty(document).unwrap_or_default()
    }

    fn file_extension(&self) -> &'static str {
        ".json"
    }
}
