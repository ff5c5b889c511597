pub mod candidate;
pub mod document_model;
pub mod placeholder;
