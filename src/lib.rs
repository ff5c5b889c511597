//! Turns a plain-English test scenario into a validated test document and
//! renders it in one of several output formats.
//!
//! The flow is: [`generation::orchestrator::Orchestrator`] asks a
//! [`generation::model_client::ModelClient`] for a JSON candidate, the
//! [`validation`] rules accept or reject it (one corrective retry is
//! allowed), and an [`adapters::FormatAdapter`] projects the accepted
//! [`document::document_model::TestDocument`] into text.

pub mod adapters;
pub mod cli;
pub mod document;
pub mod error;
pub mod generation;
pub mod trace;
pub mod validation;

pub use adapters::registry::{FormatId, available_formats, resolve};
pub use document::document_model::TestDocument;
pub use error::{AttemptFailure, ForgeError};
pub use generation::orchestrator::{GenerationOutcome, Orchestrator};
pub use generation::request::GenerationRequest;
