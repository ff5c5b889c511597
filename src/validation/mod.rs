pub mod validator;
pub mod violation;

pub use validator::{validate, validate_document, validate_raw, validate_value};
pub use violation::{RuleKind, Severity, ValidationResult, Violation};
