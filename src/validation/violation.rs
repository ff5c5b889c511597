use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Which rule family raised a violation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    SchemaVersion,
    Bounds,
    TagFormat,
    Environment,
    StepAction,
    RequiredField,
    SelectorType,
    MatchMode,
    VariableReference,
    Variable,
    FieldType,
    UnknownField,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Violation {
    /// Field path, e.g. `steps[2].selector_type`
    pub path: String,
    pub message: String,
    pub severity: Severity,
    pub rule: RuleKind,
}

impl Violation {
    pub fn error(path: impl Into<String>, rule: RuleKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
            rule,
        }
    }

    pub fn warning(path: impl Into<String>, rule: RuleKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
            rule,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "{}: {}", self.path, self.message),
            Severity::Warning => write!(f, "{} (warning): {}", self.path, self.message),
        }
    }
}

/// Everything one validation pass found. Never short-circuits: every
/// applicable rule runs and contributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationResult {
    pub violations: Vec<Violation>,
    pub strict: bool,
}

impl ValidationResult {
    pub fn new(strict: bool) -> Self {
        Self {
            violations: Vec::new(),
            strict,
        }
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// True when no error-severity violation was raised.
    pub fn is_valid(&self) -> bool {
        !self.violations.iter().any(Violation::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.is_error())
    }

    /// Error-severity violations, owned.
    pub fn into_errors(self) -> Vec<Violation> {
        self.violations.into_iter().filter(Violation::is_error).collect()
    }

    /// Whether any violation names `path` exactly.
    pub fn has_path(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }

    pub fn has_rule(&self, rule: RuleKind) -> bool {
        self.violations.iter().any(|v| v.rule == rule)
    }

    /// Itemized list of errors, one per line, for corrective feedback.
    pub fn feedback(&self) -> String {
        itemize(self.errors())
    }
}

/// One `- path: message` line per violation.
pub fn itemize<'a>(violations: impl IntoIterator<Item = &'a Violation>) -> String {
    violations
        .into_iter()
        .map(|v| format!("- {}", v))
        .collect::<Vec<_>>()
        .join("\n")
}
