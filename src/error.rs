use thiserror::Error;

use crate::validation::violation::{Violation, itemize};

/// Why a single generation attempt did not produce a valid document.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptFailure {
    /// The raw text was not a JSON object after fence stripping.
    Parse(String),

    /// The payload parsed but broke one or more schema rules.
    Schema(Vec<Violation>),
}

impl AttemptFailure {
    /// Render the failure as the itemized block embedded in a corrective prompt.
    pub fn itemized(&self) -> String {
        match self {
            AttemptFailure::Parse(message) => format!("- invalid JSON: {}", message),
            AttemptFailure::Schema(violations) => itemize(violations),
        }
    }
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptFailure::Parse(message) => write!(f, "parse error: {}", message),
            AttemptFailure::Schema(violations) => {
                write!(f, "{} schema violation(s):\n{}", violations.len(), self.itemized())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ForgeError {
    /// Raw text is not well-formed structured data after fence stripping
    #[error("Parse error: {0}")]
    Parse(String),

    /// Well-formed payload that violates the document schema
    #[error("Schema error: {} violation(s)", violations.len())]
    Schema { violations: Vec<Violation> },

    /// Registry miss
    #[error("Unsupported format '{requested}'. Available: {}", available.join(", "))]
    UnsupportedFormat {
        requested: String,
        available: Vec<&'static str>,
    },

    /// Original and corrective attempts both failed
    #[error("Generation failed for scenario '{scenario}' (format: {format}) after {attempts} attempts; final attempt: {cause}")]
    RetryBudgetExhausted {
        scenario: String,
        format: String,
        attempts: u32,
        cause: AttemptFailure,
    },

    /// Model call failed or timed out
    #[error("Model transport error: {0}")]
    Transport(String),

    /// Invocation aborted by the caller
    #[error("Generation cancelled")]
    Cancelled,

    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ForgeError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ForgeError::Io {
            context: context.into(),
            source,
        }
    }

    /// The violations carried by this error, if any.
    pub fn violations(&self) -> &[Violation] {
        match self {
            ForgeError::Schema { violations } => violations,
            ForgeError::RetryBudgetExhausted {
                cause: AttemptFailure::Schema(violations),
                ..
            } => violations,
            _ => &[],
        }
    }
}

impl From<reqwest::Error> for ForgeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ForgeError::Transport(format!("request timed out: {}", e))
        } else {
            ForgeError::Transport(e.to_string())
        }
    }
}
