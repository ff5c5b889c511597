use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AttemptFailure, ForgeError};
use crate::generation::model_client::{ModelConfig, Prompt};
use crate::generation::request::GenerationRequest;
use crate::validation::violation::Violation;

/// What happened to one request/response round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Valid { warnings: Vec<Violation> },
    ParseError { message: String },
    SchemaError { violations: Vec<Violation> },
    TransportError { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttemptRecord {
    /// 1 for the original request, 2 for the corrective one
    pub attempt: u32,
    pub prompt: String,
    pub raw_response: Option<String>,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// One line of the append-only run log: everything sent to and received
/// from the model during a single invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    pub run_id: String,
    pub timestamp_ms: u128,
    pub scenario: String,
    pub format: String,
    pub model: String,
    pub temperature: f32,
    pub strict: bool,
    pub attempts: Vec<AttemptRecord>,
    /// Whether the corrective request was sent
    pub retried: bool,
    pub status: RunStatus,
    pub error: Option<String>,
}

impl RunRecord {
    pub fn start(request: &GenerationRequest, config: &ModelConfig) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();

        Self {
            run_id: run_id(&request.scenario, timestamp_ms),
            timestamp_ms,
            scenario: request.scenario.clone(),
            format: request.format.as_str().to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            strict: request.strict,
            attempts: vec![],
            retried: false,
            status: RunStatus::Running,
            error: None,
        }
    }

    pub fn push_attempt(
        &mut self,
        attempt: u32,
        prompt: &Prompt,
        raw_response: Option<&str>,
        outcome: AttemptOutcome,
    ) {
        self.attempts.push(AttemptRecord {
            attempt,
            prompt: prompt.render(),
            raw_response: raw_response.map(str::to_string),
            outcome,
        });
    }

    pub fn push_failure(&mut self, attempt: u32, prompt: &Prompt, raw: &str, failure: &AttemptFailure) {
        let outcome = match failure {
            AttemptFailure::Parse(message) => AttemptOutcome::ParseError {
                message: message.clone(),
            },
            AttemptFailure::Schema(violations) => AttemptOutcome::SchemaError {
                violations: violations.clone(),
            },
        };
        self.push_attempt(attempt, prompt, Some(raw), outcome);
    }

    /// Number of corrective requests sent (0 or 1).
    pub fn retry_count(&self) -> usize {
        self.attempts.len().saturating_sub(1)
    }

    pub fn finish<T>(&mut self, result: &Result<T, ForgeError>) {
        match result {
            Ok(_) => self.status = RunStatus::Succeeded,
            Err(ForgeError::Cancelled) => {
                self.status = RunStatus::Cancelled;
                self.error = Some(ForgeError::Cancelled.to_string());
            }
            Err(e) => {
                self.status = RunStatus::Failed;
                self.error = Some(e.to_string());
            }
        }
    }
}

/// Short stable id derived from the scenario and start time.
fn run_id(scenario: &str, timestamp_ms: u128) -> String {
    let mut hasher = Sha1::new();
    hasher.update(scenario.as_bytes());
    hasher.update(timestamp_ms.to_le_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("run_{}", &digest[..12])
}
