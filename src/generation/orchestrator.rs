use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::document::candidate::{DocumentCandidate, parse_candidate};
use crate::document::document_model::TestDocument;
use crate::error::{AttemptFailure, ForgeError};
use crate::generation::model_client::{ModelClient, ModelConfig, Prompt};
use crate::generation::prompt::{corrective_prompt, initial_prompt};
use crate::generation::request::GenerationRequest;
use crate::trace::logger::RunObserver;
use crate::trace::record::{AttemptOutcome, RunRecord};
use crate::validation::validator::validate;

/// One original request plus one corrective request, never more.
pub const MAX_ATTEMPTS: u32 = 2;

// ============================================================================
// State machine
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationState {
    Init,
    Requesting {
        attempt: u32,
        prompt: Prompt,
    },
    Parsing {
        attempt: u32,
        prompt: Prompt,
        raw: String,
    },
    Validating {
        attempt: u32,
        prompt: Prompt,
        raw: String,
        candidate: DocumentCandidate,
    },
    Correcting {
        attempt: u32,
        prompt: Prompt,
        raw: String,
        failure: AttemptFailure,
    },
    Succeeded(TestDocument),
    /// Budget exhausted; carries the final attempt's failure
    Failed(AttemptFailure),
}

impl GenerationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GenerationState::Succeeded(_) | GenerationState::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            GenerationState::Init => "init",
            GenerationState::Requesting { .. } => "requesting",
            GenerationState::Parsing { .. } => "parsing",
            GenerationState::Validating { .. } => "validating",
            GenerationState::Correcting { .. } => "correcting",
            GenerationState::Succeeded(_) => "succeeded",
            GenerationState::Failed(_) => "failed",
        }
    }
}

// ============================================================================
// Cancellation
// ============================================================================

/// Shared abort switch. Checked before every request and again when the
/// response arrives, so a cancelled run never surfaces a document.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), ForgeError> {
        if self.is_cancelled() {
            Err(ForgeError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub document: TestDocument,
    pub record: RunRecord,
}

pub struct Orchestrator<'a> {
    client: Box<dyn ModelClient + 'a>,
    config: ModelConfig,
    observer: Option<Box<dyn RunObserver + 'a>>,
    cancel: CancellationFlag,
}

impl<'a> Orchestrator<'a> {
    pub fn new(client: Box<dyn ModelClient + 'a>, config: ModelConfig) -> Self {
        Self {
            client,
            config,
            observer: None,
            cancel: CancellationFlag::new(),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn RunObserver + 'a>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Drive the state machine to a terminal state.
    ///
    /// Transport failures and cancellation end the run immediately. Parse and
    /// schema failures get exactly one corrective request; if that also fails
    /// the result is `RetryBudgetExhausted` carrying the second attempt's
    /// failure.
    pub fn run(&self, request: &GenerationRequest) -> Result<GenerationOutcome, ForgeError> {
        let mut record = RunRecord::start(request, &self.config);
        tracing::info!(run_id = %record.run_id, format = request.format.as_str(), "generation started");

        let mut state = GenerationState::Init;
        let result = loop {
            state = match self.advance(state, request, &mut record) {
                Ok(GenerationState::Succeeded(document)) => break Ok(document),
                Ok(GenerationState::Failed(cause)) => {
                    break Err(ForgeError::RetryBudgetExhausted {
                        scenario: request.scenario.clone(),
                        format: request.format.as_str().to_string(),
                        attempts: MAX_ATTEMPTS,
                        cause,
                    });
                }
                Ok(next) => next,
                Err(e) => break Err(e),
            };
        };

        record.finish(&result);
        match &result {
            Ok(_) => tracing::info!(run_id = %record.run_id, retried = record.retried, "generation succeeded"),
            Err(e) => tracing::warn!(run_id = %record.run_id, "generation failed: {}", e),
        }
        if let Some(observer) = &self.observer {
            observer.record(&record);
        }

        result.map(|document| GenerationOutcome { document, record })
    }

    /// Perform exactly one transition.
    pub fn advance(
        &self,
        state: GenerationState,
        request: &GenerationRequest,
        record: &mut RunRecord,
    ) -> Result<GenerationState, ForgeError> {
        tracing::trace!(state = state.name(), "advance");

        match state {
            GenerationState::Init => Ok(GenerationState::Requesting {
                attempt: 1,
                prompt: initial_prompt(request),
            }),

            GenerationState::Requesting { attempt, prompt } => {
                debug_assert!(attempt <= MAX_ATTEMPTS, "attempt {} exceeds budget", attempt);
                self.cancel.check()?;

                tracing::debug!(attempt, "requesting model output");
                let raw = match self.client.complete(&prompt, &self.config) {
                    Ok(raw) => raw,
                    Err(e) => {
                        record.push_attempt(
                            attempt,
                            &prompt,
                            None,
                            AttemptOutcome::TransportError { message: e.to_string() },
                        );
                        return Err(e);
                    }
                };

                // response arriving after cancellation is discarded
                self.cancel.check()?;
                Ok(GenerationState::Parsing { attempt, prompt, raw })
            }

            GenerationState::Parsing { attempt, prompt, raw } => match parse_candidate(&raw) {
                Ok(mut candidate) => {
                    if let Some(base_url) = &request.base_url {
                        candidate.apply_base_url_override(base_url);
                    }
                    Ok(GenerationState::Validating { attempt, prompt, raw, candidate })
                }
                Err(ForgeError::Parse(message)) => {
                    tracing::debug!(attempt, "parse failed: {}", message);
                    let failure = AttemptFailure::Parse(message);
                    record.push_failure(attempt, &prompt, &raw, &failure);
                    Ok(GenerationState::Correcting { attempt, prompt, raw, failure })
                }
                Err(e) => Err(e),
            },

            GenerationState::Validating { attempt, prompt, raw, candidate } => {
                let result = validate(&candidate, request.strict);
                let typed = if result.is_valid() {
                    TestDocument::from_candidate(&candidate)
                } else {
                    Err(ForgeError::Schema { violations: result.clone().into_errors() })
                };

                match typed {
                    Ok(document) => {
                        record.push_attempt(
                            attempt,
                            &prompt,
                            Some(&raw),
                            AttemptOutcome::Valid {
                                warnings: result.warnings().cloned().collect(),
                            },
                        );
                        Ok(GenerationState::Succeeded(document))
                    }
                    Err(e) => {
                        let violations = e.violations().to_vec();
                        tracing::debug!(attempt, count = violations.len(), "validation failed");
                        let failure = AttemptFailure::Schema(violations);
                        record.push_failure(attempt, &prompt, &raw, &failure);
                        Ok(GenerationState::Correcting { attempt, prompt, raw, failure })
                    }
                }
            }

            GenerationState::Correcting { attempt, prompt, raw, failure } => {
                if attempt >= MAX_ATTEMPTS {
                    return Ok(GenerationState::Failed(failure));
                }

                record.retried = true;
                tracing::info!(attempt = attempt + 1, "sending corrective request");
                Ok(GenerationState::Requesting {
                    attempt: attempt + 1,
                    prompt: corrective_prompt(&prompt, &raw, &failure),
                })
            }

            terminal @ (GenerationState::Succeeded(_) | GenerationState::Failed(_)) => Ok(terminal),
        }
    }
}
