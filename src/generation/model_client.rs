use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ForgeError;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 1500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

// ============================================================================
// Prompt shape
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// An ordered conversation sent to the model in one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Prompt {
    pub messages: Vec<ChatMessage>,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
        }
    }

    /// Continue this conversation with the model's reply and a follow-up.
    pub fn followed_by(&self, assistant: &str, user: impl Into<String>) -> Self {
        let mut messages = self.messages.clone();
        messages.push(ChatMessage::assistant(assistant));
        messages.push(ChatMessage::user(user));
        Self { messages }
    }

    /// The last user turn, which carries the instructions for this request.
    pub fn last_user(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Flatten to plain text for logging.
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                format!("[{}]\n{}", role, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

// ============================================================================
// Model configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub endpoint: String,
    pub model: String,
    /// Low by default to keep output as repeatable as the model allows
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            api_key: None,
        }
    }
}

// ============================================================================
// ModelClient trait: the only seam to the generative model
// ============================================================================

/// Sends one prompt and returns the model's raw text. Implementations must
/// not retry on their own: the orchestrator owns the retry budget.
pub trait ModelClient {
    fn complete(&self, prompt: &Prompt, config: &ModelConfig) -> Result<String, ForgeError>;
}

// ============================================================================
// OpenAI-compatible chat completions backend
// ============================================================================

pub struct ChatCompletionsClient {
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsClient {
    pub fn new(timeout: Duration) -> Result<Self, ForgeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl ModelClient for ChatCompletionsClient {
    fn complete(&self, prompt: &Prompt, config: &ModelConfig) -> Result<String, ForgeError> {
        let body = ChatRequest {
            model: &config.model,
            messages: &prompt.messages,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: 1.0,
        };

        let mut request = self
            .client
            .post(&config.endpoint)
            .timeout(config.timeout)
            .json(&body);
        if let Some(key) = &config.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!(endpoint = %config.endpoint, model = %config.model, "sending chat completion");
        let response = request.send()?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(ForgeError::Transport(format!(
                "API error {}: {}",
                status.as_u16(),
                text
            )));
        }

        let parsed: ChatResponse = response.json()?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ForgeError::Transport("response contained no message content".into()))
    }
}

// ============================================================================
// Scripted backend (for testing without a live model)
// ============================================================================

/// Replays queued responses in order and remembers every prompt it saw.
/// An exhausted queue is reported as a transport error.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    responses: RefCell<VecDeque<Result<String, String>>>,
    prompts: RefCell<Vec<Prompt>>,
}

impl ScriptedClient {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: RefCell::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Queue a transport failure.
    pub fn then_fail(self, message: &str) -> Self {
        self.responses.borrow_mut().push_back(Err(message.to_string()));
        self
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.borrow().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.borrow().len()
    }
}

impl ModelClient for ScriptedClient {
    fn complete(&self, prompt: &Prompt, _config: &ModelConfig) -> Result<String, ForgeError> {
        self.prompts.borrow_mut().push(prompt.clone());
        match self.responses.borrow_mut().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ForgeError::Transport(message)),
            None => Err(ForgeError::Transport("scripted client has no responses left".into())),
        }
    }
}

/// Answers every prompt with the same saved response.
#[derive(Debug, Clone)]
pub struct ReplayClient {
    response: String,
}

impl ReplayClient {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }
}

impl ModelClient for ReplayClient {
    fn complete(&self, _prompt: &Prompt, _config: &ModelConfig) -> Result<String, ForgeError> {
        Ok(self.response.clone())
    }
}

impl<C: ModelClient + ?Sized> ModelClient for &C {
    fn complete(&self, prompt: &Prompt, config: &ModelConfig) -> Result<String, ForgeError> {
        (**self).complete(prompt, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_client_replays_then_fails() {
        let client = ScriptedClient::new(["one"]);
        let prompt = Prompt::new("s", "u");
        let config = ModelConfig::default();
        assert_eq!(client.complete(&prompt, &config).unwrap(), "one");
        assert!(matches!(client.complete(&prompt, &config), Err(ForgeError::Transport(_))));
        assert_eq!(client.calls(), 2);
    }

    #[test]
    fn replay_client_never_runs_dry() {
        let client = ReplayClient::new("{}");
        let prompt = Prompt::new("s", "u");
        let config = ModelConfig::default();
        for _ in 0..5 {
            assert_eq!(client.complete(&prompt, &config).unwrap(), "{}");
        }
    }

    #[test]
    fn render_labels_roles() {
        let prompt = Prompt::new("rules", "scenario").followed_by("{}", "fix it");
        assert_eq!(
            prompt.render(),
            "[system]\nrules\n\n[user]\nscenario\n\n[assistant]\n{}\n\n[user]\nfix it"
        );
        assert_eq!(prompt.last_user(), Some("fix it"));
    }
}
