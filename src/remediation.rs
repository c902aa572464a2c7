//! Free-text remediation advice from a language-model API.
//!
//! Two wire formats are supported: OpenAI-compatible chat completions (Groq by
//! default) and a local Ollama server. Response bodies are interpreted by pure
//! functions so the error-marker rules can be tested without a network.

use crate::error::RemediationError;
#[cfg(test)]
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Prefix of answers that report an API-side error instead of advice
pub const API_ERROR_MARKER: &str = "API Error";

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

pub const DEFAULT_CHAT_ENDPOINT: &str = "https://api.groq.com/openai";
pub const DEFAULT_CHAT_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a bank IT support assistant for ATM systems. Given a log error, provide a detailed but brief fix tailored to e-Agent ATM terminals.";
const UNEXPECTED_STRUCTURE: &str = "Unexpected response structure.";

/// Interface for remediation sources
pub trait RemediationApi: Send + Sync {
    /// Advice for `message`. Success text may itself carry [`API_ERROR_MARKER`].
    fn fetch(&self, message: &str) -> Result<String, RemediationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemediationBackend {
    #[default]
    OpenAi,
    Ollama,
}

/// Remediation API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationConfig {
    pub enabled: bool,
    pub backend: RemediationBackend,
    /// Base URL; the backend's default when unset
    pub endpoint: Option<String>,
    /// Model name; the backend's default when unset
    pub model: Option<String>,
    /// Bearer token for the chat backend; falls back to `GROQ_API_KEY`
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: RemediationBackend::OpenAi,
            endpoint: None,
            model: None,
            api_key: None,
            timeout_secs: 30,
            max_tokens: 150,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl RemediationConfig {
    pub fn endpoint(&self) -> &str {
        match (&self.endpoint, self.backend) {
            (Some(endpoint), _) => endpoint.trim_end_matches('/'),
            (None, RemediationBackend::OpenAi) => DEFAULT_CHAT_ENDPOINT,
            (None, RemediationBackend::Ollama) => DEFAULT_OLLAMA_ENDPOINT,
        }
    }

    pub fn model(&self) -> &str {
        match (&self.model, self.backend) {
            (Some(model), _) => model,
            (None, RemediationBackend::OpenAi) => DEFAULT_CHAT_MODEL,
            (None, RemediationBackend::Ollama) => DEFAULT_OLLAMA_MODEL,
        }
    }
}

/// Blocking HTTP client for either backend
pub struct HttpRemediationClient {
    config: RemediationConfig,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl HttpRemediationClient {
    pub fn new(config: RemediationConfig) -> Result<Self, RemediationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemediationError::Http(format!("failed to create HTTP client: {}", e)))?;

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty());

        Ok(Self { config, api_key, client })
    }

    fn send(&self, request: reqwest::blocking::RequestBuilder) -> Result<(u16, String), RemediationError> {
        let response = request.send().map_err(|e| self.request_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().map_err(|e| self.request_error(e))?;
        debug!(status, bytes = body.len(), "remediation API responded");
        Ok((status, body))
    }

    fn request_error(&self, e: reqwest::Error) -> RemediationError {
        if e.is_timeout() {
            RemediationError::Timeout(self.config.timeout_secs)
        } else {
            RemediationError::Http(format!("request failed: {}", e))
        }
    }

    fn fetch_chat(&self, message: &str) -> Result<String, RemediationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(RemediationError::MissingCredentials(API_KEY_ENV))?;
        let url = format!("{}/v1/chat/completions", self.config.endpoint());

        let body = serde_json::json!({
            "model": self.config.model(),
            "messages": [
                {"role": "system", "content": self.config.system_prompt},
                {"role": "user", "content": format!("The log error is: {}. Suggest a fix.", message)},
            ],
            "max_tokens": self.config.max_tokens,
        });

        let (status, text) = self.send(self.client.post(&url).bearer_auth(api_key).json(&body))?;
        interpret_chat_response(status, &text)
    }

    fn fetch_ollama(&self, message: &str) -> Result<String, RemediationError> {
        let url = format!("{}/api/generate", self.config.endpoint());
        let prompt = format!(
            "You are a bank IT support assistant. The log error is: '{}'. Suggest a short, clear fix.",
            message
        );

        let body = serde_json::json!({
            "model": self.config.model(),
            "prompt": prompt,
            "stream": false,
        });

        let (status, text) = self.send(self.client.post(&url).json(&body))?;
        interpret_ollama_response(status, &text)
    }
}

impl RemediationApi for HttpRemediationClient {
    fn fetch(&self, message: &str) -> Result<String, RemediationError> {
        if !self.config.enabled {
            return Err(RemediationError::Disabled);
        }

        match self.config.backend {
            RemediationBackend::OpenAi => self.fetch_chat(message),
            RemediationBackend::Ollama => self.fetch_ollama(message),
        }
    }
}

/// Interpret an OpenAI-compatible chat completion body.
///
/// An `error` object or an unknown shape becomes an answer carrying
/// [`API_ERROR_MARKER`]; a body that is not JSON at all is an error.
pub fn interpret_chat_response(status: u16, body: &str) -> Result<String, RemediationError> {
    let data = parse_body(status, body)?;

    if let Some(choices) = data.get("choices") {
        return match choices.pointer("/0/message/content").and_then(Value::as_str) {
            Some(content) => non_empty(content),
            None => Ok(api_error(UNEXPECTED_STRUCTURE)),
        };
    }

    Ok(error_answer(&data))
}

/// Interpret an Ollama `/api/generate` body
pub fn interpret_ollama_response(status: u16, body: &str) -> Result<String, RemediationError> {
    let data = parse_body(status, body)?;

    match data.get("response").and_then(Value::as_str) {
        Some(response) => non_empty(response),
        None => Ok(error_answer(&data)),
    }
}

/// Whether an answer reports an API-side error rather than advice
pub fn is_error_answer(answer: &str) -> bool {
    answer.contains(API_ERROR_MARKER)
}

fn parse_body(status: u16, body: &str) -> Result<Value, RemediationError> {
    serde_json::from_str(body).map_err(|e| {
        if (200..300).contains(&status) {
            RemediationError::InvalidResponse(e.to_string())
        } else {
            RemediationError::Status(status)
        }
    })
}

fn non_empty(text: &str) -> Result<String, RemediationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(RemediationError::EmptyResponse)
    } else {
        Ok(trimmed.to_string())
    }
}

fn error_answer(data: &Value) -> String {
    match data.get("error") {
        Some(Value::String(message)) => api_error(message),
        Some(error) => api_error(
            error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error"),
        ),
        None => api_error(UNEXPECTED_STRUCTURE),
    }
}

fn api_error(detail: &str) -> String {
    format!("{}: {}", API_ERROR_MARKER, detail)
}

/// Remediation source that is switched off
pub struct DisabledRemediation;

impl RemediationApi for DisabledRemediation {
    fn fetch(&self, _message: &str) -> Result<String, RemediationError> {
        Err(RemediationError::Disabled)
    }
}

/// Scripted remediation source for tests.
///
/// Responses are returned in order; the last one repeats.
#[cfg(test)]
pub struct FakeRemediation {
    responses: Mutex<Vec<Result<String, RemediationError>>>,
    call_count: Mutex<usize>,
}

#[cfg(test)]
impl FakeRemediation {
    pub fn new(responses: Vec<Result<String, RemediationError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
        }
    }

    pub fn answering(answer: &str) -> Self {
        Self::new(vec![Ok(answer.to_string())])
    }

    pub fn failing(error: RemediationError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }
}

#[cfg(test)]
impl RemediationApi for FakeRemediation {
    fn fetch(&self, _message: &str) -> Result<String, RemediationError> {
        *self.call_count.lock() += 1;

        let mut responses = self.responses.lock();
        match responses.len() {
            0 => Err(RemediationError::EmptyResponse),
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }
}
