use std::time::Duration;

use async_trait::async_trait;
use fashiondesk_core::config::LlmConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm client configuration is invalid: {0}")]
    Configuration(String),
    #[error("llm request timed out after {0}s")]
    Timeout(u64),
    #[error("llm transport failure: {0}")]
    Transport(String),
    #[error("llm returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("llm response could not be decoded: {0}")]
    Decode(String),
}

/// Single-shot text generation: a prompt in, a completion out.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Generation backend speaking Ollama's `/api/generate` endpoint with
/// streaming disabled.
#[derive(Clone, Debug)]
pub struct OllamaClient {
    http: reqwest::Client,
    generate_url: String,
    model: String,
    api_key: Option<SecretString>,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| LlmError::Configuration(error.to_string()))?;

        Ok(Self {
            http,
            generate_url: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn map_request_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(self.timeout_secs)
        } else {
            LlmError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(
            event_name = "agent.llm.request",
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "sending generation request"
        );

        let mut request = self.http.post(&self.generate_url).json(&GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|error| self.map_request_error(error))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let payload: GenerateResponse = response.json().await.map_err(|error| {
            if error.is_timeout() {
                LlmError::Timeout(self.timeout_secs)
            } else {
                LlmError::Decode(error.to_string())
            }
        })?;

        debug!(
            event_name = "agent.llm.response",
            model = %self.model,
            completion_chars = payload.response.chars().count(),
            "generation completed"
        );
        Ok(payload.response)
    }
}
