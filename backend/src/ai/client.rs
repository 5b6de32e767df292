//! Chat-completion client with a single raw-HTTP fallback.
//!
//! A call never fails the caller: the worst case is an empty completion. The
//! error that caused it travels back in [`CompletionResult::last_error`] so
//! concurrent calls on one client never overwrite each other's diagnostics.

use crate::config::LlmConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

pub const SYSTEM_INSTRUCTION: &str =
    "You are a knowledgeable financial advisor. Give concise, actionable answers.";

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("timed out after {0}s")]
    Timeout(u64),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("client setup failed: {0}")]
    Setup(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<CompletionMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(config: &LlmConfig, prompt: &str) -> Self {
        Self::with_system(config, SYSTEM_INSTRUCTION, prompt)
    }

    pub fn with_system(config: &LlmConfig, system: &str, prompt: &str) -> Self {
        Self {
            model: config.model.clone(),
            messages: vec![
                CompletionMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                CompletionMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// Outcome of one completion call: text (possibly empty) plus the error behind an empty one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionResult {
    pub text: String,
    pub success: bool,
    pub last_error: Option<String>,
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

fn endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

fn map_send_error(err: reqwest::Error, timeout_secs: u64) -> CompletionError {
    if err.is_timeout() {
        CompletionError::Timeout(timeout_secs)
    } else {
        CompletionError::Transport(err.to_string())
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Typed client used when an API key is configured.
pub struct SdkTransport {
    client: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl SdkTransport {
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self, CompletionError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| CompletionError::Setup("API key is not a valid header value".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            url: endpoint(&config.base_url),
            timeout_secs: config.timeout_secs,
        })
    }
}

#[async_trait]
impl ChatTransport for SdkTransport {
    async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        let data: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Decode(e.to_string()))?;

        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| CompletionError::Decode("no message content in choices".to_string()))
    }
}

/// Plain POST against the same endpoint, reading `choices[0].message.content` by pointer.
pub struct RawHttpTransport {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl RawHttpTransport {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: endpoint(&config.base_url),
            api_key: config.api_key.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

#[async_trait]
impl ChatTransport for RawHttpTransport {
    async fn send(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = json!({
            "model": request.model,
            "messages": request.messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let mut builder = self
            .client
            .post(&self.url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_send_error(e, self.timeout_secs))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: snippet(&text),
            });
        }

        let value: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| CompletionError::Decode(e.to_string()))?;
        value
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| CompletionError::Decode(snippet(&text)))
    }
}

pub struct CompletionClient {
    config: LlmConfig,
    primary: Option<Arc<dyn ChatTransport>>,
    fallback: Arc<dyn ChatTransport>,
}

impl CompletionClient {
    pub fn new(config: &LlmConfig) -> Self {
        let primary: Option<Arc<dyn ChatTransport>> = match config.api_key.as_deref() {
            Some(key) => match SdkTransport::new(config, key) {
                Ok(transport) => Some(Arc::new(transport)),
                Err(e) => {
                    warn!("Completion client unavailable, using raw HTTP only: {}", e);
                    None
                }
            },
            None => {
                warn!("No LLM API key configured, completions will use raw HTTP only");
                None
            }
        };

        Self {
            config: config.clone(),
            primary,
            fallback: Arc::new(RawHttpTransport::new(config)),
        }
    }

    pub fn with_transports(
        config: &LlmConfig,
        primary: Option<Arc<dyn ChatTransport>>,
        fallback: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            config: config.clone(),
            primary,
            fallback,
        }
    }

    /// At most one primary attempt and one raw-HTTP attempt per call.
    pub async fn complete(&self, prompt: &str) -> CompletionResult {
        self.complete_with_system(SYSTEM_INSTRUCTION, prompt).await
    }

    /// Same as [`complete`](Self::complete) with a caller-supplied system message.
    pub async fn complete_with_system(&self, system: &str, prompt: &str) -> CompletionResult {
        let request = CompletionRequest::with_system(&self.config, system, prompt);

        if let Some(primary) = &self.primary {
            match primary.send(&request).await {
                Ok(text) => {
                    debug!("Completion succeeded ({} chars)", text.len());
                    return CompletionResult {
                        text,
                        success: true,
                        last_error: None,
                    };
                }
                Err(e) => warn!("Primary completion failed, retrying over raw HTTP: {}", e),
            }
        }

        match self.fallback.send(&request).await {
            Ok(text) => CompletionResult {
                text,
                success: true,
                last_error: None,
            },
            Err(e) => {
                error!("Raw HTTP completion failed: {}", e);
                CompletionResult {
                    text: String::new(),
                    success: false,
                    last_error: Some(e.to_string()),
                }
            }
        }
    }

    pub async fn complete_text(&self, prompt: &str) -> String {
        self.complete(prompt).await.text
    }
}
