//! Completion-service client and the general-chat collaborator.

pub(crate) mod prompts;

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::LanguageTag;
use crate::config::{Config, Secret};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion API rate limit exceeded")]
    RateLimited,

    #[error("completion API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("completion response carried no content")]
    EmptyResponse,
}

/// Abstraction for the text-completion service. Used for eligibility
/// classification, grounded synthesis, and general chat, each with its own
/// prompt. Implemented by `ChatClient` for production; mock implementations
/// used in tests.
pub trait CompletionClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError>;
}

/// Client for an OpenAI-style `/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    api_key: Secret,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

impl ChatClient {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            api_key: config.completion_api_key.clone(),
            model: config.model.clone(),
            base_url: config.completion_base_url.trim_end_matches('/').to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: Secret::new("test-key"),
            model: "test-model".to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn request(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system,
                },
                Message {
                    role: "user",
                    content: user,
                },
            ],
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("completion API rate limited");
            return Err(CompletionError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ChatResponse>(&text)
                .ok()
                .and_then(|body| body.error)
                .and_then(|err| err.message)
                .unwrap_or_else(|| {
                    let snippet = if text.len() > 200 { &text[..200] } else { &text };
                    format!("HTTP {status}: {snippet}")
                });
            warn!(status = %status, "completion API error");
            return Err(CompletionError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        if let Some(err) = body.error {
            return Err(CompletionError::Api {
                code: status.as_u16(),
                message: err.message.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(CompletionError::EmptyResponse)?;

        debug!(model = %self.model, chars = content.len(), "completion received");
        Ok(content)
    }
}

impl CompletionClient for ChatClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        let mut last_err = None;
        for attempt in 0..MAX_RETRIES {
            match self.request(system, user).await {
                Ok(content) => return Ok(content),
                Err(e) if is_retriable(&e) => {
                    last_err = Some(e);
                    if attempt + 1 < MAX_RETRIES {
                        let delay_ms = jittered_backoff(attempt);
                        debug!(
                            attempt = attempt + 1,
                            delay_ms, "retrying after transient completion error"
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or(CompletionError::RateLimited))
    }
}

fn is_retriable(e: &CompletionError) -> bool {
    matches!(
        e,
        CompletionError::RateLimited
            | CompletionError::Api {
                code: 500..=599,
                ..
            }
    )
}

/// Equal jitter backoff: base/2 + rand(0, base/2).
fn jittered_backoff(attempt: u32) -> u64 {
    let base = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
    let half = base / 2;
    half + fastrand::u64(..half.max(1))
}

/// General-chat collaborator for questions outside the legal pipeline: one
/// completion call with the reply language pinned by the system instruction.
pub async fn chat(
    completion: &impl CompletionClient,
    question: &str,
    language: &LanguageTag,
) -> Result<String, CompletionError> {
    completion
        .complete(&prompts::chat_system(language), question)
        .await
}
