//! Provider abstraction for chat completion and embedding backends.

use crate::Result;
use crate::error::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single chat-style message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `"system"`, `"user"`, or `"assistant"`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Builds a `user`-role message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    /// Builds a `system`-role message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }
}

/// Optional per-call parameters.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Sampling temperature, when the provider supports it.
    pub temperature: Option<f32>,
}

/// A single event in a normalized completion stream.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// One token (or chunk of tokens) of generated text.
    Token(String),
    /// The terminal event: the full accumulated text.
    Done(String),
}

/// A chat-completion and embedding backend.
///
/// Implementations are expected to be cheap to construct and safe to share
/// across concurrent pipeline runs.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name, used for usage accounting and error messages.
    fn name(&self) -> &'static str;

    /// Completes a chat-style conversation, returning the assistant text.
    async fn complete(&self, model: &str, messages: &[ChatMessage], options: &ChatOptions) -> Result<String>;

    /// Embeds a batch of texts.
    async fn embed(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// An OpenAI-compatible gateway (chat completions + embeddings endpoints).
pub struct GatewayProvider {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl GatewayProvider {
    /// Builds a gateway client. `base_url` must not have a trailing `/v1`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: String, token: String) -> Self {
        Self { client, base_url, token }
    }
}

#[async_trait]
impl Provider for GatewayProvider {
    fn name(&self) -> &'static str {
        "gateway"
    }

    async fn complete(&self, model: &str, messages: &[ChatMessage], options: &ChatOptions) -> Result<String> {
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": options.temperature,
        });

        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::ProviderError {
                provider: self.name().to_string(),
                task: model.to_string(),
                message: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(Error::ProviderError {
                provider: self.name().to_string(),
                task: model.to_string(),
                message: format!("gateway returned {}", resp.status()),
            });
        }

        let payload: serde_json::Value = resp.json().await.map_err(|e| Error::ProviderError {
            provider: self.name().to_string(),
            task: model.to_string(),
            message: e.to_string(),
        })?;

        payload
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::BadOutput {
                task: model.to_string(),
                message: "gateway response missing choices[0].message.content".to_string(),
            })
    }

    async fn embed(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({ "model": model, "input": texts });

        let resp = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::ProviderError {
                provider: self.name().to_string(),
                task: "embed".to_string(),
                message: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(Error::ProviderError {
                provider: self.name().to_string(),
                task: "embed".to_string(),
                message: format!("gateway returned {}", resp.status()),
            });
        }

        let payload: serde_json::Value = resp.json().await.map_err(|e| Error::ProviderError {
            provider: self.name().to_string(),
            task: "embed".to_string(),
            message: e.to_string(),
        })?;

        let data = payload.get("data").and_then(serde_json::Value::as_array).ok_or_else(|| Error::BadOutput {
            task: "embed".to_string(),
            message: "gateway response missing data[]".to_string(),
        })?;

        data.iter()
            .map(|entry| {
                entry
                    .get("embedding")
                    .and_then(serde_json::Value::as_array)
                    .map(|v| v.iter().filter_map(serde_json::Value::as_f64).map(|f| f as f32).collect())
                    .ok_or_else(|| Error::BadOutput {
                        task: "embed".to_string(),
                        message: "gateway embedding entry missing embedding[]".to_string(),
                    })
            })
            .collect()
    }
}
