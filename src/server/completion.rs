//! # Completion Client
//!
//! Black-box `prompt -> text` service used by `/analyze_product`. The
//! production implementation talks to an OpenAI-compatible chat-completions
//! endpoint (Groq by default).

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::common::config::CompletionConfig;

use super::error::CompletionError;

const SYSTEM_PROMPT: &str = "You are a helpful nutrition assistant.";

/// Turns a prompt into generated text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

/// [`CompletionClient`] for OpenAI-compatible chat-completions APIs.
pub struct ChatCompletionClient {
    http: reqwest::Client,
    config: CompletionConfig,
    api_key: String,
}

impl ChatCompletionClient {
    /// Build a client whose requests time out after `config.timeout_secs`.
    pub fn new(config: CompletionConfig, api_key: String) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            api_key,
        })
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };

        let response = self
            .http
            .post(&self.config.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        debug!("Completion service answered {} ({} bytes)", status, body.len());

        // Error bodies fail to parse as a chat response and are reported as invalid
        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            error!("❌ Failed to decode completion response: {}", e);
            error!("Raw response: {}", body);
            CompletionError::InvalidResponse(e.to_string())
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::InvalidResponse("response has no choices".into()))
    }
}
