//! Chat-completion clients for the primary and fallback backends.
//!
//! Both backends speak the same OpenAI-compatible wire contract; they
//! differ only in endpoint, key, model, temperature, and system prompt,
//! so a single parameterized client serves both roles.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use dobby_core::config::{DobbyConfig, FallbackModelConfig};
use dobby_core::types::{ContextMessage, Role};

use crate::context::{truncate_context, WireMessage};
use crate::error::GenerationError;
use crate::prompt;

/// Timeout for the startup connectivity probe.
const TEST_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Common interface for the generation backends.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Backend name for logging ("primary" / "fallback").
    fn name(&self) -> &str;

    /// Generate a reply to `user_message` given the retained history.
    async fn generate_response(
        &self,
        user_message: &str,
        history: &[ContextMessage],
    ) -> Result<String, GenerationError>;

    /// Cheap connectivity probe used at startup. Any failure — transport,
    /// status, malformed payload — yields `false`, never an error.
    async fn test_connection(&self) -> bool;
}

/// A single chat-completion backend.
pub struct CompletionClient {
    client: reqwest::Client,
    name: &'static str,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: &'static str,
    max_context_chars: usize,
    reply_timeout: Duration,
}

impl CompletionClient {
    /// The persona model on the primary endpoint. No output cap — the
    /// safety filter truncates over-length replies downstream.
    pub fn primary(config: &DobbyConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            name: "primary",
            api_url: config.primary.api_url.clone(),
            api_key: config.primary.api_key.clone(),
            model: config.primary.model.clone(),
            temperature: config.primary.temperature,
            max_tokens: None,
            system_prompt: prompt::persona_prompt(&config.bot.persona),
            max_context_chars: config.bot.max_context_length,
            reply_timeout: Duration::from_millis(config.bot.reply_timeout_ms),
        }
    }

    /// The generic fallback endpoint, with a simpler voice and a capped
    /// output budget.
    pub fn fallback(config: &DobbyConfig, fallback: &FallbackModelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            name: "fallback",
            api_url: fallback.api_url.clone(),
            api_key: fallback.api_key.clone(),
            model: fallback.model.clone(),
            temperature: 0.8,
            max_tokens: Some(500),
            system_prompt: prompt::FALLBACK_PROMPT,
            max_context_chars: config.bot.max_context_length,
            reply_timeout: Duration::from_millis(config.bot.reply_timeout_ms),
        }
    }

    /// System prompt first, retained history oldest-first, the new user
    /// message last — then cut to the character budget.
    fn assemble_messages(&self, user_message: &str, history: &[ContextMessage]) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(WireMessage::new("system", self.system_prompt));
        for turn in history {
            let role = match turn.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            };
            messages.push(WireMessage::new(role, turn.content.clone()));
        }
        messages.push(WireMessage::new("user", user_message));

        truncate_context(&messages, self.max_context_chars)
    }
}

#[async_trait]
impl GenerationClient for CompletionClient {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate_response(
        &self,
        user_message: &str,
        history: &[ContextMessage],
    ) -> Result<String, GenerationError> {
        let messages = self.assemble_messages(user_message, history);
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });
        let url = format!("{}/chat/completions", self.api_url);

        debug!(backend = %self.name, model = %self.model, turns = messages.len(), "sending completion request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .timeout(self.reply_timeout)
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(backend = %self.name, status, body = %text, "completion API error");
            return Err(GenerationError::Api {
                status,
                message: text,
            });
        }

        let api_resp: ApiResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        let content = api_resp
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::Parse("response contained no choices".to_string()))?;

        info!(backend = %self.name, preview = %preview(&content), "generated response");
        Ok(content)
    }

    async fn test_connection(&self) -> bool {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": "You are a helpful assistant." },
                { "role": "user", "content": "Hello, this is a test." },
            ],
            "max_tokens": 10,
            "temperature": self.temperature,
        });
        let url = format!("{}/chat/completions", self.api_url);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .timeout(TEST_CONNECTION_TIMEOUT)
            .json(&body)
            .send()
            .await;

        match resp {
            Ok(resp) if resp.status().is_success() => match resp.json::<ApiResponse>().await {
                Ok(parsed) if !parsed.choices.is_empty() => true,
                Ok(_) => {
                    warn!(backend = %self.name, "connection test returned no choices");
                    false
                }
                Err(e) => {
                    warn!(backend = %self.name, err = %e, "connection test returned malformed payload");
                    false
                }
            },
            Ok(resp) => {
                warn!(backend = %self.name, status = resp.status().as_u16(), "connection test failed");
                false
            }
            Err(e) => {
                warn!(backend = %self.name, err = %e, "connection test failed");
                false
            }
        }
    }
}

/// First 100 characters, for log lines.
fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}

// API response types (private — deserialization only)

#[derive(Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}
