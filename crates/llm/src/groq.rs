//! Groq provider (OpenAI-compatible chat endpoint).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::{ProviderError, ProviderResult};
use crate::provider::{GenerateOptions, Message, Provider, ProviderSettings};

/// Registry name.
pub const NAME: &str = "groq";

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Default model
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Serialize)]
struct GroqMessage<'a> {
    role: String,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct GroqRequest<'a> {
    model: &'a str,
    messages: Vec<GroqMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
}

#[derive(Debug, Deserialize)]
struct GroqChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroqChoice {
    message: GroqChoiceMessage,
}

/// Groq-specific metadata attached to every completion.
#[derive(Debug, Deserialize)]
struct GroqMeta {
    id: String,
}

/// Response envelope for Groq completions.
#[derive(Debug, Deserialize)]
struct GroqResponse {
    choices: Vec<GroqChoice>,
    #[serde(default)]
    x_groq: Option<GroqMeta>,
}

#[derive(Debug, Deserialize)]
struct GroqErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct GroqErrorResponse {
    error: GroqErrorBody,
}

/// Groq LLM provider.
pub struct GroqProvider {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl GroqProvider {
    /// Build from registry settings, falling back to `GROQ_API_KEY`.
    pub fn from_settings(settings: &ProviderSettings) -> ProviderResult<Self> {
        let api_key = settings
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::NotConfigured {
                provider: NAME.to_string(),
                reason: format!("{API_KEY_ENV} not found in environment or config"),
            })?;

        Ok(Self {
            client: Client::new(),
            api_key,
            api_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| GROQ_API_URL.to_string()),
            model: if settings.model.is_empty() {
                DEFAULT_MODEL.to_string()
            } else {
                settings.model.clone()
            },
        })
    }
}

#[async_trait]
impl Provider for GroqProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> ProviderResult<String> {
        self.chat(&[Message::user(prompt)], options).await
    }

    async fn chat(&self, messages: &[Message], options: &GenerateOptions) -> ProviderResult<String> {
        let request = GroqRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| GroqMessage {
                    role: m.role.to_string(),
                    content: &m.content,
                })
                .collect(),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stop: options.stop_sequences.as_deref(),
        };

        tracing::info!(model = %self.model, "Calling Groq API");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Request {
                provider: NAME.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ProviderError::Request {
            provider: NAME.to_string(),
            reason: format!("failed to read response: {e}"),
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<GroqErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or(body);
            return Err(ProviderError::Status {
                provider: NAME.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let envelope: GroqResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse {
                provider: NAME.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(meta) = &envelope.x_groq {
            tracing::debug!(request_id = %meta.id, "Groq API call successful");
        }

        envelope
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: NAME.to_string(),
                reason: "response contained no message content".to_string(),
            })
    }
}
