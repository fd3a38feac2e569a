//! OpenAI Chat Completions provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::{ProviderError, ProviderResult};
use crate::provider::{GenerateOptions, Message, Provider, ProviderSettings};

/// Registry name.
pub const NAME: &str = "openai";

/// OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Environment variable holding the API key
const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI API request message
#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// OpenAI API request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

/// OpenAI API response choice message
#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI API response choice
#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

/// OpenAI API usage
#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Response envelope, normalized to the first choice's text.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    model: String,
    usage: Option<Usage>,
}

impl ChatCompletionResponse {
    fn into_text(self) -> ProviderResult<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::InvalidResponse {
                provider: NAME.to_string(),
                reason: "response contained no message content".to_string(),
            })
    }
}

/// OpenAI API error
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// OpenAI API error response
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

/// OpenAI GPT provider.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider with an API key.
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: OPENAI_API_URL.to_string(),
            model: model.into(),
        }
    }

    /// Build from registry settings, falling back to `OPENAI_API_KEY`.
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

        let model = if settings.model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            settings.model.clone()
        };

        let mut provider = Self::new(model, api_key);
        if let Some(url) = &settings.base_url {
            provider = provider.with_base_url(url.clone());
        }
        tracing::info!(model = %provider.model, "Initialized OpenAI client");
        Ok(provider)
    }

    /// Set a custom endpoint URL (useful for Azure OpenAI or proxies).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Convert messages to OpenAI format.
    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|msg| ChatMessage {
                role: msg.role.to_string(),
                content: msg.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
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
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: Self::convert_messages(messages),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stop: options.stop_sequences.clone(),
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "Calling OpenAI API");

        let response = self
            .client
            .post(&self.base_url)
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
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|r| r.error.message)
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), "OpenAI API error");
            return Err(ProviderError::Status {
                provider: NAME.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ChatCompletionResponse =
            serde_json::from_str(&body).map_err(|e| ProviderError::InvalidResponse {
                provider: NAME.to_string(),
                reason: e.to_string(),
            })?;

        if let Some(usage) = &envelope.usage {
            tracing::debug!(
                model = %envelope.model,
                input_tokens = usage.prompt_tokens,
                output_tokens = usage.completion_tokens,
                "OpenAI API call successful"
            );
        }

        envelope.into_text()
    }
}
