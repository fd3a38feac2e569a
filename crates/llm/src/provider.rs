//! Provider trait and common types.
//!
//! Defines the interface every text-generation backend implements.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ProviderResult;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message (sets context/behavior)
    System,
    /// User message (input)
    User,
    /// Assistant message (model output)
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        write!(f, "{s}")
    }
}

/// A message in a conversation with a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Options for text generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Stop sequences
    pub stop_sequences: Option<Vec<String>>,
}

/// Everything a factory needs to build a provider instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSettings {
    /// Model identifier passed to the backend.
    pub model: String,
    /// API key; backends fall back to their environment variable when absent.
    pub api_key: Option<String>,
    /// Custom endpoint (proxies, self-hosted gateways).
    pub base_url: Option<String>,
}

impl ProviderSettings {
    /// Settings for a model with no explicit credentials.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set an explicit API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set a custom base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

/// Trait for text-generation backends.
///
/// A provider is identified by `(name, model)` and is otherwise stateless
/// from the caller's point of view beyond the credentials it holds.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry name of the backend (e.g., "openai", "ollama").
    fn name(&self) -> &str;

    /// Model this instance generates with.
    fn model(&self) -> &str;

    /// Generate text from a single prompt.
    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> ProviderResult<String>;

    /// Generate text from a chat history.
    ///
    /// The default flattens the history into `role: content` lines and
    /// delegates to [`Provider::generate`]. Backends with a native chat
    /// endpoint override this.
    async fn chat(&self, messages: &[Message], options: &GenerateOptions) -> ProviderResult<String> {
        let prompt = messages_to_prompt(messages);
        self.generate(&prompt, options).await
    }
}

/// Flatten a chat history into one `role: content` line per message.
pub fn messages_to_prompt(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}
