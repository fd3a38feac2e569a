//! Error types for provider construction and text generation.

use thiserror::Error;

/// Errors raised by providers and the provider registry.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// Credentials or other required settings are missing.
    #[error("Provider '{provider}' not configured: {reason}")]
    NotConfigured { provider: String, reason: String },

    /// The request never produced a response (connection, TLS, body read).
    #[error("{provider} request failed: {reason}")]
    Request { provider: String, reason: String },

    /// The backend answered with a non-success status.
    #[error("{provider} API error ({status}): {message}")]
    Status {
        provider: String,
        status: u16,
        message: String,
    },

    /// The backend answered but the envelope could not be normalized to text.
    #[error("{provider} returned an invalid response: {reason}")]
    InvalidResponse { provider: String, reason: String },

    /// A subprocess-backed provider failed to run or exited unsuccessfully.
    #[error("{provider} process failed: {reason}")]
    Process { provider: String, reason: String },

    /// Lookup of a provider name that was never registered.
    #[error("Unknown LLM provider: '{name}' (available: {})", available.join(", "))]
    UnknownProvider { name: String, available: Vec<String> },
}

/// Result alias for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
