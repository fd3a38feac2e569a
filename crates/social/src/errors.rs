//! Error types for the drafting pipeline.
//!
//! Every stage has its own error type with full detail. Only the pipeline
//! orchestrator collapses them into [`PipelineError`].

use std::path::PathBuf;

use llm::ProviderError;
use thiserror::Error;

/// No candidates could be extracted from a backend response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not extract posts from LLM output: {reason}")]
pub struct ParseError {
    pub reason: String,
}

impl ParseError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Draft, refine or rank stage failure.
#[derive(Error, Debug, Clone)]
pub enum WriterError {
    #[error("Failed to {stage} posts: {source}")]
    Provider {
        stage: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to draft posts: {0}")]
    Parse(#[from] ParseError),

    #[error("Refiner broke the identity contract: {reason}")]
    Contract { reason: String },

    #[error("Failed to render {template} prompt: {reason}")]
    Prompt {
        template: &'static str,
        reason: String,
    },
}

/// Fact collection failure.
#[derive(Error, Debug, Clone)]
pub enum CollectorError {
    #[error("Failed to collect information: {0}")]
    Provider(#[from] ProviderError),

    #[error("No facts found about '{topic}' in the last {hours} hours")]
    NoFacts { topic: String, hours: u32 },

    #[error("Failed to render collect prompt: {0}")]
    Prompt(String),
}

/// Draft store failure.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Draft store I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize draft record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Corrupt draft file '{}' at line {line}: {reason}", path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Missing or invalid settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration value for '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

/// Top-level failure surfaced to callers of the pipeline.
///
/// Carries only the message of the stage error that ended the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Pipeline failed: {message}")]
pub struct PipelineError {
    pub message: String,
}

impl PipelineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_error_wraps_provider_text() {
        let err = WriterError::Provider {
            stage: "rank",
            source: ProviderError::Request {
                provider: "openai".to_string(),
                reason: "timed out".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "Failed to rank posts: openai request failed: timed out"
        );
    }

    #[test]
    fn test_pipeline_error_message() {
        let err = PipelineError::new("boom");
        assert_eq!(err.to_string(), "Pipeline failed: boom");
    }
}
