//! Ollama provider backed by the local `ollama` CLI.
//!
//! Runs `ollama run <model> <prompt>` as a subprocess and returns its stdout.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use crate::errors::{ProviderError, ProviderResult};
use crate::provider::{GenerateOptions, Provider, ProviderSettings};

/// Registry name.
pub const NAME: &str = "ollama";

/// Default model
pub const DEFAULT_MODEL: &str = "llama3";

const DEFAULT_EXECUTABLE: &str = "ollama";

/// Captured result of one CLI invocation.
#[derive(Debug)]
struct OllamaOutput {
    stdout: String,
    stderr: String,
    exit_code: Option<i32>,
    success: bool,
}

impl OllamaOutput {
    fn into_text(self) -> ProviderResult<String> {
        if !self.success {
            return Err(ProviderError::Process {
                provider: NAME.to_string(),
                reason: format!(
                    "exit code {}: {}",
                    self.exit_code.unwrap_or(-1),
                    self.stderr.trim()
                ),
            });
        }
        Ok(self.stdout.trim().to_string())
    }
}

/// Ollama LLM provider.
pub struct OllamaProvider {
    executable: String,
    model: String,
}

impl OllamaProvider {
    /// Create a provider for the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            model: model.into(),
        }
    }

    /// Build from registry settings. No credentials are needed.
    #[allow(clippy::unnecessary_wraps)]
    pub fn from_settings(settings: &ProviderSettings) -> ProviderResult<Self> {
        let model = if settings.model.is_empty() {
            DEFAULT_MODEL
        } else {
            settings.model.as_str()
        };
        Ok(Self::new(model))
    }

    /// Use a different executable (a wrapper script, or an absolute path).
    #[must_use]
    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    async fn execute(&self, prompt: &str) -> ProviderResult<OllamaOutput> {
        tracing::info!(model = %self.model, "Calling Ollama CLI");

        let output = Command::new(&self.executable)
            .args(["run", &self.model, prompt])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ProviderError::Process {
                provider: NAME.to_string(),
                reason: if e.kind() == std::io::ErrorKind::NotFound {
                    format!("'{}' CLI not found. Please install it first.", self.executable)
                } else {
                    format!("failed to spawn '{}': {e}", self.executable)
                },
            })?;

        Ok(OllamaOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
            success: output.status.success(),
        })
    }
}

#[async_trait]
impl Provider for OllamaProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, _options: &GenerateOptions) -> ProviderResult<String> {
        let output = self.execute(prompt).await?;
        let text = output.into_text();
        match &text {
            Ok(_) => tracing::info!("Ollama CLI call successful"),
            Err(e) => tracing::error!(error = %e, "Ollama CLI call failed"),
        }
        text
    }
}
