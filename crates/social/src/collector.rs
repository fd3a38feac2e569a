//! Fact collection - the first pipeline stage.

use std::sync::Arc;

use async_trait::async_trait;
use llm::{GenerateOptions, Provider};

use crate::errors::CollectorError;
use crate::prompts::{CollectPrompt, PromptManager, COLLECT};

/// Gathers recent facts about a topic.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Ordered fact strings about `topic` from the last `hours` hours.
    async fn collect(
        &self,
        topic: &str,
        hours: u32,
        provider: &dyn Provider,
    ) -> Result<Vec<String>, CollectorError>;
}

/// Asks the model itself for bullet-point facts.
pub struct LlmCollector {
    prompts: Arc<PromptManager>,
}

impl LlmCollector {
    pub fn new(prompts: Arc<PromptManager>) -> Self {
        Self { prompts }
    }
}

#[async_trait]
impl Collector for LlmCollector {
    async fn collect(
        &self,
        topic: &str,
        hours: u32,
        provider: &dyn Provider,
    ) -> Result<Vec<String>, CollectorError> {
        let prompt = self
            .prompts
            .render(COLLECT, &CollectPrompt { topic, hours })
            .map_err(|e| CollectorError::Prompt(e.to_string()))?;

        let options = GenerateOptions {
            temperature: Some(0.3),
            ..Default::default()
        };
        let response = provider.generate(&prompt, &options).await?;

        let facts = extract_bullets(&response);
        if facts.is_empty() {
            return Err(CollectorError::NoFacts {
                topic: topic.to_string(),
                hours,
            });
        }

        tracing::info!(topic, count = facts.len(), "Collected facts");
        Ok(facts)
    }
}

/// Lines starting with `•`, `-` or `*`, without the bullet.
pub fn extract_bullets(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let rest = line
                .strip_prefix('•')
                .or_else(|| line.strip_prefix('-'))
                .or_else(|| line.strip_prefix('*'))?;
            let fact = rest.trim();
            (!fact.is_empty()).then(|| fact.to_string())
        })
        .collect()
}
