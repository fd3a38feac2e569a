//! Operations exposed to front ends such as the CLI.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use llm::{global_registry, ProviderRegistry};

use crate::candidate::PostCandidate;
use crate::config::Config;
use crate::errors::{PipelineError, StoreError};
use crate::pipeline::Pipeline;
use crate::prompts::PromptManager;
use crate::refiner::HashtagRefiner;
use crate::store::DraftStore;

/// Run the digest pipeline with a provider from the global registry.
pub async fn run_pipeline(
    config: &Config,
    topic: &str,
    hours: u32,
    count: usize,
    char_limit: usize,
    provider_name: &str,
    model_name: Option<&str>,
) -> Result<PathBuf, PipelineError> {
    run_pipeline_with(
        global_registry(),
        config,
        topic,
        hours,
        count,
        char_limit,
        provider_name,
        model_name,
    )
    .await
}

/// Same as [`run_pipeline`], against an explicit registry.
pub async fn run_pipeline_with(
    registry: &ProviderRegistry,
    config: &Config,
    topic: &str,
    hours: u32,
    count: usize,
    char_limit: usize,
    provider_name: &str,
    model_name: Option<&str>,
) -> Result<PathBuf, PipelineError> {
    let settings = config.provider_settings(provider_name, model_name);
    let provider = registry
        .create(provider_name, &settings)
        .map_err(|e| PipelineError::new(e.to_string()))?;

    let prompts = match &config.prompts_dir {
        Some(dir) => PromptManager::from_dir(dir),
        None => PromptManager::new(),
    }
    .map_err(|e| PipelineError::new(e.to_string()))?;

    let mut pipeline = Pipeline::new(provider, DraftStore::new(config.drafts_dir()))
        .with_prompts(Arc::new(prompts));
    if !config.hashtags.is_empty() {
        let refiner = HashtagRefiner::new(&config.hashtags).with_char_limit(char_limit);
        pipeline = pipeline.with_refiner(Arc::new(refiner));
    }

    pipeline.run(topic, hours, count, char_limit).await
}

/// Draft files in the configured directory, optionally for one category.
pub fn list_drafts(config: &Config, category: Option<&str>) -> Result<Vec<PathBuf>, StoreError> {
    DraftStore::new(config.drafts_dir()).list(category)
}

/// Load one draft file; a missing file is an empty batch.
pub fn load_draft(path: &Path) -> Result<Vec<PostCandidate>, StoreError> {
    DraftStore::load(path)
}
