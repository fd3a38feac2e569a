//! Pipeline orchestrator: collect, draft, refine, rank, save.
//!
//! Stages run strictly one after another. The first failure ends the run,
//! is logged with its stage, and reaches the caller as a [`PipelineError`]
//! carrying only the stage error's message. Nothing touches disk before the
//! save stage.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use llm::Provider;

use crate::collector::{Collector, LlmCollector};
use crate::errors::PipelineError;
use crate::prompts::PromptManager;
use crate::ranker::Ranker;
use crate::refiner::{check_identity, IdentityRefiner, Refiner};
use crate::store::DraftStore;
use crate::writer::DraftWriter;

/// Category of batches produced by the digest pipeline.
pub const DIGEST_CATEGORY: &str = "digest";

/// Pipeline step, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Collect,
    Draft,
    Refine,
    Rank,
    Save,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Collect => "collect",
            Stage::Draft => "draft",
            Stage::Refine => "refine",
            Stage::Rank => "rank",
            Stage::Save => "save",
        };
        write!(f, "{s}")
    }
}

/// Stage error flattened to text.
struct StageFailure {
    stage: Stage,
    message: String,
}

fn at<E: fmt::Display>(stage: Stage) -> impl FnOnce(E) -> StageFailure {
    move |err| StageFailure {
        stage,
        message: err.to_string(),
    }
}

/// One configured pipeline; reusable across runs.
pub struct Pipeline {
    provider: Arc<dyn Provider>,
    store: DraftStore,
    prompts: Arc<PromptManager>,
    collector: Option<Arc<dyn Collector>>,
    refiner: Arc<dyn Refiner>,
    category: String,
}

impl Pipeline {
    /// Digest pipeline with the model-backed collector and no refinement.
    pub fn new(provider: Arc<dyn Provider>, store: DraftStore) -> Self {
        Self {
            provider,
            store,
            prompts: Arc::new(PromptManager::default()),
            collector: None,
            refiner: Arc::new(IdentityRefiner),
            category: DIGEST_CATEGORY.to_string(),
        }
    }

    #[must_use]
    pub fn with_prompts(mut self, prompts: Arc<PromptManager>) -> Self {
        self.prompts = prompts;
        self
    }

    #[must_use]
    pub fn with_collector(mut self, collector: Arc<dyn Collector>) -> Self {
        self.collector = Some(collector);
        self
    }

    #[must_use]
    pub fn with_refiner(mut self, refiner: Arc<dyn Refiner>) -> Self {
        self.refiner = refiner;
        self
    }

    /// Category used in draft file names.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn store(&self) -> &DraftStore {
        &self.store
    }

    /// Run all stages for `topic` and return the saved draft file.
    pub async fn run(
        &self,
        topic: &str,
        hours: u32,
        count: usize,
        char_limit: usize,
    ) -> Result<PathBuf, PipelineError> {
        tracing::info!(
            topic,
            hours,
            count,
            provider = self.provider.name(),
            model = self.provider.model(),
            "Starting pipeline"
        );

        match self.execute(topic, hours, count, char_limit).await {
            Ok(path) => {
                tracing::info!(path = %path.display(), "Pipeline finished");
                Ok(path)
            }
            Err(failure) => {
                tracing::error!(stage = %failure.stage, error = %failure.message, "Pipeline failed");
                Err(PipelineError::new(failure.message))
            }
        }
    }

    async fn execute(
        &self,
        topic: &str,
        hours: u32,
        count: usize,
        char_limit: usize,
    ) -> Result<PathBuf, StageFailure> {
        if count == 0 || char_limit == 0 {
            return Err(StageFailure {
                stage: Stage::Draft,
                message: format!(
                    "count and char limit must be at least 1 (got {count} and {char_limit})"
                ),
            });
        }

        let facts = match &self.collector {
            Some(collector) => collector.collect(topic, hours, self.provider.as_ref()).await,
            None => {
                LlmCollector::new(self.prompts.clone())
                    .collect(topic, hours, self.provider.as_ref())
                    .await
            }
        }
        .map_err(at(Stage::Collect))?;
        tracing::debug!(stage = %Stage::Collect, facts = facts.len(), "Stage complete");

        let drafts = DraftWriter::new(self.provider.clone(), self.prompts.clone())
            .draft(&facts, count, char_limit)
            .await
            .map_err(at(Stage::Draft))?;
        tracing::debug!(stage = %Stage::Draft, drafts = drafts.len(), "Stage complete");

        let ids: Vec<String> = drafts.iter().map(|c| c.id().to_string()).collect();
        let refined = self
            .refiner
            .refine(drafts)
            .await
            .map_err(at(Stage::Refine))?;
        check_identity(&ids, &refined).map_err(at(Stage::Refine))?;
        tracing::debug!(stage = %Stage::Refine, refiner = self.refiner.name(), "Stage complete");

        let ranked = Ranker::new(self.provider.clone(), self.prompts.clone())
            .rank(refined)
            .await
            .map_err(at(Stage::Rank))?;
        tracing::debug!(
            stage = %Stage::Rank,
            scored = ranked.iter().filter(|c| c.score().is_some()).count(),
            "Stage complete"
        );

        self.store
            .save(&self.category, topic, &ranked)
            .map_err(at(Stage::Save))
    }
}
