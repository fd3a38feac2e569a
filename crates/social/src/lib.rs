//! Social post drafting pipeline.
//!
//! This crate provides:
//! - Fact collection about a topic through an LLM provider
//! - Drafting of candidate posts and a resilient output parser
//! - Optional refinement (hashtags) and model-based ranking
//! - A JSONL draft store with one dated file per category and topic
//!
//! Providers come from the `llm` crate's registry.

pub mod api;
pub mod candidate;
pub mod collector;
pub mod config;
pub mod errors;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod ranker;
pub mod refiner;
pub mod store;
pub mod writer;

// Re-export main types
pub use api::{list_drafts, load_draft, run_pipeline, run_pipeline_with};
pub use candidate::{DraftRecord, PostCandidate, Ranking};
pub use collector::{Collector, LlmCollector};
pub use config::Config;
pub use errors::{CollectorError, ConfigError, ParseError, PipelineError, StoreError, WriterError};
pub use parser::{OutputParser, ParsedPost};
pub use pipeline::{Pipeline, DIGEST_CATEGORY};
pub use refiner::{HashtagRefiner, IdentityRefiner, Refiner};
pub use store::DraftStore;
