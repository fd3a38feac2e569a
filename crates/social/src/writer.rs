//! Draft writer - turns collected facts into an initial batch of posts.

use std::sync::Arc;

use llm::{GenerateOptions, Message, Provider};

use crate::candidate::PostCandidate;
use crate::errors::WriterError;
use crate::parser::{
    JsonListStrategy, MarkerBlockStrategy, OutputParser, PrefixedLineStrategy,
};
use crate::prompts::{DraftPrompt, PromptManager, DRAFT};

/// Marker the draft prompt asks the model to put in front of every post.
pub const POST_PREFIX: &str = "TWEET:";

/// Drafts candidate posts from a list of facts.
pub struct DraftWriter {
    provider: Arc<dyn Provider>,
    prompts: Arc<PromptManager>,
}

impl DraftWriter {
    pub fn new(provider: Arc<dyn Provider>, prompts: Arc<PromptManager>) -> Self {
        Self { provider, prompts }
    }

    /// Ask the provider for `count` posts of at most `char_limit` characters.
    ///
    /// Returns at most `count` candidates, each with a fresh id. Fewer is
    /// fine when the model emits fewer posts; none at all is an error.
    pub async fn draft(
        &self,
        facts: &[String],
        count: usize,
        char_limit: usize,
    ) -> Result<Vec<PostCandidate>, WriterError> {
        let prompt = self
            .prompts
            .render(
                DRAFT,
                &DraftPrompt {
                    facts,
                    count,
                    char_limit,
                    prefix: POST_PREFIX,
                },
            )
            .map_err(|e| WriterError::Prompt {
                template: DRAFT,
                reason: e.to_string(),
            })?;

        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)];
        let options = GenerateOptions {
            temperature: Some(0.8),
            ..Default::default()
        };

        tracing::debug!(
            provider = self.provider.name(),
            model = self.provider.model(),
            count,
            "Requesting drafts"
        );

        let response = self
            .provider
            .chat(&messages, &options)
            .await
            .map_err(|source| WriterError::Provider {
                stage: "draft",
                source,
            })?;

        let posts = draft_parser(char_limit).parse(&response, count)?;

        Ok(posts
            .into_iter()
            .map(|post| PostCandidate::new(post.text).with_image_prompt(post.image_prompt))
            .collect())
    }
}

/// Prefixed lines first, since that is what the prompt asks for.
fn draft_parser(char_limit: usize) -> OutputParser {
    OutputParser::with_strategies(
        vec![
            Box::new(PrefixedLineStrategy::new(POST_PREFIX)),
            Box::new(JsonListStrategy),
            Box::new(MarkerBlockStrategy::default()),
        ],
        char_limit,
    )
}

const SYSTEM_PROMPT: &str = "You write concise, engaging social media posts. \
Stick to the facts you are given and never invent numbers or quotes.";
