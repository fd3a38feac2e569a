//! Refiners - optional polishing stage between drafting and ranking.
//!
//! A refiner may rewrite text but must hand back the same candidates, same
//! ids, in the same order. [`check_identity`] enforces that at the pipeline
//! boundary.

use async_trait::async_trait;

use crate::candidate::PostCandidate;
use crate::errors::WriterError;
use crate::parser::truncate;

/// Polishing stage.
#[async_trait]
pub trait Refiner: Send + Sync {
    /// Name for logs.
    fn name(&self) -> &str;

    /// Return the candidates with (possibly) rewritten text.
    async fn refine(&self, candidates: Vec<PostCandidate>) -> Result<Vec<PostCandidate>, WriterError>;
}

/// Pass-through refiner.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityRefiner;

#[async_trait]
impl Refiner for IdentityRefiner {
    fn name(&self) -> &str {
        "identity"
    }

    async fn refine(&self, candidates: Vec<PostCandidate>) -> Result<Vec<PostCandidate>, WriterError> {
        Ok(candidates)
    }
}

/// Appends a fixed hashtag block to every post.
///
/// With a char limit the body is shortened to make room for the block, and
/// the block is left off when it cannot fit next to at least one character.
#[derive(Debug, Clone)]
pub struct HashtagRefiner {
    block: String,
    char_limit: Option<usize>,
}

impl HashtagRefiner {
    /// Tags may be given with or without a leading `#`; blanks are ignored.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let block = tags
            .into_iter()
            .filter_map(|tag| {
                let tag = tag.as_ref().trim().trim_start_matches('#');
                (!tag.is_empty()).then(|| format!("#{tag}"))
            })
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            block,
            char_limit: None,
        }
    }

    /// Keep every refined post within `limit` characters.
    #[must_use]
    pub fn with_char_limit(mut self, limit: usize) -> Self {
        self.char_limit = Some(limit);
        self
    }

    /// The rendered `#a #b` block; empty when no tags were given.
    pub fn block(&self) -> &str {
        &self.block
    }

    fn apply(&self, text: &str) -> String {
        if self.block.is_empty() || text.ends_with(&self.block) {
            return text.to_string();
        }
        let Some(limit) = self.char_limit else {
            return format!("{text}\n\n{}", self.block);
        };

        // Separator plus block.
        let suffix = self.block.chars().count() + 2;
        if suffix >= limit {
            tracing::debug!(limit, block = %self.block, "Hashtag block does not fit, leaving it off");
            return truncate(text, limit);
        }
        format!("{}\n\n{}", truncate(text, limit - suffix), self.block)
    }
}

#[async_trait]
impl Refiner for HashtagRefiner {
    fn name(&self) -> &str {
        "hashtags"
    }

    async fn refine(&self, candidates: Vec<PostCandidate>) -> Result<Vec<PostCandidate>, WriterError> {
        Ok(candidates
            .into_iter()
            .map(|candidate| {
                let text = self.apply(candidate.text());
                candidate.with_text(text)
            })
            .collect())
    }
}

/// Verify a refiner kept every candidate, by id and in order.
pub fn check_identity(before: &[String], after: &[PostCandidate]) -> Result<(), WriterError> {
    if before.len() != after.len() {
        return Err(WriterError::Contract {
            reason: format!("expected {} candidates, got {}", before.len(), after.len()),
        });
    }

    if let Some((position, (expected, got))) = before
        .iter()
        .zip(after)
        .enumerate()
        .find(|(_, (expected, got))| expected.as_str() != got.id())
    {
        return Err(WriterError::Contract {
            reason: format!(
                "candidate {} changed id from '{}' to '{}'",
                position + 1,
                expected,
                got.id()
            ),
        });
    }

    Ok(())
}
