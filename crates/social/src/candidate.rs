//! Post candidate types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Score and justification assigned by the ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Quality score; observed range 0-1 but not clamped.
    pub score: f64,
    /// Short free-text justification.
    pub reason: String,
}

/// One generated post.
///
/// The id is assigned once at draft time and survives refine and rank.
/// Score and reason live together in [`Ranking`], so they are either both
/// present or both absent.
#[derive(Debug, Clone, PartialEq)]
pub struct PostCandidate {
    id: String,
    text: String,
    ranking: Option<Ranking>,
    image_prompt: Option<String>,
}

impl PostCandidate {
    /// Create a candidate with a freshly generated id.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), text)
    }

    /// Create a candidate with a known id (loading, tests).
    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ranking: None,
            image_prompt: None,
        }
    }

    /// Attach an image description captured by the parser.
    #[must_use]
    pub fn with_image_prompt(mut self, image_prompt: Option<String>) -> Self {
        self.image_prompt = image_prompt;
        self
    }

    /// Replace the text, keeping id and ranking. Refiners use this.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image_prompt(&self) -> Option<&str> {
        self.image_prompt.as_deref()
    }

    pub fn ranking(&self) -> Option<&Ranking> {
        self.ranking.as_ref()
    }

    pub fn score(&self) -> Option<f64> {
        self.ranking.as_ref().map(|r| r.score)
    }

    pub fn reason(&self) -> Option<&str> {
        self.ranking.as_ref().map(|r| r.reason.as_str())
    }

    /// Set score and reason together.
    pub fn set_ranking(&mut self, score: f64, reason: impl Into<String>) {
        self.ranking = Some(Ranking {
            score,
            reason: reason.into(),
        });
    }

    /// Score used for ordering; unranked candidates count as 0.
    pub fn sort_score(&self) -> f64 {
        self.score().unwrap_or(0.0)
    }
}

/// On-disk shape of a candidate: one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl From<&PostCandidate> for DraftRecord {
    fn from(candidate: &PostCandidate) -> Self {
        Self {
            id: candidate.id.clone(),
            text: candidate.text.clone(),
            score: candidate.score(),
            reason: candidate.reason().map(str::to_string),
        }
    }
}

impl From<DraftRecord> for PostCandidate {
    fn from(record: DraftRecord) -> Self {
        let mut candidate = PostCandidate::with_id(record.id, record.text);
        // A reason without a score cannot be represented and is dropped.
        if let Some(score) = record.score {
            candidate.set_ranking(score, record.reason.unwrap_or_default());
        }
        candidate
    }
}
