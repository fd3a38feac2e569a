//! Ranker - scores candidates with a second model call and sorts them.

use std::cmp::Ordering;
use std::sync::Arc;

use llm::{GenerateOptions, Message, Provider};

use crate::candidate::PostCandidate;
use crate::errors::WriterError;
use crate::prompts::{PromptManager, RankEntry, RankPrompt, RANK};

/// Label that starts every ranking line.
const RANK_LABEL: &str = "TWEET";

/// One parsed `TWEET <i>: SCORE <v> - <reason>` line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreLine {
    /// Zero-based candidate position.
    pub position: usize,
    pub score: f64,
    pub reason: String,
}

/// Scores and orders candidates.
pub struct Ranker {
    provider: Arc<dyn Provider>,
    prompts: Arc<PromptManager>,
}

impl Ranker {
    pub fn new(provider: Arc<dyn Provider>, prompts: Arc<PromptManager>) -> Self {
        Self { provider, prompts }
    }

    /// Score every candidate the model answers for, then sort descending.
    ///
    /// Only a failed provider call is an error; malformed answer lines are
    /// skipped and leave their candidate unscored.
    pub async fn rank(
        &self,
        mut candidates: Vec<PostCandidate>,
    ) -> Result<Vec<PostCandidate>, WriterError> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let data = RankPrompt {
            posts: candidates
                .iter()
                .enumerate()
                .map(|(i, c)| RankEntry {
                    index: i + 1,
                    text: c.text(),
                })
                .collect(),
        };
        let prompt = self
            .prompts
            .render(RANK, &data)
            .map_err(|e| WriterError::Prompt {
                template: RANK,
                reason: e.to_string(),
            })?;

        let messages = vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)];
        let options = GenerateOptions {
            temperature: Some(0.2),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, &options)
            .await
            .map_err(|source| WriterError::Provider {
                stage: "rank",
                source,
            })?;

        let lines = parse_scores(&response, candidates.len());
        tracing::debug!(
            scored = lines.len(),
            candidates = candidates.len(),
            "Parsed ranking"
        );
        for line in lines {
            candidates[line.position].set_ranking(line.score, line.reason);
        }

        sort_by_score(&mut candidates);
        Ok(candidates)
    }
}

/// Parse ranking lines, skipping anything that does not fit.
///
/// Each line is split on its first `:` into an index part (`TWEET <i>`) and
/// a remainder, then the remainder on its first `-` into a score part
/// (`SCORE <v>`) and the reason. A later line for the same index overwrites
/// an earlier one.
pub fn parse_scores(text: &str, count: usize) -> Vec<ScoreLine> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = parse_score_line(line, count);
            if parsed.is_none() {
                tracing::debug!(line, "Skipping malformed ranking line");
            }
            parsed
        })
        .collect()
}

fn parse_score_line(line: &str, count: usize) -> Option<ScoreLine> {
    let (head, rest) = line.split_once(':')?;
    let mut tokens = head.split_whitespace();
    if !tokens
        .next()?
        .trim_matches('*')
        .eq_ignore_ascii_case(RANK_LABEL)
    {
        return None;
    }
    let index: usize = tokens.next()?.trim_matches('*').parse().ok()?;
    if index == 0 || index > count {
        return None;
    }

    let (score_part, reason) = rest.split_once('-')?;
    let score: f64 = score_part.split_whitespace().last()?.parse().ok()?;
    if !score.is_finite() {
        return None;
    }

    Some(ScoreLine {
        position: index - 1,
        score,
        reason: reason.trim().to_string(),
    })
}

/// Stable sort, highest score first; unscored counts as 0.
pub fn sort_by_score(candidates: &mut [PostCandidate]) {
    candidates.sort_by(|a, b| {
        b.sort_score()
            .partial_cmp(&a.sort_score())
            .unwrap_or(Ordering::Equal)
    });
}

const SYSTEM_PROMPT: &str = "You are a social media editor. Judge each post on clarity, \
accuracy and how likely it is to get engagement. Answer only in the requested format.";

#[cfg(test)]
mod tests {
    use super::*;
    use llm::{ProviderError, ScriptedProvider};

    fn batch(texts: &[&str]) -> Vec<PostCandidate> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| PostCandidate::with_id(format!("t{}", i + 1), *t))
            .collect()
    }

    fn ids(candidates: &[PostCandidate]) -> Vec<&str> {
        candidates.iter().map(PostCandidate::id).collect()
    }

    #[test]
    fn test_parse_well_formed_lines() {
        let text = "TWEET 1: SCORE 0.9 - Punchy and clear\n**Tweet 2**: SCORE 0.4 - Too long";
        let lines = parse_scores(text, 2);
        assert_eq!(
            lines,
            vec![
                ScoreLine {
                    position: 0,
                    score: 0.9,
                    reason: "Punchy and clear".to_string()
                },
                ScoreLine {
                    position: 1,
                    score: 0.4,
                    reason: "Too long".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let text = "Here are my scores:\n\
                    TWEET 3: SCORE 0.8 - out of range\n\
                    TWEET 0: SCORE 0.8 - zero index\n\
                    TWEET 1: SCORE high - not a number\n\
                    TWEET 1 SCORE 0.5 - no colon\n\
                    POST 1: SCORE 0.5 - wrong label\n\
                    TWEET 2: SCORE 0.5 no hyphen\n\
                    TWEET 2: SCORE NaN - not finite\n\
                    TWEET 2: SCORE 0.7 - keeps well-formed reasons";
        let lines = parse_scores(text, 2);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].position, 1);
        assert_eq!(lines[0].reason, "keeps well-formed reasons");
    }

    #[test]
    fn test_sort_is_stable_with_unscored_as_zero() {
        let mut candidates = batch(&["a", "b", "c", "d"]);
        candidates[1].set_ranking(0.5, "mid");
        candidates[2].set_ranking(0.5, "mid too");
        candidates[3].set_ranking(0.0, "zero");
        sort_by_score(&mut candidates);
        assert_eq!(ids(&candidates), vec!["t2", "t3", "t1", "t4"]);
    }

    #[tokio::test]
    async fn test_rank_assigns_and_sorts() {
        let provider = Arc::new(ScriptedProvider::new([
            "TWEET 1: SCORE 0.4 - fine\nTWEET 2: SCORE 0.9 - great",
        ]));
        let ranker = Ranker::new(provider.clone(), Arc::new(PromptManager::default()));

        let ranked = ranker.rank(batch(&["x", "y", "z"])).await.unwrap();

        assert_eq!(ids(&ranked), vec!["t2", "t1", "t3"]);
        assert_eq!(ranked[0].score(), Some(0.9));
        assert_eq!(ranked[0].reason(), Some("great"));
        assert!(ranked[2].ranking().is_none());
        assert!(provider.prompts()[0].contains("TWEET 3: z"));
    }

    #[tokio::test]
    async fn test_rank_garbage_keeps_order() {
        let provider = Arc::new(ScriptedProvider::new(["I like them all!"]));
        let ranker = Ranker::new(provider, Arc::new(PromptManager::default()));
        let ranked = ranker.rank(batch(&["x", "y"])).await.unwrap();
        assert_eq!(ids(&ranked), vec!["t1", "t2"]);
    }

    #[tokio::test]
    async fn test_rank_empty_skips_provider() {
        let provider = Arc::new(ScriptedProvider::new(Vec::<String>::new()));
        let ranker = Ranker::new(provider.clone(), Arc::new(PromptManager::default()));
        assert!(ranker.rank(Vec::new()).await.unwrap().is_empty());
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_rank_provider_failure() {
        let provider = Arc::new(ScriptedProvider::new(Vec::<String>::new()));
        provider.push_error(ProviderError::InvalidResponse {
            provider: "scripted".to_string(),
            reason: "empty body".to_string(),
        });
        let ranker = Ranker::new(provider, Arc::new(PromptManager::default()));
        let err = ranker.rank(batch(&["x"])).await.unwrap_err();
        assert!(matches!(err, WriterError::Provider { stage: "rank", .. }));
    }
}
