//! Prompt template management.

use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;
use std::path::Path;

/// Template names, also the file stems looked up by [`PromptManager::from_dir`].
pub const COLLECT: &str = "collect";
pub const DRAFT: &str = "draft";
pub const RANK: &str = "rank";

/// Manages Handlebars prompt templates.
pub struct PromptManager {
    handlebars: Handlebars<'static>,
}

impl PromptManager {
    /// Create a new prompt manager with embedded templates.
    pub fn new() -> Result<Self, TemplateError> {
        let mut handlebars = Self::engine();

        handlebars.register_template_string(COLLECT, COLLECT_TEMPLATE)?;
        handlebars.register_template_string(DRAFT, DRAFT_TEMPLATE)?;
        handlebars.register_template_string(RANK, RANK_TEMPLATE)?;

        Ok(Self { handlebars })
    }

    /// Embedded templates, overridden by any `<name>.hbs` found in `dir`.
    pub fn from_dir(dir: &Path) -> Result<Self, TemplateError> {
        let mut manager = Self::new()?;

        for name in [COLLECT, DRAFT, RANK] {
            let path = dir.join(format!("{name}.hbs"));
            if path.exists() {
                manager.handlebars.register_template_file(name, &path)?;
                tracing::debug!(template = name, path = %path.display(), "Loaded prompt override");
            }
        }

        Ok(manager)
    }

    /// Render a template with the given data.
    pub fn render<T: Serialize>(&self, template: &str, data: &T) -> Result<String, RenderError> {
        self.handlebars.render(template, data)
    }

    fn engine() -> Handlebars<'static> {
        let mut handlebars = Handlebars::new();
        // Prompts are plain text; HTML escaping would mangle quotes and ampersands.
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);
        handlebars
    }
}

impl Default for PromptManager {
    fn default() -> Self {
        Self::new().expect("Failed to create default PromptManager")
    }
}

/// Data for the collect template.
#[derive(Debug, Serialize)]
pub struct CollectPrompt<'a> {
    pub topic: &'a str,
    pub hours: u32,
}

/// Data for the draft template.
#[derive(Debug, Serialize)]
pub struct DraftPrompt<'a> {
    pub facts: &'a [String],
    pub count: usize,
    pub char_limit: usize,
    pub prefix: &'a str,
}

/// One numbered entry of the rank template.
#[derive(Debug, Serialize)]
pub struct RankEntry<'a> {
    pub index: usize,
    pub text: &'a str,
}

/// Data for the rank template.
#[derive(Debug, Serialize)]
pub struct RankPrompt<'a> {
    pub posts: Vec<RankEntry<'a>>,
}

const COLLECT_TEMPLATE: &str = r"What are the most important new developments about {{topic}} from the last {{hours}} hours?

Reply with exactly 5 bullet points of key facts. Start every bullet with '- ' and put each on its own line.
Do not add an introduction or a conclusion.";

const DRAFT_TEMPLATE: &str = r"Write {{count}} distinct social media posts based on these facts:
{{#each facts}}
- {{this}}
{{/each}}

Rules:
- Each post must be at most {{char_limit}} characters.
- Write exactly {{count}} posts, each on its own line, starting with '{{prefix}} '.
- No numbering and no commentary outside the posts.";

const RANK_TEMPLATE: &str = r"Rate each of the following posts for engagement potential on a scale from 0 to 1.

{{#each posts}}
TWEET {{index}}: {{text}}
{{/each}}

Reply with one line per post in exactly this format:
TWEET <number>: SCORE <score> - <one sentence reason>";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_prompt() {
        let prompts = PromptManager::default();
        let text = prompts
            .render(
                COLLECT,
                &CollectPrompt {
                    topic: "Rust & WebAssembly",
                    hours: 12,
                },
            )
            .unwrap();
        assert!(text.contains("Rust & WebAssembly"));
        assert!(text.contains("last 12 hours"));
    }

    #[test]
    fn test_draft_prompt_lists_facts() {
        let prompts = PromptManager::default();
        let facts = vec!["Fact \"one\"".to_string(), "Fact two".to_string()];
        let text = prompts
            .render(
                DRAFT,
                &DraftPrompt {
                    facts: &facts,
                    count: 3,
                    char_limit: 280,
                    prefix: "TWEET:",
                },
            )
            .unwrap();
        assert!(text.contains("- Fact \"one\""));
        assert!(text.contains("- Fact two"));
        assert!(text.contains("at most 280 characters"));
        assert!(text.contains("starting with 'TWEET: '"));
    }

    #[test]
    fn test_rank_prompt_is_one_based() {
        let prompts = PromptManager::default();
        let text = prompts
            .render(
                RANK,
                &RankPrompt {
                    posts: vec![
                        RankEntry { index: 1, text: "a" },
                        RankEntry { index: 2, text: "b" },
                    ],
                },
            )
            .unwrap();
        assert!(text.contains("TWEET 1: a"));
        assert!(text.contains("TWEET 2: b"));
    }

    #[test]
    fn test_from_dir_overrides_single_template() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("collect.hbs"), "News on {{topic}}").unwrap();

        let prompts = PromptManager::from_dir(dir.path()).unwrap();
        let text = prompts
            .render(COLLECT, &CollectPrompt { topic: "tea", hours: 1 })
            .unwrap();
        assert_eq!(text, "News on tea");

        let rank = prompts.render(RANK, &RankPrompt { posts: vec![] }).unwrap();
        assert!(rank.contains("SCORE"));
    }
}
