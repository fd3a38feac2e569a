//! Output parser - turns free-form model text into post candidates.
//!
//! Backends do not reliably honor "respond with JSON only", so extraction is
//! an ordered list of strategies. Each strategy either matches and returns
//! posts or reports [`Extraction::NoMatch`]; the first strategy whose posts
//! survive post-processing wins.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::errors::ParseError;

/// Platform maximum post length, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 280;

/// Appended to posts cut down to the maximum length.
pub const TRUNCATION_MARKER: char = '…';

/// Quote characters stripped from both ends of a post.
const QUOTE_CHARS: &[char] = &['"', '\u{201c}', '\u{201d}'];

/// One post extracted from model output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedPost {
    /// Post body.
    pub text: String,
    /// Optional image description supplied alongside the post.
    pub image_prompt: Option<String>,
    /// Any other fields of a structured record, preserved untouched.
    pub extra: Map<String, Value>,
}

impl ParsedPost {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Outcome of a single strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// The strategy recognized its format.
    Matched(Vec<ParsedPost>),
    /// The text is not in this strategy's format.
    NoMatch,
}

/// One way of reading posts out of model output.
pub trait ExtractStrategy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Try to extract posts, in document order.
    fn extract(&self, raw: &str) -> Extraction;
}

/// A JSON array of `{"text": ...}` objects, optionally inside a code fence.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonListStrategy;

impl ExtractStrategy for JsonListStrategy {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extract(&self, raw: &str) -> Extraction {
        let payload = strip_code_fence(raw);
        let Ok(Value::Array(items)) = serde_json::from_str::<Value>(payload) else {
            return Extraction::NoMatch;
        };

        let posts: Vec<ParsedPost> = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(mut fields) => {
                    let Some(Value::String(text)) = fields.remove("text") else {
                        tracing::debug!("Skipping JSON item without a text field");
                        return None;
                    };
                    let image_prompt = match fields.remove("image_prompt") {
                        Some(Value::String(s)) => Some(s),
                        Some(other) => {
                            fields.insert("image_prompt".to_string(), other);
                            None
                        }
                        None => None,
                    };
                    Some(ParsedPost {
                        text,
                        image_prompt,
                        extra: fields,
                    })
                }
                _ => None,
            })
            .collect();

        if posts.is_empty() {
            Extraction::NoMatch
        } else {
            Extraction::Matched(posts)
        }
    }
}

/// Blocks introduced by a `<label> <index>:` marker, such as `**Tweet 1:**`.
///
/// Auxiliary lines (`Image prompt:`, `Alt-text:`) inside a block are captured
/// or dropped but never included in the post text.
#[derive(Debug, Clone)]
pub struct MarkerBlockStrategy {
    marker: Regex,
}

impl MarkerBlockStrategy {
    /// Recognize markers for the given labels only (case-insensitive).
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives = labels
            .into_iter()
            .map(|l| regex::escape(l.as_ref()))
            .collect::<Vec<_>>()
            .join("|");
        Self::with_label_pattern(&alternatives)
    }

    /// Recognize any single-word label: `Tweet 1:`, `Draft 2:`, `Option 3:`.
    pub fn any_label() -> Self {
        Self::with_label_pattern(r"\p{L}[\p{L}-]*")
    }

    fn with_label_pattern(label: &str) -> Self {
        let pattern = format!(
            r"(?im)^[ \t]*[#>*_-]*[ \t]*(?:{label})[ \t]+\d+[ \t]*(?:\*\*|__)?[ \t]*:[ \t]*(?:\*\*|__)?"
        );
        Self {
            marker: Regex::new(&pattern).expect("Invalid marker pattern"),
        }
    }

    fn parse_block(block: &str) -> ParsedPost {
        let mut body = Vec::new();
        let mut image_prompt = None;
        let mut in_aux = false;

        for line in block.lines() {
            if let Some(caps) = aux_line_regex().captures(line) {
                in_aux = true;
                if image_prompt.is_none() && caps["kind"].to_lowercase().starts_with("image") {
                    let value = caps["value"].trim().trim_end_matches(['*', '_']).trim();
                    if !value.is_empty() {
                        image_prompt = Some(value.to_string());
                    }
                }
                continue;
            }
            if !in_aux {
                body.push(line);
            }
        }

        ParsedPost {
            text: body.join("\n").trim().to_string(),
            image_prompt,
            extra: Map::new(),
        }
    }
}

impl Default for MarkerBlockStrategy {
    fn default() -> Self {
        Self::any_label()
    }
}

impl ExtractStrategy for MarkerBlockStrategy {
    fn name(&self) -> &'static str {
        "marker-blocks"
    }

    fn extract(&self, raw: &str) -> Extraction {
        let markers: Vec<_> = self.marker.find_iter(raw).collect();
        if markers.is_empty() {
            return Extraction::NoMatch;
        }

        let posts = markers
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let end = markers.get(i + 1).map_or(raw.len(), regex::Match::start);
                Self::parse_block(&raw[m.end()..end])
            })
            .collect();

        Extraction::Matched(posts)
    }
}

/// Single lines starting with a fixed prefix such as `TWEET:`.
#[derive(Debug, Clone)]
pub struct PrefixedLineStrategy {
    prefix: String,
}

impl PrefixedLineStrategy {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl ExtractStrategy for PrefixedLineStrategy {
    fn name(&self) -> &'static str {
        "prefixed-lines"
    }

    fn extract(&self, raw: &str) -> Extraction {
        let posts: Vec<ParsedPost> = raw
            .lines()
            .filter_map(|line| line.trim().strip_prefix(self.prefix.as_str()))
            .map(|rest| ParsedPost::new(rest.trim()))
            .collect();

        if posts.is_empty() {
            Extraction::NoMatch
        } else {
            Extraction::Matched(posts)
        }
    }
}

/// Ordered set of strategies plus the uniform post-processing.
pub struct OutputParser {
    strategies: Vec<Box<dyn ExtractStrategy>>,
    max_length: usize,
}

impl OutputParser {
    /// Structured JSON first, then `<label> N:` blocks.
    pub fn new(max_length: usize) -> Self {
        Self::with_strategies(
            vec![
                Box::new(JsonListStrategy),
                Box::new(MarkerBlockStrategy::default()),
            ],
            max_length,
        )
    }

    /// Use a custom strategy order.
    pub fn with_strategies(strategies: Vec<Box<dyn ExtractStrategy>>, max_length: usize) -> Self {
        Self {
            strategies,
            max_length,
        }
    }

    /// Extract up to `n` posts from `raw`.
    ///
    /// Fails when no strategy yields a non-empty post; never returns an
    /// empty list.
    pub fn parse(&self, raw: &str, n: usize) -> Result<Vec<ParsedPost>, ParseError> {
        for strategy in &self.strategies {
            match strategy.extract(raw) {
                Extraction::Matched(posts) => {
                    let found = posts.len();
                    let posts = self.finish(posts, n);
                    if posts.is_empty() {
                        tracing::debug!(
                            strategy = strategy.name(),
                            found,
                            "Strategy matched but no usable posts remained"
                        );
                        continue;
                    }
                    tracing::debug!(strategy = strategy.name(), count = posts.len(), "Parsed posts");
                    return Ok(posts);
                }
                Extraction::NoMatch => {
                    tracing::debug!(strategy = strategy.name(), "No match");
                }
            }
        }

        Err(ParseError::new(format!(
            "no strategy matched ({} chars of output)",
            raw.chars().count()
        )))
    }

    /// Clean, drop empties, truncate and cap, preserving order.
    pub fn finish(&self, posts: Vec<ParsedPost>, n: usize) -> Vec<ParsedPost> {
        posts
            .into_iter()
            .filter_map(|mut post| {
                let cleaned = clean_text(&post.text);
                if cleaned.is_empty() {
                    return None;
                }
                post.text = truncate(&cleaned, self.max_length);
                Some(post)
            })
            .take(n)
            .collect()
    }
}

impl Default for OutputParser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH)
    }
}

/// Trim whitespace and enclosing quotation marks.
pub fn clean_text(text: &str) -> String {
    text.trim().trim_matches(QUOTE_CHARS).trim().to_string()
}

/// Cut `text` to `max_length` characters, ending with the truncation marker.
pub fn truncate(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_length.saturating_sub(1)).collect();
    truncated.push(TRUNCATION_MARKER);
    truncated
}

/// Remove ``` fences (optionally tagged, e.g. ```json) around a block.
///
/// The opening and closing fences are stripped independently, so output cut
/// off before its closing fence still parses.
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text;
    if let Some(m) = opening_fence_regex().find(body) {
        body = &body[m.end()..];
    }
    if let Some(m) = closing_fence_regex().find(body) {
        body = &body[..m.start()];
    }
    body.trim()
}

fn opening_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*```[A-Za-z0-9_+-]*[ \t]*").expect("Invalid opening fence pattern")
    })
}

fn closing_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*```\s*$").expect("Invalid closing fence pattern"))
}

fn aux_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^[ \t]*[*_>-]*[ \t]*(?P<kind>image[ \t-]*prompt|alt[ \t-]*text)[ \t]*(?:\*\*|__)?[ \t]*:[ \t]*(?P<value>.*)$",
        )
        .expect("Invalid auxiliary line pattern")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(posts: &[ParsedPost]) -> Vec<&str> {
        posts.iter().map(|p| p.text.as_str()).collect()
    }

    #[test]
    fn test_json_list_in_order() {
        let parser = OutputParser::default();
        let raw = r#"[{"text": "first"}, {"text": "second"}, {"text": "third"}]"#;
        let posts = parser.parse(raw, 3).unwrap();
        assert_eq!(texts(&posts), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_json_in_tagged_fence() {
        let parser = OutputParser::default();
        let raw = "```json\n[\n  {\"text\": \"fenced\"}\n]\n```";
        let posts = parser.parse(raw, 5).unwrap();
        assert_eq!(texts(&posts), vec!["fenced"]);
    }

    #[test]
    fn test_json_extra_fields_preserved() {
        let parser = OutputParser::default();
        let raw = r#"[{"text": "a", "image_prompt": "sunset", "tone": "quirky"}]"#;
        let posts = parser.parse(raw, 1).unwrap();
        assert_eq!(posts[0].image_prompt.as_deref(), Some("sunset"));
        assert_eq!(posts[0].extra.get("tone"), Some(&Value::from("quirky")));
    }

    #[test]
    fn test_cleanup_drop_truncate_and_cap() {
        let parser = OutputParser::new(10);
        let raw = r#"[
            {"text": "  \"quoted\"  "},
            {"text": "   "},
            {"text": "“abcdefghijklmnop”"},
            {"text": "fourth"}
        ]"#;
        let posts = parser.parse(raw, 2).unwrap();
        assert_eq!(texts(&posts), vec!["quoted", "abcdefghi…"]);
        assert_eq!(posts[1].text.chars().count(), 10);
    }

    #[test]
    fn test_json_object_is_not_a_list() {
        assert_eq!(
            JsonListStrategy.extract(r#"{"text": "single"}"#),
            Extraction::NoMatch
        );
    }

    #[test]
    fn test_marker_blocks_fallback() {
        let parser = OutputParser::default();
        let raw = "Here are your tweets:\n\n\
                   **Tweet 1:** The match is live!\nSecond line.\n\
                   *Image prompt: a stadium at dusk*\n\n\
                   **Tweet 2:** Halftime stats are in.\n\
                   *Alt-text: a scoreboard*\n";
        let posts = parser.parse(raw, 5).unwrap();
        assert_eq!(
            texts(&posts),
            vec!["The match is live!\nSecond line.", "Halftime stats are in."]
        );
        assert_eq!(posts[0].image_prompt.as_deref(), Some("a stadium at dusk"));
        assert_eq!(posts[1].image_prompt, None);
    }

    #[test]
    fn test_plain_marker_lines() {
        let parser = OutputParser::default();
        let raw = "Tweet 1: alpha\nTweet 2: \"beta\"\nTweet 3: gamma";
        let posts = parser.parse(raw, 2).unwrap();
        assert_eq!(texts(&posts), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_any_single_word_label() {
        let parser = OutputParser::default();
        let posts = parser.parse("Draft 1: alpha\nDraft 2: beta", 5).unwrap();
        assert_eq!(texts(&posts), vec!["alpha", "beta"]);

        let posts = parser.parse("### Option 1:\nfirst\n### Option 2:\nsecond", 5).unwrap();
        assert_eq!(texts(&posts), vec!["first", "second"]);
    }

    #[test]
    fn test_fixed_labels_ignore_others() {
        let strategy = MarkerBlockStrategy::new(["tweet"]);
        assert!(matches!(
            strategy.extract("Draft 1: alpha\nDraft 2: beta"),
            Extraction::NoMatch
        ));
        assert!(matches!(
            strategy.extract("TWEET 1: alpha"),
            Extraction::Matched(ref posts) if posts.len() == 1
        ));
    }

    #[test]
    fn test_invalid_json_falls_through_to_markers() {
        let parser = OutputParser::default();
        let raw = "[{\"text\": \"broken\"\nTweet 1: recovered";
        let posts = parser.parse(raw, 3).unwrap();
        assert_eq!(texts(&posts), vec!["recovered"]);
    }

    #[test]
    fn test_nothing_extractable_fails() {
        let parser = OutputParser::default();
        assert!(parser.parse("I cannot help with that.", 3).is_err());
        assert!(parser.parse("", 3).is_err());
        assert!(parser.parse(r#"[{"text": "  "}]"#, 3).is_err());
        assert!(parser.parse("[]", 3).is_err());
    }

    #[test]
    fn test_prefixed_lines() {
        let strategy = PrefixedLineStrategy::new("TWEET:");
        let raw = "Sure!\nTWEET: one #tag\n  TWEET:two\nnot a tweet";
        match strategy.extract(raw) {
            Extraction::Matched(posts) => assert_eq!(texts(&posts), vec!["one #tag", "two"]),
            Extraction::NoMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("héllo wörld", 6), "héllo…");
        assert_eq!(truncate("short", 280), "short");
    }

    #[test]
    fn test_strip_code_fence_passthrough() {
        assert_eq!(strip_code_fence("  [1, 2] "), "[1, 2]");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
    }

    #[test]
    fn test_unbalanced_fences_are_stripped() {
        let opening_only = "```json\n[{\"text\": \"a\"}]";
        let closing_only = "[{\"text\": \"a\"}]\n```";
        assert_eq!(strip_code_fence(opening_only), r#"[{"text": "a"}]"#);
        assert_eq!(strip_code_fence(closing_only), r#"[{"text": "a"}]"#);

        let parser = OutputParser::default();
        assert_eq!(texts(&parser.parse(opening_only, 3).unwrap()), vec!["a"]);
        assert_eq!(texts(&parser.parse(closing_only, 3).unwrap()), vec!["a"]);
    }
}
