//! Configuration: an optional TOML file plus `SOCIAL_*` environment overrides.
//!
//! ```toml
//! provider = "groq"
//! char_limit = 280
//! hashtags = ["rustlang"]
//!
//! [providers.groq]
//! api_key = "gsk-..."
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use llm::ProviderSettings;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::parser::DEFAULT_MAX_LENGTH;

/// Default backend name.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Default number of posts to draft.
pub const DEFAULT_COUNT: usize = 3;

/// Default look-back window for fact collection.
pub const DEFAULT_HOURS: u32 = 24;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "SOCIAL_";

/// Per-backend credentials and endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Settings for the drafting pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where draft files go; see [`Config::drafts_dir`] for the default.
    pub drafts_dir: Option<PathBuf>,
    /// Backend name looked up in the provider registry.
    pub provider: String,
    /// Model override; each backend has its own default.
    pub model: Option<String>,
    /// Maximum post length in characters.
    pub char_limit: usize,
    /// Posts to draft per run.
    pub count: usize,
    /// Look-back window in hours.
    pub hours: u32,
    /// Tags appended by the hashtag refiner; empty disables it.
    pub hashtags: Vec<String>,
    /// Directory with `<name>.hbs` prompt overrides.
    pub prompts_dir: Option<PathBuf>,
    /// `[providers.<name>]` tables.
    pub providers: HashMap<String, ProviderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            drafts_dir: None,
            provider: DEFAULT_PROVIDER.to_string(),
            model: None,
            char_limit: DEFAULT_MAX_LENGTH,
            count: DEFAULT_COUNT,
            hours: DEFAULT_HOURS,
            hashtags: Vec::new(),
            prompts_dir: None,
            providers: HashMap::new(),
        }
    }
}

impl Config {
    /// Load the default config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match default_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a TOML config file; a missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SOCIAL_*` overrides read through `lookup`.
    ///
    /// # Environment Variables
    /// - `SOCIAL_DRAFTS_DIR`
    /// - `SOCIAL_PROVIDER`
    /// - `SOCIAL_MODEL`
    /// - `SOCIAL_CHAR_LIMIT`
    /// - `SOCIAL_HASHTAGS`: comma-separated
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}")).filter(|v| !v.is_empty());

        if let Some(dir) = var("DRAFTS_DIR") {
            self.drafts_dir = Some(PathBuf::from(dir));
        }
        if let Some(provider) = var("PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = var("MODEL") {
            self.model = Some(model);
        }
        if let Some(limit) = var("CHAR_LIMIT") {
            self.char_limit = parse_number("SOCIAL_CHAR_LIMIT", &limit)?;
        }
        if let Some(tags) = var("HASHTAGS") {
            self.hashtags = tags
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.char_limit == 0 {
            return Err(ConfigError::Invalid {
                key: "char_limit".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.count == 0 {
            return Err(ConfigError::Invalid {
                key: "count".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.provider.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "provider".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Configured drafts directory, else `<data_dir>/social/drafts`, else
    /// `./.social/drafts`.
    pub fn drafts_dir(&self) -> PathBuf {
        self.drafts_dir.clone().unwrap_or_else(|| {
            dirs::data_dir().map_or_else(
                || PathBuf::from(".social").join("drafts"),
                |dir| dir.join("social").join("drafts"),
            )
        })
    }

    /// Settings for building `provider`, with `model` overriding the config.
    ///
    /// The API key comes from `[providers.<name>]` first, then
    /// `<NAME>_API_KEY`.
    pub fn provider_settings(&self, provider: &str, model: Option<&str>) -> ProviderSettings {
        self.provider_settings_with(provider, model, |key| std::env::var(key).ok())
    }

    fn provider_settings_with<F>(
        &self,
        provider: &str,
        model: Option<&str>,
        lookup: F,
    ) -> ProviderSettings
    where
        F: Fn(&str) -> Option<String>,
    {
        let section = self.providers.get(provider).cloned().unwrap_or_default();
        let model = model
            .map(str::to_string)
            .or_else(|| self.model.clone())
            .unwrap_or_default();

        ProviderSettings {
            model,
            api_key: section.api_key.or_else(|| {
                lookup(&format!("{}_API_KEY", provider.to_uppercase())).filter(|k| !k.is_empty())
            }),
            base_url: section.base_url,
        }
    }
}

/// `<config_dir>/social/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("social").join("config.toml"))
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        reason: format!("'{value}' is not a valid number"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.char_limit, 280);
        assert_eq!(config.count, 3);
        assert_eq!(config.hours, 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = Config::from_file(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
provider = "groq"
count = 5
hashtags = ["rustlang"]

[providers.groq]
api_key = "gsk-file"
base_url = "http://localhost:9000"
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.provider, "groq");
        assert_eq!(config.count, 5);
        assert_eq!(config.char_limit, 280);

        let settings = config.provider_settings_with("groq", None, env(&[]));
        assert_eq!(settings.api_key.as_deref(), Some("gsk-file"));
        assert_eq!(settings.base_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(settings.model, "");
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "count = \"many\"").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .with_overrides(env(&[
                ("SOCIAL_PROVIDER", "ollama"),
                ("SOCIAL_MODEL", "mistral"),
                ("SOCIAL_CHAR_LIMIT", "500"),
                ("SOCIAL_HASHTAGS", "rust, async ,,"),
                ("SOCIAL_DRAFTS_DIR", "/tmp/drafts"),
            ]))
            .unwrap();

        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model.as_deref(), Some("mistral"));
        assert_eq!(config.char_limit, 500);
        assert_eq!(config.hashtags, vec!["rust", "async"]);
        assert_eq!(config.drafts_dir(), PathBuf::from("/tmp/drafts"));
    }

    #[test]
    fn test_invalid_numeric_override() {
        let err = Config::default()
            .with_overrides(env(&[("SOCIAL_CHAR_LIMIT", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "SOCIAL_CHAR_LIMIT"));

        let err = Config::default()
            .with_overrides(env(&[("SOCIAL_CHAR_LIMIT", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("char_limit"));
    }

    #[test]
    fn test_api_key_falls_back_to_env() {
        let config = Config {
            model: Some("gpt-4o-mini".to_string()),
            ..Config::default()
        };
        let settings =
            config.provider_settings_with("openai", None, env(&[("OPENAI_API_KEY", "sk-env")]));
        assert_eq!(settings.api_key.as_deref(), Some("sk-env"));
        assert_eq!(settings.model, "gpt-4o-mini");

        let settings = config.provider_settings_with("openai", Some("o1"), env(&[]));
        assert_eq!(settings.model, "o1");
        assert_eq!(settings.api_key, None);
    }
}
