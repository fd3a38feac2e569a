//! Provider Registry - maps provider names to factories.
//!
//! Registration is an explicit call made once at startup. Lookups build a
//! fresh provider instance from [`ProviderSettings`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::errors::{ProviderError, ProviderResult};
use crate::groq::GroqProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;
use crate::provider::{Provider, ProviderSettings};

/// Constructor stored in the registry.
pub type ProviderFactory =
    Arc<dyn Fn(&ProviderSettings) -> ProviderResult<Arc<dyn Provider>> + Send + Sync>;

/// Registry of provider factories keyed by name.
pub struct ProviderRegistry {
    factories: RwLock<HashMap<String, ProviderFactory>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry with the built-in providers registered.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        register_builtin_providers(&registry);
        registry
    }

    /// Register (or replace) a factory under `name`.
    pub fn register<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&ProviderSettings) -> ProviderResult<Arc<dyn Provider>> + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(provider = %name, "Registering LLM provider");
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, Arc::new(factory));
    }

    /// Build a provider by name.
    pub fn create(
        &self,
        name: &str,
        settings: &ProviderSettings,
    ) -> ProviderResult<Arc<dyn Provider>> {
        let factory = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();

        match factory {
            Some(factory) => factory(settings),
            None => Err(ProviderError::UnknownProvider {
                name: name.to_string(),
                available: self.names(),
            }),
        }
    }

    /// Check if a provider is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// All registered provider names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Register the providers shipped with this crate.
pub fn register_builtin_providers(registry: &ProviderRegistry) {
    registry.register(crate::openai::NAME, |settings| {
        Ok(Arc::new(OpenAiProvider::from_settings(settings)?) as Arc<dyn Provider>)
    });
    registry.register(crate::groq::NAME, |settings| {
        Ok(Arc::new(GroqProvider::from_settings(settings)?) as Arc<dyn Provider>)
    });
    registry.register(crate::ollama::NAME, |settings| {
        Ok(Arc::new(OllamaProvider::from_settings(settings)?) as Arc<dyn Provider>)
    });
}

/// Global provider registry instance.
static GLOBAL_REGISTRY: OnceLock<ProviderRegistry> = OnceLock::new();

/// Get the process-wide registry, built with the defaults on first use.
pub fn global_registry() -> &'static ProviderRegistry {
    GLOBAL_REGISTRY.get_or_init(ProviderRegistry::with_defaults)
}
