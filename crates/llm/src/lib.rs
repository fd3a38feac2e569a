//! Provider abstraction over interchangeable text-generation backends.
//!
//! This crate provides:
//! - The [`Provider`] trait (`generate` plus a default `chat` adapter)
//! - A [`ProviderRegistry`] mapping provider names to factories
//! - Built-in backends: OpenAI, Groq (OpenAI-compatible) and the local Ollama CLI
//! - A [`ScriptedProvider`] that replays canned responses for tests
//!
//! Registration is explicit: call [`register_builtin_providers`] (or use
//! [`global_registry`]) at startup, then look providers up by name.

pub mod errors;
pub mod groq;
pub mod ollama;
pub mod openai;
pub mod provider;
pub mod registry;
pub mod scripted;

pub use errors::{ProviderError, ProviderResult};
pub use provider::{GenerateOptions, Message, Provider, ProviderSettings, Role};
pub use registry::{global_registry, register_builtin_providers, ProviderFactory, ProviderRegistry};
pub use scripted::ScriptedProvider;
