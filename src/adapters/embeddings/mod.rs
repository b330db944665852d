//! Embedding adapters.

mod ollama;

pub use ollama::{OllamaEmbedder, OllamaEmbedderConfig};
