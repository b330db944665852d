//! Knowledge base and vector index configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Knowledge base configuration
#[derive(Debug, Clone, Deserialize)]
pub struct KnowledgeConfig {
    /// Preferred vector index backend
    #[serde(default)]
    pub backend: IndexBackend,

    /// Qdrant base URL (REST API)
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,

    /// Startup health-check timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Ollama host serving the embedding model
    #[serde(default = "default_ollama_host")]
    pub embedding_host: String,

    /// Embedding model name
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding vector dimensionality
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// Default number of documents retrieved per search
    #[serde(default = "default_top_k")]
    pub retrieved_docs: usize,

    /// Directory holding seed documents (worked examples + schema descriptions)
    pub seed_dir: Option<String>,
}

/// Vector index backend preference
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// Remote Qdrant index, with startup fallback to memory when unreachable
    #[default]
    Qdrant,
    /// In-process index only (no remote dependency)
    Memory,
}

impl KnowledgeConfig {
    /// Get the startup connection timeout as Duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validate knowledge configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == IndexBackend::Qdrant
            && !self.qdrant_url.starts_with("http://")
            && !self.qdrant_url.starts_with("https://")
        {
            return Err(ValidationError::InvalidQdrantUrl);
        }
        if self.embedding_dimensions == 0 {
            return Err(ValidationError::InvalidEmbeddingDimensions);
        }
        Ok(())
    }
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            backend: IndexBackend::default(),
            qdrant_url: default_qdrant_url(),
            connect_timeout_secs: default_connect_timeout(),
            embedding_host: default_ollama_host(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            retrieved_docs: default_top_k(),
            seed_dir: None,
        }
    }
}

fn default_qdrant_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    "embeddinggemma".to_string()
}

fn default_embedding_dimensions() -> usize {
    768
}

fn default_top_k() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knowledge_config_defaults() {
        let config = KnowledgeConfig::default();
        assert_eq!(config.backend, IndexBackend::Qdrant);
        assert_eq!(config.embedding_dimensions, 768);
        assert_eq!(config.retrieved_docs, 3);
    }

    #[test]
    fn test_validation_bad_qdrant_url() {
        let config = KnowledgeConfig {
            qdrant_url: "localhost:6333".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_memory_backend_ignores_url() {
        let config = KnowledgeConfig {
            backend: IndexBackend::Memory,
            qdrant_url: "not-a-url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_dimensions() {
        let config = KnowledgeConfig {
            embedding_dimensions: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
