//! Ollama embedder - text embeddings via Ollama's batch embed API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{Embedder, EmbeddingError};

/// Configuration for the Ollama embedder.
#[derive(Debug, Clone)]
pub struct OllamaEmbedderConfig {
    /// Ollama host serving the embedding model.
    pub host: String,
    /// Embedding model name.
    pub model: String,
    /// Expected vector dimensionality.
    pub dimensions: usize,
    /// Request timeout.
    pub timeout: Duration,
}

impl OllamaEmbedderConfig {
    /// Creates a configuration for the given host and model.
    pub fn new(host: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            host: host.into(),
            model: model.into(),
            dimensions,
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Embedder backed by a local Ollama instance.
pub struct OllamaEmbedder {
    config: OllamaEmbedderConfig,
    client: Client,
}

impl OllamaEmbedder {
    /// Creates a new Ollama embedder.
    pub fn new(config: OllamaEmbedderConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.config.host.trim_end_matches('/'))
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(self.embed_url())
            .json(&EmbedRequest {
                model: self.config.model.clone(),
                input: texts.to_vec(),
            })
            .send()
            .await
            .map_err(|e| EmbeddingError::unavailable(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(EmbeddingError::ModelNotAvailable {
                model: self.config.model.clone(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::unavailable(format!(
                "embed returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} vectors, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        if let Some(vector) = parsed
            .embeddings
            .iter()
            .find(|v| v.len() != self.config.dimensions)
        {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {}-dimensional vectors, got {}",
                self.config.dimensions,
                vector.len()
            )));
        }

        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_url_strips_trailing_slash() {
        let embedder = OllamaEmbedder::new(OllamaEmbedderConfig::new(
            "http://localhost:11434/",
            "embeddinggemma",
            768,
        ));
        assert_eq!(embedder.embed_url(), "http://localhost:11434/api/embed");
    }

    #[test]
    fn response_parses_batch() {
        let raw = r#"{"model":"embeddinggemma","embeddings":[[0.1,0.2],[0.3,0.4]]}"#;
        let parsed: EmbedResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.embeddings.len(), 2);
    }
}
