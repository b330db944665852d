//! Embedder Port - Interface for text embedding models.

use async_trait::async_trait;

/// Port for turning text into fixed-dimension vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Dimensionality of vectors produced by this embedder.
    fn dimensions(&self) -> usize;
}

/// Embedding errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    /// Embedding service unreachable.
    #[error("embedding service unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Model not found or not loaded.
    #[error("embedding model '{model}' not available")]
    ModelNotAvailable {
        /// Model name.
        model: String,
    },

    /// Malformed service response.
    #[error("embedding response error: {0}")]
    InvalidResponse(String),
}

impl EmbeddingError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
