//! Vector Index Port - Interface for similarity search backends.
//!
//! Abstracts the vector store (Qdrant or in-process memory) behind a small
//! surface: upsert points into a named collection, query by vector, and a
//! health check used for startup backend selection.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Named collection identifiers used by the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Worked question/answer examples.
    Examples,
    /// Schema and ontology descriptions.
    Schema,
}

impl Collection {
    /// Backend collection name.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Examples => "examples",
            Collection::Schema => "schema",
        }
    }

    /// All collections, in a stable order.
    pub fn all() -> [Collection; 2] {
        [Collection::Examples, Collection::Schema]
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Document payload stored alongside each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPayload {
    /// The embedded text.
    pub text: String,
    /// Free-form metadata (e.g. "answer" for worked examples).
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl DocumentPayload {
    /// Creates a payload with no metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Adds a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// A vector plus payload, ready for insertion.
#[derive(Debug, Clone)]
pub struct VectorPoint {
    /// Stable point identifier.
    pub id: String,
    /// Embedding vector.
    pub vector: Vec<f32>,
    /// Stored document payload.
    pub payload: DocumentPayload,
}

/// A query result with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    /// Point identifier.
    pub id: String,
    /// Cosine similarity score (higher is better).
    pub score: f32,
    /// Stored document payload.
    pub payload: DocumentPayload,
}

/// Port for vector similarity search backends.
///
/// Implementations must return query results ordered by descending score;
/// the knowledge base additionally enforces a deterministic tie-break on id.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace points in a collection, creating it when absent.
    async fn upsert(&self, collection: Collection, points: &[VectorPoint])
        -> Result<(), IndexError>;

    /// Find the `top_k` nearest points to `vector`, best score first.
    async fn query(
        &self,
        collection: Collection,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError>;

    /// Check whether the backend is reachable and ready.
    async fn health_check(&self) -> Result<(), IndexError>;

    /// Backend name for logging ("qdrant" or "memory").
    fn backend_name(&self) -> &'static str;
}

/// Vector index errors.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Backend unreachable or not ready.
    #[error("index unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Collection does not exist and could not be created.
    #[error("collection '{collection}' missing")]
    CollectionMissing {
        /// Collection name.
        collection: String,
    },

    /// Vector dimensionality does not match the collection.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Collection dimensionality.
        expected: usize,
        /// Query/point dimensionality.
        actual: usize,
    },

    /// Malformed backend response.
    #[error("backend response error: {0}")]
    BackendResponse(String),
}

impl IndexError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_names_are_stable() {
        assert_eq!(Collection::Examples.name(), "examples");
        assert_eq!(Collection::Schema.name(), "schema");
        assert_eq!(Collection::all().len(), 2);
    }

    #[test]
    fn payload_metadata_builder() {
        let payload = DocumentPayload::new("Which decisions mention X?")
            .with_metadata("answer", serde_json::json!("SELECT ..."));

        assert_eq!(payload.metadata.len(), 1);
        assert!(payload.metadata.contains_key("answer"));
    }

    #[test]
    fn index_error_display() {
        let err = IndexError::DimensionMismatch {
            expected: 768,
            actual: 384,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 768, got 384");
    }
}
