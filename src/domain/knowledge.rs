//! Knowledge base: embedding-backed document retrieval.
//!
//! Wraps an embedder and a vector index into one retrieval surface. The
//! ordering contract (descending score, ascending id on ties, at most k
//! results) is enforced here so both index backends behave identically from
//! the caller's point of view.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, info};

use crate::ports::{
    Collection, DocumentPayload, Embedder, EmbeddingError, IndexError, ScoredPoint, VectorIndex,
    VectorPoint,
};

/// A document destined for the knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgeDocument {
    /// Stable document id.
    pub id: String,
    /// Target collection.
    pub collection: Collection,
    /// Raw text; this is what gets embedded.
    pub text: String,
    /// Free-form metadata stored alongside the text.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl KnowledgeDocument {
    /// Creates a document with no metadata.
    pub fn new(id: impl Into<String>, collection: Collection, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            collection,
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

/// Knowledge base errors.
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    /// Embedding the query or documents failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// The vector index failed.
    #[error("index failed: {0}")]
    Index(#[from] IndexError),
}

impl KnowledgeError {
    /// True when the failure means the index backend is currently unreachable.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            KnowledgeError::Index(IndexError::Unavailable { .. })
                | KnowledgeError::Embedding(EmbeddingError::Unavailable { .. })
        )
    }
}

/// Embedding-backed retrieval over the document collections.
pub struct KnowledgeBase {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl KnowledgeBase {
    /// Creates a knowledge base over the given embedder and index.
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Name of the active index backend ("qdrant" or "memory").
    pub fn backend_name(&self) -> &'static str {
        self.index.backend_name()
    }

    /// Embeds and upserts a batch of documents into their collections.
    pub async fn add_documents(
        &self,
        documents: Vec<KnowledgeDocument>,
    ) -> Result<(), KnowledgeError> {
        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;

        // Group points per collection so each backend call stays homogeneous.
        for collection in Collection::all() {
            let points: Vec<VectorPoint> = documents
                .iter()
                .zip(vectors.iter())
                .filter(|(doc, _)| doc.collection == collection)
                .map(|(doc, vector)| VectorPoint {
                    id: doc.id.clone(),
                    vector: vector.clone(),
                    payload: DocumentPayload {
                        text: doc.text.clone(),
                        metadata: doc.metadata.clone(),
                    },
                })
                .collect();
            if !points.is_empty() {
                info!(
                    collection = %collection,
                    count = points.len(),
                    "upserting knowledge documents"
                );
                self.index.upsert(collection, &points).await?;
            }
        }
        Ok(())
    }

    /// Retrieves the `top_k` most similar documents for a text query.
    ///
    /// Results are ordered by descending score with ascending id as the
    /// tie-break, regardless of what the backend returned.
    pub async fn search(
        &self,
        collection: Collection,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>, KnowledgeError> {
        let vectors = self.embedder.embed(&[query.to_string()]).await?;
        let vector = vectors.into_iter().next().ok_or_else(|| {
            KnowledgeError::Embedding(EmbeddingError::InvalidResponse(
                "embedder returned no vector for query".to_string(),
            ))
        })?;

        let mut results = self.index.query(collection, &vector, top_k).await?;
        enforce_ordering(&mut results);
        results.truncate(top_k);

        debug!(
            collection = %collection,
            requested = top_k,
            returned = results.len(),
            "knowledge search complete"
        );
        Ok(results)
    }
}

/// Sorts results by descending score, breaking ties by ascending id.
fn enforce_ordering(results: &mut [ScoredPoint]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}
