//! In-memory vector index - brute-force cosine similarity.
//!
//! The fallback backend when Qdrant is unreachable at startup. Holds all
//! points in process memory behind an async RwLock and scans linearly on
//! query; collection sizes here are small (seed documents), so brute force
//! is adequate.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::ports::{Collection, IndexError, ScoredPoint, VectorIndex, VectorPoint};

/// Brute-force in-process index.
#[derive(Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<Collection, Vec<VectorPoint>>>,
}

impl InMemoryIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn upsert(
        &self,
        collection: Collection,
        points: &[VectorPoint],
    ) -> Result<(), IndexError> {
        let mut collections = self.collections.write().await;
        let stored = collections.entry(collection).or_default();

        if let (Some(existing), Some(incoming)) = (stored.first(), points.first()) {
            if existing.vector.len() != incoming.vector.len() {
                return Err(IndexError::DimensionMismatch {
                    expected: existing.vector.len(),
                    actual: incoming.vector.len(),
                });
            }
        }

        for point in points {
            match stored.iter_mut().find(|p| p.id == point.id) {
                Some(slot) => *slot = point.clone(),
                None => stored.push(point.clone()),
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        let collections = self.collections.read().await;
        let stored = match collections.get(&collection) {
            Some(stored) => stored,
            None => return Ok(Vec::new()),
        };

        if let Some(first) = stored.first() {
            if first.vector.len() != vector.len() {
                return Err(IndexError::DimensionMismatch {
                    expected: first.vector.len(),
                    actual: vector.len(),
                });
            }
        }

        let mut scored: Vec<ScoredPoint> = stored
            .iter()
            .map(|point| ScoredPoint {
                id: point.id.clone(),
                score: cosine_similarity(&point.vector, vector),
                payload: point.payload.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn health_check(&self) -> Result<(), IndexError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::DocumentPayload;

    fn point(id: &str, vector: Vec<f32>) -> VectorPoint {
        VectorPoint {
            id: id.to_string(),
            vector,
            payload: DocumentPayload::new(format!("text for {id}")),
        }
    }

    #[tokio::test]
    async fn query_returns_nearest_first() {
        let index = InMemoryIndex::new();
        index
            .upsert(
                Collection::Examples,
                &[
                    point("far", vec![0.0, 1.0]),
                    point("near", vec![1.0, 0.0]),
                    point("mid", vec![0.7, 0.7]),
                ],
            )
            .await
            .unwrap();

        let results = index
            .query(Collection::Examples, &[1.0, 0.0], 2)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "near");
        assert_eq!(results[1].id, "mid");
    }

    #[tokio::test]
    async fn equal_scores_break_ties_by_id() {
        let index = InMemoryIndex::new();
        index
            .upsert(
                Collection::Examples,
                &[point("b", vec![1.0, 0.0]), point("a", vec![1.0, 0.0])],
            )
            .await
            .unwrap();

        let results = index
            .query(Collection::Examples, &[1.0, 0.0], 2)
            .await
            .unwrap();
        assert_eq!(results[0].id, "a");
        assert_eq!(results[1].id, "b");
    }

    #[tokio::test]
    async fn upsert_replaces_existing_id() {
        let index = InMemoryIndex::new();
        index
            .upsert(Collection::Schema, &[point("doc", vec![1.0, 0.0])])
            .await
            .unwrap();
        index
            .upsert(Collection::Schema, &[point("doc", vec![0.0, 1.0])])
            .await
            .unwrap();

        let results = index
            .query(Collection::Schema, &[0.0, 1.0], 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].score > 0.99);
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let index = InMemoryIndex::new();
        index
            .upsert(Collection::Examples, &[point("only-example", vec![1.0])])
            .await
            .unwrap();

        let results = index.query(Collection::Schema, &[1.0], 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let index = InMemoryIndex::new();
        index
            .upsert(Collection::Examples, &[point("a", vec![1.0, 0.0])])
            .await
            .unwrap();

        let result = index.query(Collection::Examples, &[1.0, 0.0, 0.0], 5).await;
        assert!(matches!(result, Err(IndexError::DimensionMismatch { .. })));
    }

    #[test]
    fn cosine_similarity_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
