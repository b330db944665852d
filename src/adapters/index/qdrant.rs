//! Qdrant index - remote vector store over the REST API.
//!
//! Collections are created lazily on first upsert with cosine distance.
//! Qdrant point ids must be integers or UUIDs, so each document id is
//! mapped to a deterministic v5 UUID and the original id is kept in the
//! payload under `_id`.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::ports::{
    Collection, DocumentPayload, IndexError, ScoredPoint, VectorIndex, VectorPoint,
};

const DOC_ID_FIELD: &str = "_id";

/// Configuration for the Qdrant index.
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// Base URL of the Qdrant REST API.
    pub base_url: String,
    /// Vector dimensionality for created collections.
    pub dimensions: usize,
    /// Request timeout.
    pub timeout: Duration,
}

impl QdrantConfig {
    /// Creates a configuration for the given base URL and dimensionality.
    pub fn new(base_url: impl Into<String>, dimensions: usize) -> Self {
        Self {
            base_url: base_url.into(),
            dimensions,
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Remote Qdrant index over REST.
pub struct QdrantIndex {
    config: QdrantConfig,
    client: Client,
}

impl QdrantIndex {
    /// Creates a new Qdrant index adapter.
    pub fn new(config: QdrantConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Maps a document id onto a deterministic Qdrant-compatible UUID.
    fn point_uuid(id: &str) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes()).to_string()
    }

    async fn ensure_collection(&self, collection: Collection) -> Result<(), IndexError> {
        let url = self.url(&format!("/collections/{}", collection.name()));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(connection_error)?;
        if response.status().is_success() {
            return Ok(());
        }
        if response.status() != StatusCode::NOT_FOUND {
            return Err(backend_error(response).await);
        }

        let body = CreateCollectionRequest {
            vectors: VectorParams {
                size: self.config.dimensions,
                distance: "Cosine".to_string(),
            },
        };
        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(connection_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(backend_error(response).await)
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn upsert(
        &self,
        collection: Collection,
        points: &[VectorPoint],
    ) -> Result<(), IndexError> {
        if let Some(point) = points.iter().find(|p| p.vector.len() != self.config.dimensions) {
            return Err(IndexError::DimensionMismatch {
                expected: self.config.dimensions,
                actual: point.vector.len(),
            });
        }

        self.ensure_collection(collection).await?;

        let wire_points: Vec<WirePoint> = points
            .iter()
            .map(|point| {
                let mut payload = point.payload.metadata.clone();
                payload.insert(
                    "text".to_string(),
                    serde_json::Value::String(point.payload.text.clone()),
                );
                payload.insert(
                    DOC_ID_FIELD.to_string(),
                    serde_json::Value::String(point.id.clone()),
                );
                WirePoint {
                    id: Self::point_uuid(&point.id),
                    vector: point.vector.clone(),
                    payload,
                }
            })
            .collect();

        let url = self.url(&format!("/collections/{}/points?wait=true", collection.name()));
        let response = self
            .client
            .put(&url)
            .json(&UpsertRequest {
                points: wire_points,
            })
            .send()
            .await
            .map_err(connection_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(backend_error(response).await)
        }
    }

    async fn query(
        &self,
        collection: Collection,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<ScoredPoint>, IndexError> {
        if vector.len() != self.config.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.config.dimensions,
                actual: vector.len(),
            });
        }

        let url = self.url(&format!("/collections/{}/points/search", collection.name()));
        let response = self
            .client
            .post(&url)
            .json(&SearchRequest {
                vector: vector.to_vec(),
                limit: top_k,
                with_payload: true,
            })
            .send()
            .await
            .map_err(connection_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(IndexError::CollectionMissing {
                collection: collection.name().to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(backend_error(response).await);
        }

        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| IndexError::BackendResponse(format!("Failed to parse search: {}", e)))?;

        Ok(search
            .result
            .into_iter()
            .map(|hit| {
                let mut metadata = hit.payload;
                let text = metadata
                    .remove("text")
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                let id = metadata
                    .remove(DOC_ID_FIELD)
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or(hit.id);
                ScoredPoint {
                    id,
                    score: hit.score,
                    payload: DocumentPayload { text, metadata },
                }
            })
            .collect())
    }

    async fn health_check(&self) -> Result<(), IndexError> {
        let response = self
            .client
            .get(self.url("/readyz"))
            .send()
            .await
            .map_err(connection_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(IndexError::unavailable(format!(
                "readiness check returned {}",
                response.status()
            )))
        }
    }

    fn backend_name(&self) -> &'static str {
        "qdrant"
    }
}

fn connection_error(e: reqwest::Error) -> IndexError {
    IndexError::unavailable(e.to_string())
}

async fn backend_error(response: Response) -> IndexError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if status.is_server_error() {
        IndexError::unavailable(format!("Server error {}: {}", status, body))
    } else {
        IndexError::BackendResponse(format!("Unexpected status {}: {}", status, body))
    }
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
struct CreateCollectionRequest {
    vectors: VectorParams,
}

#[derive(Debug, Serialize)]
struct VectorParams {
    size: usize,
    distance: String,
}

#[derive(Debug, Serialize)]
struct UpsertRequest {
    points: Vec<WirePoint>,
}

#[derive(Debug, Serialize)]
struct WirePoint {
    id: String,
    vector: Vec<f32>,
    payload: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Vec<SearchHitWire>,
}

#[derive(Debug, Deserialize)]
struct SearchHitWire {
    id: String,
    score: f32,
    #[serde(default)]
    payload: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_uuid_is_deterministic() {
        assert_eq!(
            QdrantIndex::point_uuid("example-1"),
            QdrantIndex::point_uuid("example-1")
        );
        assert_ne!(
            QdrantIndex::point_uuid("example-1"),
            QdrantIndex::point_uuid("example-2")
        );
    }

    #[test]
    fn url_joins_without_double_slash() {
        let index = QdrantIndex::new(QdrantConfig::new("http://localhost:6333/", 768));
        assert_eq!(
            index.url("/collections/examples"),
            "http://localhost:6333/collections/examples"
        );
    }

    #[tokio::test]
    async fn upsert_rejects_wrong_dimensionality() {
        let index = QdrantIndex::new(QdrantConfig::new("http://localhost:6333", 768));
        let point = VectorPoint {
            id: "p1".to_string(),
            vector: vec![0.0; 4],
            payload: DocumentPayload::new("text"),
        };
        let result = index.upsert(Collection::Examples, &[point]).await;
        assert!(matches!(result, Err(IndexError::DimensionMismatch { .. })));
    }

    #[test]
    fn search_response_parses_payload() {
        let raw = r#"{"result":[{"id":"u1","score":0.87,"payload":{"text":"doc text","_id":"example-1","answer":"SELECT ..."}}]}"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.result[0].score, 0.87);
        assert_eq!(parsed.result[0].payload["_id"], "example-1");
    }
}
