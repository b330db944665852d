//! Ports - Interfaces to external capabilities.
//!
//! Ports define the contracts between the application core and the outside
//! world. The domain and application layers depend only on these traits;
//! adapters provide the concrete implementations.

mod embedder;
mod geocoder;
mod llm_provider;
mod sparql;
mod vector_index;
mod web_search;

pub use embedder::{Embedder, EmbeddingError};
pub use geocoder::{Geocoder, GeocodingError, PlaceAddress, PlaceCandidate};
pub use llm_provider::{
    AssistantTurn, CompletionRequest, LlmError, LlmProvider, ProviderInfo,
};
pub use sparql::{SparqlClient, SparqlError};
pub use vector_index::{
    Collection, DocumentPayload, IndexError, ScoredPoint, VectorIndex, VectorPoint,
};
pub use web_search::{SearchError, SearchHit, WebSearch};
