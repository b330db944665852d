//! Web Search Port - Interface for general web search providers.

use async_trait::async_trait;
use serde::Serialize;

/// Port for web search.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Run a search and return at most `max_results` hits, best first.
    async fn search(&self, query: &str, max_results: usize)
        -> Result<Vec<SearchHit>, SearchError>;
}

/// A single web search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Result title.
    pub title: String,
    /// Short text snippet.
    pub snippet: String,
    /// Result URL.
    pub url: String,
}

/// Web search errors.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Provider unreachable or returned a server error.
    #[error("search provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Provider throttled the request.
    #[error("search rate limited")]
    RateLimited,

    /// Malformed provider response.
    #[error("search response error: {0}")]
    InvalidResponse(String),
}

impl SearchError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}
