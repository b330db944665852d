//! SPARQL Port - Interface for executing queries against a SPARQL endpoint.

use async_trait::async_trait;

/// Port for SPARQL query execution.
///
/// Results are returned as one JSON object per solution binding, already
/// flattened from the SPARQL JSON results format (`var -> value` string map).
#[async_trait]
pub trait SparqlClient: Send + Sync {
    /// Execute a SELECT query and return its solution rows.
    async fn execute(
        &self,
        endpoint_url: &str,
        query: &str,
    ) -> Result<Vec<serde_json::Value>, SparqlError>;
}

/// SPARQL execution errors.
#[derive(Debug, thiserror::Error)]
pub enum SparqlError {
    /// The endpoint rejected the query as malformed.
    #[error("query syntax error: {message}")]
    Syntax {
        /// Endpoint error message.
        message: String,
    },

    /// Query execution exceeded the endpoint's time limit.
    #[error("query timed out")]
    Timeout,

    /// Endpoint unreachable or returned a server error.
    #[error("endpoint unreachable: {message}")]
    Unreachable {
        /// Error details.
        message: String,
    },

    /// Malformed results document.
    #[error("results parse error: {0}")]
    InvalidResults(String),
}

impl SparqlError {
    /// Creates a syntax error.
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }

    /// Creates an unreachable error.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::Unreachable {
            message: message.into(),
        }
    }
}
