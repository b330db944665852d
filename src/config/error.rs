//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("No LLM provider configured")]
    NoLlmProviderConfigured,

    #[error("Invalid Qdrant URL format")]
    InvalidQdrantUrl,

    #[error("Embedding dimensions must be greater than zero")]
    InvalidEmbeddingDimensions,

    #[error("Agent turn budget must be greater than zero")]
    InvalidTurnBudget,

    #[error("Invalid SPARQL endpoint URL format")]
    InvalidSparqlEndpoint,
}
