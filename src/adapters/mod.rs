//! Adapters - Concrete implementations of the ports.
//!
//! Each submodule adapts one external system (LLM providers, vector stores,
//! embedding models, geocoding, web search, SPARQL endpoints, HTTP surface)
//! to the corresponding port trait.

pub mod embeddings;
pub mod geocoding;
pub mod http;
pub mod index;
pub mod llm;
pub mod search;
pub mod sparql;
