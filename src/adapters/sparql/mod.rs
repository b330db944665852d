//! SPARQL adapters.

mod http;

pub use http::{sanitize_query, HttpSparqlClient, SparqlHttpConfig};
