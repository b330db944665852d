//! SPARQL over HTTP - query execution against a public endpoint.
//!
//! Queries are sent as form-encoded POSTs with the standard JSON results
//! Accept header. Solution bindings are flattened to plain `var -> value`
//! objects so tool output stays readable for the model.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::ports::{SparqlClient, SparqlError};

/// Configuration for the HTTP SPARQL client.
#[derive(Debug, Clone)]
pub struct SparqlHttpConfig {
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for SparqlHttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// SPARQL client over plain HTTP.
pub struct HttpSparqlClient {
    config: SparqlHttpConfig,
    client: Client,
}

impl HttpSparqlClient {
    /// Creates a new client.
    pub fn new(config: SparqlHttpConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }
}

#[async_trait]
impl SparqlClient for HttpSparqlClient {
    async fn execute(
        &self,
        endpoint_url: &str,
        query: &str,
    ) -> Result<Vec<serde_json::Value>, SparqlError> {
        let mut form = HashMap::new();
        form.insert("query", query);

        let response = self
            .client
            .post(endpoint_url)
            .header("Accept", "application/sparql-results+json")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SparqlError::Timeout
                } else {
                    SparqlError::unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(SparqlError::syntax(body));
        }
        if status.as_u16() == 408 || status.as_u16() == 504 {
            return Err(SparqlError::Timeout);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SparqlError::unreachable(format!(
                "endpoint returned {}: {}",
                status, body
            )));
        }

        let results: SparqlResults = response
            .json()
            .await
            .map_err(|e| SparqlError::InvalidResults(e.to_string()))?;

        Ok(results
            .results
            .bindings
            .into_iter()
            .map(flatten_binding)
            .collect())
    }
}

/// Flattens one solution binding to a `var -> value` object.
fn flatten_binding(binding: HashMap<String, BindingValue>) -> serde_json::Value {
    let mut row = serde_json::Map::new();
    for (var, value) in binding {
        row.insert(var, serde_json::Value::String(value.value));
    }
    serde_json::Value::Object(row)
}

/// Strips `#` comments from a SPARQL query.
///
/// Models routinely emit commented queries, and some endpoints choke on
/// them. A `#` only starts a comment outside string literals and IRIs
/// (`<http://...#fragment>` must survive).
pub fn sanitize_query(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut in_single = false;
    let mut in_double = false;
    let mut in_iri = false;
    let mut escaped = false;

    for line in query.lines() {
        let mut kept = String::with_capacity(line.len());
        for ch in line.chars() {
            if escaped {
                escaped = false;
                kept.push(ch);
                continue;
            }
            match ch {
                '\\' if in_single || in_double => {
                    escaped = true;
                    kept.push(ch);
                }
                '\'' if !in_double && !in_iri => {
                    in_single = !in_single;
                    kept.push(ch);
                }
                '"' if !in_single && !in_iri => {
                    in_double = !in_double;
                    kept.push(ch);
                }
                '<' if !in_single && !in_double && !in_iri => {
                    in_iri = true;
                    kept.push(ch);
                }
                '>' if in_iri => {
                    in_iri = false;
                    kept.push(ch);
                }
                '#' if !in_single && !in_double && !in_iri => break,
                _ => kept.push(ch),
            }
        }
        let trimmed = kept.trim_end();
        if !trimmed.is_empty() {
            out.push_str(trimmed);
            out.push('\n');
        }
        // String literals and IRIs do not span lines in SPARQL.
        in_single = false;
        in_double = false;
        in_iri = false;
        escaped = false;
    }
    out.trim_end().to_string()
}

// ----- Wire Types -----

#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: Bindings,
}

#[derive(Debug, Deserialize)]
struct Bindings {
    bindings: Vec<HashMap<String, BindingValue>>,
}

#[derive(Debug, Deserialize)]
struct BindingValue {
    value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_binding_keeps_values_only() {
        let raw = r#"{"head":{"vars":["uri","label"]},"results":{"bindings":[{"uri":{"type":"uri","value":"http://data.lblod.info/id/besturen/1"},"label":{"type":"literal","value":"Vast Bureau"}}]}}"#;
        let parsed: SparqlResults = serde_json::from_str(raw).unwrap();
        let rows: Vec<serde_json::Value> = parsed
            .results
            .bindings
            .into_iter()
            .map(flatten_binding)
            .collect();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["label"], "Vast Bureau");
        assert_eq!(rows[0]["uri"], "http://data.lblod.info/id/besturen/1");
    }

    #[test]
    fn sanitize_strips_full_line_comments() {
        let query = "# find bodies\nSELECT ?s WHERE { ?s ?p ?o }";
        assert_eq!(sanitize_query(query), "SELECT ?s WHERE { ?s ?p ?o }");
    }

    #[test]
    fn sanitize_strips_trailing_comments() {
        let query = "SELECT ?s WHERE { ?s ?p ?o } # all triples";
        assert_eq!(sanitize_query(query), "SELECT ?s WHERE { ?s ?p ?o }");
    }

    #[test]
    fn sanitize_preserves_hash_in_iri() {
        let query = "SELECT ?s WHERE { ?s a <http://www.w3.org/ns/org#Organization> }";
        assert_eq!(sanitize_query(query), query);
    }

    #[test]
    fn sanitize_preserves_hash_in_string_literal() {
        let query = r#"SELECT ?s WHERE { ?s rdfs:label "item #1" }"#;
        assert_eq!(sanitize_query(query), query);
    }

    #[test]
    fn sanitize_drops_comment_only_lines_entirely() {
        let query = "SELECT ?s\n# middle comment\nWHERE { ?s ?p ?o }";
        assert_eq!(sanitize_query(query), "SELECT ?s\nWHERE { ?s ?p ?o }");
    }
}
