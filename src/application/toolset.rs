//! The registered tool set: specs, handlers, and registry assembly.
//!
//! Each tool wraps one port behind a `ToolHandler`. Handlers format their
//! output as text for the model; transport failures become `HandlerFailure`
//! and are caught at the dispatch boundary.

use std::sync::Arc;

use tracing::debug;

use crate::config::{KnowledgeConfig, ToolsConfig};
use crate::domain::knowledge::KnowledgeBase;
use crate::domain::tools::{
    ParamSpec, ParamType, RegistrationError, ToolError, ToolHandler, ToolRegistry, ToolSpec,
};
use crate::ports::{Collection, Geocoder, SparqlClient, SparqlError, WebSearch};

use async_trait::async_trait;

/// Upper bound on SPARQL rows handed back to the model.
const MAX_SPARQL_ROWS: usize = 50;

/// Default number of web search hits when the model does not ask for more.
const DEFAULT_WEB_RESULTS: usize = 5;

/// External dependencies shared by the tool handlers.
pub struct ToolDependencies {
    /// Knowledge base over the vector index.
    pub knowledge: Arc<KnowledgeBase>,
    /// Geocoding port.
    pub geocoder: Arc<dyn Geocoder>,
    /// Web search port.
    pub web_search: Arc<dyn WebSearch>,
    /// SPARQL execution port.
    pub sparql: Arc<dyn SparqlClient>,
}

/// Builds the full tool registry and applies the configured allow-list.
pub fn build_registry(
    deps: ToolDependencies,
    tools_config: &ToolsConfig,
    knowledge_config: &KnowledgeConfig,
) -> Result<ToolRegistry, RegistrationError> {
    let mut registry = ToolRegistry::new();

    registry.register(
        search_location_spec(),
        Arc::new(SearchLocationTool {
            geocoder: deps.geocoder,
            default_city: tools_config.default_city.clone(),
            default_country: tools_config.default_country.clone(),
        }),
    )?;
    registry.register(
        search_web_spec(),
        Arc::new(SearchWebTool {
            web_search: deps.web_search,
        }),
    )?;
    registry.register(
        execute_sparql_query_spec(),
        Arc::new(ExecuteSparqlQueryTool {
            sparql: deps.sparql,
            endpoint: tools_config.sparql_endpoint.clone(),
        }),
    )?;
    registry.register(
        search_sparql_docs_spec(),
        Arc::new(SearchSparqlDocsTool {
            knowledge: deps.knowledge,
            top_k: knowledge_config.retrieved_docs,
        }),
    )?;

    let allow_list = tools_config.allow_list();
    registry.apply_allow_list(allow_list.as_deref());
    Ok(registry)
}

// ────────────────────────────────────────────────────────────────────────────
// search_location
// ────────────────────────────────────────────────────────────────────────────

fn search_location_spec() -> ToolSpec {
    ToolSpec::new(
        "search_location",
        "Look up a street, address or place name and return matching locations \
         with coordinates and OpenStreetMap URLs.",
    )
    .with_param(ParamSpec::required(
        "query",
        ParamType::String,
        "Street, address or place name to look up",
    ))
    .with_param(ParamSpec::optional(
        "city",
        ParamType::String,
        "City to search in (defaults to the configured municipality)",
    ))
    .with_param(ParamSpec::optional(
        "country",
        ParamType::String,
        "ISO country code to restrict the search to (defaults to the configured country)",
    ))
}

struct SearchLocationTool {
    geocoder: Arc<dyn Geocoder>,
    default_city: String,
    default_country: String,
}

#[async_trait]
impl ToolHandler for SearchLocationTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<String, ToolError> {
        let query = required_str(arguments, "query", "search_location")?;
        let city = arguments
            .get("city")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.default_city);
        let country = arguments
            .get("country")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.default_country);

        let candidates = self
            .geocoder
            .search(query, Some(city), Some(country))
            .await
            .map_err(|e| ToolError::handler_failure("search_location", e.to_string()))?;

        if candidates.is_empty() {
            return Ok(format!("No locations found for '{query}' in {city}."));
        }

        debug!(query, count = candidates.len(), "geocoding candidates found");
        serde_json::to_string_pretty(&candidates)
            .map_err(|e| ToolError::handler_failure("search_location", e.to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// search_web
// ────────────────────────────────────────────────────────────────────────────

fn search_web_spec() -> ToolSpec {
    ToolSpec::new(
        "search_web",
        "Search the web and return result titles, snippets and URLs.",
    )
    .with_param(ParamSpec::required(
        "query",
        ParamType::String,
        "Search terms",
    ))
    .with_param(ParamSpec::optional(
        "max_results",
        ParamType::Integer,
        "Maximum number of results (default 5)",
    ))
}

struct SearchWebTool {
    web_search: Arc<dyn WebSearch>,
}

#[async_trait]
impl ToolHandler for SearchWebTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<String, ToolError> {
        let query = required_str(arguments, "query", "search_web")?;
        let max_results = arguments
            .get("max_results")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_WEB_RESULTS);

        let hits = self
            .web_search
            .search(query, max_results)
            .await
            .map_err(|e| ToolError::handler_failure("search_web", e.to_string()))?;

        if hits.is_empty() {
            return Ok(format!("No web results found for '{query}'."));
        }

        let mut out = format!("Found {} results:\n", hits.len());
        for hit in &hits {
            out.push_str(&format!("\n- {}\n  {}\n  {}\n", hit.title, hit.snippet, hit.url));
        }
        Ok(out)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// execute_sparql_query
// ────────────────────────────────────────────────────────────────────────────

fn execute_sparql_query_spec() -> ToolSpec {
    ToolSpec::new(
        "execute_sparql_query",
        "Execute a SPARQL SELECT query against the decisions endpoint and \
         return the matching rows as JSON.",
    )
    .with_param(ParamSpec::required(
        "query",
        ParamType::String,
        "A complete SPARQL SELECT query",
    ))
    .with_param(ParamSpec::optional(
        "endpoint_url",
        ParamType::String,
        "SPARQL endpoint to query (defaults to the configured decisions endpoint)",
    ))
}

struct ExecuteSparqlQueryTool {
    sparql: Arc<dyn SparqlClient>,
    endpoint: String,
}

#[async_trait]
impl ToolHandler for ExecuteSparqlQueryTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<String, ToolError> {
        let raw_query = required_str(arguments, "query", "execute_sparql_query")?;
        let endpoint = arguments
            .get("endpoint_url")
            .and_then(|v| v.as_str())
            .unwrap_or(&self.endpoint);
        let query = crate::adapters::sparql::sanitize_query(raw_query);
        if query.is_empty() {
            return Ok(
                "The query was empty after removing comments. Provide a complete \
                 SPARQL SELECT query and try again."
                    .to_string(),
            );
        }

        match self.sparql.execute(endpoint, &query).await {
            Ok(rows) if rows.is_empty() => Ok(
                "The query returned no results. Consider relaxing the filters, \
                 using CONTAINS/LCASE for label matching, and try again."
                    .to_string(),
            ),
            Ok(rows) => {
                let total = rows.len();
                let shown: Vec<&serde_json::Value> = rows.iter().take(MAX_SPARQL_ROWS).collect();
                let body = serde_json::to_string_pretty(&shown).map_err(|e| {
                    ToolError::handler_failure("execute_sparql_query", e.to_string())
                })?;
                if total > MAX_SPARQL_ROWS {
                    Ok(format!(
                        "Showing the first {MAX_SPARQL_ROWS} of {total} rows:\n{body}"
                    ))
                } else {
                    Ok(format!("{total} rows:\n{body}"))
                }
            }
            // Model-correctable failures go back as guidance, not as errors.
            Err(SparqlError::Syntax { message }) => Ok(format!(
                "The query has a syntax error: {message}\nFix the query and try again."
            )),
            Err(SparqlError::Timeout) => Ok(
                "The query timed out. Make it more selective (add FILTERs or a \
                 LIMIT) and try again."
                    .to_string(),
            ),
            Err(e) => Err(ToolError::handler_failure(
                "execute_sparql_query",
                e.to_string(),
            )),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// search_sparql_docs
// ────────────────────────────────────────────────────────────────────────────

fn search_sparql_docs_spec() -> ToolSpec {
    ToolSpec::new(
        "search_sparql_docs",
        "Retrieve worked query examples and schema documentation relevant to a \
         question about the decisions dataset.",
    )
    .with_param(ParamSpec::required(
        "question",
        ParamType::String,
        "The question to find relevant documentation for",
    ))
    .with_param(ParamSpec::optional(
        "potential_classes",
        ParamType::String,
        "Ontology classes suspected to be involved, to sharpen retrieval",
    ))
    .with_param(ParamSpec::optional(
        "steps",
        ParamType::String,
        "Planned query steps, to sharpen retrieval",
    ))
}

struct SearchSparqlDocsTool {
    knowledge: Arc<KnowledgeBase>,
    top_k: usize,
}

#[async_trait]
impl ToolHandler for SearchSparqlDocsTool {
    async fn call(&self, arguments: &serde_json::Value) -> Result<String, ToolError> {
        let question = required_str(arguments, "question", "search_sparql_docs")?;

        // Extra context rides along in the retrieval text; it is never
        // stored or echoed back.
        let mut retrieval = question.to_string();
        for key in ["potential_classes", "steps"] {
            if let Some(extra) = arguments.get(key).and_then(|v| v.as_str()) {
                retrieval.push(' ');
                retrieval.push_str(extra);
            }
        }

        let mut documents = Vec::new();
        for collection in Collection::all() {
            let results = self
                .knowledge
                .search(collection, &retrieval, self.top_k)
                .await
                .map_err(|e| ToolError::handler_failure("search_sparql_docs", e.to_string()))?;
            documents.extend(results);
        }

        // Worked examples repeat answers across paraphrased questions; keep
        // the first occurrence of each answer.
        let mut seen_answers = Vec::new();
        documents.retain(|doc| match doc.payload.metadata.get("answer") {
            Some(answer) => {
                let key = answer.to_string();
                if seen_answers.contains(&key) {
                    false
                } else {
                    seen_answers.push(key);
                    true
                }
            }
            None => true,
        });

        if documents.is_empty() {
            return Ok("No relevant documentation found.".to_string());
        }

        let mut out = format!("Found {} relevant documents:\n", documents.len());
        for doc in &documents {
            out.push_str("\n---\n");
            out.push_str(&doc.payload.text);
            out.push('\n');
            if let Some(answer) = doc.payload.metadata.get("answer").and_then(|a| a.as_str()) {
                out.push_str("Answer:\n");
                out.push_str(answer);
                out.push('\n');
            }
        }
        Ok(out)
    }
}

fn required_str<'a>(
    arguments: &'a serde_json::Value,
    key: &str,
    tool: &str,
) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArguments {
            tool: tool.to_string(),
            message: format!("missing required parameter '{key}'"),
        })
}
