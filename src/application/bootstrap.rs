//! Bootstrap - assembles the application from configuration.
//!
//! Startup order: LLM provider, embedder, vector index (with the one-time
//! Qdrant-to-memory fallback), knowledge seeding, tool registry, and finally
//! the query handlers. Backend choice happens exactly once, here; nothing
//! downstream branches on it.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::adapters::embeddings::{OllamaEmbedder, OllamaEmbedderConfig};
use crate::adapters::geocoding::{NominatimConfig, NominatimGeocoder};
use crate::adapters::index::{InMemoryIndex, QdrantConfig, QdrantIndex};
use crate::adapters::llm::{OllamaConfig, OllamaProvider, OpenAiCompatConfig, OpenAiCompatProvider};
use crate::adapters::search::{DuckDuckGoConfig, DuckDuckGoSearch};
use crate::adapters::sparql::{HttpSparqlClient, SparqlHttpConfig};
use crate::config::{AppConfig, IndexBackend, LlmProviderKind};
use crate::domain::knowledge::{KnowledgeBase, KnowledgeDocument, KnowledgeError};
use crate::domain::tools::{RegistrationError, ToolRegistry};
use crate::ports::{Collection, LlmProvider, VectorIndex};

use super::handlers::{RunFreeformQueryHandler, RunStructuredQueryHandler};
use super::toolset::{build_registry, ToolDependencies};

/// Bootstrap failures.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    /// The selected provider has no API key configured.
    #[error("no API key configured for provider '{provider}'")]
    MissingApiKey {
        /// Provider name.
        provider: &'static str,
    },

    /// Tool registration failed.
    #[error("tool registration failed: {0}")]
    Registration(#[from] RegistrationError),

    /// Seed directory could not be read.
    #[error("failed to read seed documents: {0}")]
    SeedIo(#[from] std::io::Error),

    /// Seed file could not be parsed.
    #[error("failed to parse seed file '{file}': {source}")]
    SeedParse {
        /// Offending file.
        file: String,
        /// Parse error.
        #[source]
        source: serde_json::Error,
    },

    /// Seeding the knowledge base failed.
    #[error("failed to seed knowledge base: {0}")]
    Seeding(#[from] KnowledgeError),
}

/// Shared handler state for the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    /// Free-form query handler.
    pub freeform: Arc<RunFreeformQueryHandler>,
    /// Structured query handler.
    pub structured: Arc<RunStructuredQueryHandler>,
    /// Active index backend name, for the health endpoint.
    pub index_backend: &'static str,
}

/// Builds the full application state from configuration.
pub async fn build_state(config: &AppConfig) -> Result<AppState, BootstrapError> {
    let provider = build_provider(config)?;
    let info = provider.provider_info();
    info!(provider = %info.name, model = %info.model, "LLM provider configured");

    let index = build_index(config).await;
    let index_backend = index.backend_name();

    let embedder = Arc::new(OllamaEmbedder::new(
        OllamaEmbedderConfig::new(
            &config.knowledge.embedding_host,
            &config.knowledge.embedding_model,
            config.knowledge.embedding_dimensions,
        )
        .with_timeout(config.tools.timeout()),
    ));
    let knowledge = Arc::new(KnowledgeBase::new(embedder, index));

    if let Some(seed_dir) = config.knowledge.seed_dir.as_deref() {
        let documents = load_seed_documents(Path::new(seed_dir))?;
        info!(count = documents.len(), seed_dir, "seeding knowledge base");
        knowledge.add_documents(documents).await?;
    }

    let deps = ToolDependencies {
        knowledge,
        geocoder: Arc::new(NominatimGeocoder::new(
            NominatimConfig::new(&config.tools.nominatim_endpoint)
                .with_timeout(config.tools.timeout()),
        )),
        web_search: Arc::new(DuckDuckGoSearch::new(DuckDuckGoConfig {
            timeout: config.tools.timeout(),
            ..DuckDuckGoConfig::default()
        })),
        sparql: Arc::new(HttpSparqlClient::new(SparqlHttpConfig {
            timeout: config.tools.timeout(),
        })),
    };
    let registry: Arc<ToolRegistry> =
        Arc::new(build_registry(deps, &config.tools, &config.knowledge)?);
    info!(tools = registry.advertised().len(), "tool registry ready");

    Ok(AppState {
        freeform: Arc::new(RunFreeformQueryHandler::new(
            provider.clone(),
            registry.clone(),
            &config.agent,
            &config.llm,
        )),
        structured: Arc::new(RunStructuredQueryHandler::new(
            provider,
            registry,
            &config.agent,
            &config.llm,
        )),
        index_backend,
    })
}

/// Selects and constructs the configured LLM provider.
fn build_provider(config: &AppConfig) -> Result<Arc<dyn LlmProvider>, BootstrapError> {
    let llm = &config.llm;
    match llm.provider {
        LlmProviderKind::OpenAI => {
            let api_key = llm
                .openai_api_key
                .as_deref()
                .ok_or(BootstrapError::MissingApiKey { provider: "openai" })?;
            let mut provider_config = OpenAiCompatConfig::openai(api_key)
                .with_model(&llm.openai_model)
                .with_timeout(llm.timeout());
            if let Some(endpoint) = llm.openai_endpoint.as_deref() {
                provider_config = provider_config.with_base_url(endpoint);
            }
            Ok(Arc::new(OpenAiCompatProvider::new(provider_config)))
        }
        LlmProviderKind::Mistral => {
            let api_key = llm
                .mistral_api_key
                .as_deref()
                .ok_or(BootstrapError::MissingApiKey {
                    provider: "mistral",
                })?;
            let mut provider_config = OpenAiCompatConfig::mistral(api_key)
                .with_model(&llm.mistral_model)
                .with_timeout(llm.timeout());
            if let Some(endpoint) = llm.mistral_endpoint.as_deref() {
                provider_config = provider_config.with_base_url(endpoint);
            }
            Ok(Arc::new(OpenAiCompatProvider::new(provider_config)))
        }
        LlmProviderKind::Ollama => Ok(Arc::new(OllamaProvider::new(
            OllamaConfig::new(&llm.ollama_host)
                .with_model(&llm.ollama_model)
                .with_timeout(llm.timeout()),
        ))),
    }
}

/// Selects the vector index backend, falling back to memory when the
/// configured Qdrant instance is unreachable at startup.
async fn build_index(config: &AppConfig) -> Arc<dyn VectorIndex> {
    match config.knowledge.backend {
        IndexBackend::Memory => {
            info!("using in-memory vector index");
            Arc::new(InMemoryIndex::new())
        }
        IndexBackend::Qdrant => {
            let qdrant = QdrantIndex::new(
                QdrantConfig::new(
                    &config.knowledge.qdrant_url,
                    config.knowledge.embedding_dimensions,
                )
                .with_timeout(config.knowledge.connect_timeout()),
            );
            match qdrant.health_check().await {
                Ok(()) => {
                    info!(url = %config.knowledge.qdrant_url, "connected to Qdrant");
                    Arc::new(qdrant)
                }
                Err(error) => {
                    warn!(
                        url = %config.knowledge.qdrant_url,
                        %error,
                        "Qdrant unreachable, running degraded on the in-memory index"
                    );
                    Arc::new(InMemoryIndex::new())
                }
            }
        }
    }
}

/// One entry in a seed file.
#[derive(Debug, Deserialize)]
struct SeedEntry {
    /// Optional stable id; defaults to file stem + position.
    id: Option<String>,
    /// The text to embed.
    text: String,
    /// Metadata stored alongside (e.g. a worked "answer" query).
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

/// Loads seed documents from `<dir>/examples.json` and `<dir>/schema.json`.
///
/// Both files are optional; each holds a JSON array of seed entries.
fn load_seed_documents(dir: &Path) -> Result<Vec<KnowledgeDocument>, BootstrapError> {
    let mut documents = Vec::new();
    for collection in Collection::all() {
        let file = dir.join(format!("{}.json", collection.name()));
        if !file.exists() {
            continue;
        }
        let raw = std::fs::read_to_string(&file)?;
        let entries: Vec<SeedEntry> =
            serde_json::from_str(&raw).map_err(|source| BootstrapError::SeedParse {
                file: file.display().to_string(),
                source,
            })?;
        for (position, entry) in entries.into_iter().enumerate() {
            let id = entry
                .id
                .unwrap_or_else(|| format!("{}-{}", collection.name(), position));
            documents.push(KnowledgeDocument {
                id,
                collection,
                text: entry.text,
                metadata: entry.metadata,
            });
        }
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use tempfile::TempDir;

    fn config_with_memory_backend() -> AppConfig {
        let mut config = AppConfig::default();
        config.llm = LlmConfig {
            openai_api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        };
        config.knowledge.backend = IndexBackend::Memory;
        config
    }

    #[tokio::test]
    async fn build_state_with_memory_backend_succeeds() {
        let config = config_with_memory_backend();
        let state = build_state(&config).await.unwrap();
        assert_eq!(state.index_backend, "memory");
    }

    #[tokio::test]
    async fn build_provider_requires_api_key() {
        let config = AppConfig::default();
        let result = build_provider(&config);
        assert!(matches!(
            result,
            Err(BootstrapError::MissingApiKey { provider: "openai" })
        ));
    }

    #[test]
    fn seed_documents_load_from_both_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("examples.json"),
            r#"[{"text": "Which bodies exist?", "metadata": {"answer": "SELECT ..."}}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("schema.json"),
            r#"[{"id": "org", "text": "org:Organization models a body"}]"#,
        )
        .unwrap();

        let documents = load_seed_documents(dir.path()).unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].id, "examples-0");
        assert_eq!(documents[0].collection, Collection::Examples);
        assert_eq!(documents[1].id, "org");
        assert_eq!(documents[1].collection, Collection::Schema);
    }

    #[test]
    fn missing_seed_files_yield_no_documents() {
        let dir = TempDir::new().unwrap();
        let documents = load_seed_documents(dir.path()).unwrap();
        assert!(documents.is_empty());
    }

    #[test]
    fn malformed_seed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("examples.json"), "not json").unwrap();
        let result = load_seed_documents(dir.path());
        assert!(matches!(result, Err(BootstrapError::SeedParse { .. })));
    }
}
