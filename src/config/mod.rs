//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `DECIDE_LINKER` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use decide_linker::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod agent;
mod error;
mod knowledge;
mod llm;
mod server;
mod tools;

pub use agent::AgentConfig;
pub use error::{ConfigError, ValidationError};
pub use knowledge::{IndexBackend, KnowledgeConfig};
pub use llm::{LlmConfig, LlmProviderKind};
pub use server::{Environment, ServerConfig};
pub use tools::ToolsConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the entity-linking agent service.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM provider configuration (OpenAI/Mistral/Ollama)
    #[serde(default)]
    pub llm: LlmConfig,

    /// Knowledge base configuration (vector index + embeddings)
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// External tool configuration (geocoding, web search, SPARQL)
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Agent loop configuration (turn budget)
    #[serde(default)]
    pub agent: AgentConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DECIDE_LINKER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `DECIDE_LINKER__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `DECIDE_LINKER__LLM__OPENAI_API_KEY=...` -> `llm.openai_api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DECIDE_LINKER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Performs semantic validation of configuration:
    /// - URL formats
    /// - Timeout and budget constraints
    /// - Required API keys for the selected LLM provider
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.llm.validate()?;
        self.knowledge.validate()?;
        self.tools.validate()?;
        self.agent.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("DECIDE_LINKER__LLM__OPENAI_API_KEY", "sk-test");
        env::set_var("DECIDE_LINKER__SERVER__PORT", "9090");
    }

    fn clear_env() {
        env::remove_var("DECIDE_LINKER__LLM__OPENAI_API_KEY");
        env::remove_var("DECIDE_LINKER__SERVER__PORT");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.llm.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok());
        let config = result.unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_fails_validation_without_llm_key() {
        let config = AppConfig::default();
        // OpenAI is the default provider and has no key configured
        assert!(config.validate().is_err());
    }
}
