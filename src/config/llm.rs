//! LLM provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// LLM provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Which provider backs the agent
    #[serde(default)]
    pub provider: LlmProviderKind,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible endpoint override (e.g. a proxy or Azure deployment)
    pub openai_endpoint: Option<String>,

    /// OpenAI model
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Mistral API key
    pub mistral_api_key: Option<String>,

    /// Mistral endpoint override
    pub mistral_endpoint: Option<String>,

    /// Mistral model
    #[serde(default = "default_mistral_model")]
    pub mistral_model: String,

    /// Ollama host (no API key needed)
    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,

    /// Ollama model
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,

    /// Sampling temperature
    #[serde(default)]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient provider failures
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

/// LLM provider type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    OpenAI,
    Mistral,
    Ollama,
}

impl LlmConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if OpenAI is configured
    pub fn has_openai(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Check if Mistral is configured
    pub fn has_mistral(&self) -> bool {
        self.mistral_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Validate LLM configuration
    ///
    /// The selected provider must be usable: OpenAI and Mistral require an
    /// API key, Ollama only needs a host.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.provider {
            LlmProviderKind::OpenAI if !self.has_openai() => {
                Err(ValidationError::MissingRequired("LLM__OPENAI_API_KEY"))
            }
            LlmProviderKind::Mistral if !self.has_mistral() => {
                Err(ValidationError::MissingRequired("LLM__MISTRAL_API_KEY"))
            }
            LlmProviderKind::Ollama if self.ollama_host.is_empty() => {
                Err(ValidationError::NoLlmProviderConfigured)
            }
            _ => Ok(()),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            openai_api_key: None,
            openai_endpoint: None,
            openai_model: default_openai_model(),
            mistral_api_key: None,
            mistral_endpoint: None,
            mistral_model: default_mistral_model(),
            ollama_host: default_ollama_host(),
            ollama_model: default_ollama_model(),
            temperature: 0.0,
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4.1".to_string()
}

fn default_mistral_model() -> String {
    "mistral-large-latest".to_string()
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "mistral-nemo".to_string()
}

fn default_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, LlmProviderKind::OpenAI);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_timeout_duration() {
        let config = LlmConfig {
            timeout_secs: 30,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_validation_openai_missing_key() {
        let config = LlmConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_openai_with_key() {
        let config = LlmConfig {
            openai_api_key: Some("sk-xxx".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_mistral_missing_key() {
        let config = LlmConfig {
            provider: LlmProviderKind::Mistral,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_ollama_needs_no_key() {
        let config = LlmConfig {
            provider: LlmProviderKind::Ollama,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
