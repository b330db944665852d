//! Tool endpoints and enablement configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// External tool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    /// Tool allow-list (comma-separated names). Empty or missing = all enabled.
    pub enabled_tools: Option<String>,

    /// Nominatim geocoding endpoint
    #[serde(default = "default_nominatim_endpoint")]
    pub nominatim_endpoint: String,

    /// Default city bias for location searches
    #[serde(default = "default_city")]
    pub default_city: String,

    /// Default country code bias for location searches
    #[serde(default = "default_country")]
    pub default_country: String,

    /// SPARQL endpoint the agent queries
    #[serde(default = "default_sparql_endpoint")]
    pub sparql_endpoint: String,

    /// Per-call timeout for tool HTTP requests, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ToolsConfig {
    /// Get the tool allow-list as a vector, or None when all tools are enabled
    pub fn allow_list(&self) -> Option<Vec<String>> {
        let raw = self.enabled_tools.as_ref()?;
        let names: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        // An empty allow-list means "all tools enabled", same as missing.
        if names.is_empty() {
            None
        } else {
            Some(names)
        }
    }

    /// Get the per-call timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate tool configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.sparql_endpoint.starts_with("http://")
            && !self.sparql_endpoint.starts_with("https://")
        {
            return Err(ValidationError::InvalidSparqlEndpoint);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled_tools: None,
            nominatim_endpoint: default_nominatim_endpoint(),
            default_city: default_city(),
            default_country: default_country(),
            sparql_endpoint: default_sparql_endpoint(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_nominatim_endpoint() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_city() -> String {
    "Gent".to_string()
}

fn default_country() -> String {
    "BE".to_string()
}

fn default_sparql_endpoint() -> String {
    "https://centrale-vindplaats.lblod.info/sparql".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tools_config_defaults() {
        let config = ToolsConfig::default();
        assert!(config.allow_list().is_none());
        assert_eq!(config.default_country, "BE");
    }

    #[test]
    fn test_allow_list_parsing() {
        let config = ToolsConfig {
            enabled_tools: Some("search_location, execute_sparql_query".to_string()),
            ..Default::default()
        };
        let list = config.allow_list().unwrap();
        assert_eq!(list, vec!["search_location", "execute_sparql_query"]);
    }

    #[test]
    fn test_empty_allow_list_means_all_enabled() {
        let config = ToolsConfig {
            enabled_tools: Some("  , ".to_string()),
            ..Default::default()
        };
        assert!(config.allow_list().is_none());
    }

    #[test]
    fn test_validation_bad_sparql_endpoint() {
        let config = ToolsConfig {
            sparql_endpoint: "ftp://example.org".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
