//! Agent loop configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Agent loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Maximum number of model calls per run
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,
}

impl AgentConfig {
    /// Validate agent configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_turns == 0 {
            return Err(ValidationError::InvalidTurnBudget);
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

fn default_max_turns() -> u32 {
    12
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_config_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.max_turns, 12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_zero_turn_budget() {
        let config = AgentConfig { max_turns: 0 };
        assert!(config.validate().is_err());
    }
}
