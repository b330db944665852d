//! Run Freeform Query - one free-text question through the agent loop.

use std::sync::Arc;

use tracing::info;

use crate::config::{AgentConfig, LlmConfig};
use crate::domain::agent::{AgentRunner, CancelFlag, RunOutcome};
use crate::domain::conversation::ConversationState;
use crate::domain::tools::ToolRegistry;
use crate::ports::LlmProvider;

use super::SYSTEM_PROMPT;

/// Handles free-form queries.
pub struct RunFreeformQueryHandler {
    provider: Arc<dyn LlmProvider>,
    registry: Arc<ToolRegistry>,
    max_turns: u32,
    max_retries: u32,
    temperature: f32,
}

impl RunFreeformQueryHandler {
    /// Creates the handler from its dependencies and configuration.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        registry: Arc<ToolRegistry>,
        agent_config: &AgentConfig,
        llm_config: &LlmConfig,
    ) -> Self {
        Self {
            provider,
            registry,
            max_turns: agent_config.max_turns,
            max_retries: llm_config.max_retries,
            temperature: llm_config.temperature,
        }
    }

    /// Runs one query to a terminal outcome.
    pub async fn handle(&self, query: String, cancel: CancelFlag) -> RunOutcome {
        info!(query_len = query.len(), "running freeform query");

        let transcript = ConversationState::with_prompt(SYSTEM_PROMPT, query);
        let runner = AgentRunner::new(
            self.provider.clone(),
            self.registry.clone(),
            self.max_turns,
        )
        .with_max_retries(self.max_retries)
        .with_temperature(self.temperature);

        runner.run(transcript, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::llm::MockLlmProvider;
    use crate::ports::AssistantTurn;

    #[tokio::test]
    async fn handler_seeds_system_prompt_and_returns_answer() {
        let provider = Arc::new(
            MockLlmProvider::new().with_response(AssistantTurn::text("http://example.org/e1")),
        );
        let handler = RunFreeformQueryHandler::new(
            provider.clone(),
            Arc::new(ToolRegistry::new()),
            &AgentConfig::default(),
            &LlmConfig::default(),
        );

        let outcome = handler
            .handle("Who is the mayor of Gent?".to_string(), CancelFlag::new())
            .await;

        assert_eq!(outcome.answer(), Some("http://example.org/e1"));
        let seen = provider.last_request().unwrap();
        assert!(seen.turns[0].content.contains("entity-linking assistant"));
        assert_eq!(seen.turns[1].content, "Who is the mayor of Gent?");
    }
}
