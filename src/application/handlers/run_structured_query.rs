//! Run Structured Query - entity-linking with a structured request and
//! post-run coercion of the final answer.

use std::sync::Arc;

use tracing::info;

use crate::config::{AgentConfig, LlmConfig};
use crate::domain::agent::{AgentRunner, CancelFlag, RunError, RunOutcome};
use crate::domain::conversation::ConversationState;
use crate::domain::query::{QueryValidationError, StructuredQuery, StructuredResult};
use crate::domain::tools::ToolRegistry;
use crate::ports::LlmProvider;

use super::SYSTEM_PROMPT;

/// Terminal outcome of a structured query run.
#[derive(Debug)]
pub enum StructuredRunOutcome {
    /// The run finished; the answer was coerced (or flagged as uncoercible).
    Done {
        /// Coerced result, including the raw answer.
        result: StructuredResult,
    },
    /// The run failed before producing a final answer.
    Failed {
        /// Why the run failed.
        error: RunError,
    },
}

/// Handles structured entity-linking queries.
pub struct RunStructuredQueryHandler {
    provider: Arc<dyn LlmProvider>,
    registry: Arc<ToolRegistry>,
    max_turns: u32,
    max_retries: u32,
    temperature: f32,
}

impl RunStructuredQueryHandler {
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

    /// Validates and runs one structured query to a terminal outcome.
    pub async fn handle(
        &self,
        query: StructuredQuery,
        cancel: CancelFlag,
    ) -> Result<StructuredRunOutcome, QueryValidationError> {
        query.validate()?;
        info!(
            entity_class = ?query.entity_class,
            label = %query.entity_label,
            "running structured query"
        );

        let transcript = ConversationState::with_prompt(SYSTEM_PROMPT, query.render());
        let runner = AgentRunner::new(
            self.provider.clone(),
            self.registry.clone(),
            self.max_turns,
        )
        .with_max_retries(self.max_retries)
        .with_temperature(self.temperature);

        match runner.run(transcript, cancel).await {
            RunOutcome::Done { answer, .. } => Ok(StructuredRunOutcome::Done {
                result: StructuredResult::coerce(&answer),
            }),
            RunOutcome::Failed { error, .. } => Ok(StructuredRunOutcome::Failed { error }),
        }
    }
}
