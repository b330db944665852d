//! The agent runner: model calls, tool dispatch, and termination.
//!
//! One runner executes one query. Each iteration makes a single model call
//! (with bounded retries on transient provider errors), then either finishes
//! with the model's final answer or dispatches the requested tool calls in
//! emission order and loops. The transcript is append-only and owned by the
//! run; nothing is shared across queries.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::conversation::{ConversationState, Turn};
use crate::domain::tools::ToolRegistry;
use crate::ports::{CompletionRequest, LlmError, LlmProvider};

/// Cooperative cancellation flag, checked between turns.
///
/// Cancellation is best-effort: an in-flight model call or tool dispatch
/// completes before the flag is observed.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a new, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True when cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

use super::outcome::{RunError, RunOutcome};

/// Executes the agent loop for one query.
pub struct AgentRunner {
    provider: Arc<dyn LlmProvider>,
    registry: Arc<ToolRegistry>,
    max_turns: u32,
    max_retries: u32,
    temperature: Option<f32>,
}

impl AgentRunner {
    /// Creates a runner over a provider and tool registry.
    pub fn new(provider: Arc<dyn LlmProvider>, registry: Arc<ToolRegistry>, max_turns: u32) -> Self {
        Self {
            provider,
            registry,
            max_turns,
            max_retries: 3,
            temperature: None,
        }
    }

    /// Sets the retry bound for transient provider errors.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the sampling temperature passed to the provider.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Runs the loop to a terminal outcome.
    ///
    /// The budget counts model calls: a run makes at most `max_turns` calls
    /// and fails with `TurnBudgetExceeded` if none of them was final.
    pub async fn run(&self, mut transcript: ConversationState, cancel: CancelFlag) -> RunOutcome {
        let info = self.provider.provider_info();
        info!(
            provider = %info.name,
            model = %info.model,
            max_turns = self.max_turns,
            "starting agent run"
        );

        for turn_index in 0..self.max_turns {
            if cancel.is_cancelled() {
                info!(turn = turn_index, "run cancelled");
                return RunOutcome::Failed {
                    error: RunError::Cancelled,
                    transcript,
                };
            }

            let request = CompletionRequest::new(transcript.turns().to_vec())
                .with_tools(self.registry.advertised());
            let request = match self.temperature {
                Some(t) => request.with_temperature(t),
                None => request,
            };

            let reply = match self.complete_with_retry(request).await {
                Ok(reply) => reply,
                Err(source) => {
                    warn!(turn = turn_index, error = %source, "model call failed, aborting run");
                    return RunOutcome::Failed {
                        error: RunError::ModelUnavailable { source },
                        transcript,
                    };
                }
            };

            if reply.is_final() {
                info!(turns_used = turn_index + 1, "run finished with final answer");
                let answer = reply.content.clone();
                transcript.push(Turn::assistant(reply.content));
                return RunOutcome::Done { answer, transcript };
            }

            debug!(
                turn = turn_index,
                tool_calls = reply.tool_calls.len(),
                "model requested tool calls"
            );
            let calls = reply.tool_calls.clone();
            transcript.push(Turn::assistant_with_tool_calls(reply.content, calls.clone()));

            // Dispatch in emission order so re-runs with a deterministic
            // model yield identical transcripts.
            for call in &calls {
                let result = self.registry.dispatch(call).await;
                transcript.push(result.into_turn());
            }
        }

        warn!(max_turns = self.max_turns, "turn budget exhausted");
        RunOutcome::Failed {
            error: RunError::TurnBudgetExceeded {
                max_turns: self.max_turns,
            },
            transcript,
        }
    }

    /// Calls the provider, retrying transient errors with exponential backoff.
    ///
    /// Retries reuse the same conversation prefix; only the last error is
    /// reported when the bound is exhausted.
    async fn complete_with_retry(
        &self,
        request: CompletionRequest,
    ) -> Result<crate::ports::AssistantTurn, LlmError> {
        let mut attempt: u32 = 0;
        loop {
            match self.provider.complete(request.clone()).await {
                Ok(reply) => return Ok(reply),
                Err(error) if error.is_transient() && attempt < self.max_retries => {
                    let delay_secs = match &error {
                        LlmError::RateLimited { retry_after_secs } => u64::from(*retry_after_secs),
                        _ => 1u64 << attempt,
                    };
                    warn!(
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_secs,
                        error = %error,
                        "transient provider error, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
