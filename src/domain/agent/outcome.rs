//! Terminal outcomes of an agent run.

use crate::domain::conversation::ConversationState;
use crate::ports::LlmError;

/// How an agent run ended. The transcript is kept in both cases; a failed
/// run still carries the partial conversation for diagnostics.
#[derive(Debug)]
pub enum RunOutcome {
    /// The model produced a final answer.
    Done {
        /// The final answer text.
        answer: String,
        /// Full transcript of the run.
        transcript: ConversationState,
    },
    /// The run terminated without a final answer.
    Failed {
        /// Why the run failed.
        error: RunError,
        /// Partial transcript up to the failure.
        transcript: ConversationState,
    },
}

impl RunOutcome {
    /// The transcript, regardless of how the run ended.
    pub fn transcript(&self) -> &ConversationState {
        match self {
            RunOutcome::Done { transcript, .. } => transcript,
            RunOutcome::Failed { transcript, .. } => transcript,
        }
    }

    /// The final answer, when the run completed.
    pub fn answer(&self) -> Option<&str> {
        match self {
            RunOutcome::Done { answer, .. } => Some(answer.as_str()),
            RunOutcome::Failed { .. } => None,
        }
    }
}

/// Agent run failures.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The model never produced a final answer within the turn budget.
    #[error("turn budget of {max_turns} model calls exhausted")]
    TurnBudgetExceeded {
        /// Configured budget.
        max_turns: u32,
    },

    /// The provider kept failing after bounded retries.
    #[error("model unavailable: {source}")]
    ModelUnavailable {
        /// Last provider error observed.
        #[source]
        source: LlmError,
    },

    /// The run was cancelled between turns.
    #[error("run cancelled")]
    Cancelled,
}
