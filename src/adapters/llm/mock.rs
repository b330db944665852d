//! Mock LLM provider for tests.
//!
//! Replies are scripted up front: a queue of canned turns and failures,
//! plus an optional repeating fallback for "never finishes" scenarios.
//! Every incoming request is recorded so tests can assert on what the
//! model was shown (conversation prefix, advertised tools).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{AssistantTurn, CompletionRequest, LlmError, LlmProvider, ProviderInfo};

enum ScriptedReply {
    Turn(AssistantTurn),
    TransientFailure(String),
    FatalFailure(String),
}

/// Scriptable in-memory provider.
#[derive(Default)]
pub struct MockLlmProvider {
    script: Mutex<VecDeque<ScriptedReply>>,
    repeating: Mutex<Option<AssistantTurn>>,
    requests: Mutex<Vec<CompletionRequest>>,
    call_count: AtomicUsize,
}

impl MockLlmProvider {
    /// Creates a provider with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply.
    pub fn with_response(self, turn: AssistantTurn) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedReply::Turn(turn));
        self
    }

    /// Queues a transient (retryable) failure.
    pub fn with_transient_failure(self, message: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedReply::TransientFailure(message.into()));
        self
    }

    /// Queues a fatal (non-retryable) failure.
    pub fn with_fatal_failure(self, message: impl Into<String>) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(ScriptedReply::FatalFailure(message.into()));
        self
    }

    /// Sets a reply returned for every call once the script is exhausted.
    pub fn with_repeating(self, turn: AssistantTurn) -> Self {
        *self.repeating.lock().unwrap() = Some(turn);
        self
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// All recorded requests, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The most recent recorded request.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<AssistantTurn, LlmError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        if let Some(reply) = self.script.lock().unwrap().pop_front() {
            return match reply {
                ScriptedReply::Turn(turn) => Ok(turn),
                ScriptedReply::TransientFailure(message) => Err(LlmError::network(message)),
                ScriptedReply::FatalFailure(message) => Err(LlmError::InvalidRequest(message)),
            };
        }

        if let Some(turn) = self.repeating.lock().unwrap().clone() {
            return Ok(turn);
        }

        Err(LlmError::InvalidRequest(
            "mock script exhausted with no repeating reply".to_string(),
        ))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("mock", "scripted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::Turn;

    #[tokio::test]
    async fn replies_follow_script_order() {
        let provider = MockLlmProvider::new()
            .with_response(AssistantTurn::text("first"))
            .with_response(AssistantTurn::text("second"));

        let request = CompletionRequest::new(vec![Turn::user("q")]);
        assert_eq!(
            provider.complete(request.clone()).await.unwrap().content,
            "first"
        );
        assert_eq!(
            provider.complete(request).await.unwrap().content,
            "second"
        );
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn repeating_reply_outlives_script() {
        let provider =
            MockLlmProvider::new().with_repeating(AssistantTurn::text("again and again"));

        let request = CompletionRequest::new(vec![Turn::user("q")]);
        for _ in 0..3 {
            let reply = provider.complete(request.clone()).await.unwrap();
            assert_eq!(reply.content, "again and again");
        }
    }

    #[tokio::test]
    async fn exhausted_script_without_repeat_errors() {
        let provider = MockLlmProvider::new();
        let result = provider
            .complete(CompletionRequest::new(vec![Turn::user("q")]))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn requests_are_recorded() {
        let provider = MockLlmProvider::new().with_response(AssistantTurn::text("ok"));
        let request = CompletionRequest::new(vec![Turn::user("what was asked")]);
        provider.complete(request).await.unwrap();

        let recorded = provider.last_request().unwrap();
        assert_eq!(recorded.turns[0].content, "what was asked");
    }
}
