//! LLM Provider Port - Interface for language model integrations.
//!
//! This port abstracts all interactions with LLM providers (OpenAI, Mistral,
//! Ollama), enabling the agent loop to request completions without coupling to
//! a specific provider's wire protocol.
//!
//! # Design
//!
//! - Provider-agnostic conversation format (the domain `Turn` type)
//! - Tool advertisement travels with every request
//! - Error classification distinguishes transient failures (retryable by the
//!   agent loop) from fatal ones (escalate immediately)

use async_trait::async_trait;

use crate::domain::conversation::{ToolCallRequest, Turn};
use crate::domain::tools::AdvertisedTool;

/// Port for LLM provider interactions.
///
/// Implementations connect to external LLM services and translate between
/// the provider-specific API and our domain types. The agent loop is the
/// only consumer; it must stay provider-agnostic.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate the next assistant turn for the given conversation.
    ///
    /// `request.tools` carries the currently-advertised tool schemas; the
    /// provider is expected to expose them to the model so it can emit tool
    /// call requests.
    async fn complete(&self, request: CompletionRequest) -> Result<AssistantTurn, LlmError>;

    /// Get provider information (name, model) for logging and diagnostics.
    fn provider_info(&self) -> ProviderInfo;
}

/// Request for a model completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Full conversation so far (system prompt + user + assistant + tool turns).
    pub turns: Vec<Turn>,
    /// Tools advertised to the model for this turn.
    pub tools: Vec<AdvertisedTool>,
    /// Sampling temperature (None = provider default).
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Creates a new completion request over the given conversation prefix.
    pub fn new(turns: Vec<Turn>) -> Self {
        Self {
            turns,
            tools: Vec::new(),
            temperature: None,
        }
    }

    /// Sets the advertised tools.
    pub fn with_tools(mut self, tools: Vec<AdvertisedTool>) -> Self {
        self.tools = tools;
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// The model's reply: free text, tool call requests, or both.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantTurn {
    /// Text content of the reply (may be empty when only tools are called).
    pub content: String,
    /// Tool calls requested by the model, in emission order.
    pub tool_calls: Vec<ToolCallRequest>,
}

impl AssistantTurn {
    /// Creates a plain-text assistant turn.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Creates an assistant turn that requests tool calls.
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCallRequest>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
        }
    }

    /// Returns true when this turn is a final answer (no pending tool calls).
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Provider information for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    /// Provider name (e.g. "openai", "mistral", "ollama").
    pub name: String,
    /// Model identifier.
    pub model: String,
}

impl ProviderInfo {
    /// Creates new provider info.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until retry is allowed.
        retry_after_secs: u32,
    },

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout {
        /// Configured timeout.
        timeout_secs: u32,
    },

    /// Provider is unavailable (5xx or connection refused).
    #[error("provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if the agent loop may retry this error with the same
    /// conversation prefix.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimited { .. }
                | LlmError::Timeout { .. }
                | LlmError::Unavailable { .. }
                | LlmError::Network(_)
        )
    }
}
