//! Ollama provider - local models via Ollama's native chat API.
//!
//! Ollama's protocol differs from OpenAI's in two ways that matter here:
//! tool call arguments arrive as a JSON object rather than an encoded
//! string, and calls carry no id, so we mint one per call to keep the
//! transcript pairing intact.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::conversation::{Role, Turn};
use crate::domain::conversation::ToolCallRequest;
use crate::domain::tools::AdvertisedTool;
use crate::ports::{AssistantTurn, CompletionRequest, LlmError, LlmProvider, ProviderInfo};

/// Configuration for the Ollama provider.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Ollama host (e.g. http://localhost:11434).
    pub host: String,
    /// Model to use.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OllamaConfig {
    /// Creates a configuration for the given host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            model: "mistral-nemo".to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Provider implementation for a local Ollama instance.
pub struct OllamaProvider {
    config: OllamaConfig,
    client: Client,
}

impl OllamaProvider {
    /// Creates a new Ollama provider.
    pub fn new(config: OllamaConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.host.trim_end_matches('/'))
    }

    fn to_wire_request(&self, request: &CompletionRequest) -> OllamaRequest {
        let messages = request.turns.iter().map(to_ollama_message).collect();
        let tools: Vec<OllamaTool> = request.tools.iter().map(to_ollama_tool).collect();

        OllamaRequest {
            model: self.config.model.clone(),
            messages,
            tools: if tools.is_empty() { None } else { Some(tools) },
            stream: false,
            options: request
                .temperature
                .map(|temperature| OllamaOptions { temperature }),
        }
    }

    async fn handle_response_status(&self, response: Response) -> Result<Response, LlmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            404 => Err(LlmError::InvalidRequest(format!(
                "model '{}' not found: {}",
                self.config.model, error_body
            ))),
            400 => Err(LlmError::InvalidRequest(error_body)),
            500..=599 => Err(LlmError::unavailable(format!(
                "Server error {}: {}",
                status, error_body
            ))),
            _ => Err(LlmError::network(format!(
                "Unexpected status {}: {}",
                status, error_body
            ))),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<AssistantTurn, LlmError> {
        let wire_request = self.to_wire_request(&request);

        let response = self
            .client
            .post(self.chat_url())
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        timeout_secs: self.config.timeout.as_secs() as u32,
                    }
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {}", e))
                } else {
                    LlmError::network(e.to_string())
                }
            })?;

        let response = self.handle_response_status(response).await?;
        let wire_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LlmError::parse(format!("Failed to parse response: {}", e)))?;

        let tool_calls = wire_response
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                // Ollama omits call ids; mint one so tool turns can pair up.
                ToolCallRequest::new(
                    Uuid::new_v4().to_string(),
                    call.function.name,
                    call.function.arguments,
                )
            })
            .collect();

        Ok(AssistantTurn {
            content: wire_response.message.content.unwrap_or_default(),
            tool_calls,
        })
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("ollama", &self.config.model)
    }
}

fn to_ollama_message(turn: &Turn) -> OllamaMessage {
    let role = match turn.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let tool_calls: Vec<OllamaToolCall> = turn
        .tool_calls
        .iter()
        .map(|call| OllamaToolCall {
            function: OllamaFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.clone(),
            },
        })
        .collect();

    OllamaMessage {
        role: role.to_string(),
        content: Some(turn.content.clone()),
        tool_calls: if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        },
    }
}

fn to_ollama_tool(tool: &AdvertisedTool) -> OllamaTool {
    OllamaTool {
        tool_type: "function".to_string(),
        function: OllamaFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaTool>>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OllamaFunction,
}

#[derive(Debug, Serialize)]
struct OllamaFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    // Arguments arrive as a JSON object, unlike the OpenAI protocol.
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_url_strips_trailing_slash() {
        let provider = OllamaProvider::new(OllamaConfig::new("http://localhost:11434/"));
        assert_eq!(provider.chat_url(), "http://localhost:11434/api/chat");
    }

    #[test]
    fn wire_request_disables_streaming() {
        let provider = OllamaProvider::new(OllamaConfig::new("http://localhost:11434"));
        let request = CompletionRequest::new(vec![Turn::user("hi")]).with_temperature(0.0);

        let wire = provider.to_wire_request(&request);
        assert!(!wire.stream);
        assert_eq!(wire.options.unwrap().temperature, 0.0);
    }

    #[test]
    fn tool_call_arguments_stay_objects() {
        let turn = Turn::assistant_with_tool_calls(
            "",
            vec![ToolCallRequest::new(
                "c1",
                "search_location",
                json!({"query": "Gent"}),
            )],
        );
        let wire = to_ollama_message(&turn);
        let calls = wire.tool_calls.unwrap();
        assert!(calls[0].function.arguments.is_object());
    }

    #[test]
    fn response_tool_calls_deserialize() {
        let raw = r#"{"message":{"role":"assistant","content":"","tool_calls":[{"function":{"name":"search_web","arguments":{"query":"x"}}}]}}"#;
        let response: OllamaResponse = serde_json::from_str(raw).unwrap();
        let calls = response.message.tool_calls.unwrap();
        assert_eq!(calls[0].function.name, "search_web");
    }
}
