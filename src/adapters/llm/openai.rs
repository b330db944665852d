//! OpenAI-compatible provider - chat completions with tool calling.
//!
//! Works against any endpoint speaking the OpenAI chat-completions protocol;
//! in practice that is OpenAI itself and Mistral's La Plateforme, which share
//! the wire format. The provider name in diagnostics follows the configured
//! endpoint.
//!
//! Retry policy lives in the agent loop, not here; this adapter only maps
//! wire failures onto error kinds the loop can classify.

use async_trait::async_trait;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::conversation::{Role, ToolCallRequest, Turn};
use crate::domain::tools::AdvertisedTool;
use crate::ports::{AssistantTurn, CompletionRequest, LlmError, LlmProvider, ProviderInfo};

/// Configuration for an OpenAI-compatible provider.
#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Provider name reported in diagnostics ("openai" or "mistral").
    pub provider_name: String,
    /// Model to use.
    pub model: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl OpenAiCompatConfig {
    /// Creates a configuration targeting OpenAI.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            provider_name: "openai".to_string(),
            model: "gpt-4.1".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Creates a configuration targeting Mistral.
    pub fn mistral(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            provider_name: "mistral".to_string(),
            model: "mistral-large-latest".to_string(),
            base_url: "https://api.mistral.ai/v1".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Provider implementation for OpenAI-compatible endpoints.
pub struct OpenAiCompatProvider {
    config: OpenAiCompatConfig,
    client: Client,
}

impl OpenAiCompatProvider {
    /// Creates a new provider with the given configuration.
    pub fn new(config: OpenAiCompatConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    /// Converts our request to the wire format.
    fn to_wire_request(&self, request: &CompletionRequest) -> WireRequest {
        let messages = request.turns.iter().map(to_wire_message).collect();
        let tools: Vec<WireTool> = request.tools.iter().map(to_wire_tool).collect();

        WireRequest {
            model: self.config.model.clone(),
            messages,
            tools: if tools.is_empty() { None } else { Some(tools) },
            temperature: request.temperature,
        }
    }

    async fn send_request(&self, request: &CompletionRequest) -> Result<Response, LlmError> {
        let wire_request = self.to_wire_request(request);

        self.client
            .post(self.completions_url())
            .header("Authorization", format!("Bearer {}", self.config.api_key()))
            .header("Content-Type", "application/json")
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
            })
    }

    async fn handle_response_status(&self, response: Response) -> Result<Response, LlmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        match status.as_u16() {
            401 | 403 => Err(LlmError::AuthenticationFailed),
            429 => Err(LlmError::RateLimited {
                retry_after_secs: parse_retry_after(&error_body),
            }),
            400 | 422 => Err(LlmError::InvalidRequest(error_body)),
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

    async fn parse_response(&self, response: Response) -> Result<AssistantTurn, LlmError> {
        let response = self.handle_response_status(response).await?;

        let wire_response: WireResponse = response
            .json()
            .await
            .map_err(|e| LlmError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = wire_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::parse("No choices in response"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(parse_tool_call)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AssistantTurn {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<AssistantTurn, LlmError> {
        let response = self.send_request(&request).await?;
        self.parse_response(response).await
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new(&self.config.provider_name, &self.config.model)
    }
}

/// Parses retry-after from an error body, defaulting to 30 seconds.
fn parse_retry_after(error_body: &str) -> u32 {
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(error_body) {
        if let Some(s) = parsed
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            if let Some(idx) = s.find("try again in ") {
                let rest = &s[idx + 13..];
                if let Some(num_end) = rest.find(|c: char| !c.is_ascii_digit()) {
                    if let Ok(secs) = rest[..num_end].parse::<u32>() {
                        return secs;
                    }
                }
            }
        }
    }
    30
}

fn to_wire_message(turn: &Turn) -> WireMessage {
    let role = match turn.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let tool_calls: Vec<WireToolCall> = turn
        .tool_calls
        .iter()
        .map(|call| WireToolCall {
            id: call.id.clone(),
            call_type: "function".to_string(),
            function: WireFunctionCall {
                name: call.name.clone(),
                arguments: call.arguments.to_string(),
            },
        })
        .collect();

    WireMessage {
        role: role.to_string(),
        content: Some(turn.content.clone()),
        tool_calls: if tool_calls.is_empty() {
            None
        } else {
            Some(tool_calls)
        },
        tool_call_id: turn.tool_call_id.clone(),
    }
}

fn to_wire_tool(tool: &AdvertisedTool) -> WireTool {
    WireTool {
        tool_type: "function".to_string(),
        function: WireFunction {
            name: tool.name.clone(),
            description: tool.description.clone(),
            parameters: tool.parameters.clone(),
        },
    }
}

fn parse_tool_call(call: WireToolCall) -> Result<ToolCallRequest, LlmError> {
    let arguments = serde_json::from_str(&call.function.arguments).map_err(|e| {
        LlmError::parse(format!(
            "Tool call '{}' carried unparseable arguments: {}",
            call.function.name, e
        ))
    })?;
    Ok(ToolCallRequest::new(call.id, call.function.name, arguments))
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    // Arguments arrive as a JSON-encoded string, not an object.
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<WireToolCall>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tools::{ParamSpec, ParamType, ToolSpec};
    use serde_json::json;

    #[test]
    fn config_builders_set_provider_names() {
        let openai = OpenAiCompatConfig::openai("key");
        assert_eq!(openai.provider_name, "openai");
        assert_eq!(openai.model, "gpt-4.1");

        let mistral = OpenAiCompatConfig::mistral("key").with_model("mistral-small-latest");
        assert_eq!(mistral.provider_name, "mistral");
        assert_eq!(mistral.base_url, "https://api.mistral.ai/v1");
        assert_eq!(mistral.model, "mistral-small-latest");
    }

    #[test]
    fn wire_request_includes_tools() {
        let provider = OpenAiCompatProvider::new(OpenAiCompatConfig::openai("key"));
        let spec = ToolSpec::new("search_web", "Search the web").with_param(ParamSpec::required(
            "query",
            ParamType::String,
            "Search terms",
        ));
        let request =
            CompletionRequest::new(vec![Turn::user("hi")]).with_tools(vec![spec.advertise()]);

        let wire = provider.to_wire_request(&request);
        let tools = wire.tools.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].function.name, "search_web");
        assert_eq!(tools[0].tool_type, "function");
    }

    #[test]
    fn wire_message_round_trips_tool_turns() {
        let turn = Turn::tool("call-3", "{\"rows\": []}");
        let wire = to_wire_message(&turn);
        assert_eq!(wire.role, "tool");
        assert_eq!(wire.tool_call_id.as_deref(), Some("call-3"));
    }

    #[test]
    fn assistant_tool_calls_serialize_arguments_as_string() {
        let turn = Turn::assistant_with_tool_calls(
            "",
            vec![ToolCallRequest::new(
                "c1",
                "search_location",
                json!({"query": "Gent"}),
            )],
        );
        let wire = to_wire_message(&turn);
        let calls = wire.tool_calls.unwrap();
        assert_eq!(calls[0].function.arguments, r#"{"query":"Gent"}"#);
    }

    #[test]
    fn parse_tool_call_decodes_argument_string() {
        let call = WireToolCall {
            id: "c1".to_string(),
            call_type: "function".to_string(),
            function: WireFunctionCall {
                name: "search_web".to_string(),
                arguments: r#"{"query": "Vast Bureau Gent"}"#.to_string(),
            },
        };
        let parsed = parse_tool_call(call).unwrap();
        assert_eq!(parsed.name, "search_web");
        assert_eq!(parsed.arguments["query"], "Vast Bureau Gent");
    }

    #[test]
    fn parse_tool_call_rejects_bad_arguments() {
        let call = WireToolCall {
            id: "c1".to_string(),
            call_type: "function".to_string(),
            function: WireFunctionCall {
                name: "search_web".to_string(),
                arguments: "not json".to_string(),
            },
        };
        assert!(matches!(parse_tool_call(call), Err(LlmError::Parse(_))));
    }

    #[test]
    fn parse_retry_after_from_message() {
        let error = r#"{"error":{"message":"Rate limit exceeded. Please try again in 12 seconds."}}"#;
        assert_eq!(parse_retry_after(error), 12);
    }

    #[test]
    fn parse_retry_after_default() {
        assert_eq!(parse_retry_after("{}"), 30);
    }
}
