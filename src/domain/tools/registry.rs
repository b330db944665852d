//! Tool registry: registration, advertisement, and dispatch.
//!
//! The registry owns the tool set for an agent run. Registration rejects
//! duplicate names; advertisement lists only enabled tools; dispatch
//! validates arguments before invoking a handler and converts every failure
//! into a result the model can read. Dispatch itself never propagates an
//! error to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::conversation::{ToolCallRequest, Turn};

use super::spec::{AdvertisedTool, ToolSpec};

/// A tool implementation invoked by the registry.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Executes the tool with validated arguments.
    ///
    /// The returned string is handed to the model verbatim as a tool turn.
    async fn call(&self, arguments: &serde_json::Value) -> Result<String, ToolError>;
}

/// Tool dispatch errors.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// No tool registered under this name.
    #[error("unknown tool '{name}'")]
    UnknownTool {
        /// Requested name.
        name: String,
    },

    /// Tool exists but is disabled by the allow-list.
    #[error("tool '{name}' is disabled")]
    ToolDisabled {
        /// Requested name.
        name: String,
    },

    /// Arguments failed structural validation.
    #[error("invalid arguments for '{tool}': {message}")]
    InvalidArguments {
        /// Tool name.
        tool: String,
        /// Validation problem.
        message: String,
    },

    /// The handler itself failed.
    #[error("tool '{tool}' failed: {message}")]
    HandlerFailure {
        /// Tool name.
        tool: String,
        /// Failure details.
        message: String,
    },
}

impl ToolError {
    /// Creates a handler failure.
    pub fn handler_failure(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HandlerFailure {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Outcome of dispatching one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallResult {
    /// Call id from the model's request.
    pub call_id: String,
    /// Tool name.
    pub tool_name: String,
    /// Text handed back to the model.
    pub content: String,
    /// True when `content` describes a failure rather than tool output.
    pub is_error: bool,
}

impl ToolCallResult {
    fn success(call: &ToolCallRequest, content: String) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            content,
            is_error: false,
        }
    }

    fn failure(call: &ToolCallRequest, error: &ToolError) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            content: format!("Error: {error}"),
            is_error: true,
        }
    }

    /// Converts this result into a tool turn for the transcript.
    pub fn into_turn(self) -> Turn {
        Turn::tool(self.call_id, self.content)
    }
}

struct RegisteredTool {
    spec: ToolSpec,
    handler: Arc<dyn ToolHandler>,
    enabled: bool,
}

/// Registry of tools available to an agent run.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

/// Registration errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// A tool with this name is already registered.
    #[error("tool '{name}' already registered")]
    DuplicateName {
        /// Conflicting name.
        name: String,
    },
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool. Fails if the name is already taken.
    pub fn register(
        &mut self,
        spec: ToolSpec,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RegistrationError> {
        let name = spec.name.to_string();
        if self.tools.contains_key(&name) {
            return Err(RegistrationError::DuplicateName { name });
        }
        self.tools.insert(
            name,
            RegisteredTool {
                spec,
                handler,
                enabled: true,
            },
        );
        Ok(())
    }

    /// Applies a tool allow-list. `None` enables every registered tool.
    ///
    /// Names in the list that match no registered tool are ignored with a
    /// warning, so a typo narrows the tool set instead of failing startup.
    pub fn apply_allow_list(&mut self, allow_list: Option<&[String]>) {
        match allow_list {
            None => {
                for tool in self.tools.values_mut() {
                    tool.enabled = true;
                }
            }
            Some(names) => {
                for unknown in names.iter().filter(|n| !self.tools.contains_key(*n)) {
                    warn!(tool = %unknown, "allow-list names an unregistered tool");
                }
                for (name, tool) in self.tools.iter_mut() {
                    tool.enabled = names.iter().any(|n| n == name);
                }
            }
        }
    }

    /// Tools currently advertised to the model, sorted by name.
    pub fn advertised(&self) -> Vec<AdvertisedTool> {
        let mut tools: Vec<AdvertisedTool> = self
            .tools
            .values()
            .filter(|t| t.enabled)
            .map(|t| t.spec.advertise())
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// True when a tool is registered and enabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.tools.get(name).map(|t| t.enabled).unwrap_or(false)
    }

    /// Number of registered tools (enabled or not).
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Dispatches one tool call.
    ///
    /// Every failure mode (unknown tool, disabled tool, invalid arguments,
    /// handler failure) is converted into an error-flavored result for the
    /// model; this method never fails outward.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> ToolCallResult {
        let tool = match self.tools.get(&call.name) {
            Some(tool) => tool,
            None => {
                warn!(tool = %call.name, "model requested unknown tool");
                return ToolCallResult::failure(
                    call,
                    &ToolError::UnknownTool {
                        name: call.name.clone(),
                    },
                );
            }
        };

        if !tool.enabled {
            warn!(tool = %call.name, "model requested disabled tool");
            return ToolCallResult::failure(
                call,
                &ToolError::ToolDisabled {
                    name: call.name.clone(),
                },
            );
        }

        if let Some(problem) = tool.spec.check_arguments(&call.arguments) {
            debug!(tool = %call.name, %problem, "tool arguments rejected");
            return ToolCallResult::failure(
                call,
                &ToolError::InvalidArguments {
                    tool: call.name.clone(),
                    message: problem,
                },
            );
        }

        debug!(tool = %call.name, call_id = %call.id, "dispatching tool call");
        match tool.handler.call(&call.arguments).await {
            Ok(content) => ToolCallResult::success(call, content),
            Err(error) => {
                warn!(tool = %call.name, %error, "tool handler failed");
                ToolCallResult::failure(call, &error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tools::{ParamSpec, ParamType};
    use serde_json::json;

    struct EchoHandler;

    #[async_trait]
    impl ToolHandler for EchoHandler {
        async fn call(&self, arguments: &serde_json::Value) -> Result<String, ToolError> {
            Ok(arguments["query"].as_str().unwrap_or_default().to_string())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl ToolHandler for FailingHandler {
        async fn call(&self, _arguments: &serde_json::Value) -> Result<String, ToolError> {
            Err(ToolError::handler_failure("broken_tool", "backend down"))
        }
    }

    fn echo_spec() -> ToolSpec {
        ToolSpec::new("echo", "Echoes the query").with_param(ParamSpec::required(
            "query",
            ParamType::String,
            "Text to echo",
        ))
    }

    fn registry_with_echo() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .register(echo_spec(), Arc::new(EchoHandler))
            .unwrap();
        registry
    }

    #[test]
    fn register_rejects_duplicate_names() {
        let mut registry = registry_with_echo();
        let result = registry.register(echo_spec(), Arc::new(EchoHandler));
        assert!(matches!(
            result,
            Err(RegistrationError::DuplicateName { name }) if name == "echo"
        ));
    }

    #[tokio::test]
    async fn dispatch_runs_enabled_tool() {
        let registry = registry_with_echo();
        let call = ToolCallRequest::new("c1", "echo", json!({"query": "hello"}));

        let result = registry.dispatch(&call).await;
        assert!(!result.is_error);
        assert_eq!(result.content, "hello");
        assert_eq!(result.call_id, "c1");
    }

    #[tokio::test]
    async fn dispatch_rejects_unknown_tool() {
        let registry = registry_with_echo();
        let call = ToolCallRequest::new("c1", "missing", json!({}));

        let result = registry.dispatch(&call).await;
        assert!(result.is_error);
        assert!(result.content.contains("unknown tool"));
    }

    #[tokio::test]
    async fn dispatch_rejects_disabled_tool() {
        let mut registry = registry_with_echo();
        registry.apply_allow_list(Some(&["other".to_string()]));
        let call = ToolCallRequest::new("c1", "echo", json!({"query": "hi"}));

        let result = registry.dispatch(&call).await;
        assert!(result.is_error);
        assert!(result.content.contains("disabled"));
    }

    #[tokio::test]
    async fn dispatch_validates_arguments_before_handler() {
        let registry = registry_with_echo();
        let call = ToolCallRequest::new("c1", "echo", json!({"query": 42}));

        let result = registry.dispatch(&call).await;
        assert!(result.is_error);
        assert!(result.content.contains("invalid arguments"));
    }

    #[tokio::test]
    async fn dispatch_catches_handler_failure() {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolSpec::new("broken_tool", "Always fails"),
                Arc::new(FailingHandler),
            )
            .unwrap();
        let call = ToolCallRequest::new("c1", "broken_tool", json!({}));

        let result = registry.dispatch(&call).await;
        assert!(result.is_error);
        assert!(result.content.contains("backend down"));
    }

    #[test]
    fn advertised_excludes_disabled_and_sorts() {
        let mut registry = registry_with_echo();
        registry
            .register(
                ToolSpec::new("another", "Another tool"),
                Arc::new(EchoHandler),
            )
            .unwrap();

        let names: Vec<String> = registry.advertised().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["another", "echo"]);

        registry.apply_allow_list(Some(&["echo".to_string()]));
        let names: Vec<String> = registry.advertised().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["echo"]);
    }

    #[test]
    fn allow_list_none_reenables_everything() {
        let mut registry = registry_with_echo();
        registry.apply_allow_list(Some(&[]));
        assert!(!registry.is_enabled("echo"));

        registry.apply_allow_list(None);
        assert!(registry.is_enabled("echo"));
    }

    #[test]
    fn result_into_turn_carries_call_id() {
        let call = ToolCallRequest::new("c9", "echo", json!({"query": "x"}));
        let result = ToolCallResult::success(&call, "x".to_string());
        let turn = result.into_turn();
        assert_eq!(turn.tool_call_id.as_deref(), Some("c9"));
    }
}
