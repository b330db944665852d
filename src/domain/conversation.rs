//! Conversation state: turns, roles, and tool call requests.
//!
//! The transcript is an append-only sequence of turns. Every provider adapter
//! translates between this representation and its own wire format, so the
//! agent loop never sees provider-specific message shapes.

use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
    /// Tool execution result.
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        f.write_str(s)
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Provider-assigned call id; echoed back in the tool result turn.
    pub id: String,
    /// Tool name as advertised.
    pub name: String,
    /// Arguments as a JSON object.
    pub arguments: serde_json::Value,
}

impl ToolCallRequest {
    /// Creates a new tool call request.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// One entry in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this turn.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Tool calls requested (assistant turns only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
    /// Id of the tool call this turn answers (tool turns only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Turn {
    /// Creates a system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Creates an assistant turn carrying tool call requests.
    pub fn assistant_with_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Creates a tool result turn answering `tool_call_id`.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Append-only conversation transcript.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    turns: Vec<Turn>,
}

impl ConversationState {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transcript seeded with a system prompt and user query.
    pub fn with_prompt(system_prompt: impl Into<String>, user_query: impl Into<String>) -> Self {
        Self {
            turns: vec![Turn::system(system_prompt), Turn::user(user_query)],
        }
    }

    /// Appends a turn.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns in the transcript.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Last assistant turn content, if any.
    pub fn last_assistant_content(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.content.as_str())
    }

    /// Consumes the transcript, returning its turns.
    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_prompt_seeds_system_then_user() {
        let state = ConversationState::with_prompt("You link entities.", "Who signed this?");
        assert_eq!(state.len(), 2);
        assert_eq!(state.turns()[0].role, Role::System);
        assert_eq!(state.turns()[1].role, Role::User);
    }

    #[test]
    fn last_assistant_content_skips_tool_turns() {
        let mut state = ConversationState::new();
        state.push(Turn::user("q"));
        state.push(Turn::assistant("first answer"));
        state.push(Turn::tool("call-1", "{\"rows\":[]}"));

        assert_eq!(state.last_assistant_content(), Some("first answer"));
    }

    #[test]
    fn tool_turn_carries_call_id() {
        let turn = Turn::tool("call-7", "result");
        assert_eq!(turn.role, Role::Tool);
        assert_eq!(turn.tool_call_id.as_deref(), Some("call-7"));
    }

    #[test]
    fn turn_serialization_omits_empty_fields() {
        let json = serde_json::to_value(Turn::user("hello")).unwrap();
        assert!(json.get("tool_calls").is_none());
        assert!(json.get("tool_call_id").is_none());
    }
}
