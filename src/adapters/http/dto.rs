//! Wire DTOs for the query endpoints.
//!
//! Kept separate from the domain types so the wire format can evolve
//! without touching the core.

use serde::{Deserialize, Serialize};

use crate::domain::agent::RunError;
use crate::domain::query::{EntityClass, LinkedEntity, StructuredQuery, StructuredResult};

/// POST /api/query request body.
#[derive(Debug, Deserialize)]
pub struct FreeformQueryRequest {
    /// Free-form question text.
    pub query: String,
}

/// POST /api/link request body.
#[derive(Debug, Deserialize)]
pub struct StructuredQueryRequest {
    /// Entity class to link against.
    pub entity_class: EntityClass,
    /// Textual mention to resolve.
    pub entity_label: String,
    /// Optional location scope.
    #[serde(default)]
    pub location: Option<String>,
}

impl From<StructuredQueryRequest> for StructuredQuery {
    fn from(req: StructuredQueryRequest) -> Self {
        StructuredQuery {
            entity_class: req.entity_class,
            entity_label: req.entity_label,
            location: req.location,
        }
    }
}

/// Successful free-form query response.
#[derive(Debug, Serialize)]
pub struct FreeformQueryResponse {
    /// The model's final answer.
    pub answer: String,
    /// Number of turns in the transcript.
    pub turns: usize,
}

/// Successful structured query response.
#[derive(Debug, Serialize)]
pub struct StructuredQueryResponse {
    /// Linked entities (empty when coercion failed).
    pub entities: Vec<LinkedEntity>,
    /// True when the answer could not be coerced.
    pub coercion_failed: bool,
    /// The model's verbatim final answer.
    pub raw_answer: String,
}

impl From<StructuredResult> for StructuredQueryResponse {
    fn from(result: StructuredResult) -> Self {
        Self {
            entities: result.entities,
            coercion_failed: result.coercion_failed,
            raw_answer: result.raw_answer,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" when the process is serving.
    pub status: &'static str,
    /// Active vector index backend.
    pub index_backend: &'static str,
}

/// Structured failure payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Stable machine-readable error kind.
    pub code: &'static str,
    /// Human-readable message.
    pub message: String,
}

impl ErrorResponse {
    /// Creates an error response for a failed agent run.
    pub fn from_run_error(error: &RunError) -> Self {
        let code = match error {
            RunError::TurnBudgetExceeded { .. } => "turn_budget_exceeded",
            RunError::ModelUnavailable { .. } => "model_unavailable",
            RunError::Cancelled => "cancelled",
        };
        Self {
            code,
            message: error.to_string(),
        }
    }

    /// Creates a validation error response.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            code: "validation_failed",
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::LlmError;

    #[test]
    fn structured_request_deserializes_entity_class() {
        let raw = r#"{"entity_class": "AdministrativeBody", "entity_label": "Vast Bureau", "location": "Gent"}"#;
        let request: StructuredQueryRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.entity_class, EntityClass::AdministrativeBody);

        let query: StructuredQuery = request.into();
        assert_eq!(query.location.as_deref(), Some("Gent"));
    }

    #[test]
    fn unknown_entity_class_is_rejected() {
        let raw = r#"{"entity_class": "Spaceship", "entity_label": "x"}"#;
        assert!(serde_json::from_str::<StructuredQueryRequest>(raw).is_err());
    }

    #[test]
    fn run_errors_map_to_stable_codes() {
        let error = RunError::TurnBudgetExceeded { max_turns: 12 };
        assert_eq!(ErrorResponse::from_run_error(&error).code, "turn_budget_exceeded");

        let error = RunError::ModelUnavailable {
            source: LlmError::AuthenticationFailed,
        };
        assert_eq!(ErrorResponse::from_run_error(&error).code, "model_unavailable");
    }
}
