//! HTTP handlers for the query endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::handlers::StructuredRunOutcome;
use crate::application::AppState;
use crate::domain::agent::{CancelFlag, RunError, RunOutcome};

use super::dto::{
    ErrorResponse, FreeformQueryRequest, FreeformQueryResponse, HealthResponse,
    StructuredQueryRequest, StructuredQueryResponse,
};

/// GET /health - liveness plus the active index backend.
pub async fn health(State(state): State<AppState>) -> Response {
    let response = HealthResponse {
        status: "ok",
        index_backend: state.index_backend,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// POST /api/query - run a free-form query.
pub async fn run_freeform_query(
    State(state): State<AppState>,
    Json(req): Json<FreeformQueryRequest>,
) -> Response {
    if req.query.trim().is_empty() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::validation("query must not be empty")),
        )
            .into_response();
    }

    match state.freeform.handle(req.query, CancelFlag::new()).await {
        RunOutcome::Done { answer, transcript } => {
            let response = FreeformQueryResponse {
                answer,
                turns: transcript.len(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        RunOutcome::Failed { error, .. } => run_error_response(&error),
    }
}

/// POST /api/link - run a structured entity-linking query.
pub async fn run_structured_query(
    State(state): State<AppState>,
    Json(req): Json<StructuredQueryRequest>,
) -> Response {
    match state.structured.handle(req.into(), CancelFlag::new()).await {
        Ok(StructuredRunOutcome::Done { result }) => {
            let response: StructuredQueryResponse = result.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(StructuredRunOutcome::Failed { error }) => run_error_response(&error),
        Err(validation) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::validation(validation.to_string())),
        )
            .into_response(),
    }
}

fn run_error_response(error: &RunError) -> Response {
    let status = match error {
        RunError::TurnBudgetExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RunError::ModelUnavailable { .. } => StatusCode::BAD_GATEWAY,
        RunError::Cancelled => StatusCode::REQUEST_TIMEOUT,
    };
    (status, Json(ErrorResponse::from_run_error(error))).into_response()
}
