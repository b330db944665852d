//! Router assembly for the query front door.

use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::application::AppState;
use crate::config::ServerConfig;

use super::handlers::{health, run_freeform_query, run_structured_query};

/// Builds the application router with tracing, CORS and a request timeout.
pub fn build_router(state: AppState, server_config: &ServerConfig) -> Router {
    let cors = build_cors(server_config);
    let timeout = TimeoutLayer::new(Duration::from_secs(server_config.request_timeout_secs));

    Router::new()
        .route("/health", get(health))
        .route("/api/query", post(run_freeform_query))
        .route("/api/link", post(run_structured_query))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(timeout),
        )
        .with_state(state)
}

fn build_cors(server_config: &ServerConfig) -> CorsLayer {
    let origins = server_config.cors_origins_list();
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(parsed)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
    }
}
