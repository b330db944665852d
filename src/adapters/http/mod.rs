//! HTTP surface - axum routes for the query front door.

mod dto;
mod handlers;
mod routes;

pub use routes::build_router;
