//! Domain layer - Core business logic.
//!
//! Pure logic with no knowledge of HTTP, wire formats, or concrete backends.
//! Depends on the ports layer for external capabilities.

pub mod agent;
pub mod conversation;
pub mod knowledge;
pub mod query;
pub mod tools;
