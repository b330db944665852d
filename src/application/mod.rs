//! Application layer - wiring and use-case handlers.

pub mod bootstrap;
pub mod handlers;
pub mod toolset;

pub use bootstrap::{AppState, BootstrapError};
