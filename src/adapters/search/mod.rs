//! Web search adapters.

mod duckduckgo;

pub use duckduckgo::{DuckDuckGoConfig, DuckDuckGoSearch};
