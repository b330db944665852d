//! Vector index adapters: remote Qdrant and in-process memory.

mod in_memory;
mod qdrant;

pub use in_memory::InMemoryIndex;
pub use qdrant::{QdrantConfig, QdrantIndex};
