//! LLM provider adapters.
//!
//! `OpenAiCompatProvider` speaks the OpenAI chat-completions protocol and
//! covers both OpenAI and Mistral (same wire format, different base URL).
//! `OllamaProvider` speaks Ollama's native chat API for local models.

mod mock;
mod ollama;
mod openai;

pub use mock::MockLlmProvider;
pub use ollama::{OllamaConfig, OllamaProvider};
pub use openai::{OpenAiCompatConfig, OpenAiCompatProvider};
