//! Decide Linker - LLM-driven entity linking for local government decisions.
//!
//! An agent service that maps textual mentions (mandataries, administrative
//! bodies, locations) onto canonical URIs by orchestrating a language model
//! over a registered tool set and an embedding-backed knowledge base.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
