//! Inference Client — Ollama API client for local model servers.
//!
//! Everything that touches the network lives here:
//! - health probe and model catalog (`GET /api/tags`)
//! - streaming chat completions (`POST /api/chat`, NDJSON)
//! - client configuration loading from `localchat.yaml`
//!
//! The client speaks the Ollama wire protocol, so any server exposing it is
//! interchangeable via config; switching models or hosts is a config change,
//! not a code change.

pub mod client;
pub mod config;
pub mod errors;
pub mod streaming;
pub mod types;

// Re-exports for convenience
pub use client::OllamaClient;
pub use config::ClientConfig;
pub use errors::InferenceError;
pub use types::{ChatMessage, GenerationOptions, ModelInfo, Role};
