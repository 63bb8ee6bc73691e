//! Wire types for the Ollama chat API.
//!
//! Request types serialize to the shapes `/api/chat` and `/api/tags` expect.
//! Response types tolerate absent and unknown fields, so server-side
//! additions never break parsing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ─── Request Types ───────────────────────────────────────────────────────────

/// A single message in the conversation, as sent over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub options: GenerationOptions,
}

/// Sampling options forwarded to the model runtime.
///
/// Recognized fields are typed and validated at config load. Anything else
/// placed in `extra` is flattened into the same JSON object and passed
/// through to the server opaquely; the server owns its semantics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate (`num_predict` in Ollama terms).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

// ─── Response Types ──────────────────────────────────────────────────────────

/// One NDJSON unit from the `/api/chat` stream.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatStreamLine {
    #[serde(default)]
    pub message: Option<StreamMessage>,
    #[serde(default)]
    pub done: bool,
}

/// The message object within a stream unit.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Raw `/api/tags` response shape.
#[derive(Debug, Deserialize)]
pub struct TagsResponse {
    #[serde(default)]
    pub models: Vec<TagModel>,
}

/// Raw model entry from the tags endpoint.
#[derive(Debug, Deserialize)]
pub struct TagModel {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub details: Option<TagModelDetails>,
}

/// Details sub-object from the tags endpoint.
#[derive(Debug, Deserialize)]
pub struct TagModelDetails {
    pub parameter_size: Option<String>,
    pub quantization_level: Option<String>,
}

/// A model available on the inference server.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub size_bytes: u64,
    pub parameter_size: String,
    pub quantization_level: String,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
