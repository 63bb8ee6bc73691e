//! Ollama API client.
//!
//! Issues the health probe, model catalog query, and streaming chat request
//! against a local inference server. Failure policy per operation:
//!
//! - [`OllamaClient::check_availability`] never errors; any failure is `false`.
//! - [`OllamaClient::list_models`] never errors; any failure is an empty list.
//! - [`OllamaClient::chat_stream`] folds failures into the stream itself:
//!   a transport error or non-success status becomes a single synthesized
//!   error fragment and the stream ends. Nothing is retried; the caller
//!   resubmits.

use std::time::Duration;

use futures::future::Either;
use futures::stream::{self, Stream};

use super::config::ClientConfig;
use super::errors::InferenceError;
use super::streaming::parse_chat_stream;
use super::types::{ChatMessage, ChatRequest, GenerationOptions, ModelInfo, TagsResponse};

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Health probe timeout.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Model catalog query timeout.
const TAGS_TIMEOUT: Duration = Duration::from_secs(10);

/// Total request timeout for streaming chat calls.
///
/// Reasoning models spend a long time inside the thinking block before the
/// first answer token arrives; a short timeout here reads as an empty
/// response to the caller.
const STREAM_TIMEOUT: Duration = Duration::from_secs(120);

// ─── OllamaClient ────────────────────────────────────────────────────────────

/// Client for a local Ollama-compatible inference server.
pub struct OllamaClient {
    /// HTTP client for probe and catalog requests (10s timeout).
    http: reqwest::Client,
    /// HTTP client for streaming chat requests (120s timeout).
    http_stream: reqwest::Client,
    /// Server base URL, e.g. `http://localhost:11434`.
    base_url: String,
}

impl OllamaClient {
    /// Create a client for the given server base URL.
    ///
    /// Does NOT check connectivity; that is the health probe's job.
    pub fn new(base_url: impl Into<String>) -> Result<Self, InferenceError> {
        let base_url = base_url.into();

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(TAGS_TIMEOUT)
            .build()
            .map_err(|e| InferenceError::Config {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        let http_stream = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(STREAM_TIMEOUT)
            .build()
            .map_err(|e| InferenceError::Config {
                reason: format!("failed to build streaming HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            http_stream,
            base_url,
        })
    }

    /// Create a client from the loaded configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, InferenceError> {
        Self::new(config.base_url.clone())
    }

    /// The server base URL this client targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ─── Health Check ────────────────────────────────────────────────────

    /// Bounded-timeout health probe against the catalog endpoint.
    ///
    /// `true` iff the server answers 2xx within the probe timeout. Network
    /// failures and non-success statuses both read as "not available".
    pub async fn check_availability(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.http.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    // ─── Model Catalog ───────────────────────────────────────────────────

    /// List the models available on the server.
    ///
    /// Returns an empty list on any failure; the underlying error is logged
    /// at debug level, never surfaced.
    pub async fn list_models(&self) -> Vec<ModelInfo> {
        let url = format!("{}/api/tags", self.base_url);

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, "model catalog query failed");
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "model catalog returned non-success");
            return Vec::new();
        }

        let tags: TagsResponse = match response.json().await {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!(error = %e, "model catalog parse failed");
                return Vec::new();
            }
        };

        tags.models
            .into_iter()
            .map(|m| {
                let details = m.details.unwrap_or(super::types::TagModelDetails {
                    parameter_size: None,
                    quantization_level: None,
                });
                ModelInfo {
                    name: m.name,
                    size_bytes: m.size,
                    parameter_size: details.parameter_size.unwrap_or_default(),
                    quantization_level: details.quantization_level.unwrap_or_default(),
                }
            })
            .collect()
    }

    // ─── Streaming Chat ──────────────────────────────────────────────────

    /// Open a streaming chat request and yield content fragments as they
    /// arrive.
    ///
    /// The returned stream is lazy, finite, and non-restartable: it ends
    /// when the server signals completion or the connection closes. On a
    /// non-success status or transport failure it yields exactly one
    /// human-readable error string and terminates.
    pub async fn chat_stream(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        options: GenerationOptions,
    ) -> impl Stream<Item = String> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model: model.to_string(),
            messages,
            stream: true,
            options,
        };

        tracing::info!(
            url = %url,
            model = %body.model,
            message_count = body.messages.len(),
            "chat request"
        );

        match self.send_chat_request(&url, &body).await {
            Ok(response) => Either::Right(parse_chat_stream(response)),
            Err(err) => {
                tracing::warn!(error = %err, "chat request failed");
                let msg = err.to_string();
                Either::Left(stream::once(async move { msg }))
            }
        }
    }

    /// Issue a single chat request and check the response status.
    async fn send_chat_request(
        &self,
        url: &str,
        body: &ChatRequest,
    ) -> Result<reqwest::Response, InferenceError> {
        let response = self
            .http_stream
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| InferenceError::from_transport(url, &e, STREAM_TIMEOUT.as_secs()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::HttpStatus {
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
