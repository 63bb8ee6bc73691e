//! End-to-end tests against a minimal in-process HTTP server.
//!
//! The server speaks just enough HTTP/1.1 to exercise the client: it reads
//! one request per connection, writes a canned response, and closes the
//! socket. Responses carry no Content-Length, so the NDJSON body is
//! EOF-delimited, which reqwest handles.

use futures::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use localchat::chat::{split_response, ChatSession};
use localchat::inference::types::GenerationOptions;
use localchat::inference::{OllamaClient, Role};

// ─── Mock server ─────────────────────────────────────────────────────────────

/// Spawn a server that answers every connection with `response`.
/// Returns the base URL to point the client at.
async fn spawn_server(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut data = Vec::with_capacity(4096);
                let mut buf = [0u8; 4096];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) => break,
                        Ok(n) => {
                            data.extend_from_slice(&buf[..n]);
                            if request_complete(&data) {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

/// A request is complete once the headers have arrived along with any body
/// the Content-Length header declares.
fn request_complete(data: &[u8]) -> bool {
    let Some(headers_end) = find_subslice(data, b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&data[..headers_end]);
    let content_length = headers
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse::<usize>().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);
    data.len() >= headers_end + 4 + content_length
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Base URL of a port nothing is listening on.
fn dead_server_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

// ─── Canned responses ────────────────────────────────────────────────────────

const TAGS_OK: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: application/json\r\n\
Connection: close\r\n\
\r\n\
{\"models\":[{\"name\":\"deepseek-r1:8b\",\"size\":4700000000,\"details\":{\"parameter_size\":\"8B\",\"quantization_level\":\"Q4_K_M\"}},{\"name\":\"qwen3:4b\",\"size\":2500000000}]}";

const CHAT_REASONING: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: application/x-ndjson\r\n\
Connection: close\r\n\
\r\n\
{\"message\":{\"content\":\"<think>\"},\"done\":false}\n\
{\"message\":{\"content\":\"compute\"},\"done\":false}\n\
{\"message\":{\"content\":\"</think>4\"},\"done\":false}\n\
{\"done\":true}\n";

const CHAT_MALFORMED_LINE: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: application/x-ndjson\r\n\
Connection: close\r\n\
\r\n\
{\"message\":{\"content\":\"first\"},\"done\":false}\n\
this line is not json\n\
{\"message\":{\"content\":\" second\"},\"done\":false}\n\
{\"done\":true}\n";

const CHAT_CONTENT_ON_DONE: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: application/x-ndjson\r\n\
Connection: close\r\n\
\r\n\
{\"message\":{\"content\":\"head\"},\"done\":false}\n\
{\"message\":{\"content\":\" tail\"},\"done\":true}\n";

const HTTP_500: &str = "HTTP/1.1 500 Internal Server Error\r\n\
Content-Length: 0\r\n\
Connection: close\r\n\
\r\n";

// ─── Health probe ────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_probe_unreachable_server_is_false() {
    let client = OllamaClient::new(dead_server_url()).unwrap();
    assert!(!client.check_availability().await);
}

#[tokio::test]
async fn health_probe_running_server_is_true() {
    let base = spawn_server(TAGS_OK).await;
    let client = OllamaClient::new(base).unwrap();
    assert!(client.check_availability().await);
}

#[tokio::test]
async fn health_probe_error_status_is_false() {
    let base = spawn_server(HTTP_500).await;
    let client = OllamaClient::new(base).unwrap();
    assert!(!client.check_availability().await);
}

// ─── Model catalog ───────────────────────────────────────────────────────────

#[tokio::test]
async fn list_models_parses_catalog() {
    let base = spawn_server(TAGS_OK).await;
    let client = OllamaClient::new(base).unwrap();

    let models = client.list_models().await;
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].name, "deepseek-r1:8b");
    assert_eq!(models[0].parameter_size, "8B");
    assert_eq!(models[0].quantization_level, "Q4_K_M");
    // Second entry has no details object; fields default to empty
    assert_eq!(models[1].name, "qwen3:4b");
    assert_eq!(models[1].parameter_size, "");
}

#[tokio::test]
async fn list_models_unreachable_server_is_empty() {
    let client = OllamaClient::new(dead_server_url()).unwrap();
    assert!(client.list_models().await.is_empty());
}

#[tokio::test]
async fn list_models_error_status_is_empty() {
    let base = spawn_server(HTTP_500).await;
    let client = OllamaClient::new(base).unwrap();
    assert!(client.list_models().await.is_empty());
}

// ─── Streaming chat ──────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_stream_yields_fragments_in_order() {
    let base = spawn_server(CHAT_REASONING).await;
    let client = OllamaClient::new(base).unwrap();

    let mut session = ChatSession::new(true);
    session.push_user("2+2?");

    let stream = client
        .chat_stream("deepseek-r1:8b", session.build_messages(), GenerationOptions::default())
        .await;
    let fragments: Vec<String> = stream.collect().await;

    assert_eq!(fragments, vec!["<think>", "compute", "</think>4"]);
}

#[tokio::test]
async fn chat_stream_end_to_end_records_reasoning_turn() {
    let base = spawn_server(CHAT_REASONING).await;
    let client = OllamaClient::new(base).unwrap();

    let mut session = ChatSession::new(true);
    session.push_user("2+2?");

    let stream = client
        .chat_stream("deepseek-r1:8b", session.build_messages(), GenerationOptions::default())
        .await;
    let accumulated: String = stream.collect::<Vec<String>>().await.concat();

    session.record_response(&accumulated);

    let turn = session.turns().last().unwrap();
    assert_eq!(turn.role, Role::Assistant);
    assert_eq!(turn.content, "4");
    assert_eq!(turn.reasoning.as_deref(), Some("compute"));
}

#[tokio::test]
async fn chat_stream_split_converges_on_every_prefix() {
    // Re-splitting the accumulated text after each fragment must end at the
    // same result as splitting the final text once
    let base = spawn_server(CHAT_REASONING).await;
    let client = OllamaClient::new(base).unwrap();

    let stream = client
        .chat_stream("deepseek-r1:8b", Vec::new(), GenerationOptions::default())
        .await;
    futures::pin_mut!(stream);

    let mut accumulated = String::new();
    let mut last = split_response(&accumulated);
    while let Some(fragment) = stream.next().await {
        accumulated.push_str(&fragment);
        last = split_response(&accumulated);
    }

    assert_eq!(last.reasoning, "compute");
    assert_eq!(last.answer, "4");
}

#[tokio::test]
async fn chat_stream_skips_malformed_lines() {
    let base = spawn_server(CHAT_MALFORMED_LINE).await;
    let client = OllamaClient::new(base).unwrap();

    let stream = client
        .chat_stream("deepseek-r1:8b", Vec::new(), GenerationOptions::default())
        .await;
    let fragments: Vec<String> = stream.collect().await;

    assert_eq!(fragments, vec!["first", " second"]);
}

#[tokio::test]
async fn chat_stream_yields_content_on_done_line() {
    let base = spawn_server(CHAT_CONTENT_ON_DONE).await;
    let client = OllamaClient::new(base).unwrap();

    let stream = client
        .chat_stream("deepseek-r1:8b", Vec::new(), GenerationOptions::default())
        .await;
    let fragments: Vec<String> = stream.collect().await;

    assert_eq!(fragments, vec!["head", " tail"]);
}

#[tokio::test]
async fn chat_stream_http_error_yields_single_fragment() {
    let base = spawn_server(HTTP_500).await;
    let client = OllamaClient::new(base).unwrap();

    let stream = client
        .chat_stream("deepseek-r1:8b", Vec::new(), GenerationOptions::default())
        .await;
    let fragments: Vec<String> = stream.collect().await;

    assert_eq!(fragments.len(), 1);
    assert!(
        fragments[0].contains("500"),
        "error fragment should name the status: {}",
        fragments[0]
    );
}

#[tokio::test]
async fn chat_stream_transport_failure_yields_single_fragment() {
    let client = OllamaClient::new(dead_server_url()).unwrap();

    let stream = client
        .chat_stream("deepseek-r1:8b", Vec::new(), GenerationOptions::default())
        .await;
    let fragments: Vec<String> = stream.collect().await;

    assert_eq!(fragments.len(), 1);
    assert!(
        fragments[0].contains("connection failed") || fragments[0].contains("timeout"),
        "error fragment should describe the failure: {}",
        fragments[0]
    );
}

#[tokio::test]
async fn error_fragment_is_recorded_as_assistant_turn() {
    // Taxonomy case (d): the conversation still records the failed turn
    let client = OllamaClient::new(dead_server_url()).unwrap();

    let mut session = ChatSession::new(true);
    session.push_user("hello?");

    let stream = client
        .chat_stream("deepseek-r1:8b", session.build_messages(), GenerationOptions::default())
        .await;
    let accumulated: String = stream.collect::<Vec<String>>().await.concat();
    session.record_response(&accumulated);

    let turn = session.turns().last().unwrap();
    assert_eq!(turn.role, Role::Assistant);
    assert!(!turn.content.is_empty());
    assert!(turn.reasoning.is_none());
}
