//! NDJSON stream parser for `/api/chat` responses.
//!
//! Reads a `reqwest::Response` as a byte stream, splits it on line
//! boundaries, parses each line as a chat unit, and yields the content
//! fragments. Malformed lines are skipped. The stream ends at the unit
//! carrying `done: true` or when the connection closes, whichever comes
//! first; a mid-stream read failure is folded into one final synthesized
//! error fragment.

use futures::stream::{self, Stream, StreamExt};

use super::errors::InferenceError;
use super::types::ChatStreamLine;

// ─── Line parser ─────────────────────────────────────────────────────────────

/// What a single NDJSON line contributes to the stream.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum LineEvent {
    /// A content fragment to yield.
    Content(String),
    /// A content fragment on the terminal unit: yield it, then end.
    ContentThenDone(String),
    /// Terminal unit with no content.
    Done,
    /// Nothing usable on this line (blank, malformed, or no content field).
    Skip,
}

/// Parse one line of the wire response.
///
/// A line is usable only when it parses as a unit with a `message.content`
/// field; everything else is `Skip` (or `Done` when the unit carries the
/// completion flag).
pub(crate) fn parse_stream_line(line: &str) -> LineEvent {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineEvent::Skip;
    }

    let unit: ChatStreamLine = match serde_json::from_str(trimmed) {
        Ok(unit) => unit,
        Err(_) => return LineEvent::Skip,
    };

    let content = unit.message.and_then(|m| m.content);
    match (content, unit.done) {
        (Some(c), true) => LineEvent::ContentThenDone(c),
        (Some(c), false) => LineEvent::Content(c),
        (None, true) => LineEvent::Done,
        (None, false) => LineEvent::Skip,
    }
}

// ─── Stream assembly ─────────────────────────────────────────────────────────

/// Turn an open `/api/chat` response into a stream of content fragments.
///
/// Buffers bytes until a full line is available, then feeds it through
/// [`parse_stream_line`]. A trailing line without a final newline is still
/// parsed when the connection closes.
pub fn parse_chat_stream(response: reqwest::Response) -> impl Stream<Item = String> {
    let byte_stream = response.bytes_stream();

    stream::unfold(
        (byte_stream, String::new(), false),
        |(mut byte_stream, mut buffer, finished)| async move {
            if finished {
                return None;
            }
            loop {
                // Drain complete lines already in the buffer
                if let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].to_string();
                    buffer.drain(..=pos);
                    match parse_stream_line(&line) {
                        LineEvent::Content(c) => return Some((c, (byte_stream, buffer, false))),
                        LineEvent::ContentThenDone(c) => {
                            return Some((c, (byte_stream, buffer, true)))
                        }
                        LineEvent::Done => return None,
                        LineEvent::Skip => continue,
                    }
                }

                // Need more data from the wire
                match byte_stream.next().await {
                    Some(Ok(bytes)) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                    }
                    Some(Err(e)) => {
                        let msg = InferenceError::Stream {
                            reason: e.to_string(),
                        }
                        .to_string();
                        tracing::warn!(error = %msg, "chat stream read failed");
                        return Some((msg, (byte_stream, buffer, true)));
                    }
                    None => {
                        // Connection closed: flush a trailing unterminated line
                        if !buffer.trim().is_empty() {
                            let line = std::mem::take(&mut buffer);
                            match parse_stream_line(&line) {
                                LineEvent::Content(c) | LineEvent::ContentThenDone(c) => {
                                    return Some((c, (byte_stream, buffer, true)));
                                }
                                LineEvent::Done | LineEvent::Skip => {}
                            }
                        }
                        return None;
                    }
                }
            }
        },
    )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
