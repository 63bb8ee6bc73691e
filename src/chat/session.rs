//! In-memory chat session.
//!
//! The session is an explicit object handed to the presentation layer; there
//! is no ambient process-wide state. It lives for the process lifetime and
//! is dropped on exit; nothing is persisted.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::inference::types::{ChatMessage, Role};

use super::splitter::{split_response, SplitResponse};

/// One user or assistant turn in the conversation.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    /// Reasoning captured from the response when the model produced a closed
    /// reasoning block. Never sent back to the server.
    pub reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Conversation history plus display preferences for one interactive session.
///
/// Append-only while the session runs; role alternation is a convention, not
/// enforced. The single mutator of history is the active turn: the caller
/// holds `&mut self` across `push_user` → stream → `record_response`, so at
/// most one inference call is in flight per turn by construction.
pub struct ChatSession {
    id: String,
    turns: Vec<ConversationTurn>,
    /// Whether reasoning blocks are rendered.
    pub show_reasoning: bool,
}

impl ChatSession {
    /// Create a fresh session with an empty history.
    pub fn new(show_reasoning: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            turns: Vec::new(),
            show_reasoning,
        }
    }

    /// The session identifier (for log correlation).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The full conversation history, oldest first.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Append the user's message.
    pub fn push_user(&mut self, content: &str) {
        self.turns.push(ConversationTurn {
            role: Role::User,
            content: content.to_string(),
            reasoning: None,
            created_at: Utc::now(),
        });
    }

    /// Completion step for one inference call.
    ///
    /// Splits the accumulated response text and appends the assistant turn.
    /// When the answer region is empty (the whole response was an unclosed
    /// or bare reasoning block, or a synthesized error) the raw text is
    /// stored as content so the turn is never silently empty. Returns the
    /// split for final rendering.
    pub fn record_response(&mut self, full_text: &str) -> SplitResponse {
        let split = split_response(full_text);

        let content = if split.answer.is_empty() {
            full_text.to_string()
        } else {
            split.answer.clone()
        };
        let reasoning = (!split.reasoning.is_empty()).then(|| split.reasoning.clone());

        self.turns.push(ConversationTurn {
            role: Role::Assistant,
            content,
            reasoning,
            created_at: Utc::now(),
        });

        split
    }

    /// Wire messages for the next chat request. Reasoning text stays local.
    pub fn build_messages(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .map(|t| ChatMessage {
                role: t.role,
                content: t.content.clone(),
            })
            .collect()
    }

    /// Drop the conversation history, keeping the session and preferences.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Number of user turns so far.
    pub fn user_turn_count(&self) -> usize {
        self.turns.iter().filter(|t| t.role == Role::User).count()
    }

    /// Number of assistant turns so far.
    pub fn assistant_turn_count(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.role == Role::Assistant)
            .count()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
