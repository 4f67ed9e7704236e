//! Per-session chat state.
//!
//! The log is only ever appended to or reset; it is never empty.

use serde::Serialize;

use crate::agent::PendingWrite;

/// Message shown at the start of every session and after a reset.
pub const GREETING: &str = "Hello! How can I assist you with your database today?";

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "You",
            Self::Assistant => "pgchat",
        }
    }
}

/// One entry in the chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    role: ChatRole,
    text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// One user's conversation: the message log plus any write awaiting
/// confirmation.
#[derive(Debug, Clone)]
pub struct Session {
    messages: Vec<ChatMessage>,
    pending: Option<PendingWrite>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a session seeded with the greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::assistant(GREETING)],
            pending: None,
        }
    }

    /// Adds a message to the end of the log.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Replaces the log with the greeting and drops any pending write.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.messages.push(ChatMessage::assistant(GREETING));
        self.pending = None;
    }

    /// Iterates the log in insertion order.
    pub fn render(&self) -> impl Iterator<Item = &ChatMessage> + '_ {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn pending(&self) -> Option<&PendingWrite> {
        self.pending.as_ref()
    }

    pub fn set_pending(&mut self, pending: Option<PendingWrite>) {
        self.pending = pending;
    }

    pub fn take_pending(&mut self) -> Option<PendingWrite> {
        self.pending.take()
    }
}
