//! Chat sessions
//!
//! A session is a bounded message history. The engine includes a trailing
//! window of it in the prompt so follow-up questions resolve references
//! like "it" or "that setting".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One turn in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Bounded conversation history for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    max_history: usize,
}

impl ChatSession {
    pub fn new(session_id: impl Into<String>, max_history: usize) -> Self {
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            created_at: Utc::now(),
            max_history,
        }
    }

    /// Append a message, dropping the oldest when over capacity
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if self.messages.len() > self.max_history {
            let excess = self.messages.len() - self.max_history;
            self.messages.drain(..excess);
        }
    }

    /// The trailing `window` messages, oldest first
    pub fn recent(&self, window: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_bounded() {
        let mut session = ChatSession::new("s1", 4);
        for i in 0..10 {
            session.push(ChatMessage::user(format!("message {}", i)));
        }
        assert_eq!(session.messages.len(), 4);
        assert_eq!(session.messages[0].content, "message 6");
    }

    #[test]
    fn recent_returns_trailing_window() {
        let mut session = ChatSession::new("s1", 10);
        for i in 0..5 {
            session.push(ChatMessage::user(format!("m{}", i)));
        }
        let recent = session.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "m3");
        assert_eq!(recent[1].content, "m4");

        // Window larger than history is fine
        assert_eq!(session.recent(100).len(), 5);
    }
}
