//! Session statistics: a read-only projection over the conversation.

use std::fmt;

use crate::core::store::Conversation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub message_count: usize,
    pub total_tokens: usize,
    /// Zero until the first exchange completes.
    pub last_response_latency_ms: u64,
}

impl SessionStats {
    pub fn from_conversation(conv: &Conversation) -> Self {
        Self {
            message_count: conv.message_count(),
            total_tokens: conv.total_tokens(),
            last_response_latency_ms: conv.last_response_latency_ms().unwrap_or(0),
        }
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} messages · {} tokens · {}ms",
            self.message_count, self.total_tokens, self.last_response_latency_ms
        )
    }
}
