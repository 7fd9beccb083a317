//! # Messages
//!
//! One conversational turn. Messages are immutable once created; the only
//! way to get rid of one is a full-history clear.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Who produced a message.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

impl Sender {
    /// Lowercase name, as used in CSS classes and serialized output.
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }

    /// Uppercase label used in the plain-text transcript.
    pub fn label(self) -> &'static str {
        match self {
            Sender::User => "USER",
            Sender::Assistant => "ASSISTANT",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    id: u64,
    content: String,
    sender: Sender,
    timestamp: DateTime<Local>,
    token_estimate: usize,
}

impl Message {
    /// Only the store creates messages, so ids stay monotonic.
    pub(crate) fn new(id: u64, content: String, sender: Sender) -> Self {
        let token_estimate = estimate_tokens(&content);
        Self {
            id,
            content,
            sender,
            timestamp: Local::now(),
            token_estimate,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn token_estimate(&self) -> usize {
        self.token_estimate
    }
}

/// Rough cost proxy: one token per four characters, rounded up.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}
