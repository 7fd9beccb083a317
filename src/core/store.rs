//! # Message Store
//!
//! Append-only, ordered log of the conversation plus the aggregates the
//! stats bar shows.
//!
//! ```text
//! Conversation
//! ├── messages: Vec<Message>        // insertion order, never reordered
//! ├── next_id: u64                  // survives clear, so ids stay unique
//! ├── total_tokens: usize           // sum of token estimates
//! └── last_response_latency_ms      // written only on matcher resolution
//! ```
//!
//! Every mutation takes `&mut self`, so a reader holding a shared borrow (or
//! the lock around a [`SharedConversation`]) never sees an append without its
//! aggregate update.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::core::message::{Message, Sender};
use crate::core::stats::SessionStats;

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
    total_tokens: usize,
    last_response_latency_ms: Option<u64>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and updates the aggregates in the same step.
    /// Accepts any text; validation belongs to the orchestrator.
    pub fn append(&mut self, content: impl Into<String>, sender: Sender) -> Message {
        self.next_id += 1;
        let message = Message::new(self.next_id, content.into(), sender);
        self.total_tokens += message.token_estimate();
        self.messages.push(message.clone());
        debug!(
            "Appended {} message #{} ({} tokens, {} total)",
            sender.as_str(),
            message.id(),
            message.token_estimate(),
            self.total_tokens
        );
        message
    }

    /// Drops every message and resets count and tokens.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.total_tokens = 0;
        debug!("Conversation cleared");
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    pub fn last_response_latency_ms(&self) -> Option<u64> {
        self.last_response_latency_ms
    }

    pub(crate) fn record_latency(&mut self, latency_ms: u64) {
        self.last_response_latency_ms = Some(latency_ms);
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats::from_conversation(self)
    }
}

/// The conversation as shared between the orchestrator and the display layer.
#[derive(Debug, Clone, Default)]
pub struct SharedConversation(Arc<Mutex<Conversation>>);

impl SharedConversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the conversation. A poisoned lock still holds consistent data
    /// because no mutation can panic halfway through.
    pub fn lock(&self) -> MutexGuard<'_, Conversation> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn stats(&self) -> SessionStats {
        self.lock().stats()
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().all().to_vec()
    }
}
