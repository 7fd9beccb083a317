use std::fmt;

use async_trait::async_trait;

/// Errors a responder can resolve with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponderError {
    /// The simulated backend decided to fail this call.
    Simulated(String),
    /// The backend could not be reached at all.
    Unavailable(String),
}

impl fmt::Display for ResponderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponderError::Simulated(msg) => write!(f, "simulated failure: {msg}"),
            ResponderError::Unavailable(msg) => write!(f, "responder unavailable: {msg}"),
        }
    }
}

impl std::error::Error for ResponderError {}

/// A resolved response plus how long it took to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub body: String,
    /// Wall-clock time from invocation to resolution.
    pub latency_ms: u64,
}

#[async_trait]
pub trait Responder: Send + Sync {
    /// Returns the name of the responder.
    fn name(&self) -> &str;

    /// Produces the response body for one user submission. Once started the
    /// future always resolves; there is no cancellation path.
    async fn respond(&self, user_text: &str) -> Result<Reply, ResponderError>;
}
