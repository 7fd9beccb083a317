//! # Turn State Machine
//!
//! Every submission walks one of two paths:
//!
//! ```text
//! Idle → Validating → AwaitingResponse → Rendering → Idle
//! Idle → Validating → Rejected → Idle
//! ```
//!
//! plus the failure edge `AwaitingResponse → Idle` when the responder errors.
//!
//! `TurnState::next()` is pure: it takes the current state and an event and
//! returns the new state. Events that make no sense in the current state
//! leave it unchanged. I/O happens in the orchestrator, not here.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    #[default]
    Idle,
    Validating,
    AwaitingResponse,
    Rendering,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnEvent {
    /// User pressed Enter / clicked send.
    Submit,
    /// Input passed validation and the user message was stored.
    Accepted,
    /// Input was empty or too long.
    Invalid,
    /// The rejection was reported to the user.
    Acknowledged,
    /// Responder resolved with a body.
    ResponseReady,
    /// Responder resolved with an error.
    ResponseFailed,
    /// Assistant message stored and shown.
    Rendered,
}

impl TurnState {
    pub fn next(self, event: TurnEvent) -> TurnState {
        use TurnEvent::*;
        use TurnState::*;
        match (self, event) {
            (Idle, Submit) => Validating,
            (Validating, Accepted) => AwaitingResponse,
            (Validating, Invalid) => Rejected,
            (Rejected, Acknowledged) => Idle,
            (AwaitingResponse, ResponseReady) => Rendering,
            (AwaitingResponse, ResponseFailed) => Idle,
            (Rendering, Rendered) => Idle,
            (state, _) => state,
        }
    }

    pub fn is_idle(self) -> bool {
        self == TurnState::Idle
    }
}
