//! # Core Application Logic
//!
//! The message pipeline. It knows nothing about any specific UI technology;
//! everything user-facing goes through the [`host::ChatHost`] trait.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Conversation (store) │
//!                    │  • TurnState (machine)  │
//!                    │  • Orchestrator         │
//!                    └───────────┬─────────────┘
//!                                │ ChatHost
//!                    ┌───────────┴─────────────┐
//!                    ▼                         ▼
//!             ┌────────────┐            ┌────────────┐
//!             │    CLI     │            │   Tests    │
//!             │  Adapter   │            │ (recorder) │
//!             │ (crossterm)│            │            │
//!             └────────────┘            └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`message`]: `Message` and the token estimate
//! - [`store`]: the append-only `Conversation` and its aggregates
//! - [`stats`]: `SessionStats`, a projection over the store
//! - [`action`]: `TurnState`, the per-submission state machine
//! - [`orchestrator`]: sequences submit → respond → render
//! - [`host`]: the collaborator traits the UI implements
//! - [`config`], [`settings`], [`export`]: configuration, persisted
//!   preferences and transcript export

pub mod action;
pub mod config;
pub mod export;
pub mod host;
pub mod message;
pub mod orchestrator;
pub mod settings;
pub mod stats;
pub mod store;
pub mod validation;

// Re-export commonly used types for convenience
pub use message::{Message, Sender};
pub use orchestrator::{Orchestrator, TurnOutcome, TurnPolicy};
pub use store::{Conversation, SharedConversation};
