//! # Conversation Orchestrator
//!
//! Drives one conversational turn from submission to rendered reply:
//!
//! ```text
//! submit(text)
//!   ├─ validate ──✗──▶ notify(warning/error) ──▶ Idle   (nothing stored)
//!   └─ ✓ append user ─▶ clear input ─▶ "Processing..." ─▶ responder.respond().await
//!                                                          ├─ Ok  ─▶ append assistant ─▶ "Ready" ─▶ sound ─▶ stats
//!                                                          └─ Err ─▶ notify(error) ─▶ "Error"       (nothing stored)
//! ```
//!
//! With `serialize_turns` on, a turn holds an async gate from the user
//! append until the assistant append, so overlapping submissions queue in
//! arrival order. With it off, two turns' appends may interleave; each
//! append is still atomic.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use log::{debug, info, warn};
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};

use crate::core::action::{TurnEvent, TurnState};
use crate::core::config::ResolvedConfig;
use crate::core::export::{self, ExportError, ExportFormat};
use crate::core::host::{ChatHost, Severity, SoundCue, StatusKind};
use crate::core::message::{Message, Sender};
use crate::core::stats::SessionStats;
use crate::core::store::SharedConversation;
use crate::core::validation::{DEFAULT_MAX_INPUT_CHARS, ValidationError, validate};
use crate::markup;
use crate::responder::{Responder, ResponderError};

/// How a single `submit` ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The assistant message that was appended.
    Completed(Message),
    Rejected(ValidationError),
    Failed(ResponderError),
}

/// Knobs the orchestrator reads for every turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPolicy {
    pub max_input_chars: usize,
    pub serialize_turns: bool,
}

impl Default for TurnPolicy {
    fn default() -> Self {
        Self {
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            serialize_turns: true,
        }
    }
}

impl From<&ResolvedConfig> for TurnPolicy {
    fn from(config: &ResolvedConfig) -> Self {
        Self {
            max_input_chars: config.max_input_chars,
            serialize_turns: config.serialize_turns,
        }
    }
}

/// Counts an accepted turn as in flight until dropped, including when the
/// `submit` future is abandoned mid-await.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Orchestrator {
    conversation: SharedConversation,
    responder: Arc<dyn Responder>,
    host: Arc<dyn ChatHost>,
    policy: TurnPolicy,
    sound_enabled: AtomicBool,
    turn_gate: AsyncMutex<()>,
    in_flight: AtomicUsize,
}

impl Orchestrator {
    pub fn new(
        conversation: SharedConversation,
        responder: Arc<dyn Responder>,
        host: Arc<dyn ChatHost>,
        policy: TurnPolicy,
    ) -> Self {
        Self {
            conversation,
            responder,
            host,
            policy,
            sound_enabled: AtomicBool::new(true),
            turn_gate: AsyncMutex::new(()),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn conversation(&self) -> &SharedConversation {
        &self.conversation
    }

    pub fn policy(&self) -> TurnPolicy {
        self.policy
    }

    pub fn stats(&self) -> SessionStats {
        self.conversation.stats()
    }

    pub fn set_sound_enabled(&self, enabled: bool) {
        self.sound_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled.load(Ordering::Relaxed)
    }

    /// True while any accepted submission is waiting on the responder.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    async fn gate(&self) -> Option<AsyncMutexGuard<'_, ()>> {
        if self.policy.serialize_turns {
            Some(self.turn_gate.lock().await)
        } else {
            None
        }
    }

    fn transition(state: TurnState, event: TurnEvent) -> TurnState {
        let next = state.next(event);
        debug!("Turn: {:?} --{:?}--> {:?}", state, event, next);
        next
    }

    /// Applies the last event of a turn. Every path must land in `Idle`.
    fn finish(state: TurnState, event: TurnEvent) -> TurnState {
        let end = Self::transition(state, event);
        if !end.is_idle() {
            warn!("Turn ended in {:?} after {:?}, expected Idle", end, event);
        }
        end
    }

    /// Runs one full turn for `text`.
    pub async fn submit(&self, text: &str) -> TurnOutcome {
        let mut state = Self::transition(TurnState::Idle, TurnEvent::Submit);

        let accepted = match validate(text, self.policy.max_input_chars) {
            Ok(trimmed) => trimmed,
            Err(err) => {
                state = Self::transition(state, TurnEvent::Invalid);
                info!("Submission rejected: {}", err);
                let severity = match err {
                    ValidationError::Empty => Severity::Warning,
                    ValidationError::TooLong { .. } => Severity::Error,
                };
                self.host.notify(&err.user_message(), severity);
                Self::finish(state, TurnEvent::Acknowledged);
                return TurnOutcome::Rejected(err);
            }
        };

        let _gate = self.gate().await;
        let _in_flight = InFlight::enter(&self.in_flight);

        let user_message = self.conversation.lock().append(accepted, Sender::User);
        state = Self::transition(state, TurnEvent::Accepted);
        info!(
            "Accepted submission #{} ({} chars)",
            user_message.id(),
            accepted.chars().count()
        );

        self.host
            .show_message(&user_message, &markup::format(user_message.content()));
        self.host.clear_input();
        self.host.set_status("Processing...", StatusKind::Processing);
        self.host.set_typing(true);
        self.host.show_stats(self.stats());

        let result = self.responder.respond(accepted).await;
        self.host.set_typing(false);

        match result {
            Ok(reply) => {
                state = Self::transition(state, TurnEvent::ResponseReady);
                let rendered = markup::format(&reply.body);
                let assistant_message = {
                    let mut conv = self.conversation.lock();
                    conv.record_latency(reply.latency_ms);
                    conv.append(reply.body, Sender::Assistant)
                };
                self.host.show_message(&assistant_message, &rendered);
                self.host.set_status("Ready", StatusKind::Ready);
                if self.sound_enabled() {
                    self.host.play_sound(SoundCue::Success);
                }
                self.host.show_stats(self.stats());
                Self::finish(state, TurnEvent::Rendered);
                info!(
                    "Turn #{} completed by {} in {}ms",
                    user_message.id(),
                    self.responder.name(),
                    reply.latency_ms
                );
                TurnOutcome::Completed(assistant_message)
            }
            Err(err) => {
                Self::finish(state, TurnEvent::ResponseFailed);
                warn!("Responder failed for turn #{}: {}", user_message.id(), err);
                self.host.notify("Failed to get response", Severity::Error);
                self.host.set_status("Error", StatusKind::Error);
                TurnOutcome::Failed(err)
            }
        }
    }

    /// Empties the conversation. Waits for an in-flight turn first when turns
    /// are serialized, so a reply never lands in a freshly cleared history.
    pub async fn clear_history(&self) {
        let _gate = self.gate().await;
        self.conversation.lock().clear();
        info!("Chat history cleared");
        self.host.show_stats(self.stats());
        self.host.notify("Chat history cleared", Severity::Success);
    }

    /// Writes the transcript into `dir`. An empty conversation is reported
    /// as a warning and nothing is written.
    pub fn export(&self, dir: &Path, format: ExportFormat) -> Result<PathBuf, ExportError> {
        let messages = self.conversation.snapshot();
        match export::export_to_dir(&messages, dir, format) {
            Ok(path) => {
                self.host.notify("Chat exported successfully", Severity::Success);
                Ok(path)
            }
            Err(ExportError::Empty) => {
                self.host.notify("No messages to export", Severity::Warning);
                Err(ExportError::Empty)
            }
            Err(e) => {
                warn!("Export failed: {}", e);
                self.host.notify("Export failed", Severity::Error);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::{CannedResponder, DelayRange, ResponseTable};
    use crate::test_support::{FailingResponder, HostEvent, RecordingHost, test_orchestrator};

    #[tokio::test]
    async fn test_submit_hello_end_to_end() {
        let (orch, host) = test_orchestrator();
        let outcome = orch.submit("hello").await;

        let expected = ResponseTable::builtin().lookup("hello").unwrap().to_string();
        match outcome {
            TurnOutcome::Completed(msg) => assert_eq!(msg.content(), expected),
            other => panic!("expected completion, got {:?}", other),
        }

        let messages = orch.conversation().snapshot();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender(), Sender::User);
        assert_eq!(messages[0].content(), "hello");
        assert_eq!(messages[1].sender(), Sender::Assistant);
        assert_eq!(orch.stats().message_count, 2);
        assert!(host.events().contains(&HostEvent::Status("Ready".into(), StatusKind::Ready)));
    }

    #[tokio::test]
    async fn test_submit_stores_trimmed_text() {
        let (orch, _host) = test_orchestrator();
        orch.submit("   hello  \n").await;
        assert_eq!(orch.conversation().snapshot()[0].content(), "hello");
    }

    #[tokio::test]
    async fn test_empty_submission_rejected_with_warning() {
        let (orch, host) = test_orchestrator();
        let outcome = orch.submit("   ").await;

        assert_eq!(outcome, TurnOutcome::Rejected(ValidationError::Empty));
        assert!(orch.conversation().snapshot().is_empty());
        assert_eq!(
            host.events(),
            vec![HostEvent::Notify("Please enter a message".into(), Severity::Warning)]
        );
    }

    #[tokio::test]
    async fn test_length_boundary() {
        let (orch, host) = test_orchestrator();

        let ok = orch.submit(&"a".repeat(2000)).await;
        assert!(matches!(ok, TurnOutcome::Completed(_)));
        assert_eq!(orch.stats().message_count, 2);

        let rejected = orch.submit(&"a".repeat(2001)).await;
        assert!(matches!(rejected, TurnOutcome::Rejected(ValidationError::TooLong { .. })));
        assert_eq!(orch.stats().message_count, 2);
        assert!(host.events().contains(&HostEvent::Notify(
            "Message exceeds 2000 characters".into(),
            Severity::Error
        )));
    }

    #[tokio::test]
    async fn test_failure_keeps_user_message_only() {
        let host = Arc::new(RecordingHost::default());
        let orch = Orchestrator::new(
            SharedConversation::new(),
            Arc::new(FailingResponder),
            host.clone(),
            TurnPolicy::default(),
        );

        let outcome = orch.submit("hello").await;
        assert!(matches!(outcome, TurnOutcome::Failed(_)));

        let messages = orch.conversation().snapshot();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].sender(), Sender::User);
        assert!(!orch.is_busy());

        let events = host.events();
        assert!(events.contains(&HostEvent::Notify(
            "Failed to get response".into(),
            Severity::Error
        )));
        assert!(events.contains(&HostEvent::Status("Error".into(), StatusKind::Error)));
        assert!(events.contains(&HostEvent::Typing(false)));
        assert!(!events.iter().any(|e| matches!(e, HostEvent::Sound(_))));
    }

    #[tokio::test]
    async fn test_sound_is_gated_by_setting() {
        let (orch, host) = test_orchestrator();
        orch.submit("hello").await;
        assert!(host.events().contains(&HostEvent::Sound(SoundCue::Success)));

        let (orch, host) = test_orchestrator();
        orch.set_sound_enabled(false);
        orch.submit("hello").await;
        assert!(!host.events().iter().any(|e| matches!(e, HostEvent::Sound(_))));
    }

    #[tokio::test]
    async fn test_host_event_order_for_success() {
        let (orch, host) = test_orchestrator();
        orch.submit("blockchain").await;

        let kinds: Vec<&'static str> = host.events().iter().map(HostEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                "message", "clear_input", "status", "typing", "stats", "typing", "message",
                "status", "sound", "stats",
            ]
        );
    }

    #[tokio::test]
    async fn test_assistant_message_rendered_through_formatter() {
        let (orch, host) = test_orchestrator();
        orch.submit("quantum computing").await;

        let markup = host
            .events()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::Message(Sender::Assistant, markup) => Some(markup),
                _ => None,
            })
            .next()
            .unwrap();
        assert!(markup.contains("<strong>Key Concepts:</strong>"));
        assert!(markup.contains("<div class=\"code-block\">"));
    }

    #[tokio::test]
    async fn test_latency_recorded_from_reply() {
        let host = Arc::new(RecordingHost::default());
        let responder =
            CannedResponder::new(ResponseTable::builtin(), DelayRange::from_millis(20, 20));
        let orch = Orchestrator::new(
            SharedConversation::new(),
            Arc::new(responder),
            host,
            TurnPolicy::default(),
        );
        orch.submit("hello").await;
        assert!(orch.stats().last_response_latency_ms >= 20);
    }

    #[tokio::test]
    async fn test_clear_history_resets_and_notifies() {
        let (orch, host) = test_orchestrator();
        orch.submit("hello").await;
        orch.clear_history().await;

        let stats = orch.stats();
        assert_eq!(stats.message_count, 0);
        assert_eq!(stats.total_tokens, 0);
        assert!(host.events().contains(&HostEvent::Notify(
            "Chat history cleared".into(),
            Severity::Success
        )));
    }

    #[tokio::test]
    async fn test_export_empty_warns() {
        let (orch, host) = test_orchestrator();
        let dir = tempfile::tempdir().unwrap();
        let result = orch.export(dir.path(), ExportFormat::Text);
        assert!(matches!(result, Err(ExportError::Empty)));
        assert_eq!(
            host.events(),
            vec![HostEvent::Notify("No messages to export".into(), Severity::Warning)]
        );
    }

    #[tokio::test]
    async fn test_export_writes_transcript() {
        let (orch, host) = test_orchestrator();
        orch.submit("hello").await;
        let dir = tempfile::tempdir().unwrap();
        let path = orch.export(dir.path(), ExportFormat::Text).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("USER: hello"));
        assert!(text.contains("ASSISTANT: Hello!"));
        assert!(host.events().contains(&HostEvent::Notify(
            "Chat exported successfully".into(),
            Severity::Success
        )));
    }

    #[tokio::test]
    async fn test_serialized_turns_do_not_interleave() {
        let host = Arc::new(RecordingHost::default());
        let responder =
            CannedResponder::new(ResponseTable::builtin(), DelayRange::from_millis(5, 25));
        let orch = Orchestrator::new(
            SharedConversation::new(),
            Arc::new(responder),
            host,
            TurnPolicy::default(),
        );

        tokio::join!(orch.submit("hello"), orch.submit("blockchain"), orch.submit("ai trends"));

        let senders: Vec<Sender> = orch
            .conversation()
            .snapshot()
            .iter()
            .map(|m| m.sender())
            .collect();
        assert_eq!(senders.len(), 6);
        for pair in senders.chunks(2) {
            assert_eq!(pair, [Sender::User, Sender::Assistant]);
        }
    }

    #[tokio::test]
    async fn test_unserialized_turns_keep_aggregates_consistent() {
        let host = Arc::new(RecordingHost::default());
        let responder =
            CannedResponder::new(ResponseTable::builtin(), DelayRange::from_millis(5, 25));
        let orch = Orchestrator::new(
            SharedConversation::new(),
            Arc::new(responder),
            host,
            TurnPolicy {
                serialize_turns: false,
                ..TurnPolicy::default()
            },
        );

        tokio::join!(orch.submit("hello"), orch.submit("blockchain"));

        let conv = orch.conversation().lock();
        assert_eq!(conv.message_count(), 4);
        let recomputed: usize = conv.all().iter().map(|m| m.token_estimate()).sum();
        assert_eq!(conv.total_tokens(), recomputed);
    }

    #[tokio::test]
    async fn test_abandoned_turn_is_not_left_busy() {
        let host = Arc::new(RecordingHost::default());
        let responder =
            CannedResponder::new(ResponseTable::builtin(), DelayRange::from_millis(5000, 5000));
        let orch = Orchestrator::new(
            SharedConversation::new(),
            Arc::new(responder),
            host,
            TurnPolicy::default(),
        );

        {
            let turn = orch.submit("hello");
            tokio::pin!(turn);
            let timed_out =
                tokio::time::timeout(std::time::Duration::from_millis(20), &mut turn).await;
            assert!(timed_out.is_err());
            assert!(orch.is_busy());
        }

        assert!(!orch.is_busy());
        // The gate was released with the dropped turn.
        orch.clear_history().await;
        assert_eq!(orch.stats().message_count, 0);
    }

    #[test]
    fn test_every_turn_path_finishes_idle() {
        use TurnEvent::*;
        let rejected = Orchestrator::finish(TurnState::Rejected, Acknowledged);
        let rendered = Orchestrator::finish(TurnState::Rendering, Rendered);
        let failed = Orchestrator::finish(TurnState::AwaitingResponse, ResponseFailed);
        assert!(rejected.is_idle() && rendered.is_idle() && failed.is_idle());

        // An out-of-order finish is reported rather than forced to Idle.
        assert_eq!(
            Orchestrator::finish(TurnState::AwaitingResponse, Rendered),
            TurnState::AwaitingResponse
        );
    }
}
