//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::host::{ChatHost, Severity, SoundCue, StatusKind};
use crate::core::message::{Message, Sender};
use crate::core::orchestrator::{Orchestrator, TurnPolicy};
use crate::core::stats::SessionStats;
use crate::core::store::SharedConversation;
use crate::responder::{
    CannedResponder, DelayRange, Reply, Responder, ResponderError, ResponseTable,
};

/// Everything a host was asked to do, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Notify(String, Severity),
    Status(String, StatusKind),
    ClearInput,
    Typing(bool),
    Message(Sender, String),
    Stats(SessionStats),
    Sound(SoundCue),
}

impl HostEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            HostEvent::Notify(..) => "notify",
            HostEvent::Status(..) => "status",
            HostEvent::ClearInput => "clear_input",
            HostEvent::Typing(_) => "typing",
            HostEvent::Message(..) => "message",
            HostEvent::Stats(_) => "stats",
            HostEvent::Sound(_) => "sound",
        }
    }
}

/// A host that records every call instead of drawing anything.
#[derive(Default)]
pub struct RecordingHost {
    events: Mutex<Vec<HostEvent>>,
}

impl RecordingHost {
    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: HostEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ChatHost for RecordingHost {
    fn notify(&self, message: &str, severity: Severity) {
        self.push(HostEvent::Notify(message.to_string(), severity));
    }

    fn set_status(&self, label: &str, kind: StatusKind) {
        self.push(HostEvent::Status(label.to_string(), kind));
    }

    fn clear_input(&self) {
        self.push(HostEvent::ClearInput);
    }

    fn set_typing(&self, visible: bool) {
        self.push(HostEvent::Typing(visible));
    }

    fn show_message(&self, message: &Message, markup: &str) {
        self.push(HostEvent::Message(message.sender(), markup.to_string()));
    }

    fn show_stats(&self, stats: SessionStats) {
        self.push(HostEvent::Stats(stats));
    }

    fn play_sound(&self, cue: SoundCue) {
        self.push(HostEvent::Sound(cue));
    }
}

/// A responder whose backend is always down.
pub struct FailingResponder;

#[async_trait]
impl Responder for FailingResponder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn respond(&self, _user_text: &str) -> Result<Reply, ResponderError> {
        Err(ResponderError::Unavailable("test backend offline".to_string()))
    }
}

/// Creates an orchestrator over the built-in table with no artificial delay.
pub fn test_orchestrator() -> (Orchestrator, Arc<RecordingHost>) {
    let host = Arc::new(RecordingHost::default());
    let responder = CannedResponder::new(ResponseTable::builtin(), DelayRange::instant());
    let orch = Orchestrator::new(
        SharedConversation::new(),
        Arc::new(responder),
        host.clone(),
        TurnPolicy::default(),
    );
    (orch, host)
}

/// A `Write` sink whose contents can be read back after the writer moved
/// into a host.
#[derive(Clone, Default)]
pub struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl CapturedOutput {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
