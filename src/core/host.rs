//! # Host Collaborators
//!
//! Everything the core needs from the surrounding UI: notifications, the
//! status pill, the input box, the message list, the stats bar, sound, and
//! speech input. The core only calls into these; it never reads anything
//! back except a speech transcript.

use std::fmt;

use async_trait::async_trait;

use crate::core::message::Message;
use crate::core::stats::SessionStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Ready,
    Processing,
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Success,
    Failure,
}

impl SoundCue {
    /// Tone frequency in Hz.
    pub fn frequency(self) -> u32 {
        match self {
            SoundCue::Success => 800,
            SoundCue::Failure => 400,
        }
    }
}

/// The display side of the widget. All calls are fire-and-forget.
pub trait ChatHost: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);

    fn set_status(&self, label: &str, kind: StatusKind);

    fn clear_input(&self);

    fn set_typing(&self, visible: bool);

    /// A message was appended. `markup` is the formatted content.
    fn show_message(&self, message: &Message, markup: &str);

    fn show_stats(&self, stats: SessionStats);

    fn play_sound(&self, cue: SoundCue);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    /// The environment has no speech recognition at all.
    Unsupported,
    Failed(String),
}

impl fmt::Display for SpeechError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpeechError::Unsupported => write!(f, "speech recognition unsupported"),
            SpeechError::Failed(msg) => write!(f, "voice error: {msg}"),
        }
    }
}

impl std::error::Error for SpeechError {}

/// Supplies a finalized transcript to populate the input box.
#[async_trait]
pub trait SpeechInput: Send + Sync {
    async fn listen(&self) -> Result<String, SpeechError>;
}

/// Speech backend for environments without a microphone pipeline.
pub struct UnavailableSpeech;

#[async_trait]
impl SpeechInput for UnavailableSpeech {
    async fn listen(&self) -> Result<String, SpeechError> {
        Err(SpeechError::Unsupported)
    }
}
