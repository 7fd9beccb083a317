//! # Terminal Adapter
//!
//! A line-based front end standing in for the browser widget. It owns every
//! collaborator the core talks to: the input surface (stdin), the display
//! (a [`TerminalHost`]), settings persistence, export, speech, and sound.
//!
//! Each input line is parsed into a [`Command`]. Chat submissions are awaited
//! inline, so the next line is not read until the reply is on screen.

pub mod event;
pub mod host;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::cli::event::{Command, HELP, QUICK_PROMPTS, parse};
use crate::cli::host::TerminalHost;
use crate::core::config::ResolvedConfig;
use crate::core::host::{ChatHost, Severity, SpeechError, SpeechInput, StatusKind, UnavailableSpeech};
use crate::core::orchestrator::{Orchestrator, TurnPolicy};
use crate::core::settings::{FileSettingsStore, MemorySettingsStore, Settings, SettingsStore, settings_path};
use crate::core::store::SharedConversation;
use crate::responder::CannedResponder;

/// Front-end switches that are not part of the resolved config.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Mute the chime for this session without touching saved settings.
    pub no_sound: bool,
    /// Show formatted markup instead of raw message text.
    pub show_markup: bool,
}

/// Everything the input loop needs between lines.
pub struct Session {
    orchestrator: Orchestrator,
    host: Arc<TerminalHost>,
    settings_store: Box<dyn SettingsStore>,
    settings: Settings,
    speech: Box<dyn SpeechInput>,
    export_dir: PathBuf,
    max_input_chars: usize,
    voice_mode: bool,
    speech_reported: bool,
    no_sound: bool,
}

/// What the loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    ConfirmClear,
    Quit,
}

fn default_settings_store() -> Box<dyn SettingsStore> {
    match settings_path() {
        Some(path) => Box::new(FileSettingsStore::new(path)),
        None => {
            warn!("No home directory; settings will not persist");
            Box::new(MemorySettingsStore::default())
        }
    }
}

impl Session {
    pub fn new(config: &ResolvedConfig, options: &RunOptions) -> Self {
        let host = Arc::new(TerminalHost::new(&Settings::default(), options.show_markup));
        Self::with_collaborators(
            config,
            options,
            host,
            default_settings_store(),
            Box::new(UnavailableSpeech),
        )
    }

    /// Builds a session around the given display, settings store and speech
    /// backend. Saved settings are loaded and applied here.
    pub fn with_collaborators(
        config: &ResolvedConfig,
        options: &RunOptions,
        host: Arc<TerminalHost>,
        settings_store: Box<dyn SettingsStore>,
        speech: Box<dyn SpeechInput>,
    ) -> Self {
        let settings = settings_store.load();
        let responder = CannedResponder::new(config.table.clone(), config.delay)
            .with_failure_rate(config.failure_rate);
        let orchestrator = Orchestrator::new(
            SharedConversation::new(),
            Arc::new(responder),
            host.clone(),
            TurnPolicy::from(config),
        );

        let session = Self {
            orchestrator,
            host,
            settings_store,
            settings,
            speech,
            export_dir: config.export_dir.clone(),
            max_input_chars: config.max_input_chars,
            voice_mode: false,
            speech_reported: false,
            no_sound: options.no_sound,
        };
        session.apply_settings();
        session
    }

    fn apply_settings(&self) {
        self.host.apply_settings(&self.settings);
        self.orchestrator
            .set_sound_enabled(self.settings.sound_enabled && !self.no_sound);
    }

    /// Persists and applies a settings change.
    fn update_settings(&mut self, change: impl FnOnce(&mut Settings), confirmation: &str) {
        change(&mut self.settings);
        self.apply_settings();
        match self.settings_store.save(&self.settings) {
            Ok(()) => self.host.notify(confirmation, Severity::Success),
            Err(e) => {
                warn!("Failed to save settings: {}", e);
                self.host
                    .notify("Setting applied but could not be saved", Severity::Warning);
            }
        }
    }

    async fn submit(&self, text: &str) {
        self.host.warn_if_near_limit(text, self.max_input_chars);
        self.orchestrator.submit(text).await;
    }

    async fn listen(&mut self) {
        self.host.set_status("Listening...", StatusKind::Warning);
        let heard = self.speech.listen().await;
        self.host.set_status("Ready", StatusKind::Ready);

        match heard {
            Ok(transcript) => {
                self.host.print_line(&format!("Heard: \"{transcript}\""));
                self.submit(&transcript).await;
            }
            Err(SpeechError::Unsupported) => {
                if !self.speech_reported {
                    self.speech_reported = true;
                    self.host.notify(
                        "Voice recognition not supported in this terminal",
                        Severity::Warning,
                    );
                }
            }
            Err(e) => self.host.notify(&e.to_string(), Severity::Error),
        }
    }

    async fn handle(&mut self, command: Command) -> Flow {
        match command {
            Command::Submit(text) => self.submit(&text).await,
            Command::QuickPrompt(i) => {
                if let Some((_, prompt)) = QUICK_PROMPTS.get(i) {
                    self.host.print_line(prompt);
                    self.submit(prompt).await;
                }
            }
            Command::Help => self.host.print_line(HELP),
            Command::Clear => return Flow::ConfirmClear,
            Command::Export(format) => {
                if let Ok(path) = self.orchestrator.export(&self.export_dir, format) {
                    self.host.print_line(&format!("Saved {}", path.display()));
                }
            }
            Command::Stats => self.host.print_stats(),
            Command::Theme(theme) => {
                self.update_settings(|s| s.theme = theme, "Theme updated");
            }
            Command::Font(size) => {
                self.update_settings(|s| s.font_size = size, "Font size updated");
            }
            Command::Sound(on) => {
                let msg = if on { "Sound enabled" } else { "Sound disabled" };
                self.update_settings(|s| s.sound_enabled = on, msg);
            }
            Command::AutoScroll(on) => {
                let msg = if on { "Auto-scroll enabled" } else { "Auto-scroll disabled" };
                self.update_settings(|s| s.auto_scroll = on, msg);
            }
            Command::Voice => self.listen().await,
            Command::VoiceMode => {
                self.voice_mode = !self.voice_mode;
                self.host.set_voice_mode(self.voice_mode);
                let state = if self.voice_mode { "enabled" } else { "disabled" };
                self.host
                    .notify(&format!("Voice mode {state}"), Severity::Success);
            }
            Command::Invalid(hint) => self.host.notify(&hint, Severity::Warning),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    async fn clear(&self) {
        self.orchestrator.clear_history().await;
        self.host.print_welcome(QUICK_PROMPTS);
    }
}

/// Reads one logical line; a trailing `\` joins the next physical line.
async fn read_message(lines: &mut Lines<BufReader<Stdin>>) -> io::Result<Option<String>> {
    let mut message = String::new();
    loop {
        let Some(line) = lines.next_line().await? else {
            return Ok(if message.is_empty() { None } else { Some(message) });
        };
        match line.strip_suffix('\\') {
            Some(head) => {
                message.push_str(head);
                message.push('\n');
            }
            None => {
                message.push_str(&line);
                return Ok(Some(message));
            }
        }
    }
}

fn show_prompt(prompt: &str) -> io::Result<()> {
    let mut out = io::stdout();
    write!(out, "{prompt}")?;
    out.flush()
}

pub async fn run(config: ResolvedConfig, options: RunOptions) -> io::Result<()> {
    let mut session = Session::new(&config, &options);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    session.host.print_welcome(QUICK_PROMPTS);
    session
        .host
        .notify("Welcome to Chatsim! 🚀", Severity::Success);

    loop {
        show_prompt(&session.host.prompt())?;
        let Some(line) = read_message(&mut lines).await? else {
            info!("Input closed");
            break;
        };

        match session.handle(parse(&line)).await {
            Flow::Continue => {}
            Flow::Quit => break,
            Flow::ConfirmClear => {
                show_prompt("Are you sure you want to clear chat history? [y/N] ")?;
                let answer = lines.next_line().await?.unwrap_or_default();
                if answer.trim().eq_ignore_ascii_case("y") {
                    session.clear().await;
                }
            }
        }
    }

    info!("Session ended with {}", session.orchestrator.stats());
    Ok(())
}
