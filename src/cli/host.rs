//! The terminal as a [`ChatHost`].
//!
//! Messages are printed as wrapped, sender-coloured blocks. Status and stats
//! are not printed on every change; they are folded into the input prompt so
//! the scrollback stays readable.

use std::fmt::Display;
use std::io::{Write, stdout};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossterm::QueueableCommand;
use crossterm::cursor::MoveToPreviousLine;
use crossterm::style::{Color, Stylize, style};
use crossterm::terminal::{Clear, ClearType};
use log::debug;

use crate::core::host::{ChatHost, Severity, SoundCue, StatusKind};
use crate::core::message::{Message, Sender};
use crate::core::settings::{Settings, Theme};
use crate::core::stats::SessionStats;
use crate::core::validation::SOFT_LIMIT_CHARS;

/// Colours for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub user: Color,
    pub assistant: Color,
    pub meta: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme.resolve(terminal_prefers_dark()) {
            Theme::Light => Palette {
                user: Color::DarkBlue,
                assistant: Color::DarkGreen,
                meta: Color::DarkGrey,
                success: Color::DarkGreen,
                warning: Color::DarkYellow,
                error: Color::DarkRed,
            },
            _ => Palette {
                user: Color::Cyan,
                assistant: Color::Green,
                meta: Color::DarkGrey,
                success: Color::Green,
                warning: Color::Yellow,
                error: Color::Red,
            },
        }
    }
}

/// Reads `COLORFGBG` ("fg;bg"). Backgrounds 7 and 9-15 are light.
pub fn terminal_prefers_dark() -> bool {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|v| v.rsplit(';').next().and_then(|bg| bg.trim().parse::<u8>().ok()))
        .map(|bg| !(bg == 7 || bg >= 9))
        .unwrap_or(true)
}

#[derive(Debug)]
struct View {
    palette: Palette,
    wrap_width: usize,
    status: (String, StatusKind),
    stats: SessionStats,
    typing: bool,
    voice_mode: bool,
}

/// Where host output goes; stdout outside of tests.
pub type Output = Box<dyn Write + Send>;

pub struct TerminalHost {
    view: Mutex<View>,
    out: Mutex<Output>,
    /// Print the formatted markup instead of the raw text.
    show_markup: bool,
}

impl TerminalHost {
    pub fn new(settings: &Settings, show_markup: bool) -> Self {
        Self::with_output(settings, show_markup, Box::new(stdout()))
    }

    pub fn with_output(settings: &Settings, show_markup: bool, out: Output) -> Self {
        Self {
            view: Mutex::new(View {
                palette: Palette::for_theme(settings.theme),
                wrap_width: settings.font_size.wrap_width(),
                status: ("Ready".to_string(), StatusKind::Ready),
                stats: SessionStats::default(),
                typing: false,
                voice_mode: false,
            }),
            out: Mutex::new(out),
            show_markup,
        }
    }

    fn view(&self) -> MutexGuard<'_, View> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Lock order: view, then out.
    fn out(&self) -> MutexGuard<'_, Output> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, line: impl Display) {
        let mut out = self.out();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }

    pub fn apply_settings(&self, settings: &Settings) {
        let mut view = self.view();
        view.palette = Palette::for_theme(settings.theme);
        view.wrap_width = settings.font_size.wrap_width();
    }

    /// Shown as a microphone marker in front of the prompt.
    pub fn set_voice_mode(&self, on: bool) {
        self.view().voice_mode = on;
    }

    /// The input prompt: voice marker, status and running stats.
    pub fn prompt(&self) -> String {
        let view = self.view();
        let (label, kind) = &view.status;
        let colour = match kind {
            StatusKind::Ready => view.palette.success,
            StatusKind::Processing | StatusKind::Warning => view.palette.warning,
            StatusKind::Error => view.palette.error,
        };
        format!(
            "{}{} {} › ",
            if view.voice_mode { "🎤 " } else { "" },
            style(format!("({label})")).with(colour),
            style(format!("[{}]", view.stats)).with(view.palette.meta)
        )
    }

    pub fn print_stats(&self) {
        let view = self.view();
        self.emit(
            style(format!(
                "Messages: {}  Tokens: {}  Last response: {}ms",
                view.stats.message_count, view.stats.total_tokens, view.stats.last_response_latency_ms
            ))
            .with(view.palette.meta),
        );
    }

    pub fn print_welcome(&self, quick_prompts: &[(&str, &str)]) {
        let view = self.view();
        self.emit("");
        self.emit(style("Welcome to Chatsim").with(view.palette.assistant).bold());
        self.emit("Ask me anything about technology, science, programming, or just chat!");
        for (i, (label, _)) in quick_prompts.iter().enumerate() {
            self.emit(format!(
                "  {} {}",
                style(format!("/{}", i + 1)).with(view.palette.user),
                label
            ));
        }
        self.emit("");
    }

    pub fn print_line(&self, text: &str) {
        let view = self.view();
        self.emit(style(text).with(view.palette.meta));
    }

    /// Character counter feedback for long drafts.
    pub fn warn_if_near_limit(&self, draft: &str, max_chars: usize) {
        let len = draft.chars().count();
        if len > SOFT_LIMIT_CHARS {
            let view = self.view();
            self.emit(style(format!("{len}/{max_chars} characters")).with(view.palette.warning));
        }
    }
}

impl ChatHost for TerminalHost {
    fn notify(&self, message: &str, severity: Severity) {
        let view = self.view();
        let (icon, colour) = match severity {
            Severity::Success => ("✔", view.palette.success),
            Severity::Warning => ("⚠", view.palette.warning),
            Severity::Error => ("✖", view.palette.error),
        };
        self.emit(style(format!("{icon} {message}")).with(colour));
    }

    fn set_status(&self, label: &str, kind: StatusKind) {
        debug!("Status: {} ({:?})", label, kind);
        self.view().status = (label.to_string(), kind);
    }

    fn clear_input(&self) {
        // The line reader already consumed the draft.
        debug!("Input cleared");
    }

    fn set_typing(&self, visible: bool) {
        let mut view = self.view();
        if visible && !view.typing {
            self.emit(style("  ● ● ●").with(view.palette.meta));
        } else if !visible && view.typing {
            let mut out = self.out();
            let _ = out
                .queue(MoveToPreviousLine(1))
                .and_then(|out| out.queue(Clear(ClearType::CurrentLine)))
                .and_then(|out| out.flush());
        }
        view.typing = visible;
    }

    fn show_message(&self, message: &Message, markup: &str) {
        let view = self.view();
        let (name, colour) = match message.sender() {
            Sender::User => ("You", view.palette.user),
            Sender::Assistant => ("Assistant", view.palette.assistant),
        };
        self.emit(format!(
            "{} {}",
            style(name).with(colour).bold(),
            style(format!(
                "{} · ⚡{} tokens",
                message.timestamp().format("%H:%M:%S"),
                message.token_estimate()
            ))
            .with(view.palette.meta)
        ));

        let body = if self.show_markup { markup } else { message.content() };
        let options = textwrap::Options::new(view.wrap_width)
            .initial_indent("  ")
            .subsequent_indent("  ");
        self.emit(textwrap::fill(body, options));
        self.emit("");
    }

    fn show_stats(&self, stats: SessionStats) {
        self.view().stats = stats;
    }

    fn play_sound(&self, cue: SoundCue) {
        debug!("Sound cue {:?} ({} Hz)", cue, cue.frequency());
        // The terminal has a single tone; failures stay silent.
        if cue == SoundCue::Success {
            let mut out = self.out();
            let _ = out.write_all(b"\x07");
            let _ = out.flush();
        }
    }
}
