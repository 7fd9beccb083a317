//! Input lines → commands.
//!
//! Anything not starting with `/` is a chat submission. `//text` sends
//! `/text` literally.

use crate::core::export::ExportFormat;
use crate::core::settings::{FontSize, Theme};

/// Prompts offered on the welcome screen, selectable with `/1`..`/4`.
pub const QUICK_PROMPTS: &[(&str, &str)] = &[
    ("Quantum Computing", "Explain quantum computing in simple terms"),
    ("AI Trends", "What are the latest AI trends?"),
    ("Machine Learning", "How does machine learning work?"),
    ("Blockchain", "Explain blockchain technology"),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Submit(String),
    Help,
    Clear,
    Export(ExportFormat),
    Stats,
    Theme(Theme),
    Font(FontSize),
    Sound(bool),
    AutoScroll(bool),
    Voice,
    VoiceMode,
    /// Zero-based index into [`QUICK_PROMPTS`].
    QuickPrompt(usize),
    Quit,
    /// Unknown command or bad argument; carries the usage hint.
    Invalid(String),
}

fn on_off(arg: Option<&str>) -> Option<bool> {
    match arg?.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

pub fn parse(line: &str) -> Command {
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Command::Submit(line.to_string());
    };
    if rest.starts_with('/') {
        return Command::Submit(rest.to_string());
    }

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or("").to_ascii_lowercase();
    let arg = parts.next();

    match name.as_str() {
        "help" | "h" | "?" => Command::Help,
        "clear" => Command::Clear,
        "export" => match arg {
            None => Command::Export(ExportFormat::Text),
            Some(fmt) => ExportFormat::parse(fmt)
                .map(Command::Export)
                .unwrap_or_else(|| Command::Invalid("usage: /export [text|json]".into())),
        },
        "stats" => Command::Stats,
        "theme" => arg
            .and_then(Theme::parse)
            .map(Command::Theme)
            .unwrap_or_else(|| Command::Invalid("usage: /theme dark|light|auto".into())),
        "font" => arg
            .and_then(FontSize::parse)
            .map(Command::Font)
            .unwrap_or_else(|| Command::Invalid("usage: /font small|medium|large".into())),
        "sound" => on_off(arg)
            .map(Command::Sound)
            .unwrap_or_else(|| Command::Invalid("usage: /sound on|off".into())),
        "autoscroll" => on_off(arg)
            .map(Command::AutoScroll)
            .unwrap_or_else(|| Command::Invalid("usage: /autoscroll on|off".into())),
        "voice" => Command::Voice,
        "voicemode" => Command::VoiceMode,
        "quit" | "exit" | "q" => Command::Quit,
        n => match n.parse::<usize>() {
            Ok(i) if (1..=QUICK_PROMPTS.len()).contains(&i) => Command::QuickPrompt(i - 1),
            _ => Command::Invalid(format!("unknown command /{n} (try /help)")),
        },
    }
}

pub const HELP: &str = "\
Commands:
  /help                      show this help
  /clear                     clear chat history
  /export [text|json]        save the conversation to a file
  /stats                     show message, token and latency stats
  /theme dark|light|auto     switch colour theme
  /font small|medium|large   change wrap width
  /sound on|off              toggle the reply chime
  /autoscroll on|off         toggle auto-scroll
  /voice                     dictate a message
  /voicemode                 toggle voice mode
  /1 .. /4                   send a quick prompt
  /quit                      leave
End a line with \\ to continue the message on the next line.";
