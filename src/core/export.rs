//! # Transcript Export
//!
//! Flattens the conversation into a downloadable file:
//!
//! ```text
//! [14:02:11] USER: hello
//!
//! [14:02:12] ASSISTANT: Hello! 👋 How can I assist you today?
//! ```
//!
//! Files are named `chat-<unix millis>.<ext>` and written atomically.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;

use crate::core::message::Message;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Text,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Some(ExportFormat::Text),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum ExportError {
    /// Nothing to export.
    Empty,
    Io(io::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Empty => write!(f, "no messages to export"),
            ExportError::Io(e) => write!(f, "export I/O error: {e}"),
            ExportError::Serialize(e) => write!(f, "export serialization error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

/// One line per message, separated by blank lines.
pub fn transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|msg| {
            format!(
                "[{}] {}: {}",
                msg.timestamp().format("%H:%M:%S"),
                msg.sender().label(),
                msg.content()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders the messages in the requested format.
pub fn render(messages: &[Message], format: ExportFormat) -> Result<String, ExportError> {
    if messages.is_empty() {
        return Err(ExportError::Empty);
    }
    match format {
        ExportFormat::Text => Ok(transcript(messages)),
        ExportFormat::Json => serde_json::to_string_pretty(messages).map_err(ExportError::Serialize),
    }
}

/// `chat-<unix millis>.<ext>`
pub fn export_file_name(format: ExportFormat) -> String {
    format!("chat-{}.{}", Utc::now().timestamp_millis(), format.extension())
}

/// Writes the export into `dir` and returns the path of the new file.
pub fn export_to_dir(
    messages: &[Message],
    dir: &Path,
    format: ExportFormat,
) -> Result<PathBuf, ExportError> {
    let body = render(messages, format)?;
    fs::create_dir_all(dir).map_err(ExportError::Io)?;

    let path = dir.join(export_file_name(format));
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, body).map_err(ExportError::Io)?;
    fs::rename(&tmp_path, &path).map_err(ExportError::Io)?;

    info!("Exported {} messages to {}", messages.len(), path.display());
    Ok(path)
}
