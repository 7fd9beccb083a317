//! # User Settings
//!
//! Theme, font size, auto-scroll and sound, persisted across sessions as
//! simple key/value pairs in `~/.chatsim/settings.toml`.
//!
//! Reads are forgiving: a missing file, a missing key or an unreadable value
//! falls back to that key's default. Writes go through `.tmp` + `rename()`.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    /// Follow the environment's preference.
    Auto,
}

impl Theme {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            "auto" => Some(Theme::Auto),
            _ => None,
        }
    }

    /// Collapses `Auto` to a concrete theme. `prefers_dark` comes from the
    /// environment (terminal background on the CLI).
    pub fn resolve(self, prefers_dark: bool) -> Theme {
        match self {
            Theme::Auto if prefers_dark => Theme::Dark,
            Theme::Auto => Theme::Light,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl FontSize {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "small" => Some(FontSize::Small),
            "medium" => Some(FontSize::Medium),
            "large" => Some(FontSize::Large),
            _ => None,
        }
    }

    /// Wrap width in columns for terminal output; bigger text, fewer columns.
    pub fn wrap_width(self) -> usize {
        match self {
            FontSize::Small => 100,
            FontSize::Medium => 80,
            FontSize::Large => 64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub theme: Theme,
    pub font_size: FontSize,
    pub auto_scroll: bool,
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            font_size: FontSize::Medium,
            auto_scroll: true,
            sound_enabled: true,
        }
    }
}

/// On-disk shape: every key optional and kept as a raw string so one bad
/// value cannot knock out the rest.
#[derive(Debug, Default, Deserialize)]
struct StoredSettings {
    theme: Option<String>,
    font_size: Option<String>,
    auto_scroll: Option<toml::Value>,
    sound_enabled: Option<toml::Value>,
}

/// Anything but an explicit "false" counts as on.
fn flag(value: Option<&toml::Value>) -> bool {
    match value {
        Some(toml::Value::Boolean(b)) => *b,
        Some(toml::Value::String(s)) => s != "false",
        _ => true,
    }
}

impl Settings {
    /// Parses settings TOML, defaulting each key independently.
    pub fn from_toml(contents: &str) -> Result<Settings, SettingsError> {
        let stored: StoredSettings = toml::from_str(contents).map_err(SettingsError::Parse)?;
        Ok(Settings {
            theme: stored
                .theme
                .as_deref()
                .and_then(Theme::parse)
                .unwrap_or_default(),
            font_size: stored
                .font_size
                .as_deref()
                .and_then(FontSize::parse)
                .unwrap_or_default(),
            auto_scroll: flag(stored.auto_scroll.as_ref()),
            sound_enabled: flag(stored.sound_enabled.as_ref()),
        })
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io(io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "settings I/O error: {e}"),
            SettingsError::Parse(e) => write!(f, "settings parse error: {e}"),
            SettingsError::Serialize(e) => write!(f, "settings serialize error: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Where settings survive between sessions.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Settings;
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Returns `~/.chatsim/settings.toml`.
pub fn settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".chatsim").join("settings.toml"))
}

pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Settings {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No settings at {}, using defaults", self.path.display());
                return Settings::default();
            }
            Err(e) => {
                warn!("Failed to read settings {}: {}", self.path.display(), e);
                return Settings::default();
            }
        };
        Settings::from_toml(&contents).unwrap_or_else(|e| {
            warn!("Ignoring malformed settings file: {}", e);
            Settings::default()
        })
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(SettingsError::Io)?;
        }
        let contents = toml::to_string_pretty(settings).map_err(SettingsError::Serialize)?;
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, contents).map_err(SettingsError::Io)?;
        fs::rename(&tmp_path, &self.path).map_err(SettingsError::Io)?;
        debug!("Settings saved to {}", self.path.display());
        Ok(())
    }
}

/// Keeps settings in memory only. Used when there is no home directory.
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Option<Settings>>,
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Settings {
        self.settings
            .lock()
            .map(|slot| (*slot).unwrap_or_default())
            .unwrap_or_default()
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Ok(mut slot) = self.settings.lock() {
            *slot = Some(*settings);
        }
        Ok(())
    }
}
