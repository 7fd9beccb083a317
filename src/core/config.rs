//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.chatsim/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::validation::DEFAULT_MAX_INPUT_CHARS;
use crate::responder::table::{ResponseEntry, ResponseTable};
use crate::responder::DelayRange;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatsimConfig {
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub responses: Vec<ResponseEntry>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ChatConfig {
    pub max_input_chars: Option<usize>,
    pub min_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub failure_rate: Option<f64>,
    pub serialize_turns: Option<bool>,
    pub export_dir: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_MIN_DELAY_MS: u64 = 500;
pub const DEFAULT_MAX_DELAY_MS: u64 = 2000;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub max_input_chars: usize,
    pub delay: DelayRange,
    pub failure_rate: f64,
    pub serialize_turns: bool,
    pub export_dir: PathBuf,
    pub table: ResponseTable,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        resolve(&ChatsimConfig::default(), &CliOverrides::default())
    }
}

/// Values from CLI flags (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub min_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.chatsim/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".chatsim").join("config.toml"))
}

/// Load config from the default location.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ChatsimConfig::default()`.
pub fn load_config() -> Result<ChatsimConfig, ConfigError> {
    match config_path() {
        Some(path) => load_config_from(&path),
        None => {
            warn!("Could not determine home directory, using default config");
            Ok(ChatsimConfig::default())
        }
    }
}

/// Load config from an explicit path. Malformed files yield `ConfigError::Parse`.
pub fn load_config_from(path: &Path) -> Result<ChatsimConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(ChatsimConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ChatsimConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r#"# Chatsim Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [chat]
# max_input_chars = 2000
# min_delay_ms = 500                 # Or CHATSIM_MIN_DELAY_MS
# max_delay_ms = 2000                # Or CHATSIM_MAX_DELAY_MS
# failure_rate = 0.0                 # Probability a simulated reply fails
# serialize_turns = true             # Queue overlapping submissions
# export_dir = "."

# Replaces the built-in response table. First matching keyword wins.
# [[responses]]
# keyword = "rust"
# response = "Rust is a systems programming language."
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

fn env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring non-numeric {}={:?}", key, raw);
            None
        }
    }
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &ChatsimConfig, cli: &CliOverrides) -> ResolvedConfig {
    let min_delay_ms = cli
        .min_delay_ms
        .or_else(|| env_u64("CHATSIM_MIN_DELAY_MS"))
        .or(config.chat.min_delay_ms)
        .unwrap_or(DEFAULT_MIN_DELAY_MS);

    let max_delay_ms = cli
        .max_delay_ms
        .or_else(|| env_u64("CHATSIM_MAX_DELAY_MS"))
        .or(config.chat.max_delay_ms)
        .unwrap_or(DEFAULT_MAX_DELAY_MS);

    let max_input_chars = env_u64("CHATSIM_MAX_INPUT_CHARS")
        .map(|v| v as usize)
        .or(config.chat.max_input_chars)
        .unwrap_or(DEFAULT_MAX_INPUT_CHARS);

    let failure_rate = config
        .chat
        .failure_rate
        .filter(|r| !r.is_nan())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);

    // Custom responses replace the built-in table wholesale, order kept.
    let table = if config.responses.is_empty() {
        ResponseTable::builtin()
    } else {
        ResponseTable::new(
            config
                .responses
                .iter()
                .map(|e| (e.keyword.clone(), e.response.clone())),
        )
    };

    ResolvedConfig {
        max_input_chars,
        delay: DelayRange::from_millis(min_delay_ms, max_delay_ms),
        failure_rate,
        serialize_turns: config.chat.serialize_turns.unwrap_or(true),
        export_dir: config
            .chat
            .export_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
        table,
    }
}
