//! Loading `config.toml` and layering it with the environment and CLI.

use crate::view_state::anchor::ScrollConfig;
use crate::view_state::cache::CacheConfig;
use crate::view_state::context::LayoutStyle;
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "CHATLAYOUT_CONFIG";

/// Environment variable overriding the local sender id.
pub const LOCAL_SENDER_ENV_VAR: &str = "CHATLAYOUT_LOCAL_SENDER";

/// Failure to locate, read or parse a config file.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config path could not be used.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// The file exists but reading it failed.
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// File that was read.
        path: PathBuf,
        /// I/O error text.
        reason: String,
    },

    /// The file is not valid TOML or has unknown keys.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// File that was parsed.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },
}

/// On-disk configuration. Every key is optional; absent keys fall back to
/// [`ResolvedConfig::default`]. Example `~/.config/chatlayout/config.toml`:
///
/// ```toml
/// local_sender = "me"
/// auto_scroll = true
///
/// [layout]
/// avatar_policy = "every_message"
///
/// [layout.bubble]
/// max_width_percent = 70
///
/// [layout.timestamps]
/// gap_threshold_secs = 600
///
/// [cache]
/// min_capacity = 2000
///
/// [scroll]
/// epsilon = 2
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Sender id whose messages are outgoing.
    #[serde(default)]
    pub local_sender: Option<String>,

    /// Follow the newest message on append.
    #[serde(default)]
    pub auto_scroll: Option<bool>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,

    /// Layout style; omitted fields keep their defaults.
    #[serde(default)]
    pub layout: Option<LayoutStyle>,

    /// Cache sizing.
    #[serde(default)]
    pub cache: Option<CacheConfig>,

    /// Scroll anchoring tolerance.
    #[serde(default)]
    pub scroll: Option<ScrollConfig>,
}

/// Final configuration the binary runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Sender id whose messages are outgoing.
    pub local_sender: String,
    /// Follow the newest message on append.
    pub auto_scroll: bool,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
    /// Layout style.
    pub layout: LayoutStyle,
    /// Cache sizing.
    pub cache: CacheConfig,
    /// Scroll anchoring tolerance.
    pub scroll: ScrollConfig,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            local_sender: "me".to_string(),
            auto_scroll: true,
            log_file_path: default_log_path(),
            layout: LayoutStyle::default(),
            cache: CacheConfig::default(),
            scroll: ScrollConfig::default(),
        }
    }
}

/// `<state dir>/chatlayout/chatlayout.log`, or `./chatlayout.log` when the
/// platform has no state directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("chatlayout").join("chatlayout.log")
    } else {
        PathBuf::from("chatlayout.log")
    }
}

/// Reads and parses the file at `path`. A missing file yields `Ok(None)`.
///
/// # Errors
///
/// [`ConfigError::ReadError`] or [`ConfigError::ParseError`] when the file
/// exists but is unusable.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let text = std::fs::read_to_string(&path).map_err(|err| ConfigError::ReadError {
        path: path.clone(),
        reason: err.to_string(),
    })?;

    toml::from_str::<ConfigFile>(&text)
        .map(Some)
        .map_err(|err| ConfigError::ParseError {
            path,
            reason: err.to_string(),
        })
}

/// `<config dir>/chatlayout/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("chatlayout").join("config.toml"))
}

/// Picks which config file to read, first match wins:
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `CHATLAYOUT_CONFIG` environment variable
/// 3. Default path `~/.config/chatlayout/config.toml`
///
/// # Errors
///
/// An empty `CHATLAYOUT_CONFIG`, or a chosen file that cannot be read or
/// parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(explicit) = config_path {
        return load_config_file(explicit);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
        if env_path.is_empty() {
            return Err(ConfigError::InvalidPath(format!("{CONFIG_ENV_VAR} is empty")));
        }
        return load_config_file(PathBuf::from(env_path));
    }

    match default_config_path() {
        Some(path) => load_config_file(path),
        None => Ok(None),
    }
}

/// Applies `CHATLAYOUT_LOCAL_SENDER` when set and non-empty.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(sender) = std::env::var(LOCAL_SENDER_ENV_VAR) {
        if !sender.is_empty() {
            config.local_sender = sender;
        }
    }

    config
}

/// Fills every key the file left out from the defaults.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let base = ResolvedConfig::default();
    match config_file {
        None => base,
        Some(file) => ResolvedConfig {
            local_sender: file.local_sender.unwrap_or(base.local_sender),
            auto_scroll: file.auto_scroll.unwrap_or(base.auto_scroll),
            log_file_path: file.log_file_path.unwrap_or(base.log_file_path),
            layout: file.layout.unwrap_or(base.layout),
            cache: file.cache.unwrap_or(base.cache),
            scroll: file.scroll.unwrap_or(base.scroll),
        },
    }
}

/// Last layer: flags the user actually passed replace whatever the file
/// and environment produced.
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    local_sender_override: Option<String>,
    auto_scroll_override: Option<bool>,
) -> ResolvedConfig {
    if let Some(sender) = local_sender_override {
        config.local_sender = sender;
    }

    if let Some(auto_scroll) = auto_scroll_override {
        config.auto_scroll = auto_scroll;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
