//! Where toolchat keeps its files: config under the XDG config home,
//! sessions under the data home and readline history under the cache home.

use anyhow::Result;
use std::path::PathBuf;

use super::types::Config;
use crate::constants::{APP_NAME, CONFIG_FILENAME, HISTORY_FILENAME};

/// Subdirectory of [`Config::data_dir`] holding one JSON file per session.
const SESSIONS_DIRNAME: &str = "sessions";

/// `base/toolchat`, or an error naming which platform directory is missing.
fn app_dir(base: Option<PathBuf>, kind: &str) -> Result<PathBuf> {
    base.map(|dir| dir.join(APP_NAME))
        .ok_or_else(|| anyhow::anyhow!("Could not determine {} directory", kind))
}

impl Config {
    /// Returns `~/.config/toolchat/` on Linux (`XDG_CONFIG_HOME/toolchat`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform's config directory cannot be determined.
    pub fn config_dir() -> Result<PathBuf> {
        app_dir(dirs::config_dir(), "config")
    }

    /// Returns `~/.local/share/toolchat/` on Linux (`XDG_DATA_HOME/toolchat`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform's data directory cannot be determined.
    pub fn data_dir() -> Result<PathBuf> {
        app_dir(dirs::data_dir(), "data")
    }

    /// Returns `~/.cache/toolchat/` on Linux (`XDG_CACHE_HOME/toolchat`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform's cache directory cannot be determined.
    pub fn cache_dir() -> Result<PathBuf> {
        app_dir(dirs::cache_dir(), "cache")
    }

    /// Path to `config.toml`. The file may not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform's config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Directory holding saved chat sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform's data directory cannot be determined.
    pub fn sessions_dir() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join(SESSIONS_DIRNAME))
    }

    /// File the chat REPL loads and saves readline history from.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform's cache directory cannot be determined.
    pub fn history_path() -> Result<PathBuf> {
        Ok(Self::cache_dir()?.join(HISTORY_FILENAME))
    }
}
