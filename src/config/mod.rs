//! Configuration types and path resolution for toolchat.
//!
//! Toolchat stores its settings as TOML at the platform's XDG config path
//! (e.g. `~/.config/toolchat/config.toml` on Linux) and session data under
//! the XDG data directory (`~/.local/share/toolchat/`). A `toolchat.toml`
//! in the project (found by walking up to the git root) overrides the
//! global file.

mod loader;
mod paths;
mod resolve;
mod types;

pub use types::Config;

use anyhow::{Context, Result};

impl Config {
    /// Load config with precedence: project > global > defaults.
    /// Creates default config file if none exists.
    pub fn load() -> Result<Self> {
        let global = Self::load_global()?;
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let project = Self::load_project(&cwd)?;

        let mut config = global;
        if let Some(proj) = project {
            config = Self::merge(config, proj);
        }

        config.resolve_substitutions();
        Ok(config)
    }

    /// The effective config as TOML, for `config show`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
