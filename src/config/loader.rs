//! File loading and merging for toolchat configuration.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::types::{default_model, AgentConfig, Config, ToolsConfig};

impl Config {
    /// Loads the global config from `~/.config/toolchat/config.toml`.
    ///
    /// If no config file exists, creates one with sensible defaults and
    /// returns it.
    pub(super) fn load_global() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_or_create(&path)
    }

    fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            let default_toml = format!(
                r#"model = "{}"
base_url = "{{env:OLLAMA_HOST}}"

[agent]
max_rounds = {}
forced_tool_policy = "consume"

[tools]
# Allow delete_files. Leave off for untrusted checkouts.
trusted = false
command_timeout_secs = {}
exclude = ["**/node_modules/**"]
"#,
                default_model(),
                crate::constants::DEFAULT_MAX_ROUNDS,
                crate::constants::COMMAND_DEFAULT_TIMEOUT_SECS,
            );
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &default_toml)
                .with_context(|| format!("Failed to write default config to {:?}", path))?;
            let config: Config = toml::from_str(&default_toml)
                .with_context(|| "Failed to parse default config".to_string())?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {:?}", path))?;
        Ok(config)
    }

    /// Find `toolchat.toml` in `start`, then walk up to the git root.
    pub(super) fn find_project_file(start: &Path) -> Option<PathBuf> {
        let mut dir = start.to_path_buf();
        loop {
            let candidate = dir.join(crate::constants::PROJECT_CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            // Stop at git root or filesystem root
            if dir.join(".git").exists() || !dir.pop() {
                return None;
            }
        }
    }

    pub(super) fn load_project(start: &Path) -> Result<Option<Config>> {
        let Some(path) = Self::find_project_file(start) else {
            return Ok(None);
        };
        tracing::debug!(path = %path.display(), "loading project config");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read project config {:?}", path))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse project config {:?}", path))?;
        Ok(Some(config))
    }

    /// Merge project config over global config.
    /// Project values win when present.
    pub(super) fn merge(global: Config, project: Config) -> Config {
        Config {
            model: if project.model != default_model() {
                project.model
            } else {
                global.model
            },
            base_url: project.base_url.or(global.base_url),
            // Serde fills in the default prompt, so only a changed one overrides.
            system_prompt: match project.system_prompt {
                Some(p) if p != crate::constants::DEFAULT_SYSTEM_PROMPT => Some(p),
                _ => global.system_prompt,
            },
            max_input_tokens: project.max_input_tokens.or(global.max_input_tokens),
            log_level: project.log_level.or(global.log_level),
            token_counter: project.token_counter.or(global.token_counter),
            agent: AgentConfig {
                max_rounds: project.agent.max_rounds.or(global.agent.max_rounds),
                forced_tool_policy: project
                    .agent
                    .forced_tool_policy
                    .or(global.agent.forced_tool_policy),
            },
            tools: ToolsConfig {
                trusted: project.tools.trusted.or(global.tools.trusted),
                command_timeout_secs: project
                    .tools
                    .command_timeout_secs
                    .or(global.tools.command_timeout_secs),
                exclude: project.tools.exclude.or(global.tools.exclude),
                disabled: project.tools.disabled.or(global.tools.disabled),
            },
        }
    }
}
