//! Struct definitions and serde defaults for toolchat configuration.

use serde::{Deserialize, Serialize};

use crate::agent::ForcedToolPolicy;
use crate::tokens::CounterKind;

/// Root configuration for toolchat, deserialized from `config.toml`.
///
/// Fields use serde defaults so toolchat can run with sensible defaults
/// when no config file exists. Optional fields fall back to the values in
/// [`crate::constants`] through the accessors in `resolve.rs`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Model name, matched as a substring against the installed models.
    #[serde(default = "default_model")]
    pub model: String,
    /// Ollama server URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// System prompt prepended to every request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: Option<String>,
    /// Prompt token budget.
    #[serde(default)]
    pub max_input_tokens: Option<usize>,
    /// Log filter used when neither `RUST_LOG` nor `--verbose` is set.
    #[serde(default)]
    pub log_level: Option<String>,
    /// Token estimator used for the prompt budget.
    #[serde(default)]
    pub token_counter: Option<CounterKind>,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Returns the default model name.
///
/// Used by serde's `#[serde(default)]` attribute during deserialization.
pub(super) fn default_model() -> String {
    crate::constants::DEFAULT_MODEL.to_string()
}

fn default_system_prompt() -> Option<String> {
    Some(crate::constants::DEFAULT_SYSTEM_PROMPT.to_string())
}

/// `[agent]` table: loop limits and forced-tool handling.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct AgentConfig {
    /// Maximum model requests per user turn.
    pub max_rounds: Option<usize>,
    /// How `#tool` references are spent across rounds.
    pub forced_tool_policy: Option<ForcedToolPolicy>,
}

/// `[tools]` table: what the built-in tools may do.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolsConfig {
    /// Whether destructive tools (file deletion) are allowed.
    pub trusted: Option<bool>,
    /// Default timeout for `run_command`, in seconds.
    pub command_timeout_secs: Option<u64>,
    /// Glob patterns hidden from search and deletion.
    pub exclude: Option<Vec<String>>,
    /// Tool names never offered to the model.
    pub disabled: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: None,
            system_prompt: default_system_prompt(),
            max_input_tokens: None,
            log_level: None,
            token_counter: None,
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}
