//! Environment variable substitution and typed accessors over the raw
//! config values.

use std::sync::LazyLock;

use regex::Regex;

use super::types::Config;
use crate::agent::AgentSettings;
use crate::constants::{
    COMMAND_DEFAULT_TIMEOUT_SECS, DEFAULT_EXCLUDES, DEFAULT_LOG_LEVEL, DEFAULT_MAX_INPUT_TOKENS,
    DEFAULT_MAX_ROUNDS, DEFAULT_SYSTEM_PROMPT, OLLAMA_DEFAULT_BASE_URL,
};
use crate::tokens::CounterKind;
use crate::tools::ToolSettings;

static ENV_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{env:([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

impl Config {
    /// Resolve {env:VAR_NAME} patterns in string fields.
    pub(super) fn resolve_substitutions(&mut self) {
        self.model = Self::resolve_str(&self.model);
        for field in [
            &mut self.base_url,
            &mut self.system_prompt,
            &mut self.log_level,
        ] {
            if let Some(value) = field.as_mut() {
                *value = Self::resolve_str(value);
            }
        }
        if let Some(patterns) = self.tools.exclude.as_mut() {
            for p in patterns.iter_mut() {
                *p = Self::resolve_str(p);
            }
        }
    }

    /// Replace {env:VAR} with the environment variable value. Unset
    /// variables become empty.
    pub(super) fn resolve_str(s: &str) -> String {
        ENV_PATTERN
            .replace_all(s, |caps: &regex::Captures| {
                std::env::var(&caps[1]).unwrap_or_default()
            })
            .into_owned()
    }

    /// Ollama base URL. Accepts `host:port` as `OLLAMA_HOST` does.
    pub fn base_url(&self) -> String {
        let url = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(OLLAMA_DEFAULT_BASE_URL);
        let url = url.trim_end_matches('/');
        if url.contains("://") {
            url.to_string()
        } else {
            format!("http://{url}")
        }
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn max_input_tokens(&self) -> usize {
        self.max_input_tokens.unwrap_or(DEFAULT_MAX_INPUT_TOKENS)
    }

    pub fn log_level(&self) -> &str {
        self.log_level
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn token_counter(&self) -> CounterKind {
        self.token_counter.unwrap_or_default()
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            system_prompt: self.system_prompt().to_string(),
            max_rounds: self.agent.max_rounds.unwrap_or(DEFAULT_MAX_ROUNDS).max(1),
            forced_tool_policy: self.agent.forced_tool_policy.unwrap_or_default(),
        }
    }

    pub fn tool_settings(&self) -> ToolSettings {
        ToolSettings {
            disabled: self.tools.disabled.clone().unwrap_or_default(),
            command_timeout_secs: self
                .tools
                .command_timeout_secs
                .unwrap_or(COMMAND_DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Whether destructive tools may run. Off unless configured.
    pub fn workspace_trusted(&self) -> bool {
        self.tools.trusted.unwrap_or(false)
    }

    pub fn excludes(&self) -> Vec<String> {
        self.tools
            .exclude
            .clone()
            .unwrap_or_else(|| DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_placeholders_are_substituted() {
        std::env::set_var("TOOLCHAT_TEST_HOST", "gpu-box:11434");
        let resolved = Config::resolve_str("http://{env:TOOLCHAT_TEST_HOST}/");
        assert_eq!(resolved, "http://gpu-box:11434/");
        assert_eq!(Config::resolve_str("{env:TOOLCHAT_TEST_UNSET_VAR}"), "");
        assert_eq!(Config::resolve_str("no placeholders"), "no placeholders");
    }

    #[test]
    fn base_url_defaults_and_normalises() {
        let mut config = Config::default();
        assert_eq!(config.base_url(), OLLAMA_DEFAULT_BASE_URL);

        config.base_url = Some(String::new());
        assert_eq!(config.base_url(), OLLAMA_DEFAULT_BASE_URL);

        config.base_url = Some("127.0.0.1:11500".into());
        assert_eq!(config.base_url(), "http://127.0.0.1:11500");

        config.base_url = Some("https://ollama.internal/".into());
        assert_eq!(config.base_url(), "https://ollama.internal");
    }

    #[test]
    fn accessors_fall_back_to_defaults() {
        let config = Config::default();
        assert_eq!(config.max_input_tokens(), DEFAULT_MAX_INPUT_TOKENS);
        assert_eq!(config.log_level(), DEFAULT_LOG_LEVEL);
        assert_eq!(config.agent_settings().max_rounds, DEFAULT_MAX_ROUNDS);
        assert!(!config.workspace_trusted());
        assert_eq!(config.excludes(), vec!["**/node_modules/**".to_string()]);
        assert_eq!(
            config.tool_settings().command_timeout_secs,
            COMMAND_DEFAULT_TIMEOUT_SECS
        );
    }
}
