//! Interactive chat REPL for toolchat.
//!
//! Provides a multi-turn conversation loop using [`rustyline`] for readline
//! support (history, line editing). Each finished turn is appended to a
//! [`Session`]; earlier turns are rendered into the next prompt and the last
//! turn's tool results seed the next agent run.

mod commands;

use std::sync::LazyLock;

use anyhow::{Context, Result};
use colored::Colorize;
use regex::Regex;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio_util::sync::CancellationToken;

use crate::agent::{
    AgentLoop, AgentSettings, LoopOutcome, Termination, ToolCallsMetadata, TurnRequest,
};
use crate::config::Config;
use crate::error::AgentError;
use crate::output::{Renderer, StdoutRenderer};
use crate::prompt::{ChatTurn, TranscriptAssembler};
use crate::provider::{discover_model, ModelBackend, OllamaBackend};
use crate::session::Session;
use crate::tokens::{format_token_usage, TokenCounter};
use crate::tools::editor::new_editor;
use crate::tools::workspace::Workspace;
use crate::tools::{ToolKind, ToolRegistry};

pub(crate) use commands::print_tools;

static TOOL_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([A-Za-z_][A-Za-z0-9_]*)").unwrap());

/// Tools mentioned as `#tool_name` in `prompt`, in mention order.
///
/// Mentions that don't name a tool (`#include`, `#1`) are ignored.
pub(crate) fn tool_references(prompt: &str) -> Vec<String> {
    TOOL_REFERENCE
        .captures_iter(prompt)
        .filter_map(|caps| ToolKind::from_name(&caps[1]))
        .map(|kind| kind.name().to_string())
        .collect()
}

/// Build the tool registry for the current directory.
pub(crate) fn build_registry(config: &Config) -> Result<ToolRegistry> {
    let root = std::env::current_dir().context("Failed to read current directory")?;
    let workspace = Workspace::new(root, config.workspace_trusted(), &config.excludes());
    Ok(ToolRegistry::with_builtins(
        workspace,
        new_editor(),
        &config.tool_settings(),
    ))
}

/// Everything a turn needs: the connected model, the tools and the loop
/// settings.
pub(crate) struct Runtime {
    backend: OllamaBackend,
    tools: ToolRegistry,
    assembler: TranscriptAssembler,
    settings: AgentSettings,
}

impl Runtime {
    /// Resolve the configured model against the server and build the tools.
    pub async fn connect(config: &Config) -> Result<Self> {
        let base_url = config.base_url();
        let model = discover_model(&base_url, &config.model)
            .await
            .map_err(|e| {
                anyhow::anyhow!("Failed to initialize the model '{}': {}", config.model, e)
            })?;
        tracing::info!(%model, %base_url, "model ready");

        let counter = TokenCounter::from_kind(config.token_counter())?;
        Ok(Self {
            backend: OllamaBackend::new(&base_url, model, counter, config.max_input_tokens()),
            tools: build_registry(config)?,
            assembler: TranscriptAssembler,
            settings: config.agent_settings(),
        })
    }

    pub fn model(&self) -> &str {
        self.backend.model_name()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Estimated tokens taken by the conversation so far.
    fn history_tokens(&self, turns: &[ChatTurn]) -> usize {
        turns
            .iter()
            .map(|t| self.backend.count_tokens(&t.prompt) + self.backend.count_tokens(&t.response))
            .sum()
    }

    /// Run one turn, streaming to stdout. Ctrl+C cancels the turn instead
    /// of the process. Errors are already shown when this returns.
    pub async fn turn(
        &self,
        request: TurnRequest<'_>,
        prior: Option<&ToolCallsMetadata>,
    ) -> Result<LoopOutcome, AgentError> {
        let cancel = CancellationToken::new();
        let mut renderer = StdoutRenderer::new();
        let agent = AgentLoop::new(&self.backend, &self.tools, &self.assembler, &self.settings);

        let result = {
            let run = agent.run(request, prior, &mut renderer, cancel.clone());
            tokio::pin!(run);
            loop {
                tokio::select! {
                    result = &mut run => break result,
                    _ = tokio::signal::ctrl_c() => {
                        tracing::debug!("interrupt received, cancelling turn");
                        cancel.cancel();
                    }
                }
            }
        };

        match &result {
            Ok(outcome) => {
                match outcome.termination {
                    Termination::Completed => {}
                    Termination::Cancelled => renderer.warn("Turn cancelled."),
                    Termination::RoundLimitExceeded => renderer.warn(&format!(
                        "Stopped after {} rounds without a final answer.",
                        self.settings.max_rounds
                    )),
                }
                renderer.render_done();
            }
            Err(e) => renderer.render_error(&e.to_string()),
        }
        result
    }
}

/// Runs the interactive chat REPL.
///
/// # Readline behavior
///
/// - **Ctrl+C** at the prompt: cancels current input, stays in REPL
/// - **Ctrl+C** during a turn: cancels the running agent loop
/// - **Ctrl+D**: exits cleanly with "goodbye."
/// - Readline history is persisted to `~/.cache/toolchat/chat_history.txt`
pub async fn run_chat(config: Config, session_id: Option<String>) -> Result<()> {
    let runtime = Runtime::connect(&config).await?;

    let mut session = if let Some(ref id) = session_id {
        let s = Session::load(id)?;
        if let Some(metadata) = s.last_metadata().filter(|m| !m.results.is_empty()) {
            runtime.backend.continue_call_ids(metadata.results.ids());
        }
        println!(
            "{} [session: {}] [model: {}]",
            "resuming".bold().cyan(),
            s.id[..8].yellow(),
            runtime.model().yellow(),
        );
        println!();
        for turn in &s.turns {
            commands::print_turn(turn);
        }
        s
    } else {
        let s = Session::new(runtime.model())?;
        println!(
            "{} [session: {}] [model: {}] (/help for commands, Ctrl+D to exit)",
            "toolchat".bold().cyan(),
            s.id[..8].yellow(),
            runtime.model().yellow(),
        );
        println!();
        s
    };

    let mut rl = DefaultEditor::new()?;
    let history_path = Config::history_path()?;
    if history_path.exists() {
        let _ = rl.load_history(&history_path);
    }

    loop {
        let readline = rl.readline(&format!("{} ", ">".green().bold()));

        match readline {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }

                if line.starts_with('/') {
                    match commands::handle_slash_command(&line, &mut session, runtime.tools()) {
                        commands::CommandAction::Continue => continue,
                        commands::CommandAction::Unknown(cmd) => {
                            println!("{} Unknown command: {}", "?".yellow(), cmd);
                            continue;
                        }
                    }
                }

                let _ = rl.add_history_entry(&line);
                println!();

                let pinned = tool_references(&line);
                let request = TurnRequest {
                    prompt: &line,
                    history: &session.turns,
                    pinned_tools: &pinned,
                };

                let result = runtime.turn(request, session.last_metadata()).await;
                match result {
                    Ok(outcome) => {
                        session.append(ChatTurn {
                            prompt: line,
                            response: outcome.response,
                            tool_calls: outcome.metadata,
                        })?;
                        let used = runtime.history_tokens(&session.turns);
                        let budget = runtime.backend.max_input_tokens();
                        let usage = format_token_usage(used, budget);
                        println!("{}", format!("Context: {} tokens", usage).dimmed());
                    }
                    // The turn is not saved so the user can retry it.
                    Err(_) => {}
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".dimmed());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "goodbye.".dimmed());
                break;
            }
            Err(e) => {
                eprintln!("{} {}", "error:".red().bold(), e);
                break;
            }
        }
    }

    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.save_history(&history_path);

    Ok(())
}
