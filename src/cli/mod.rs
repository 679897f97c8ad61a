//! Command-line interface definition and dispatch for toolchat.
//!
//! Uses [`clap`] for argument parsing with derive macros. Each subcommand is
//! routed to its handler; session operations live in the [`session`]
//! submodule.

mod session;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use crate::agent::TurnRequest;
use crate::chat::{self, Runtime};
use crate::config::Config;
use crate::provider;

/// Top-level CLI structure for toolchat.
#[derive(Parser)]
#[command(
    name = "toolchat",
    about = "Chat with a local Ollama model that can act on your workspace"
)]
pub struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the toolchat CLI.
///
/// The `///` doc comments on variants double as `--help` text rendered by
/// clap.
#[derive(Subcommand)]
pub enum Commands {
    /// Ask a one-shot question
    Ask {
        /// The question to ask
        prompt: Vec<String>,
        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
        /// Force a tool for one round; repeat to queue several
        #[arg(short, long = "tool")]
        tools: Vec<String>,
    },
    /// Start an interactive chat session
    Chat {
        /// Resume a specific session (supports partial IDs)
        #[arg(short, long)]
        session: Option<String>,
        /// Model to use (overrides config)
        #[arg(short, long)]
        model: Option<String>,
    },
    /// List the tools offered to the model
    Tools,
    /// List models installed on the Ollama server
    Models,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage chat sessions
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

/// Subcommands for the `config` command.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective config
    Show,
}

/// Subcommands for the `session` command.
#[derive(Subcommand)]
pub enum SessionAction {
    /// List all sessions
    List,
    /// Delete a session by ID (supports partial IDs)
    Delete { id: String },
}

/// Parses command-line arguments into a [`Cli`] struct.
pub fn parse() -> Cli {
    Cli::parse()
}

/// Dispatches the parsed CLI command to its handler.
pub async fn run(cli: Cli, mut config: Config) -> Result<()> {
    match cli.command {
        Commands::Ask {
            prompt,
            model,
            tools,
        } => {
            let prompt = prompt.join(" ");
            if prompt.is_empty() {
                anyhow::bail!("No prompt provided. Usage: toolchat ask \"your question here\"");
            }
            if let Some(model) = model {
                config.model = model;
            }

            let runtime = Runtime::connect(&config).await?;
            println!(
                "{} [model: {}]",
                "toolchat".bold().cyan(),
                runtime.model().yellow(),
            );
            println!();
            println!("{} {}", ">".green().bold(), prompt);
            println!();

            let mut pinned = tools;
            pinned.extend(chat::tool_references(&prompt));
            let request = TurnRequest {
                prompt: &prompt,
                history: &[],
                pinned_tools: &pinned,
            };
            if runtime.turn(request, None).await.is_err() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Chat { session, model } => {
            if let Some(model) = model {
                config.model = model;
            }
            let session_id = session
                .as_deref()
                .map(session::resolve_session_id)
                .transpose()?;
            chat::run_chat(config, session_id).await
        }
        Commands::Tools => {
            let registry = chat::build_registry(&config)?;
            chat::print_tools(&registry);
            let workspace = registry.workspace();
            if !workspace.is_trusted() {
                println!();
                println!(
                    "{}",
                    format!(
                        "delete_files refuses to run in {} until [tools] trusted = true.",
                        workspace.root().display()
                    )
                    .dimmed()
                );
            }
            Ok(())
        }
        Commands::Models => provider::print_models(&config.base_url(), &config.model).await,
        Commands::Config { action } => {
            match action {
                ConfigAction::Show => {
                    let path = Config::config_path()?;
                    println!("{} {}", "Config path:".bold(), path.display());
                    println!();
                    println!("{}", config.to_toml()?);
                }
            }
            Ok(())
        }
        Commands::Session { action } => session::handle_session(action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ask_collects_repeated_tool_flags() {
        let cli = Cli::parse_from([
            "toolchat", "ask", "-t", "find_files", "--tool", "delete_files", "clean", "up",
        ]);
        match cli.command {
            Commands::Ask { prompt, tools, .. } => {
                assert_eq!(prompt, vec!["clean", "up"]);
                assert_eq!(tools, vec!["find_files", "delete_files"]);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn verbose_is_accepted_after_the_subcommand() {
        let cli = Cli::parse_from(["toolchat", "chat", "--session", "1a2b", "-v"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Chat { session: Some(_), .. }));
    }
}
