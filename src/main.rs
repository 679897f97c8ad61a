//! Entry point for toolchat, a terminal chat agent that lets a local Ollama
//! model act on the current workspace through tools.
//!
//! This binary loads environment variables, parses CLI arguments via [`cli`],
//! loads the config, sets up logging and dispatches to the appropriate
//! subcommand handler.

mod agent;
mod chat;
mod cli;
mod config;
mod constants;
mod error;
mod logging;
mod message;
mod output;
mod prompt;
mod provider;
mod session;
mod tokens;
mod tools;

use anyhow::Result;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = cli::parse();
    let config = config::Config::load()?;
    logging::init_logging(cli.verbose, config.log_level());
    tracing::debug!(model = %config.model, base_url = %config.base_url(), "config loaded");
    cli::run(cli, config).await
}
