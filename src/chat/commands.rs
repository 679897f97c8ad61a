//! Slash command handlers for the chat REPL.
//!
//! Dispatches `/list`, `/history`, `/clear` and `/help`. Returns a
//! [`CommandAction`] so the REPL loop can decide how to proceed.

use colored::Colorize;

use crate::prompt::ChatTurn;
use crate::session::Session;
use crate::tools::ToolInvoker;

/// Action returned by slash command handling.
pub(crate) enum CommandAction {
    /// Command was handled successfully; continue the REPL loop.
    Continue,
    /// Unknown command was entered.
    Unknown(String),
}

/// Print the tools the model is offered, with their descriptions.
pub(crate) fn print_tools(tools: &dyn ToolInvoker) {
    let definitions = tools.definitions();
    if definitions.is_empty() {
        println!("{}", "No tools enabled.".dimmed());
        return;
    }
    for spec in definitions {
        println!("{}", format!("#{}", spec.name).cyan().bold());
        println!("  {}", spec.description.dimmed());
    }
}

/// Print one finished turn the way it streamed.
pub(crate) fn print_turn(turn: &ChatTurn) {
    println!("{} {}", ">".green().bold(), turn.prompt);
    for round in &turn.tool_calls.rounds {
        for call in &round.tool_calls {
            println!("{} {}", "⚙".cyan(), call.name.cyan());
        }
    }
    println!("{}", turn.response.trim_end());
    println!();
}

/// Dispatch and handle a slash command.
pub(crate) fn handle_slash_command(
    command: &str,
    session: &mut Session,
    tools: &dyn ToolInvoker,
) -> CommandAction {
    match command {
        "/list" => {
            print_tools(tools);
            CommandAction::Continue
        }
        "/history" => {
            if session.turns.is_empty() {
                println!("{}", "No turns yet.".dimmed());
            }
            for turn in &session.turns {
                print_turn(turn);
            }
            CommandAction::Continue
        }
        "/clear" => {
            session.clear_history();
            println!("{}", "History cleared.".dimmed());
            CommandAction::Continue
        }
        "/help" => {
            println!("{}", "Commands:".bold());
            println!("  {} - list available tools", "/list".cyan());
            println!("  {} - show conversation history", "/history".cyan());
            println!("  {} - clear conversation", "/clear".cyan());
            println!("  {} - show this help", "/help".cyan());
            println!("  {} - force a tool for one round", "#tool_name".cyan());
            println!("  {} - cancel the running turn", "Ctrl+C".cyan());
            println!("  {} - exit", "Ctrl+D".cyan());
            CommandAction::Continue
        }
        _ => CommandAction::Unknown(command.to_string()),
    }
}
