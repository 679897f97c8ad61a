//! Output rendering abstraction for toolchat.
//!
//! Defines the [`Renderer`] trait the agent loop streams into. The
//! [`StdoutRenderer`] prints tokens directly to the terminal and shows tool
//! activity as dimmed one-line summaries.

use colored::Colorize;
use serde_json::Value;
use std::io::{self, Write};

use crate::tools::ToolResult;

/// Longest tool result preview shown to the user.
const RESULT_PREVIEW_CHARS: usize = 200;

/// Sink for everything a running turn shows the user.
pub trait Renderer: Send {
    /// Render a single text increment as it arrives.
    fn render_token(&mut self, token: &str);

    /// Called when the turn's response is complete.
    fn render_done(&mut self);

    /// Called when the turn fails.
    fn render_error(&mut self, err: &str);

    /// A tool is about to run.
    fn tool_start(&mut self, name: &str, args: &Value);

    /// A tool finished.
    fn tool_result(&mut self, name: &str, result: &ToolResult);

    /// Non-fatal notice (round limit, cancellation).
    fn warn(&mut self, message: &str);
}

/// Renders streaming output directly to stdout.
///
/// Each token is printed immediately with an explicit flush so the user
/// sees a "typing" effect.
pub struct StdoutRenderer {
    token_count: usize,
    /// Whether the cursor sits mid-line after streamed text.
    mid_line: bool,
}

impl StdoutRenderer {
    pub fn new() -> Self {
        Self {
            token_count: 0,
            mid_line: false,
        }
    }

    fn break_line(&mut self) {
        if self.mid_line {
            println!();
            self.mid_line = false;
        }
    }
}

/// First line of `text`, shortened for display.
fn preview(text: &str) -> String {
    let first = text.lines().next().unwrap_or_default();
    if first.chars().count() > RESULT_PREVIEW_CHARS {
        let cut: String = first.chars().take(RESULT_PREVIEW_CHARS).collect();
        format!("{cut}...")
    } else {
        first.to_string()
    }
}

impl Renderer for StdoutRenderer {
    fn render_token(&mut self, token: &str) {
        print!("{}", token);
        // Flush immediately so each token appears as it arrives
        io::stdout().flush().ok();
        self.token_count += 1;
        self.mid_line = !token.ends_with('\n');
    }

    fn render_done(&mut self) {
        self.break_line();
        println!();
        println!("{}", format!("[{} chunks]", self.token_count).dimmed());
    }

    fn render_error(&mut self, err: &str) {
        self.break_line();
        eprintln!("{} {}", "error:".red().bold(), err);
    }

    fn tool_start(&mut self, name: &str, args: &Value) {
        self.break_line();
        println!("{} {} {}", "⚙".cyan(), name.cyan().bold(), args.to_string().dimmed());
    }

    fn tool_result(&mut self, name: &str, result: &ToolResult) {
        self.break_line();
        let line = preview(&result.content);
        if result.is_error {
            println!("  {} {} {}", "✗".red(), name.dimmed(), line.red());
        } else {
            println!("  {} {} {}", "✓".green(), name.dimmed(), line.dimmed());
        }
    }

    fn warn(&mut self, message: &str) {
        self.break_line();
        println!("{} {}", "warning:".yellow().bold(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_first_line_and_truncates() {
        assert_eq!(preview("Found 2 files:\na.ts\nb.ts"), "Found 2 files:");
        let long = "x".repeat(RESULT_PREVIEW_CHARS + 10);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), RESULT_PREVIEW_CHARS + 3);
    }
}
