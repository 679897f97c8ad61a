//! Run-command tool — shell command execution in the workspace root.

use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::ToolResult;

use crate::constants::{COMMAND_MAX_OUTPUT_SIZE, COMMAND_STRIPPED_ENV_VARS};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunCommandArgs {
    pub command: String,
    /// Timeout in seconds; falls back to the configured default.
    #[serde(default)]
    pub timeout: Option<u64>,
}

pub fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "command": {
                "type": "string",
                "description": "Shell command to run in the workspace root"
            },
            "timeout": {
                "type": "integer",
                "description": "Timeout in seconds"
            }
        },
        "required": ["command"]
    })
}

/// Truncate `output` to at most `COMMAND_MAX_OUTPUT_SIZE` bytes, appending a
/// notice when truncation occurs.
fn cap_output(output: &str) -> String {
    if output.len() <= COMMAND_MAX_OUTPUT_SIZE {
        return output.to_string();
    }
    let mut end = COMMAND_MAX_OUTPUT_SIZE;
    while end > 0 && !output.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}\n... output truncated at {} bytes",
        &output[..end],
        COMMAND_MAX_OUTPUT_SIZE
    )
}

/// Spawn `sh -c <command>` and collect its output.
///
/// The child is killed when the timeout fires or `cancel` is triggered.
pub async fn run(
    root: &Path,
    default_timeout_secs: u64,
    args: RunCommandArgs,
    cancel: CancellationToken,
) -> ToolResult {
    let timeout_secs = args.timeout.unwrap_or(default_timeout_secs);

    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(&args.command);
    cmd.current_dir(root);
    cmd.kill_on_drop(true);
    for var in COMMAND_STRIPPED_ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.stdin(std::process::Stdio::null());
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    let child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => return ToolResult::error(format!("Failed to execute command: {e}")),
    };

    tracing::debug!(command = %args.command, timeout_secs, "running command");

    let waited = tokio::select! {
        _ = cancel.cancelled() => {
            return ToolResult::error("Command cancelled".into());
        }
        waited = tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output()) => waited,
    };

    match waited {
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);

            let mut text = stdout.to_string();
            if !stderr.is_empty() {
                text.push_str("\n--- stderr ---\n");
                text.push_str(&stderr);
            }
            let text = cap_output(&text);
            let code = output.status.code().unwrap_or(-1);

            if code != 0 {
                ToolResult::error(format!("{}\nExit code: {}", text.trim(), code))
            } else {
                ToolResult::success(text.trim().to_string())
            }
        }
        Ok(Err(e)) => ToolResult::error(format!("Failed to execute command: {e}")),
        Err(_) => ToolResult::error(format!("Command timed out after {timeout_secs}s")),
    }
}
