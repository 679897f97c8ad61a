//! Delete-files tool — removes files and folders matching a pattern.
//!
//! Only available in trusted workspaces. Each match is checked before and
//! after removal; the first hard failure stops the batch and is reported.

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use super::editor::Editor;
use super::workspace::Workspace;
use super::ToolResult;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeleteFilesArgs {
    /// Glob pattern or plain path, relative to the workspace root.
    pub pattern: String,
}

pub fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "pattern": {
                "type": "string",
                "description": "File or folder pattern to delete (e.g. 'src/*.css' or 'dist')"
            }
        },
        "required": ["pattern"]
    })
}

fn remove(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

pub fn run(workspace: &Workspace, editor: &Editor, args: DeleteFilesArgs) -> ToolResult {
    if !workspace.is_trusted() {
        return ToolResult::error(
            "File or folder deletion is disabled in untrusted workspaces.".into(),
        );
    }

    let matches = match workspace.glob(&args.pattern) {
        Ok(m) => m,
        Err(e) => {
            return ToolResult::error(format!("Failed to search for \"{}\": {e:#}", args.pattern))
        }
    };

    if matches.is_empty() {
        return ToolResult::success(format!(
            "No files or folders found matching \"{}\".",
            args.pattern
        ));
    }

    let mut deleted = Vec::new();
    for path in &matches {
        // A parent directory removed earlier in the batch takes its children with it.
        if !path.exists() {
            tracing::debug!(path = %path.display(), "already gone, skipping");
            continue;
        }
        if let Err(e) = remove(path) {
            tracing::warn!(path = %path.display(), error = %e, "delete failed");
            return ToolResult::error(format!("Failed to delete {}: {e}", path.display()));
        }
        if path.exists() {
            tracing::warn!(path = %path.display(), "deletion could not be verified");
            continue;
        }
        deleted.push(path.display().to_string());
    }

    match editor.lock() {
        Ok(mut state) => state.close_missing(),
        Err(poisoned) => poisoned.into_inner().close_missing(),
    }

    ToolResult::success(format!(
        "Deleted {} items:\n{}",
        deleted.len(),
        deleted.join("\n")
    ))
}
