//! Find-files tool — glob search across the workspace.

use serde::Deserialize;
use serde_json::{json, Value};

use super::workspace::Workspace;
use super::ToolResult;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FindFilesArgs {
    pub pattern: String,
}

pub fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "pattern": {
                "type": "string",
                "description": "Glob pattern relative to the workspace root (e.g. 'src/**/*.ts')"
            }
        },
        "required": ["pattern"]
    })
}

pub fn run(workspace: &Workspace, args: FindFilesArgs) -> ToolResult {
    match workspace.glob(&args.pattern) {
        Ok(files) => {
            let listing = files
                .iter()
                .map(|f| f.display().to_string())
                .collect::<Vec<_>>()
                .join("\n");
            ToolResult::success(format!(
                "Found {} files matching \"{}\":\n{}",
                files.len(),
                args.pattern,
                listing
            ))
        }
        Err(e) => ToolResult::error(format!("Failed to search for \"{}\": {e:#}", args.pattern)),
    }
}
