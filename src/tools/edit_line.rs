//! Edit-line tool — replaces one line (1-based) of a workspace file.

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use super::editor::{open_in, Editor};
use super::workspace::Workspace;
use super::ToolResult;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditLineArgs {
    #[serde(alias = "path")]
    pub file_path: String,
    pub line_number: i64,
    pub new_content: String,
}

pub fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "filePath": {
                "type": "string",
                "description": "Path of the file to edit"
            },
            "lineNumber": {
                "type": "integer",
                "description": "Line to replace, 1-based"
            },
            "newContent": {
                "type": "string",
                "description": "Replacement text for the line"
            }
        },
        "required": ["filePath", "lineNumber", "newContent"]
    })
}

enum Edit {
    Applied,
    OutOfRange(usize),
}

fn replace_line(path: &Path, line_number: i64, new_content: &str) -> Result<Edit> {
    let content = fs::read_to_string(path)?;
    let eol = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let trailing_eol = content.ends_with('\n');

    let mut lines: Vec<&str> = content.lines().collect();
    // An empty document still has one (empty) line.
    if lines.is_empty() {
        lines.push("");
    }

    let count = lines.len();
    if line_number < 1 || line_number as usize > count {
        return Ok(Edit::OutOfRange(count));
    }
    lines[line_number as usize - 1] = new_content;

    let mut updated = lines.join(eol);
    if trailing_eol {
        updated.push_str(eol);
    }
    fs::write(path, updated)?;
    Ok(Edit::Applied)
}

pub fn run(workspace: &Workspace, editor: &Editor, args: EditLineArgs) -> ToolResult {
    let outcome = workspace
        .resolve_existing(&args.file_path)
        .and_then(|path| {
            let edit = replace_line(&path, args.line_number, &args.new_content)?;
            open_in(editor, &path);
            Ok((path, edit))
        });

    match outcome {
        Ok((path, Edit::Applied)) => ToolResult::success(format!(
            "Line {} in file \"{}\" has been updated.",
            args.line_number,
            path.display()
        )),
        Ok((_, Edit::OutOfRange(count))) => ToolResult::error(format!(
            "Invalid line number. The file has {count} lines."
        )),
        Err(e) => ToolResult::error(format!(
            "Failed to edit line {} in file \"{}\": {e}",
            args.line_number, args.file_path
        )),
    }
}
