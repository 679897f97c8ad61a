//! Create-file tool — creates a file (and its folders) inside the workspace.

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::editor::{open_in, Editor};
use super::workspace::Workspace;
use super::ToolResult;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileArgs {
    #[serde(alias = "path")]
    pub file_path: String,
    #[serde(default)]
    pub content: Option<String>,
}

pub fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "filePath": {
                "type": "string",
                "description": "Path of the file to create (e.g. 'src/components/widget.ts')"
            },
            "content": {
                "type": "string",
                "description": "Optional content written into the new file"
            }
        },
        "required": ["filePath"]
    })
}

/// Create an empty file, creating parent folders as needed. Truncates an
/// existing file.
fn create_empty(workspace: &Workspace, file_path: &str) -> Result<PathBuf> {
    let full_path = workspace.resolve(file_path)?;
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&full_path, "")?;
    Ok(full_path)
}

/// Append `content` at the end of the document.
pub(super) fn append_content(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(())
}

pub fn run(workspace: &Workspace, editor: &Editor, args: CreateFileArgs) -> ToolResult {
    let outcome = create_empty(workspace, &args.file_path).and_then(|path| {
        match args.content.as_deref().filter(|c| !c.is_empty()) {
            Some(content) => {
                append_content(&path, content)?;
                open_in(editor, &path);
                Ok(format!("File created and content streamed: {}", path.display()))
            }
            None => Ok(format!("File created: {}", path.display())),
        }
    });

    match outcome {
        Ok(message) => ToolResult::success(message),
        Err(e) => ToolResult::error(format!(
            "Failed to create file \"{}\": {e}",
            args.file_path
        )),
    }
}
