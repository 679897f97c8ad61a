//! Open-file tool — opens an existing workspace file as a tab, optionally
//! appending content to it.

use serde::Deserialize;
use serde_json::{json, Value};

use super::create_file::append_content;
use super::editor::{open_in, Editor};
use super::workspace::Workspace;
use super::ToolResult;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenFileArgs {
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
                "description": "Path of the file to open (e.g. 'src/existingFile.js')"
            },
            "content": {
                "type": "string",
                "description": "Optional content appended to the end of the file"
            }
        },
        "required": ["filePath"]
    })
}

pub fn run(workspace: &Workspace, editor: &Editor, args: OpenFileArgs) -> ToolResult {
    let outcome = workspace.resolve_existing(&args.file_path).and_then(|path| {
        if path.is_dir() {
            anyhow::bail!("{} is a directory", path.display());
        }
        open_in(editor, &path);
        match args.content.as_deref().filter(|c| !c.is_empty()) {
            Some(content) => {
                append_content(&path, content)?;
                Ok(format!("Content streamed into file: {}", path.display()))
            }
            None => Ok(format!("File opened: {}", path.display())),
        }
    });

    match outcome {
        Ok(message) => ToolResult::success(message),
        Err(e) => ToolResult::error(format!(
            "Failed to open file \"{}\": {e}",
            args.file_path
        )),
    }
}
