pub mod count_tabs;
pub mod create_file;
pub mod delete_files;
pub mod edit_line;
pub mod editor;
pub mod find_files;
pub mod open_file;
pub mod run_command;
pub mod workspace;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::ToolError;
use crate::message::ToolCallRequest;

use count_tabs::CountTabsArgs;
use create_file::CreateFileArgs;
use delete_files::DeleteFilesArgs;
use edit_line::EditLineArgs;
use editor::Editor;
use find_files::FindFilesArgs;
use open_file::OpenFileArgs;
use run_command::RunCommandArgs;
use workspace::Workspace;

/// The result of executing a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(content: String) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    pub fn error(content: String) -> Self {
        Self {
            content,
            is_error: true,
        }
    }
}

/// Definition sent to the model so it knows what tools are available.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value, // JSON Schema
}

/// The closed set of built-in tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    FindFiles,
    DeleteFiles,
    CreateFile,
    OpenFile,
    EditLine,
    RunCommand,
    CountTabs,
}

impl ToolKind {
    pub const ALL: [ToolKind; 7] = [
        ToolKind::FindFiles,
        ToolKind::DeleteFiles,
        ToolKind::CreateFile,
        ToolKind::OpenFile,
        ToolKind::EditLine,
        ToolKind::RunCommand,
        ToolKind::CountTabs,
    ];

    /// Stable name the model uses to call this tool.
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::FindFiles => "find_files",
            ToolKind::DeleteFiles => "delete_files",
            ToolKind::CreateFile => "create_file",
            ToolKind::OpenFile => "open_file",
            ToolKind::EditLine => "edit_line",
            ToolKind::RunCommand => "run_command",
            ToolKind::CountTabs => "count_tabs",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::FindFiles => {
                "Search the workspace for files matching a glob pattern. \
                 node_modules folders are skipped."
            }
            ToolKind::DeleteFiles => {
                "Delete files or folders in the workspace that match a glob pattern. \
                 Only available in trusted workspaces."
            }
            ToolKind::CreateFile => {
                "Create a new file (and any missing folders) in the workspace, \
                 optionally writing content into it and opening it."
            }
            ToolKind::OpenFile => {
                "Open an existing workspace file in the editor, optionally \
                 appending content to the end of it."
            }
            ToolKind::EditLine => {
                "Replace a single line (1-based) of a workspace file with new content."
            }
            ToolKind::RunCommand => {
                "Run a shell command in the workspace root and return its output."
            }
            ToolKind::CountTabs => {
                "Count the editor tabs open in a tab group (1-based). \
                 Defaults to the active tab group."
            }
        }
    }

    pub fn schema(self) -> Value {
        match self {
            ToolKind::FindFiles => find_files::schema(),
            ToolKind::DeleteFiles => delete_files::schema(),
            ToolKind::CreateFile => create_file::schema(),
            ToolKind::OpenFile => open_file::schema(),
            ToolKind::EditLine => edit_line::schema(),
            ToolKind::RunCommand => run_command::schema(),
            ToolKind::CountTabs => count_tabs::schema(),
        }
    }

    pub fn spec(self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.schema(),
        }
    }
}

/// A validated tool call: the variant fixes the tool, the payload its
/// arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    FindFiles(FindFilesArgs),
    DeleteFiles(DeleteFilesArgs),
    CreateFile(CreateFileArgs),
    OpenFile(OpenFileArgs),
    EditLine(EditLineArgs),
    RunCommand(RunCommandArgs),
    CountTabs(CountTabsArgs),
}

fn args<T: DeserializeOwned>(kind: ToolKind, value: Value) -> Result<T, ToolError> {
    // Models sometimes send `null` for tools without parameters.
    let value = if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    };
    serde_json::from_value(value).map_err(|e| ToolError::InvalidArguments {
        tool: kind.name().to_string(),
        message: e.to_string(),
    })
}

impl ToolInput {
    /// Validate raw JSON arguments for `kind`.
    pub fn parse(kind: ToolKind, value: Value) -> Result<Self, ToolError> {
        Ok(match kind {
            ToolKind::FindFiles => ToolInput::FindFiles(args(kind, value)?),
            ToolKind::DeleteFiles => ToolInput::DeleteFiles(args(kind, value)?),
            ToolKind::CreateFile => ToolInput::CreateFile(args(kind, value)?),
            ToolKind::OpenFile => ToolInput::OpenFile(args(kind, value)?),
            ToolKind::EditLine => ToolInput::EditLine(args(kind, value)?),
            ToolKind::RunCommand => ToolInput::RunCommand(args(kind, value)?),
            ToolKind::CountTabs => ToolInput::CountTabs(args(kind, value)?),
        })
    }
}

/// Executes tool calls on behalf of the agent loop.
///
/// Implementations never fail: every problem is reported as a failure
/// [`ToolResult`] so the model can see it.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Definitions for every tool that may be offered to the model.
    fn definitions(&self) -> Vec<ToolSpec>;

    /// Execute one call.
    async fn invoke(&self, call: &ToolCallRequest, cancel: CancellationToken) -> ToolResult;
}

/// Registry settings taken from the `[tools]` config table.
#[derive(Debug, Clone)]
pub struct ToolSettings {
    pub disabled: Vec<String>,
    pub command_timeout_secs: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            disabled: Vec::new(),
            command_timeout_secs: crate::constants::COMMAND_DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Holds the enabled tools and dispatches calls by name.
pub struct ToolRegistry {
    workspace: Workspace,
    editor: Editor,
    enabled: Vec<ToolKind>,
    command_timeout_secs: u64,
}

impl ToolRegistry {
    /// Create a registry with every built-in tool not disabled in `settings`.
    pub fn with_builtins(workspace: Workspace, editor: Editor, settings: &ToolSettings) -> Self {
        for name in &settings.disabled {
            if ToolKind::from_name(name).is_none() {
                tracing::warn!(tool = %name, "disabled tool is not a known tool");
            }
        }
        let enabled = ToolKind::ALL
            .into_iter()
            .filter(|k| !settings.disabled.iter().any(|d| d == k.name()))
            .collect();
        Self {
            workspace,
            editor,
            enabled,
            command_timeout_secs: settings.command_timeout_secs,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    #[cfg(test)]
    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Look up an enabled tool by name.
    pub fn resolve(&self, name: &str) -> Result<ToolKind, ToolError> {
        let kind = ToolKind::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.into()))?;
        if !self.enabled.contains(&kind) {
            return Err(ToolError::Disabled(name.into()));
        }
        Ok(kind)
    }

    /// Run a validated call.
    pub async fn dispatch(&self, input: ToolInput, cancel: CancellationToken) -> ToolResult {
        match input {
            ToolInput::FindFiles(args) => find_files::run(&self.workspace, args),
            ToolInput::DeleteFiles(args) => delete_files::run(&self.workspace, &self.editor, args),
            ToolInput::CreateFile(args) => create_file::run(&self.workspace, &self.editor, args),
            ToolInput::OpenFile(args) => open_file::run(&self.workspace, &self.editor, args),
            ToolInput::EditLine(args) => edit_line::run(&self.workspace, &self.editor, args),
            ToolInput::RunCommand(args) => {
                run_command::run(self.workspace.root(), self.command_timeout_secs, args, cancel)
                    .await
            }
            ToolInput::CountTabs(args) => count_tabs::run(&self.editor, args),
        }
    }
}

#[async_trait]
impl ToolInvoker for ToolRegistry {
    fn definitions(&self) -> Vec<ToolSpec> {
        self.enabled.iter().map(|k| k.spec()).collect()
    }

    async fn invoke(&self, call: &ToolCallRequest, cancel: CancellationToken) -> ToolResult {
        let input = self
            .resolve(&call.name)
            .and_then(|kind| ToolInput::parse(kind, call.arguments.clone()));
        let input = match input {
            Ok(input) => input,
            Err(e) => {
                tracing::warn!(tool = %call.name, id = %call.id, error = %e, "rejected tool call");
                return ToolResult::error(e.to_string());
            }
        };

        tracing::debug!(tool = %call.name, id = %call.id, "invoking tool");
        let result = self.dispatch(input, cancel).await;
        if result.is_error {
            tracing::warn!(tool = %call.name, id = %call.id, "tool reported failure");
        }
        result
    }
}

#[cfg(test)]
mod tests;
