use super::*;
use serde_json::json;
use std::fs;
use std::path::Path;

fn registry_in(dir: &Path, trusted: bool) -> ToolRegistry {
    let workspace = Workspace::new(dir.to_path_buf(), trusted, &["**/node_modules/**".to_string()]);
    ToolRegistry::with_builtins(workspace, editor::new_editor(), &ToolSettings::default())
}

fn call(name: &str, arguments: Value) -> ToolCallRequest {
    ToolCallRequest {
        id: "call_0".into(),
        name: name.into(),
        arguments,
    }
}

async fn invoke(registry: &ToolRegistry, name: &str, arguments: Value) -> ToolResult {
    registry
        .invoke(&call(name, arguments), CancellationToken::new())
        .await
}

fn tab_count(registry: &ToolRegistry) -> usize {
    registry.editor().lock().unwrap().active_group().tabs.len()
}

#[test]
fn test_registry_with_builtins() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_in(dir.path(), true);
    let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
    assert_eq!(
        names,
        vec![
            "find_files",
            "delete_files",
            "create_file",
            "open_file",
            "edit_line",
            "run_command",
            "count_tabs"
        ]
    );
}

#[test]
fn test_disabled_tools_are_not_offered() {
    let dir = tempfile::tempdir().unwrap();
    let workspace = Workspace::new(dir.path().to_path_buf(), true, &[]);
    let settings = ToolSettings {
        disabled: vec!["run_command".into()],
        ..Default::default()
    };
    let registry = ToolRegistry::with_builtins(workspace, editor::new_editor(), &settings);
    assert_eq!(registry.definitions().len(), 6);
    assert!(registry.definitions().iter().all(|d| d.name != "run_command"));
    assert!(matches!(
        registry.resolve("run_command"),
        Err(ToolError::Disabled(_))
    ));
}

#[tokio::test]
async fn test_unknown_tool() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_in(dir.path(), true);
    let result = invoke(&registry, "rename_file", json!({})).await;
    assert!(result.is_error);
    assert_eq!(result.content, "Tool not found: rename_file");
}

#[tokio::test]
async fn test_invalid_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_in(dir.path(), true);
    let result = invoke(&registry, "edit_line", json!({"filePath": "a.txt"})).await;
    assert!(result.is_error);
    assert!(result.content.starts_with("Invalid arguments for edit_line"));
}

#[tokio::test]
async fn test_find_files_skips_node_modules() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("web/node_modules/pkg")).unwrap();
    fs::write(dir.path().join("a.ts"), "").unwrap();
    fs::write(dir.path().join("b.ts"), "").unwrap();
    fs::write(dir.path().join("web/node_modules/pkg/c.ts"), "").unwrap();

    let registry = registry_in(dir.path(), true);
    let result = invoke(&registry, "find_files", json!({"pattern": "**/*.ts"})).await;
    assert!(!result.is_error);
    assert!(result.content.starts_with("Found 2 files matching \"**/*.ts\":"));
    assert!(!result.content.contains("c.ts"));
}

#[tokio::test]
async fn test_delete_files_untrusted() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.ts"), "").unwrap();
    let registry = registry_in(dir.path(), false);
    let result = invoke(&registry, "delete_files", json!({"pattern": "*.ts"})).await;
    assert!(result.is_error);
    assert!(result.content.contains("disabled in untrusted workspaces"));
    assert!(dir.path().join("a.ts").exists());
}

#[tokio::test]
async fn test_delete_files_and_folders() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("dist/nested")).unwrap();
    fs::write(dir.path().join("dist/nested/out.js"), "").unwrap();
    fs::write(dir.path().join("a.ts"), "").unwrap();

    let registry = registry_in(dir.path(), true);
    let result = invoke(&registry, "delete_files", json!({"pattern": "dist"})).await;
    assert!(!result.is_error);
    assert!(result.content.starts_with("Deleted 1 items:"));
    assert!(!dir.path().join("dist").exists());
    assert!(dir.path().join("a.ts").exists());

    let result = invoke(&registry, "delete_files", json!({"pattern": "*.css"})).await;
    assert_eq!(result.content, "No files or folders found matching \"*.css\".");
}

#[tokio::test]
async fn test_create_file_with_content() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_in(dir.path(), true);
    let result = invoke(
        &registry,
        "create_file",
        json!({"filePath": "src/components/widget.ts", "content": "export {};\n"}),
    )
    .await;
    assert!(!result.is_error, "{}", result.content);
    assert!(result.content.starts_with("File created and content streamed:"));
    let written = fs::read_to_string(dir.path().join("src/components/widget.ts")).unwrap();
    assert_eq!(written, "export {};\n");
    assert_eq!(tab_count(&registry), 1);
}

#[tokio::test]
async fn test_create_file_outside_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_in(dir.path(), true);
    let result = invoke(&registry, "create_file", json!({"filePath": "../escape.txt"})).await;
    assert!(result.is_error);
    assert!(result.content.contains("outside the workspace"));
}

#[tokio::test]
async fn test_open_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_in(dir.path(), true);
    let result = invoke(&registry, "open_file", json!({"filePath": "nope.txt"})).await;
    assert!(result.is_error);
    assert!(result.content.contains("File not found"));
    assert_eq!(tab_count(&registry), 0);
}

#[tokio::test]
async fn test_open_file_appends_content() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.md"), "# Notes\n").unwrap();
    let registry = registry_in(dir.path(), true);
    let result = invoke(
        &registry,
        "open_file",
        json!({"filePath": "notes.md", "content": "- item\n"}),
    )
    .await;
    assert!(!result.is_error);
    assert!(result.content.starts_with("Content streamed into file:"));
    assert_eq!(
        fs::read_to_string(dir.path().join("notes.md")).unwrap(),
        "# Notes\n- item\n"
    );
    assert_eq!(tab_count(&registry), 1);
}

#[tokio::test]
async fn test_edit_line() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "one\ntwo\nthree\n").unwrap();
    let registry = registry_in(dir.path(), true);

    let result = invoke(
        &registry,
        "edit_line",
        json!({"filePath": "a.txt", "lineNumber": 2, "newContent": "TWO"}),
    )
    .await;
    assert!(!result.is_error, "{}", result.content);
    assert!(result.content.starts_with("Line 2 in file"));
    assert_eq!(
        fs::read_to_string(dir.path().join("a.txt")).unwrap(),
        "one\nTWO\nthree\n"
    );

    let result = invoke(
        &registry,
        "edit_line",
        json!({"filePath": "a.txt", "lineNumber": 9, "newContent": "x"}),
    )
    .await;
    assert!(result.is_error);
    assert_eq!(result.content, "Invalid line number. The file has 3 lines.");
}

#[tokio::test]
async fn test_run_command() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_in(dir.path(), true);
    let result = invoke(&registry, "run_command", json!({"command": "echo hello"})).await;
    assert!(!result.is_error);
    assert_eq!(result.content, "hello");

    let result = invoke(&registry, "run_command", json!({"command": "exit 3"})).await;
    assert!(result.is_error);
    assert!(result.content.contains("Exit code: 3"));
}

#[tokio::test]
async fn test_run_command_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_in(dir.path(), true);
    let result = invoke(
        &registry,
        "run_command",
        json!({"command": "sleep 5", "timeout": 1}),
    )
    .await;
    assert!(result.is_error);
    assert!(result.content.contains("timed out"));
}

#[tokio::test]
async fn test_run_command_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_in(dir.path(), true);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = registry
        .invoke(&call("run_command", json!({"command": "sleep 5"})), cancel)
        .await;
    assert!(result.is_error);
    assert_eq!(result.content, "Command cancelled");
}

#[tokio::test]
async fn test_count_tabs_after_opening() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "").unwrap();
    fs::write(dir.path().join("b.txt"), "").unwrap();
    let registry = registry_in(dir.path(), true);
    invoke(&registry, "open_file", json!({"filePath": "a.txt"})).await;
    invoke(&registry, "open_file", json!({"filePath": "b.txt"})).await;
    invoke(&registry, "open_file", json!({"filePath": "a.txt"})).await;

    let result = invoke(&registry, "count_tabs", Value::Null).await;
    assert_eq!(result.content, "There are 2 tabs open in the active tab group.");

    let result = invoke(&registry, "count_tabs", json!({"tabGroup": 2})).await;
    assert_eq!(result.content, "There are 2 tabs open in the 2nd tab group.");
}
