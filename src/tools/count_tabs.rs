//! Count-tabs tool — reports how many tabs are open in a tab group.

use serde::Deserialize;
use serde_json::{json, Value};

use super::editor::{Editor, EditorState};
use super::ToolResult;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountTabsArgs {
    /// 1-based tab group; the active group when absent.
    #[serde(default)]
    pub tab_group: Option<i64>,
}

pub fn schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "tabGroup": {
                "type": "integer",
                "description": "Tab group to inspect, 1-based. Defaults to the active group."
            }
        }
    })
}

fn ordinal(n: i64) -> String {
    match n {
        1 => "1st".into(),
        2 => "2nd".into(),
        3 => "3rd".into(),
        _ => format!("{n}th"),
    }
}

fn describe(state: &EditorState, args: &CountTabsArgs) -> String {
    match args.tab_group {
        Some(n) => {
            let groups = state.groups();
            // Out-of-range numbers pick the nearest group.
            let last = groups.len().saturating_sub(1);
            let index = usize::try_from(n.saturating_sub(1)).unwrap_or(0).min(last);
            match groups.get(index) {
                Some(group) => format!(
                    "There are {} tabs open in the {} tab group.",
                    group.tabs.len(),
                    ordinal(n)
                ),
                None => "The specified tab group does not exist.".into(),
            }
        }
        None => format!(
            "There are {} tabs open in the active tab group.",
            state.active_group().tabs.len()
        ),
    }
}

pub fn run(editor: &Editor, args: CountTabsArgs) -> ToolResult {
    let text = match editor.lock() {
        Ok(state) => describe(&state, &args),
        Err(poisoned) => describe(&poisoned.into_inner(), &args),
    };
    ToolResult::success(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::editor::TabGroup;
    use std::path::PathBuf;

    fn state() -> EditorState {
        EditorState::with_groups(
            vec![
                TabGroup {
                    tabs: vec![PathBuf::from("a.rs")],
                },
                TabGroup {
                    tabs: vec![PathBuf::from("b.rs"), PathBuf::from("c.rs")],
                },
            ],
            1,
        )
    }

    #[test]
    fn active_group_is_the_default() {
        let text = describe(&state(), &CountTabsArgs::default());
        assert_eq!(text, "There are 2 tabs open in the active tab group.");
    }

    #[test]
    fn group_index_is_clamped_but_ordinal_kept() {
        let text = describe(&state(), &CountTabsArgs { tab_group: Some(7) });
        assert_eq!(text, "There are 2 tabs open in the 7th tab group.");
        let text = describe(&state(), &CountTabsArgs { tab_group: Some(1) });
        assert_eq!(text, "There are 1 tabs open in the 1st tab group.");
    }

    #[test]
    fn extreme_group_numbers_clamp_instead_of_overflowing() {
        let editor = crate::tools::editor::new_editor();
        let result = run(&editor, CountTabsArgs { tab_group: Some(i64::MIN) });
        assert!(!result.is_error);
        assert!(result.content.starts_with("There are 0 tabs open in the "));

        let text = describe(&state(), &CountTabsArgs { tab_group: Some(i64::MIN) });
        assert!(text.starts_with("There are 1 tabs open in the "));
        let text = describe(&state(), &CountTabsArgs { tab_group: Some(i64::MAX) });
        assert!(text.starts_with("There are 2 tabs open in the "));
    }
}
