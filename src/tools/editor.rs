//! In-process editor model: files the agent opened, grouped into tab groups.
//!
//! The terminal has no real editor, so the tools that "open" or "show" a
//! document record it here and `count_tabs` reports on it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One group of open tabs.
#[derive(Debug, Default, Clone)]
pub struct TabGroup {
    pub tabs: Vec<PathBuf>,
}

/// All tab groups plus the index of the active one.
#[derive(Debug, Clone)]
pub struct EditorState {
    groups: Vec<TabGroup>,
    active: usize,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            groups: vec![TabGroup::default()],
            active: 0,
        }
    }
}

impl EditorState {
    #[cfg(test)]
    pub fn with_groups(groups: Vec<TabGroup>, active: usize) -> Self {
        let groups = if groups.is_empty() {
            vec![TabGroup::default()]
        } else {
            groups
        };
        let active = active.min(groups.len() - 1);
        Self { groups, active }
    }

    /// Open `path` in the active group. Already-open files are not duplicated.
    pub fn open(&mut self, path: &Path) {
        let group = &mut self.groups[self.active];
        if !group.tabs.iter().any(|t| t == path) {
            group.tabs.push(path.to_path_buf());
        }
    }

    pub fn groups(&self) -> &[TabGroup] {
        &self.groups
    }

    pub fn active_group(&self) -> &TabGroup {
        &self.groups[self.active]
    }

    /// Drop tabs whose files no longer exist on disk.
    pub fn close_missing(&mut self) {
        for group in &mut self.groups {
            group.tabs.retain(|t| t.exists());
        }
    }
}

/// Shared handle to the editor model.
pub type Editor = Arc<Mutex<EditorState>>;

pub fn new_editor() -> Editor {
    Arc::new(Mutex::new(EditorState::default()))
}

/// Record `path` as open, tolerating a poisoned lock.
pub fn open_in(editor: &Editor, path: &Path) {
    match editor.lock() {
        Ok(mut state) => state.open(path),
        Err(poisoned) => poisoned.into_inner().open(path),
    }
}
