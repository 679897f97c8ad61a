//! Workspace root, trust flag and path resolution shared by the file tools.

use anyhow::{bail, Context, Result};
use std::path::{Component, Path, PathBuf};

use crate::constants::FIND_MAX_RESULTS;

/// The directory tree the tools are allowed to touch.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    /// Canonical form of `root`, when it can be resolved.
    canonical_root: Option<PathBuf>,
    trusted: bool,
    excludes: Vec<glob::Pattern>,
}

impl Workspace {
    /// Create a workspace rooted at `root`.
    ///
    /// Invalid exclude patterns are skipped with a warning.
    pub fn new(root: PathBuf, trusted: bool, excludes: &[String]) -> Self {
        let canonical_root = root.canonicalize().ok();
        let excludes = excludes
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    tracing::warn!(pattern = %p, error = %e, "ignoring invalid exclude pattern");
                    None
                }
            })
            .collect();
        Self {
            root,
            canonical_root,
            trusted,
            excludes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether destructive operations are allowed.
    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    /// Resolve `path` against the root and reject anything outside it.
    ///
    /// Resolution is lexical so paths that don't exist yet can be checked.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        if path.trim().is_empty() {
            bail!("Invalid file path. Please provide a valid file path.");
        }
        let joined = if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.root.join(path)
        };
        let normalized = normalize(&joined);
        if !self.contains(&normalized) {
            bail!(
                "The file path \"{}\" is outside the workspace. Please provide a valid workspace path.",
                normalized.display()
            );
        }
        Ok(normalized)
    }

    /// Resolve a path that must already exist.
    pub fn resolve_existing(&self, path: &str) -> Result<PathBuf> {
        let resolved = self.resolve(path)?;
        if !resolved.exists() {
            bail!("File not found: {}", resolved.display());
        }
        Ok(resolved)
    }

    fn contains(&self, path: &Path) -> bool {
        path.starts_with(normalize(&self.root))
            || self
                .canonical_root
                .as_ref()
                .is_some_and(|root| path.starts_with(root))
    }

    fn is_excluded(&self, relative: &Path) -> bool {
        self.excludes.iter().any(|p| p.matches_path(relative))
    }

    /// Expand a glob pattern relative to the root, skipping excluded paths.
    ///
    /// Results are sorted and capped at [`FIND_MAX_RESULTS`].
    pub fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let full_pattern = if Path::new(pattern).is_absolute() {
            PathBuf::from(pattern)
        } else {
            self.root.join(pattern)
        };
        let pattern_str = full_pattern.to_string_lossy();

        let mut paths = Vec::new();
        for entry in glob::glob(&pattern_str).with_context(|| format!("Invalid pattern: {pattern}"))? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable glob entry");
                    continue;
                }
            };
            let normalized = normalize(&entry);
            if !self.contains(&normalized) {
                continue;
            }
            if self.is_excluded(&self.relative(&normalized)) {
                continue;
            }
            paths.push(normalized);
            if paths.len() >= FIND_MAX_RESULTS {
                break;
            }
        }
        paths.sort();
        Ok(paths)
    }

    /// Path relative to the root, for display and exclusion matching.
    pub fn relative(&self, path: &Path) -> PathBuf {
        let root = normalize(&self.root);
        if let Ok(rel) = path.strip_prefix(&root) {
            return rel.to_path_buf();
        }
        if let Some(canonical) = &self.canonical_root {
            if let Ok(rel) = path.strip_prefix(canonical) {
                return rel.to_path_buf();
            }
        }
        path.to_path_buf()
    }
}

/// Lexically remove `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace(dir: &Path) -> Workspace {
        Workspace::new(dir.to_path_buf(), true, &["**/node_modules/**".to_string()])
    }

    #[test]
    fn resolve_rejects_parent_escape() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        assert!(ws.resolve("../../etc/passwd").is_err());
        assert!(ws.resolve("src/../lib.rs").unwrap().ends_with("lib.rs"));
    }

    #[test]
    fn resolve_rejects_empty_path() {
        let dir = tempfile::tempdir().unwrap();
        let ws = workspace(dir.path());
        let err = ws.resolve("  ").unwrap_err();
        assert!(err.to_string().contains("Invalid file path"));
    }

    #[test]
    fn glob_skips_excluded_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("pkg/node_modules")).unwrap();
        std::fs::write(dir.path().join("a.ts"), "").unwrap();
        std::fs::write(dir.path().join("pkg/b.ts"), "").unwrap();
        std::fs::write(dir.path().join("pkg/node_modules/dep.ts"), "").unwrap();

        let ws = workspace(dir.path());
        let found: Vec<PathBuf> = ws
            .glob("**/*.ts")
            .unwrap()
            .iter()
            .map(|p| ws.relative(p))
            .collect();
        assert_eq!(found, vec![PathBuf::from("a.ts"), PathBuf::from("pkg/b.ts")]);
    }
}
