//! Session persistence for toolchat.
//!
//! Each session is stored as a JSONL file under
//! `~/.local/share/toolchat/sessions/`, one [`ChatTurn`] per line (prompt,
//! streamed response and the turn's tool-call metadata). A
//! `sessions/index.json` file maintains metadata for all sessions.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::ToolCallsMetadata;
use crate::config::Config;
use crate::prompt::ChatTurn;

/// Metadata for a single session, stored in the session index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMeta {
    pub id: String,
    pub title: Option<String>,
    pub model: String,
    pub created_at: String,
    pub updated_at: String,
    pub turn_count: usize,
}

/// Index of all sessions, persisted as `index.json`.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SessionIndex {
    pub sessions: Vec<SessionMeta>,
}

/// An active conversation session.
///
/// Appends each finished turn to its JSONL file and refreshes the index.
pub struct Session {
    pub id: String,
    pub turns: Vec<ChatTurn>,
    pub model: String,
    dir: PathBuf,
}

impl Session {
    /// Creates a new session with a UUID v4 identifier.
    pub fn new(model: &str) -> Result<Self> {
        Self::create_in(&Config::sessions_dir()?, model)
    }

    fn create_in(dir: &Path, model: &str) -> Result<Self> {
        fs::create_dir_all(dir).context("Failed to create sessions directory")?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            turns: Vec::new(),
            model: model.to_string(),
            dir: dir.to_path_buf(),
        })
    }

    /// Loads an existing session from its JSONL file.
    pub fn load(id: &str) -> Result<Self> {
        Self::load_from(&Config::sessions_dir()?, id)
    }

    fn load_from(dir: &Path, id: &str) -> Result<Self> {
        let file_path = Self::session_path(dir, id);
        let short = &id[..8.min(id.len())];
        anyhow::ensure!(file_path.exists(), "Session {} not found", short);

        let model = Self::load_index(dir)?
            .sessions
            .into_iter()
            .find(|s| s.id == id)
            .map(|s| s.model)
            .unwrap_or_default();

        let file = fs::File::open(&file_path)
            .with_context(|| format!("Failed to open session file {:?}", file_path))?;
        let mut turns = Vec::new();
        for (number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let turn: ChatTurn = serde_json::from_str(&line).with_context(|| {
                format!("Failed to parse turn on line {} of {:?}", number + 1, file_path)
            })?;
            turns.push(turn);
        }

        Ok(Self {
            id: id.to_string(),
            turns,
            model,
            dir: dir.to_path_buf(),
        })
    }

    /// Appends a finished turn, flushing it before the index is updated.
    pub fn append(&mut self, turn: ChatTurn) -> Result<()> {
        let path = Self::session_path(&self.dir, &self.id);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open session file {:?}", path))?;

        let json = serde_json::to_string(&turn)?;
        writeln!(file, "{}", json)?;
        file.flush()?;

        self.turns.push(turn);
        self.update_index()
    }

    /// Tool metadata of the latest turn, used to seed the next one.
    pub fn last_metadata(&self) -> Option<&ToolCallsMetadata> {
        self.turns.last().map(|t| &t.tool_calls)
    }

    /// Forget the in-memory history. The session file is left as is.
    pub fn clear_history(&mut self) {
        self.turns.clear();
    }

    /// Returns the session title derived from the first prompt.
    pub fn title(&self) -> Option<String> {
        self.turns.first().map(|t| {
            if t.prompt.chars().count() > 50 {
                let truncated: String = t.prompt.chars().take(50).collect();
                format!("{}...", truncated)
            } else {
                t.prompt.clone()
            }
        })
    }

    /// Updates (or creates) this session's entry in the index file.
    fn update_index(&self) -> Result<()> {
        let mut index = Self::load_index(&self.dir)?;
        let now = Utc::now().to_rfc3339();

        if let Some(entry) = index.sessions.iter_mut().find(|s| s.id == self.id) {
            entry.title = self.title();
            entry.updated_at = now;
            entry.turn_count = self.turns.len();
        } else {
            index.sessions.push(SessionMeta {
                id: self.id.clone(),
                title: self.title(),
                model: self.model.clone(),
                created_at: now.clone(),
                updated_at: now,
                turn_count: self.turns.len(),
            });
        }

        Self::write_index(&self.dir, &index)
    }

    fn load_index(dir: &Path) -> Result<SessionIndex> {
        let path = dir.join("index.json");
        if !path.exists() {
            return Ok(SessionIndex::default());
        }
        let contents = fs::read_to_string(&path).with_context(|| "Failed to read session index")?;
        serde_json::from_str(&contents).with_context(|| "Failed to parse session index")
    }

    fn write_index(dir: &Path, index: &SessionIndex) -> Result<()> {
        let json = serde_json::to_string_pretty(index)?;
        fs::write(dir.join("index.json"), json).with_context(|| "Failed to write session index")
    }

    fn session_path(dir: &Path, id: &str) -> PathBuf {
        dir.join(format!("{}.jsonl", id))
    }

    /// Returns metadata for all sessions.
    pub fn list_all() -> Result<Vec<SessionMeta>> {
        Ok(Self::load_index(&Config::sessions_dir()?)?.sessions)
    }

    /// Deletes a session's JSONL file and removes it from the index.
    pub fn delete(id: &str) -> Result<()> {
        Self::delete_in(&Config::sessions_dir()?, id)
    }

    fn delete_in(dir: &Path, id: &str) -> Result<()> {
        let path = Self::session_path(dir, id);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete session file {:?}", path))?;
        }
        if dir.exists() {
            let mut index = Self::load_index(dir)?;
            index.sessions.retain(|s| s.id != id);
            Self::write_index(dir, &index)?;
        }
        Ok(())
    }
}
