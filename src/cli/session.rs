//! Session management CLI operations for toolchat.
//!
//! Handles listing and deleting chat sessions through the `toolchat session`
//! subcommand family, and partial session ID matching (git-style short IDs)
//! for `chat --session`.

use anyhow::Result;
use colored::Colorize;

use super::SessionAction;
use crate::session::{Session, SessionMeta};

/// Widest title shown in the session table.
const TITLE_WIDTH: usize = 50;

/// Dispatches a session subcommand to its handler.
pub(crate) fn handle_session(action: SessionAction) -> Result<()> {
    match action {
        SessionAction::List => session_list(),
        SessionAction::Delete { id } => {
            let full_id = resolve_session_id(&id)?;
            session_delete(&full_id)
        }
    }
}

fn short_id(id: &str) -> &str {
    &id[..8.min(id.len())]
}

/// Pick the single session whose ID starts with `partial`.
fn match_session<'a>(sessions: &'a [SessionMeta], partial: &str) -> Result<&'a SessionMeta> {
    let matches: Vec<_> = sessions.iter().filter(|s| s.id.starts_with(partial)).collect();
    match matches.as_slice() {
        [] => anyhow::bail!("No session found matching '{}'", partial),
        [only] => Ok(*only),
        _ => {
            eprintln!("{} Multiple sessions match '{}':", "ambiguous:".yellow(), partial);
            for s in &matches {
                let title = s.title.as_deref().unwrap_or("(untitled)");
                eprintln!("  {} {}", short_id(&s.id), title.dimmed());
            }
            anyhow::bail!("Provide more characters to disambiguate")
        }
    }
}

/// Resolves a partial session ID to a full ID.
pub(crate) fn resolve_session_id(partial: &str) -> Result<String> {
    let sessions = Session::list_all()?;
    Ok(match_session(&sessions, partial)?.id.clone())
}

/// Lists all saved sessions, most recently updated first.
fn session_list() -> Result<()> {
    let mut sessions = Session::list_all()?;
    if sessions.is_empty() {
        println!("{}", "No sessions found.".dimmed());
        println!("Start one with: {}", "toolchat chat".cyan());
        return Ok(());
    }
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let title_width = sessions
        .iter()
        .map(|s| s.title.as_deref().unwrap_or("(untitled)").chars().count())
        .max()
        .unwrap_or(5)
        .clamp(5, TITLE_WIDTH);

    println!(
        "{} {} {} {} {}",
        format!("{:<10}", "ID").bold(),
        format!("{:<tw$}", "TITLE", tw = title_width + 2).bold(),
        format!("{:<6}", "TURNS").bold(),
        format!("{:<18}", "UPDATED").bold(),
        "MODEL".bold(),
    );
    println!("{}", "-".repeat(10 + title_width + 2 + 6 + 18 + 20));

    for s in &sessions {
        let title_str = s.title.as_deref().unwrap_or("(untitled)");
        let title = if title_str.chars().count() > title_width {
            let truncated: String = title_str.chars().take(title_width - 3).collect();
            format!("{}...", truncated)
        } else {
            title_str.to_string()
        };

        // RFC3339 -> "YYYY-MM-DD HH:MM"
        let updated = chrono::DateTime::parse_from_rfc3339(&s.updated_at)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|_| s.updated_at.chars().take(16).collect());

        // Pad first, then colorize to avoid ANSI escape code width issues
        println!(
            "{} {} {} {} {}",
            format!("{:<10}", short_id(&s.id)).cyan(),
            format!("{:<tw$}", title, tw = title_width + 2),
            format!("{:<6}", s.turn_count).yellow(),
            format!("{:<18}", updated).dimmed(),
            s.model.dimmed(),
        );
    }
    println!();
    println!(
        "{} {} sessions. Resume with: {}",
        "total:".dimmed(),
        sessions.len(),
        "toolchat chat --session <id>".cyan()
    );
    Ok(())
}

/// Deletes a session by its full ID.
fn session_delete(id: &str) -> Result<()> {
    let sessions = Session::list_all()?;
    let meta = sessions
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| anyhow::anyhow!("Session not found: {}", id))?;
    let title = meta.title.as_deref().unwrap_or("(untitled)");
    println!("Deleting session {} (\"{}\")", short_id(id).cyan(), title);
    Session::delete(id)?;
    println!("{}", "Deleted.".green());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: &str) -> SessionMeta {
        SessionMeta {
            id: id.into(),
            title: None,
            model: "m".into(),
            created_at: String::new(),
            updated_at: String::new(),
            turn_count: 0,
        }
    }

    #[test]
    fn partial_ids_resolve_to_a_single_session() {
        let sessions = vec![meta("1a2b3c4d-0000"), meta("1a9f0000-1111"), meta("ffee0000-2222")];
        assert_eq!(match_session(&sessions, "1a2").unwrap().id, "1a2b3c4d-0000");
        assert_eq!(match_session(&sessions, "ff").unwrap().id, "ffee0000-2222");
        assert!(match_session(&sessions, "1a").is_err());
        assert!(match_session(&sessions, "zz").is_err());
    }
}
