//! Saving new messages to the board.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::debug;

/// Words of the message that make up its file name.
const TITLE_WORDS: usize = 5;
const RANDOM_NAME_LEN: usize = 10;

/// File stem for a message: its first words joined by `_`, reduced to
/// alphanumerics, `_` and `-`.
pub fn title_for(message: &str) -> Option<String> {
    let joined = message
        .split_whitespace()
        .take(TITLE_WORDS)
        .collect::<Vec<_>>()
        .join("_");
    let title: String = joined
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Ten random lowercase letters.
pub fn random_name() -> String {
    uuid::Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(RANDOM_NAME_LEN)
        .map(|b| char::from(b'a' + b % 26))
        .collect()
}

/// File contents: the message, a blank line, then the author line.
pub fn message_file_contents(author: &str, message: &str) -> String {
    format!("{}\n\nauthor: {}", message, author)
}

/// Save a message under `<message_dir>/<date>/`, returning its path.
///
/// Existing files are never overwritten; a numeric suffix is added instead.
pub fn save_message(message_dir: &Path, date: NaiveDate, author: &str, message: &str) -> Result<PathBuf> {
    let author = author.trim();
    let message = message.trim();
    if author.is_empty() {
        bail!("Author must not be empty");
    }
    if message.is_empty() {
        bail!("Message must not be empty");
    }

    let dir = message_dir.join(date.format("%Y-%m-%d").to_string());
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let stem = title_for(message).unwrap_or_else(random_name);
    let path = free_path(&dir, &stem);

    std::fs::write(&path, message_file_contents(author, message))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    debug!(path = %path.display(), author, "Saved message");
    Ok(path)
}

fn free_path(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{}.txt", stem));
    if !first.exists() {
        return first;
    }
    (2..)
        .map(|n| dir.join(format!("{}_{}.txt", stem, n)))
        .find(|p| !p.exists())
        .unwrap_or(first)
}
