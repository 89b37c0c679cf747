use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Author shown on the chat page when a message has no `Author:` line.
pub const CHAT_DEFAULT_AUTHOR: &str = "Unknown";
/// Author shown in the report when a message has no `Author:` line.
pub const REPORT_DEFAULT_AUTHOR: &str = "";
/// Author of the placeholder produced for unreadable files.
pub const PLACEHOLDER_AUTHOR: &str = "Error";
/// Body of the placeholder produced for unreadable files.
pub const PLACEHOLDER_BODY: &str = "Error reading message";

/// Whether a message was parsed from its file or stands in for a bad one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Parsed,
    Placeholder,
}

/// Metadata pulled out of a message file's text, before it is tied to a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub author: String,
    pub body: String,
    pub hashtags: Vec<String>,
    pub status: MessageStatus,
}

impl ExtractedText {
    /// Stand-in for a file that could not be read or decoded.
    pub fn placeholder() -> Self {
        Self {
            author: PLACEHOLDER_AUTHOR.to_string(),
            body: PLACEHOLDER_BODY.to_string(),
            hashtags: Vec::new(),
            status: MessageStatus::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.status == MessageStatus::Placeholder
    }
}

/// One `.txt` file on the board.
///
/// Messages are rebuilt from disk on every run and never change once built,
/// so the fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    author: String,
    body: String,
    hashtags: Vec<String>,
    timestamp: DateTime<Utc>,
    source_path: PathBuf,
    stored_date: String,
    status: MessageStatus,
}

impl Message {
    /// Build a message from extracted text and the file it came from.
    ///
    /// `source_path` is relative to the repository root. The stored date is
    /// the name of the directory holding the file (`message/<YYYY-MM-DD>/`).
    pub fn new(text: ExtractedText, source_path: PathBuf, timestamp: DateTime<Utc>) -> Self {
        let stored_date = source_path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            author: text.author,
            body: text.body,
            hashtags: text.hashtags,
            timestamp,
            source_path,
            stored_date,
            status: text.status,
        }
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn hashtags(&self) -> &[String] {
        &self.hashtags
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn stored_date(&self) -> &str {
        &self.stored_date
    }

    pub fn status(&self) -> MessageStatus {
        self.status
    }

    pub fn is_placeholder(&self) -> bool {
        self.status == MessageStatus::Placeholder
    }
}
