use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

/// Which page a pipeline produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Chat,
    Report,
}

impl PageKind {
    fn label(self) -> &'static str {
        match self {
            PageKind::Chat => "chat",
            PageKind::Report => "report",
        }
    }
}

/// User-facing events of a board run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BoardEvent {
    PageWritten {
        page: PageKind,
        path: PathBuf,
        scanned: usize,
        shown: usize,
        placeholders: usize,
    },
    MessageSaved {
        path: PathBuf,
        author: String,
    },
    CommitCreated {
        commit_id: String,
        files: usize,
    },
    NothingToCommit,
    SyncCompleted {
        stashed: bool,
        merged: bool,
        pushed: bool,
    },
    /// Sync failures are reported, never fatal
    SyncFailed {
        error: String,
    },
    WatchStarted {
        dir: PathBuf,
    },
    WatchTriggered {
        changed: usize,
    },
    WatchStopped,
    ErrorEncountered {
        context: String,
        error: String,
    },
}

impl BoardEvent {
    fn with_timestamp(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.insert(
                "timestamp".to_string(),
                serde_json::Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
        value
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable format with colors
    #[default]
    Pretty,
    /// JSON lines format for machine consumption
    Json,
    /// Compact single-line format
    Compact,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

/// Writes board events to stderr in the chosen format
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger {
    format: LogFormat,
}

impl Logger {
    pub fn new(format: LogFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    pub fn log(&self, event: &BoardEvent) {
        if let Some(line) = self.render(event) {
            let _ = writeln!(std::io::stderr(), "{}", line);
        }
    }

    /// The line `log` would print, if any.
    pub fn render(&self, event: &BoardEvent) -> Option<String> {
        match self.format {
            LogFormat::Json => Some(event.with_timestamp().to_string()),
            LogFormat::Pretty => Some(Self::render_pretty(event)),
            LogFormat::Compact => Some(Self::render_compact(event)),
        }
    }

    fn render_pretty(event: &BoardEvent) -> String {
        match event {
            BoardEvent::PageWritten {
                page,
                path,
                scanned,
                shown,
                placeholders,
            } => {
                let mut line = format!(
                    "{} Wrote {} page {} ({} of {} {})",
                    "✓".bright_green(),
                    page.label(),
                    path.display().to_string().bold(),
                    shown,
                    scanned,
                    if *scanned == 1 { "message" } else { "messages" }
                );
                if *placeholders > 0 {
                    line.push_str(&format!(
                        ", {}",
                        format!("{} unreadable", placeholders).bright_yellow()
                    ));
                }
                line
            }
            BoardEvent::MessageSaved { path, author } => format!(
                "{} Saved message from {} to {}",
                "✓".bright_green(),
                author.bright_cyan(),
                path.display()
            ),
            BoardEvent::CommitCreated { commit_id, files } => format!(
                "{} Committed {} {} ({})",
                "✓".bright_green(),
                files,
                if *files == 1 { "file" } else { "files" },
                commit_id.chars().take(7).collect::<String>().dimmed()
            ),
            BoardEvent::NothingToCommit => format!("{}", "No new messages to commit".dimmed()),
            BoardEvent::SyncCompleted {
                stashed,
                merged,
                pushed,
            } => {
                let mut parts = Vec::new();
                if *stashed {
                    parts.push("stashed");
                }
                if *merged {
                    parts.push("merged");
                }
                if *pushed {
                    parts.push("pushed");
                }
                let detail = if parts.is_empty() {
                    "nothing to do".to_string()
                } else {
                    parts.join(", ")
                };
                format!("{} Synced with remote ({})", "✓".bright_green(), detail)
            }
            BoardEvent::SyncFailed { error } => format!(
                "{} Sync failed: {}",
                "⚠".bright_yellow(),
                error.bright_yellow()
            ),
            BoardEvent::WatchStarted { dir } => format!(
                "{} Watching {} (Ctrl+C to stop)",
                "▶".bright_cyan(),
                dir.display().to_string().bold()
            ),
            BoardEvent::WatchTriggered { changed } => format!(
                "{} {} {} changed, regenerating",
                "↻".bright_blue(),
                changed,
                if *changed == 1 { "file" } else { "files" }
            ),
            BoardEvent::WatchStopped => format!("{}", "Stopped watching".dimmed()),
            BoardEvent::ErrorEncountered { context, error } => format!(
                "{} {}: {}",
                "✗".bright_red(),
                context,
                error.bright_red()
            ),
        }
    }

    fn render_compact(event: &BoardEvent) -> String {
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        match event {
            BoardEvent::PageWritten {
                page,
                path,
                scanned,
                shown,
                placeholders,
            } => format!(
                "[{}] page:{} {} {}/{} bad={}",
                timestamp,
                page.label(),
                path.display(),
                shown,
                scanned,
                placeholders
            ),
            BoardEvent::MessageSaved { path, author } => {
                format!("[{}] post:{} {}", timestamp, author, path.display())
            }
            BoardEvent::CommitCreated { commit_id, files } => {
                format!("[{}] commit:{} {}f", timestamp, commit_id, files)
            }
            BoardEvent::NothingToCommit => format!("[{}] commit:none", timestamp),
            BoardEvent::SyncCompleted {
                stashed,
                merged,
                pushed,
            } => format!(
                "[{}] sync:done stashed={} merged={} pushed={}",
                timestamp, stashed, merged, pushed
            ),
            BoardEvent::SyncFailed { error } => format!("[{}] sync:failed {}", timestamp, error),
            BoardEvent::WatchStarted { dir } => {
                format!("[{}] watch:start {}", timestamp, dir.display())
            }
            BoardEvent::WatchTriggered { changed } => {
                format!("[{}] watch:change {}", timestamp, changed)
            }
            BoardEvent::WatchStopped => format!("[{}] watch:stop", timestamp),
            BoardEvent::ErrorEncountered { context, error } => {
                format!("[{}] error:{}:{}", timestamp, context, error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_written(placeholders: usize) -> BoardEvent {
        BoardEvent::PageWritten {
            page: PageKind::Report,
            path: PathBuf::from("log.html"),
            scanned: 120,
            shown: 100,
            placeholders,
        }
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_json_lines_are_tagged_and_timestamped() {
        let line = Logger::new(LogFormat::Json).render(&page_written(2)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["event"], "page_written");
        assert_eq!(value["page"], "report");
        assert_eq!(value["shown"], 100);
        assert_eq!(value["placeholders"], 2);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_event_round_trips_through_json() {
        let event = BoardEvent::SyncFailed {
            error: "push rejected".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"event":"sync_failed","error":"push rejected"}"#);
        assert_eq!(serde_json::from_str::<BoardEvent>(&json).unwrap(), event);
    }

    #[test]
    fn test_compact_line() {
        let line = Logger::new(LogFormat::Compact).render(&page_written(0)).unwrap();
        assert!(line.ends_with("page:report log.html 100/120 bad=0"));
    }

    #[test]
    fn test_pretty_mentions_unreadable_files_only_when_present() {
        colored::control::set_override(false);
        let logger = Logger::new(LogFormat::Pretty);

        let clean = logger.render(&page_written(0)).unwrap();
        assert_eq!(clean, "✓ Wrote report page log.html (100 of 120 messages)");

        let dirty = logger.render(&page_written(3)).unwrap();
        assert!(dirty.ends_with(", 3 unreadable"));
    }
}
