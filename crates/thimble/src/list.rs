use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use thimble_core::{format_timestamp, Message};

/// One row of `thimble list --json`.
#[derive(Debug, Serialize)]
pub struct ListedMessage<'a> {
    pub timestamp: String,
    pub author: &'a str,
    pub path: String,
    pub hashtags: &'a [String],
    pub placeholder: bool,
}

impl<'a> From<&'a Message> for ListedMessage<'a> {
    fn from(m: &'a Message) -> Self {
        Self {
            timestamp: m.timestamp().to_rfc3339(),
            author: m.author(),
            path: m.source_path().to_string_lossy().replace('\\', "/"),
            hashtags: m.hashtags(),
            placeholder: m.is_placeholder(),
        }
    }
}

pub fn print_messages(messages: &[Message], json: bool) -> Result<()> {
    if json {
        let rows: Vec<ListedMessage<'_>> = messages.iter().map(ListedMessage::from).collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if messages.is_empty() {
        println!("{}", "No messages found.".dimmed());
    } else {
        print_messages_table(messages);
    }
    Ok(())
}

fn print_messages_table(messages: &[Message]) {
    println!(
        "{:<20} {:<16} {:<44} {}",
        "TIMESTAMP".dimmed(),
        "AUTHOR".dimmed(),
        "PATH".dimmed(),
        "HASHTAGS".dimmed(),
    );

    for m in messages {
        let author = if m.is_placeholder() {
            m.author().bright_red().to_string()
        } else if m.author().is_empty() {
            "-".dimmed().to_string()
        } else {
            m.author().bright_cyan().to_string()
        };
        let path = m.source_path().to_string_lossy().replace('\\', "/");

        println!(
            "{:<20} {:<16} {:<44} {}",
            format_timestamp(m.timestamp()),
            author,
            path,
            m.hashtags().join(" ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;
    use thimble_core::{ExtractedText, MetadataExtractor};

    #[test]
    fn test_listed_message_json() {
        let text = MetadataExtractor::for_report().extract_text("Author: Ada\nhi #a #b");
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let message = Message::new(text, PathBuf::from("message/2024-06-01/hi.txt"), ts);

        let value = serde_json::to_value(ListedMessage::from(&message)).unwrap();

        assert_eq!(value["author"], "Ada");
        assert_eq!(value["path"], "message/2024-06-01/hi.txt");
        assert_eq!(value["hashtags"], serde_json::json!(["#a", "#b"]));
        assert_eq!(value["timestamp"], "2024-06-01T08:00:00+00:00");
        assert_eq!(value["placeholder"], false);
    }

    #[test]
    fn test_placeholder_is_flagged() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let message = Message::new(ExtractedText::placeholder(), PathBuf::from("bad.txt"), ts);

        let listed = ListedMessage::from(&message);
        assert!(listed.placeholder);
        assert_eq!(listed.author, "Error");
    }
}
