use chrono::{DateTime, Local, Utc};

use crate::message::Message;
use crate::order::truncate;
use crate::template::{escape_html, substitute};

/// Display format for every timestamp on a page.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local-time display form of a message timestamp.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string()
}

/// Renders one chat bubble per message.
#[derive(Debug, Clone, Copy)]
pub struct ChatRenderer<'a> {
    template: &'a str,
    max_message_length: usize,
}

impl<'a> ChatRenderer<'a> {
    pub fn new(template: &'a str, max_message_length: usize) -> Self {
        Self {
            template,
            max_message_length,
        }
    }

    /// Render `message` at position `index` of the displayed sequence.
    ///
    /// Long bodies get a truncated snippet, a hidden full-text block and a
    /// "Show More" toggle, both keyed by `index`.
    pub fn render(&self, index: usize, message: &Message) -> String {
        let (snippet, truncated) = truncate(message.body(), self.max_message_length);

        let (full_content, expand_link) = if truncated {
            (
                format!(
                    r#"<div class="full-message" id="full-message-{index}" style="display: none;">{}</div>"#,
                    escape_html(message.body())
                ),
                format!(r##"<a href="#" class="expand-link" data-message-id="{index}">Show More</a>"##),
            )
        } else {
            (String::new(), String::new())
        };

        let author = escape_html(message.author());
        let content = escape_html(&snippet);
        let timestamp = format_timestamp(message.timestamp());
        let hashtags = escape_html(&message.hashtags().join(" "));

        substitute(
            self.template,
            &[
                ("author", author.as_str()),
                ("content", content.as_str()),
                ("full_content", full_content.as_str()),
                ("expand_link", expand_link.as_str()),
                ("timestamp", timestamp.as_str()),
                ("hashtags", hashtags.as_str()),
            ],
        )
    }
}

/// Renders one report table row per message.
#[derive(Debug, Clone, Copy)]
pub struct RowRenderer<'a> {
    template: &'a str,
}

impl<'a> RowRenderer<'a> {
    pub fn new(template: &'a str) -> Self {
        Self { template }
    }

    pub fn render(&self, message: &Message) -> String {
        let relative_path = escape_html(&message.source_path().to_string_lossy().replace('\\', "/"));
        let commit_timestamp = format_timestamp(message.timestamp());
        let stored_date = escape_html(message.stored_date());
        let author = escape_html(message.author());
        let hashtags = escape_html(&message.hashtags().join(", "));

        substitute(
            self.template,
            &[
                ("relative_path", relative_path.as_str()),
                ("commit_timestamp", commit_timestamp.as_str()),
                ("stored_date", stored_date.as_str()),
                ("author", author.as_str()),
                ("hashtags", hashtags.as_str()),
            ],
        )
    }
}
