//! The two page pipelines.
//!
//! Both run scan -> load -> sort -> limit -> render -> assemble -> write.
//! The chat page additionally truncates long bodies; the report renders one
//! table row per message. A run holds the output lock for its file from the
//! scan to the final write.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::loader::MessageLoader;
use crate::locks::OutputLocks;
use crate::message::Message;
use crate::order::sort_messages;
use crate::page::{write_page, PageAssembler, PageContent, PageTokens};
use crate::render::{ChatRenderer, RowRenderer};
use crate::scan::{DirectoryScanner, ScanError};
use crate::template::{ChatTemplates, ReportTemplates, TemplateError};

pub const DEFAULT_MAX_MESSAGES: usize = 50;
pub const DEFAULT_MAX_ROWS: usize = 100;
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 300;
pub const DEFAULT_CHAT_TITLE: &str = "THIMBLE Chat";
pub const DEFAULT_REPORT_TITLE: &str = "THIMBLE";

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Failed to write page {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub output_file: PathBuf,
    pub max_messages: usize,
    pub max_message_length: usize,
    pub title: String,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("chat.html"),
            max_messages: DEFAULT_MAX_MESSAGES,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            title: DEFAULT_CHAT_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub output_file: PathBuf,
    pub max_rows: usize,
    pub title: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("log.html"),
            max_rows: DEFAULT_MAX_ROWS,
            title: DEFAULT_REPORT_TITLE.to_string(),
        }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub output_file: PathBuf,
    /// Message files found by the scan.
    pub scanned: usize,
    /// Items that made it onto the page.
    pub shown: usize,
    /// Files that could not be read or decoded.
    pub placeholders: usize,
}

/// Scanner plus loader, with the lock registry shared across runs.
pub struct Pipeline<L> {
    scanner: DirectoryScanner,
    loader: L,
    locks: Arc<OutputLocks>,
}

impl<L: MessageLoader> Pipeline<L> {
    pub fn new(scanner: DirectoryScanner, loader: L) -> Self {
        Self {
            scanner,
            loader,
            locks: Arc::new(OutputLocks::new()),
        }
    }

    /// Share an existing lock registry instead of a private one.
    pub fn with_locks(mut self, locks: Arc<OutputLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn scanner(&self) -> &DirectoryScanner {
        &self.scanner
    }

    /// Every message under the scan root, newest first.
    pub fn collect(&self) -> Result<Vec<Message>, ScanError> {
        let paths = self.scanner.scan()?;
        let mut messages: Vec<Message> = paths.iter().map(|p| self.loader.load(p)).collect();
        sort_messages(&mut messages);
        debug!(root = %self.scanner.root().display(), count = messages.len(), "Collected messages");
        Ok(messages)
    }

    pub fn write_chat(
        &self,
        templates: &ChatTemplates,
        options: &ChatOptions,
    ) -> Result<PageSummary, PipelineError> {
        self.locks.with_lock(&options.output_file, || -> Result<PageSummary, PipelineError> {
            let messages = self.collect()?;
            let html = render_chat(templates, options, &messages);
            self.finish(&options.output_file, &html, &messages, options.max_messages)
        })
    }

    pub fn write_report(
        &self,
        templates: &ReportTemplates,
        options: &ReportOptions,
    ) -> Result<PageSummary, PipelineError> {
        self.locks.with_lock(&options.output_file, || -> Result<PageSummary, PipelineError> {
            let messages = self.collect()?;
            let html = render_report(templates, options, &messages);
            self.finish(&options.output_file, &html, &messages, options.max_rows)
        })
    }

    fn finish(
        &self,
        path: &std::path::Path,
        html: &str,
        messages: &[Message],
        limit: usize,
    ) -> Result<PageSummary, PipelineError> {
        write_page(path, html).map_err(|source| PipelineError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        let summary = PageSummary {
            output_file: path.to_path_buf(),
            scanned: messages.len(),
            shown: messages.len().min(limit),
            placeholders: messages.iter().filter(|m| m.is_placeholder()).count(),
        };
        info!(
            path = %path.display(),
            scanned = summary.scanned,
            shown = summary.shown,
            placeholders = summary.placeholders,
            "Wrote page"
        );
        Ok(summary)
    }
}

/// Chat page HTML for already sorted `messages`.
pub fn render_chat(templates: &ChatTemplates, options: &ChatOptions, messages: &[Message]) -> String {
    let renderer = ChatRenderer::new(&templates.message, options.max_message_length);
    let fragments: Vec<String> = messages
        .iter()
        .take(options.max_messages)
        .enumerate()
        .map(|(index, message)| renderer.render(index, message))
        .collect();

    PageAssembler::new(&templates.page, &templates.style, PageTokens::CHAT)
        .with_script(&templates.script)
        .assemble(&PageContent {
            fragments: &fragments,
            scanned: messages.len(),
            title: &options.title,
            generated_at: Local::now(),
        })
}

/// Report page HTML for already sorted `messages`.
pub fn render_report(
    templates: &ReportTemplates,
    options: &ReportOptions,
    messages: &[Message],
) -> String {
    let renderer = RowRenderer::new(&templates.row);
    let fragments: Vec<String> = messages
        .iter()
        .take(options.max_rows)
        .map(|message| renderer.render(message))
        .collect();

    PageAssembler::new(&templates.page, &templates.style, PageTokens::REPORT).assemble(&PageContent {
        fragments: &fragments,
        scanned: messages.len(),
        title: &options.title,
        generated_at: Local::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::MetadataExtractor;
    use chrono::{TimeZone, Utc};

    fn message(content: &str, path: &str, minute: u32) -> Message {
        let text = MetadataExtractor::for_chat().extract_text(content);
        let ts = Utc.with_ymd_and_hms(2024, 5, 5, 12, minute, 0).unwrap();
        Message::new(text, PathBuf::from(path), ts)
    }

    fn chat_templates() -> ChatTemplates {
        ChatTemplates {
            page: "{chat_messages}|{message_count}|{total_count}</body>".into(),
            message: "<{author}:{content}>".into(),
            style: "".into(),
            script: "s".into(),
        }
    }

    #[test]
    fn test_render_chat_limits_and_counts() {
        let messages: Vec<Message> = (0..5)
            .map(|i| message(&format!("Author: A{i}\nm{i}"), &format!("{i}.txt"), i))
            .collect();
        let options = ChatOptions {
            max_messages: 2,
            ..ChatOptions::default()
        };

        let html = render_chat(&chat_templates(), &options, &messages);

        assert_eq!(html, "<A0:m0><A1:m1>|2|5<script>s</script></body>");
    }

    #[test]
    fn test_render_report_on_empty_board() {
        let templates = ReportTemplates {
            page: "[{table_rows}]{file_count}".into(),
            row: "<tr/>".into(),
            style: "".into(),
        };
        let html = render_report(&templates, &ReportOptions::default(), &[]);
        assert_eq!(html, "[]0");
    }

    #[test]
    fn test_default_options() {
        let chat = ChatOptions::default();
        assert_eq!(chat.output_file, PathBuf::from("chat.html"));
        assert_eq!(chat.max_messages, 50);
        assert_eq!(chat.max_message_length, 300);
        assert_eq!(chat.title, "THIMBLE Chat");

        let report = ReportOptions::default();
        assert_eq!(report.output_file, PathBuf::from("log.html"));
        assert_eq!(report.max_rows, 100);
        assert_eq!(report.title, "THIMBLE");
    }
}
