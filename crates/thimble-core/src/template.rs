//! Plain-text templates with `{token}` placeholders.
//!
//! Templates are not parsed into anything richer than a string. A single
//! pass replaces known `{name}` tokens, turns `{{` and `}}` into literal
//! braces and copies everything else through. Values are inserted as given;
//! callers escape user content with [`escape_html`] first.

use std::borrow::Cow;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read template {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Substitute `{name}` tokens in `template`.
pub fn substitute(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }
        if let Some(end) = tail.strip_prefix('{').and_then(|t| t.find('}')) {
            let name = &tail[1..=end];
            if let Some((_, value)) = values.iter().find(|(key, _)| *key == name) {
                out.push_str(value);
                rest = &tail[end + 2..];
                continue;
            }
        }

        // Lone brace or unknown token: copy one character and move on.
        out.push_str(&tail[..1]);
        rest = &tail[1..];
    }

    out.push_str(rest);
    out
}

/// Template files the board knows how to render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFile {
    ChatPage,
    ChatMessage,
    ChatStyle,
    ChatScript,
    ReportPage,
    ReportRow,
    ReportStyle,
}

impl TemplateFile {
    pub fn file_name(self) -> &'static str {
        match self {
            TemplateFile::ChatPage => "chat_page.html",
            TemplateFile::ChatMessage => "chat_message.html",
            TemplateFile::ChatStyle => "chat_style.css",
            TemplateFile::ChatScript => "chat.js",
            TemplateFile::ReportPage => "page.html",
            TemplateFile::ReportRow => "page_row.html",
            TemplateFile::ReportStyle => "report.css",
        }
    }

    /// Version compiled into the binary.
    pub fn builtin(self) -> &'static str {
        match self {
            TemplateFile::ChatPage => include_str!("../templates/chat_page.html"),
            TemplateFile::ChatMessage => include_str!("../templates/chat_message.html"),
            TemplateFile::ChatStyle => include_str!("../templates/chat_style.css"),
            TemplateFile::ChatScript => include_str!("../templates/chat.js"),
            TemplateFile::ReportPage => include_str!("../templates/page.html"),
            TemplateFile::ReportRow => include_str!("../templates/page_row.html"),
            TemplateFile::ReportStyle => include_str!("../templates/report.css"),
        }
    }

    /// Load from `dir` when given and the file exists there, else the builtin.
    pub fn load(self, dir: Option<&Path>) -> Result<Cow<'static, str>, TemplateError> {
        let Some(dir) = dir else {
            return Ok(Cow::Borrowed(self.builtin()));
        };

        let path = dir.join(self.file_name());
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                debug!(path = %path.display(), "Loaded template override");
                Ok(Cow::Owned(content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Cow::Borrowed(self.builtin()))
            }
            Err(source) => Err(TemplateError::Read { path, source }),
        }
    }
}

/// Templates for the chat page.
#[derive(Debug, Clone)]
pub struct ChatTemplates {
    pub page: Cow<'static, str>,
    pub message: Cow<'static, str>,
    pub style: Cow<'static, str>,
    pub script: Cow<'static, str>,
}

impl ChatTemplates {
    pub fn builtin() -> Self {
        Self {
            page: Cow::Borrowed(TemplateFile::ChatPage.builtin()),
            message: Cow::Borrowed(TemplateFile::ChatMessage.builtin()),
            style: Cow::Borrowed(TemplateFile::ChatStyle.builtin()),
            script: Cow::Borrowed(TemplateFile::ChatScript.builtin()),
        }
    }

    pub fn load(dir: Option<&Path>) -> Result<Self, TemplateError> {
        Ok(Self {
            page: TemplateFile::ChatPage.load(dir)?,
            message: TemplateFile::ChatMessage.load(dir)?,
            style: TemplateFile::ChatStyle.load(dir)?,
            script: TemplateFile::ChatScript.load(dir)?,
        })
    }
}

/// Templates for the tabular report.
#[derive(Debug, Clone)]
pub struct ReportTemplates {
    pub page: Cow<'static, str>,
    pub row: Cow<'static, str>,
    pub style: Cow<'static, str>,
}

impl ReportTemplates {
    pub fn builtin() -> Self {
        Self {
            page: Cow::Borrowed(TemplateFile::ReportPage.builtin()),
            row: Cow::Borrowed(TemplateFile::ReportRow.builtin()),
            style: Cow::Borrowed(TemplateFile::ReportStyle.builtin()),
        }
    }

    pub fn load(dir: Option<&Path>) -> Result<Self, TemplateError> {
        Ok(Self {
            page: TemplateFile::ReportPage.load(dir)?,
            row: TemplateFile::ReportRow.load(dir)?,
            style: TemplateFile::ReportStyle.load(dir)?,
        })
    }
}
