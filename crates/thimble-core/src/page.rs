use std::path::Path;

use chrono::{DateTime, Local};

use crate::render::TIMESTAMP_FORMAT;
use crate::template::{escape_html, substitute};

/// Which token of the page template receives the fragments and the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTokens {
    pub items: &'static str,
    pub count: &'static str,
}

impl PageTokens {
    pub const CHAT: PageTokens = PageTokens {
        items: "chat_messages",
        count: "message_count",
    };

    pub const REPORT: PageTokens = PageTokens {
        items: "table_rows",
        count: "file_count",
    };
}

/// What goes into one page.
#[derive(Debug, Clone)]
pub struct PageContent<'a> {
    pub fragments: &'a [String],
    /// Files scanned, before the display limit was applied.
    pub scanned: usize,
    pub title: &'a str,
    pub generated_at: DateTime<Local>,
}

/// Builds the final HTML document from a page template.
#[derive(Debug, Clone, Copy)]
pub struct PageAssembler<'a> {
    page: &'a str,
    style: &'a str,
    script: Option<&'a str>,
    tokens: PageTokens,
}

impl<'a> PageAssembler<'a> {
    pub fn new(page: &'a str, style: &'a str, tokens: PageTokens) -> Self {
        Self {
            page,
            style,
            script: None,
            tokens,
        }
    }

    /// Inject `script` just before `</body>`.
    pub fn with_script(mut self, script: &'a str) -> Self {
        self.script = Some(script);
        self
    }

    pub fn assemble(&self, content: &PageContent<'_>) -> String {
        let items = content.fragments.concat();
        let count = content.fragments.len().to_string();
        let total = content.scanned.to_string();
        let current_time = content.generated_at.format(TIMESTAMP_FORMAT).to_string();
        let title = escape_html(content.title);

        let mut html = substitute(
            self.page,
            &[
                ("style", self.style),
                (self.tokens.items, items.as_str()),
                (self.tokens.count, count.as_str()),
                ("total_count", total.as_str()),
                ("current_time", current_time.as_str()),
                ("title", title.as_str()),
            ],
        );

        if let Some(script) = self.script {
            let tag = format!("<script>{}</script>", script);
            match html.rfind("</body>") {
                Some(pos) => html.insert_str(pos, &tag),
                None => html.push_str(&tag),
            }
        }

        html
    }
}

/// Write a page, replacing whatever was at `path`.
pub fn write_page(path: &Path, html: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn content<'a>(fragments: &'a [String], title: &'a str) -> PageContent<'a> {
        PageContent {
            fragments,
            scanned: 120,
            title,
            generated_at: Local.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap(),
        }
    }

    #[test]
    fn test_assemble_fills_tokens() {
        let page = "<title>{title}</title><style>{style}</style>{table_rows}|{file_count}/{total_count}|{current_time}";
        let fragments = vec!["<tr>1</tr>".to_string(), "<tr>2</tr>".to_string()];
        let html = PageAssembler::new(page, "td{}", PageTokens::REPORT).assemble(&content(&fragments, "THIMBLE"));

        assert_eq!(
            html,
            "<title>THIMBLE</title><style>td{}</style><tr>1</tr><tr>2</tr>|2/120|2024-02-03 04:05:06"
        );
    }

    #[test]
    fn test_style_braces_survive() {
        let page = "{style}";
        let html = PageAssembler::new(page, "a { b: c; } {title}", PageTokens::CHAT).assemble(&content(&[], "T"));
        assert_eq!(html, "a { b: c; } {title}");
    }

    #[test]
    fn test_script_goes_before_closing_body() {
        let page = "<body>{chat_messages}</body></html>";
        let fragments = vec!["m".to_string()];
        let html = PageAssembler::new(page, "", PageTokens::CHAT)
            .with_script("go()")
            .assemble(&content(&fragments, "T"));

        assert_eq!(html, "<body>m<script>go()</script></body></html>");
    }

    #[test]
    fn test_script_appended_without_body_tag() {
        let html = PageAssembler::new("x", "", PageTokens::CHAT)
            .with_script("go()")
            .assemble(&content(&[], "T"));
        assert_eq!(html, "x<script>go()</script>");
    }

    #[test]
    fn test_title_is_escaped() {
        let html = PageAssembler::new("{title}", "", PageTokens::CHAT).assemble(&content(&[], "<T>"));
        assert_eq!(html, "&lt;T&gt;");
    }

    #[test]
    fn test_write_page_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/chat.html");
        write_page(&path, "a much longer first version").unwrap();
        write_page(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }
}
