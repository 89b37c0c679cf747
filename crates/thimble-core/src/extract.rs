use lazy_static::lazy_static;
use regex::Regex;

use crate::decode::{decode, DecodeError};
use crate::message::{ExtractedText, MessageStatus, CHAT_DEFAULT_AUTHOR, REPORT_DEFAULT_AUTHOR};

lazy_static! {
    static ref AUTHOR_LINE: Regex =
        Regex::new(r"(?i)Author:\s*(.+)").expect("author pattern compiles");
    static ref HASHTAG: Regex = Regex::new(r"#\w+").expect("hashtag pattern compiles");
}

/// Pulls the author, hashtags and body out of a message file.
///
/// Only the first `Author:` match is captured, and only that match is cut
/// from the body. Hashtags are collected from the whole text, author line
/// included, in order of appearance and without deduplication.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    default_author: String,
}

impl MetadataExtractor {
    pub fn new(default_author: impl Into<String>) -> Self {
        Self {
            default_author: default_author.into(),
        }
    }

    /// Extractor with the chat page's default author (`"Unknown"`).
    pub fn for_chat() -> Self {
        Self::new(CHAT_DEFAULT_AUTHOR)
    }

    /// Extractor with the report's default author (empty).
    pub fn for_report() -> Self {
        Self::new(REPORT_DEFAULT_AUTHOR)
    }

    pub fn default_author(&self) -> &str {
        &self.default_author
    }

    /// Decode and extract, turning decode failures into a placeholder.
    pub fn extract(&self, raw: &[u8]) -> ExtractedText {
        self.try_extract(raw)
            .unwrap_or_else(|_| ExtractedText::placeholder())
    }

    /// Decode and extract, reporting decode failures to the caller.
    pub fn try_extract(&self, raw: &[u8]) -> Result<ExtractedText, DecodeError> {
        let decoded = decode(raw)?;
        Ok(self.extract_text(&decoded.text))
    }

    /// Extract metadata from already decoded text.
    pub fn extract_text(&self, content: &str) -> ExtractedText {
        let captures = AUTHOR_LINE.captures(content);

        let author = captures
            .as_ref()
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .filter(|name| !name.is_empty())
            .unwrap_or(self.default_author.as_str())
            .to_string();

        let hashtags = hashtags(content);

        let body = match captures.as_ref().and_then(|c| c.get(0)) {
            Some(line) => {
                let mut remaining = String::with_capacity(content.len() - line.len());
                remaining.push_str(&content[..line.start()]);
                remaining.push_str(&content[line.end()..]);
                remaining.trim().to_string()
            }
            None => content.trim().to_string(),
        };

        ExtractedText {
            author,
            body,
            hashtags,
            status: MessageStatus::Parsed,
        }
    }
}

/// Every `#hashtag` in the text, in order of appearance.
pub fn hashtags(content: &str) -> Vec<String> {
    HASHTAG
        .find_iter(content)
        .map(|m| m.as_str().to_string())
        .collect()
}
