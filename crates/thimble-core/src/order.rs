use std::borrow::Cow;

use crate::message::Message;

/// Newest first; equal timestamps fall back to the source path so repeated
/// runs over the same tree produce the same page.
pub fn sort_messages(messages: &mut [Message]) {
    messages.sort_by(|a, b| {
        b.timestamp()
            .cmp(&a.timestamp())
            .then_with(|| a.source_path().as_os_str().cmp(b.source_path().as_os_str()))
    });
}

/// Cut `body` to `max_len` characters, appending `...` when anything was cut.
///
/// Counts characters, not bytes, and never snaps to a word boundary.
pub fn truncate(body: &str, max_len: usize) -> (Cow<'_, str>, bool) {
    match body.char_indices().nth(max_len) {
        None => (Cow::Borrowed(body), false),
        Some((cut, _)) => (Cow::Owned(format!("{}...", &body[..cut])), true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ExtractedText, MessageStatus};
    use chrono::{DateTime, TimeZone, Utc};
    use std::path::PathBuf;

    fn message(path: &str, timestamp: DateTime<Utc>) -> Message {
        let text = ExtractedText {
            author: "a".to_string(),
            body: "b".to_string(),
            hashtags: vec![],
            status: MessageStatus::Parsed,
        };
        Message::new(text, PathBuf::from(path), timestamp)
    }

    #[test]
    fn test_sort_newest_first_then_path() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let mut messages = vec![message("b.txt", t1), message("a.txt", t1), message("c.txt", t2)];

        sort_messages(&mut messages);

        let order: Vec<_> = messages
            .iter()
            .map(|m| (m.timestamp(), m.source_path().to_string_lossy().into_owned()))
            .collect();
        assert_eq!(
            order,
            vec![
                (t2, "c.txt".to_string()),
                (t1, "a.txt".to_string()),
                (t1, "b.txt".to_string()),
            ]
        );
    }

    #[test]
    fn test_sort_is_deterministic_across_input_orders() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut forward = vec![message("x/1.txt", t), message("x/2.txt", t), message("x/3.txt", t)];
        let mut backward = forward.clone();
        backward.reverse();

        sort_messages(&mut forward);
        sort_messages(&mut backward);

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_truncate_short_body_is_untouched() {
        for (body, max) in [("", 0), ("abc", 3), ("abc", 10), ("héé", 3)] {
            let (text, cut) = truncate(body, max);
            assert_eq!(text, body);
            assert!(!cut);
        }
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        let (text, cut) = truncate("abcdef", 4);
        assert_eq!(text, "abcd...");
        assert!(cut);
    }

    #[test]
    fn test_truncate_length_is_max_plus_three() {
        let body: String = "é".repeat(50);
        for max in [0, 1, 7, 49] {
            let (text, cut) = truncate(&body, max);
            assert!(cut);
            assert_eq!(text.chars().count(), max + 3);
            assert!(text.ends_with("..."));
        }
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let (text, cut) = truncate("日本語テキスト", 3);
        assert_eq!(text, "日本語...");
        assert!(cut);
    }
}
