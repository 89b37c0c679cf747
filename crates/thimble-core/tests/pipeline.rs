use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;
use thimble_core::{
    ChatOptions, ChatTemplates, DirectoryScanner, DiskLoader, Message, MessageLoader,
    MetadataExtractor, ModifiedTime, Pipeline, PipelineError, ReportOptions, ReportTemplates,
    TimestampChain, TimestampSource,
};

/// Dates each file by the number in its name, so file `n.txt` is `n`
/// minutes after a fixed epoch.
struct NumberedTimes;

impl TimestampSource for NumberedTimes {
    fn timestamp(&self, relative: &Path, _absolute: &Path) -> Option<DateTime<Utc>> {
        let n: i64 = relative.file_stem()?.to_str()?.parse().ok()?;
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Some(base + chrono::Duration::minutes(n))
    }
}

struct CountingLoader<L> {
    inner: L,
    calls: AtomicUsize,
}

impl<L: MessageLoader> MessageLoader for CountingLoader<L> {
    fn load(&self, path: &Path) -> Message {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.load(path)
    }
}

fn board(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        let path = dir.path().join("message").join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn loader(repo: &Path, extractor: MetadataExtractor) -> DiskLoader {
    DiskLoader::new(
        repo.to_path_buf(),
        extractor,
        TimestampChain::new().then(NumberedTimes).then(ModifiedTime),
    )
}

fn output(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join("out").join(name)
}

#[test]
fn test_report_scans_everything_but_shows_the_limit() {
    let dir = TempDir::new().unwrap();
    for n in 0..120 {
        let day = dir.path().join("message/2024-01-01");
        fs::create_dir_all(&day).unwrap();
        fs::write(day.join(format!("{n}.txt")), format!("post {n}\nauthor: u{n}")).unwrap();
    }

    let spy = CountingLoader {
        inner: loader(dir.path(), MetadataExtractor::for_report()),
        calls: AtomicUsize::new(0),
    };
    let pipeline = Pipeline::new(DirectoryScanner::new(dir.path().join("message")), &spy);
    let templates = ReportTemplates {
        page: "{file_count} of {total_count}\n{table_rows}".into(),
        row: "{author}\n".into(),
        style: "".into(),
    };
    let options = ReportOptions {
        output_file: output(&dir, "log.html"),
        ..ReportOptions::default()
    };

    let summary = pipeline.write_report(&templates, &options).unwrap();

    assert_eq!(spy.calls.load(Ordering::SeqCst), 120);
    assert_eq!(summary.scanned, 120);
    assert_eq!(summary.shown, 100);

    let html = fs::read_to_string(&options.output_file).unwrap();
    let mut lines = html.lines();
    assert_eq!(lines.next(), Some("100 of 120"));
    // Newest first: 119 down to 20.
    assert_eq!(lines.next(), Some("u119"));
    assert_eq!(html.lines().last(), Some("u20"));
    assert!(!html.lines().any(|line| line == "u19"));
}

#[test]
fn test_chat_page_for_short_message() {
    let dir = board(&[("2024-06-01/1.txt", "Author: Ada\nHello #test world")]);
    let pipeline = Pipeline::new(
        DirectoryScanner::new(dir.path().join("message")),
        loader(dir.path(), MetadataExtractor::for_chat()),
    );
    let options = ChatOptions {
        output_file: output(&dir, "chat.html"),
        ..ChatOptions::default()
    };

    let summary = pipeline.write_chat(&ChatTemplates::builtin(), &options).unwrap();
    let html = fs::read_to_string(&options.output_file).unwrap();

    assert_eq!(summary.shown, 1);
    assert!(html.contains("Ada"));
    assert!(html.contains("Hello #test world"));
    assert!(html.contains("#test"));
    assert!(!html.contains("Show More"));
    assert!(html.contains("<title>THIMBLE Chat</title>"));
    assert!(html.contains("<script>"));
}

#[test]
fn test_chat_page_for_long_message() {
    let body = "y".repeat(400);
    let dir = board(&[("2024-06-01/1.txt", body.as_str())]);
    let pipeline = Pipeline::new(
        DirectoryScanner::new(dir.path().join("message")),
        loader(dir.path(), MetadataExtractor::for_chat()),
    );
    let templates = ChatTemplates {
        message: "[{content}]{full_content}{expand_link}".into(),
        ..ChatTemplates::builtin()
    };
    let options = ChatOptions {
        output_file: output(&dir, "chat.html"),
        ..ChatOptions::default()
    };

    pipeline.write_chat(&templates, &options).unwrap();
    let html = fs::read_to_string(&options.output_file).unwrap();

    let snippet = format!("[{}...]", "y".repeat(300));
    assert!(html.contains(&snippet));
    assert!(html.contains(r#"id="full-message-0" style="display: none;""#));
    assert!(html.contains(&body));
    assert!(html.contains(">Show More</a>"));
}

#[test]
fn test_undecodable_file_becomes_placeholder_row() {
    let dir = board(&[("2024-06-01/2.txt", "fine\nauthor: Bo")]);
    // Odd-length UTF-16 payload after a little-endian BOM.
    fs::write(
        dir.path().join("message/2024-06-01/1.txt"),
        [0xFFu8, 0xFE, 0x41, 0x00, 0x42],
    )
    .unwrap();
    let pipeline = Pipeline::new(
        DirectoryScanner::new(dir.path().join("message")),
        loader(dir.path(), MetadataExtractor::for_report()),
    );
    let templates = ReportTemplates {
        page: "{table_rows}".into(),
        row: "{author}|{relative_path};".into(),
        style: "".into(),
    };
    let options = ReportOptions {
        output_file: output(&dir, "log.html"),
        ..ReportOptions::default()
    };

    let summary = pipeline.write_report(&templates, &options).unwrap();
    let html = fs::read_to_string(&options.output_file).unwrap();

    assert_eq!(summary.placeholders, 1);
    assert_eq!(
        html,
        "Bo|message/2024-06-01/2.txt;Error|message/2024-06-01/1.txt;"
    );
}

#[test]
fn test_metadata_sidecars_are_not_messages() {
    let dir = board(&[
        ("2024-06-01/1.txt", "real"),
        ("2024-06-01/metadata/1.txt", "sidecar"),
    ]);
    let pipeline = Pipeline::new(
        DirectoryScanner::new(dir.path().join("message")),
        loader(dir.path(), MetadataExtractor::for_chat()),
    );

    let messages = pipeline.collect().unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].body(), "real");
}

#[test]
fn test_missing_message_dir_is_fatal() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(
        DirectoryScanner::new(dir.path().join("nope")),
        loader(dir.path(), MetadataExtractor::for_chat()),
    );
    let options = ChatOptions {
        output_file: output(&dir, "chat.html"),
        ..ChatOptions::default()
    };

    let err = pipeline.write_chat(&ChatTemplates::builtin(), &options).unwrap_err();

    assert!(matches!(err, PipelineError::Scan(_)));
    assert!(!options.output_file.exists());
}

#[test]
fn test_rerun_overwrites_previous_page() {
    let dir = board(&[("2024-06-01/1.txt", "first")]);
    let pipeline = Pipeline::new(
        DirectoryScanner::new(dir.path().join("message")),
        loader(dir.path(), MetadataExtractor::for_chat()),
    );
    let templates = ChatTemplates {
        page: "{chat_messages}".into(),
        message: "{content};".into(),
        style: "".into(),
        script: "".into(),
    };
    let options = ChatOptions {
        output_file: output(&dir, "chat.html"),
        ..ChatOptions::default()
    };

    pipeline.write_chat(&templates, &options).unwrap();
    fs::write(dir.path().join("message/2024-06-01/2.txt"), "second").unwrap();
    pipeline.write_chat(&templates, &options).unwrap();

    let html = fs::read_to_string(&options.output_file).unwrap();
    assert_eq!(html, "second;first;<script></script>");
}
