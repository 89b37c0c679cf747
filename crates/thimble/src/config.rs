//! Board configuration file support.
//!
//! Loads configuration from `thimble.toml` in the repository root. Every
//! field is optional; command-line flags override file values, which
//! override the built-in defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use thimble_core::{ChatOptions, ReportOptions};

/// The config file name
pub const CONFIG_FILE_NAME: &str = "thimble.toml";

pub const DEFAULT_MESSAGE_DIR: &str = "message";

/// Board-level configuration loaded from `thimble.toml`
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct BoardConfig {
    /// Directory holding message files, relative to the repository
    pub message_dir: Option<PathBuf>,
    /// Directory with template overrides, relative to the repository
    pub template_dir: Option<PathBuf>,
    #[serde(default)]
    pub chat: ChatSection,
    #[serde(default)]
    pub report: ReportSection,
    #[serde(default)]
    pub sync: SyncSection,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ChatSection {
    pub output_file: Option<PathBuf>,
    pub max_messages: Option<usize>,
    pub max_message_length: Option<usize>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportSection {
    pub output_file: Option<PathBuf>,
    pub max_rows: Option<usize>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SyncSection {
    /// Sync after posting (default: true)
    pub enabled: Option<bool>,
    pub remote: Option<String>,
    pub branch: Option<String>,
}

impl BoardConfig {
    /// Load configuration from the repository root.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(repo_path: &Path) -> Result<Option<Self>> {
        let config_path = repo_path.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: BoardConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }
}

/// Command-line values that take priority over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub message_dir: Option<PathBuf>,
    pub template_dir: Option<PathBuf>,
    pub chat_output: Option<PathBuf>,
    pub report_output: Option<PathBuf>,
    pub max_messages: Option<usize>,
    pub max_rows: Option<usize>,
    pub max_message_length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub enabled: bool,
    pub remote: String,
    pub branch: String,
}

/// Fully resolved settings for one run. All paths are absolute or
/// relative to the working directory, never to the repository.
#[derive(Debug, Clone)]
pub struct Settings {
    pub repo_path: PathBuf,
    pub message_dir: PathBuf,
    pub template_dir: Option<PathBuf>,
    pub chat: ChatOptions,
    pub report: ReportOptions,
    pub sync: SyncSettings,
}

impl Settings {
    pub fn resolve(repo_path: PathBuf, config: BoardConfig, overrides: Overrides) -> Self {
        let in_repo = |p: PathBuf| if p.is_absolute() { p } else { repo_path.join(p) };

        let chat_defaults = ChatOptions::default();
        let report_defaults = ReportOptions::default();

        let message_dir = overrides
            .message_dir
            .or(config.message_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MESSAGE_DIR));

        let chat = ChatOptions {
            output_file: in_repo(
                overrides
                    .chat_output
                    .or(config.chat.output_file)
                    .unwrap_or(chat_defaults.output_file),
            ),
            max_messages: overrides
                .max_messages
                .or(config.chat.max_messages)
                .unwrap_or(chat_defaults.max_messages),
            max_message_length: overrides
                .max_message_length
                .or(config.chat.max_message_length)
                .unwrap_or(chat_defaults.max_message_length),
            title: config.chat.title.unwrap_or(chat_defaults.title),
        };

        let report = ReportOptions {
            output_file: in_repo(
                overrides
                    .report_output
                    .or(config.report.output_file)
                    .unwrap_or(report_defaults.output_file),
            ),
            max_rows: overrides
                .max_rows
                .or(config.report.max_rows)
                .unwrap_or(report_defaults.max_rows),
            title: config.report.title.unwrap_or(report_defaults.title),
        };

        let sync = SyncSettings {
            enabled: config.sync.enabled.unwrap_or(true),
            remote: config.sync.remote.unwrap_or_else(|| "origin".to_string()),
            branch: config.sync.branch.unwrap_or_else(|| "main".to_string()),
        };

        Self {
            message_dir: in_repo(message_dir),
            template_dir: overrides.template_dir.or(config.template_dir).map(in_repo),
            chat,
            report,
            sync,
            repo_path,
        }
    }
}
