use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;

use thimble_core::{NoSync, SourceSync};
use thimble_git::{GitCliSync, MessageCommitter};
use thimble_logging::{BoardEvent, LogFormat, Logger, PageKind};

mod board;
mod config;
mod list;
mod post;
mod watch;

use board::{page_written, Board};
use config::{BoardConfig, Overrides, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "thimble",
    about = "Text-message board over git",
    version,
    author
)]
struct Cli {
    /// Repository directory (default: current directory)
    #[arg(short = 'd', long, global = true)]
    repo_path: Option<PathBuf>,

    /// Message directory, relative to the repository (default: message)
    #[arg(long, global = true)]
    message_dir: Option<PathBuf>,

    /// Directory with template overrides
    #[arg(long, global = true)]
    template_dir: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatChoice,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the chat page
    Chat {
        /// Output file (default: chat.html)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum messages shown (default: 50)
        #[arg(short = 'n', long)]
        max_messages: Option<usize>,

        /// Characters shown before "Show More" (default: 300)
        #[arg(long)]
        max_message_length: Option<usize>,

        /// Open the page in the default browser
        #[arg(long)]
        open: bool,
    },

    /// Generate the tabular report page
    Report {
        /// Output file (default: log.html)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum rows shown (default: 100)
        #[arg(short = 'n', long)]
        max_rows: Option<usize>,

        /// Open the page in the default browser
        #[arg(long)]
        open: bool,
    },

    /// List messages, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Save a new message, commit it, sync and rebuild the chat page
    Post {
        /// Who is posting
        #[arg(short, long)]
        author: String,

        /// Message text
        message: String,

        /// Skip syncing with the remote
        #[arg(long)]
        no_sync: bool,
    },

    /// Commit new or modified message files with metadata
    Commit,

    /// Stash, fetch, merge, push and restore local changes
    Sync,

    /// Rebuild both pages whenever a message changes
    Watch,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_format: LogFormat = cli.log_format.into();
    let level = if cli.debug { "debug" } else { "warn" };
    thimble_logging::init_tracing(level, log_format);
    let logger = Logger::new(log_format);

    let repo_path = match cli.repo_path.clone() {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let config = BoardConfig::load(&repo_path)?.unwrap_or_default();
    let settings = Settings::resolve(repo_path, config, overrides(&cli));

    match cli.command {
        Command::Chat { open, .. } => {
            let summary = Board::new(settings).write_chat()?;
            logger.log(&page_written(PageKind::Chat, &summary));
            if open {
                open_page(&summary.output_file);
            }
        }
        Command::Report { open, .. } => {
            let summary = Board::new(settings).write_report()?;
            logger.log(&page_written(PageKind::Report, &summary));
            if open {
                open_page(&summary.output_file);
            }
        }
        Command::List { json } => {
            let messages = Board::new(settings).messages()?;
            list::print_messages(&messages, json)?;
        }
        Command::Post {
            author,
            message,
            no_sync,
        } => {
            post_message(Board::new(settings), &logger, &author, &message, no_sync).await?;
        }
        Command::Commit => {
            commit_messages(&settings, &logger)?;
        }
        Command::Sync => {
            let sync = git_sync(&settings);
            let synced = sync
                .sync_with_remote()
                .await
                .context("Failed to sync with remote")?;
            logger.log(&BoardEvent::SyncCompleted {
                stashed: synced.stashed,
                merged: synced.merged,
                pushed: synced.pushed,
            });
        }
        Command::Watch => {
            watch::watch(Arc::new(Board::new(settings)), logger).await?;
        }
    }

    Ok(())
}

fn overrides(cli: &Cli) -> Overrides {
    let mut overrides = Overrides {
        message_dir: cli.message_dir.clone(),
        template_dir: cli.template_dir.clone(),
        ..Default::default()
    };
    match &cli.command {
        Command::Chat {
            output,
            max_messages,
            max_message_length,
            ..
        } => {
            overrides.chat_output = output.clone();
            overrides.max_messages = *max_messages;
            overrides.max_message_length = *max_message_length;
        }
        Command::Report {
            output, max_rows, ..
        } => {
            overrides.report_output = output.clone();
            overrides.max_rows = *max_rows;
        }
        _ => {}
    }
    overrides
}

fn git_sync(settings: &Settings) -> GitCliSync {
    GitCliSync::new(&settings.repo_path)
        .with_remote(&settings.sync.remote)
        .with_branch(&settings.sync.branch)
}

fn committer(settings: &Settings) -> MessageCommitter {
    let message_dir = settings
        .message_dir
        .strip_prefix(&settings.repo_path)
        .unwrap_or(settings.message_dir.as_path());
    MessageCommitter::new(&settings.repo_path).with_message_dir(message_dir)
}

fn commit_messages(settings: &Settings, logger: &Logger) -> Result<()> {
    let summary = committer(settings)
        .commit()
        .context("Failed to commit message files")?;
    match summary {
        Some(summary) => logger.log(&BoardEvent::CommitCreated {
            commit_id: summary.commit_id,
            files: summary.files.len(),
        }),
        None => logger.log(&BoardEvent::NothingToCommit),
    }
    Ok(())
}

/// Save, commit, sync, rebuild. Commit and sync failures are reported and skipped.
async fn post_message(
    board: Board,
    logger: &Logger,
    author: &str,
    message: &str,
    no_sync: bool,
) -> Result<()> {
    let settings = board.settings();
    let today = chrono::Local::now().date_naive();
    let path = post::save_message(&settings.message_dir, today, author, message)?;
    logger.log(&BoardEvent::MessageSaved {
        path: path.clone(),
        author: author.trim().to_string(),
    });

    if let Err(e) = commit_messages(settings, logger) {
        warn!(error = %e, "Commit after post failed");
        logger.log(&BoardEvent::ErrorEncountered {
            context: "commit".to_string(),
            error: format!("{:#}", e),
        });
    }

    let sync: Box<dyn SourceSync> = if no_sync || !settings.sync.enabled {
        Box::new(NoSync)
    } else {
        Box::new(git_sync(settings))
    };
    match sync.sync_with_remote().await {
        Ok(synced) => {
            if sync.name() != "none" {
                logger.log(&BoardEvent::SyncCompleted {
                    stashed: synced.stashed,
                    merged: synced.merged,
                    pushed: synced.pushed,
                });
            }
        }
        Err(e) => logger.log(&BoardEvent::SyncFailed {
            error: e.to_string(),
        }),
    }

    let summary = board.write_chat()?;
    logger.log(&page_written(PageKind::Chat, &summary));
    Ok(())
}

fn open_page(path: &Path) {
    if let Err(e) = open::that(path) {
        warn!(path = %path.display(), error = %e, "Failed to open page in browser");
        eprintln!("Open {} in your browser", path.display());
    }
}
