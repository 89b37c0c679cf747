//! # thimble-git
//!
//! Git integration for the thimble message board.
//!
//! ## Key Types
//!
//! - [`CommitTimestamps`] - last commit time per file, used to order messages
//! - [`MessageCommitter`] - commits new message files with metadata sidecars
//! - [`GitCliSync`] - [`thimble_core::SourceSync`] over the `git` command line
//!
//! ## Usage
//!
//! ```rust,ignore
//! use thimble_core::{ModifiedTime, TimestampChain};
//! use thimble_git::{CommitTimestamps, MessageCommitter};
//! use std::path::Path;
//!
//! // Commit whatever was posted since the last run
//! MessageCommitter::new(".").with_message_dir("message").commit()?;
//!
//! // Date messages by commit, falling back to mtime
//! let chain = TimestampChain::new()
//!     .then(CommitTimestamps::load(Path::new("."))?)
//!     .then(ModifiedTime);
//! ```
//!
//! ## Sidecars
//!
//! Each committed `message/<date>/<name>.txt` gets a JSON file at
//! `message/<date>/metadata/<name>.txt.json` holding the author, a title,
//! the hashtags and a SHA-256 of the file. The scanner skips `metadata`
//! directories so sidecars never show up as messages.

mod commit;
mod sync;
mod timestamps;

pub use commit::{CommitError, CommitSummary, MessageCommitter, MessageSidecar};
pub use sync::GitCliSync;
pub use timestamps::{CommitTimestamps, GitError};
