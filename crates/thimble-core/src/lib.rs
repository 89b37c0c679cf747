//! Core of the thimble message board.
//!
//! Messages are plain `.txt` files in a directory tree. This crate turns
//! such a tree into two static HTML pages: a chat page of message bubbles
//! and a tabular report. It also defines the contract for syncing the tree
//! with a remote; the git-backed implementation lives in `thimble-git`.

pub mod decode;
pub mod extract;
pub mod loader;
pub mod locks;
pub mod message;
pub mod order;
pub mod page;
pub mod pipeline;
pub mod render;
pub mod scan;
pub mod sync;
pub mod template;
pub mod timestamps;

pub use decode::{decode, DecodeError, Encoding};
pub use extract::MetadataExtractor;
pub use loader::{DiskLoader, MessageLoader};
pub use locks::OutputLocks;
pub use message::{ExtractedText, Message, MessageStatus};
pub use order::{sort_messages, truncate};
pub use page::{PageAssembler, PageContent, PageTokens};
pub use pipeline::{
    render_chat, render_report, ChatOptions, PageSummary, Pipeline, PipelineError, ReportOptions,
};
pub use render::{format_timestamp, ChatRenderer, RowRenderer};
pub use scan::{exclude_metadata_dirs, DirectoryScanner, ScanError};
pub use sync::{NoSync, SourceSync, SyncError, Synced};
pub use template::{escape_html, ChatTemplates, ReportTemplates, TemplateError, TemplateFile};
pub use timestamps::{ModifiedTime, TimestampChain, TimestampSource};
