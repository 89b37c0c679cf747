use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while syncing with the remote
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to run sync command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Sync step '{step}' failed: {detail}")]
    Step { step: &'static str, detail: String },

    #[error("Merge of {upstream} produced conflicts: {detail}")]
    MergeConflict { upstream: String, detail: String },

    #[error("Restoring stashed changes conflicted; the stash was kept")]
    StashConflict,

    #[error("Sync is not configured: {0}")]
    NotConfigured(String),
}

/// What a successful sync did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Synced {
    /// Local changes were stashed and restored around the merge.
    pub stashed: bool,
    /// Upstream commits were merged in.
    pub merged: bool,
    pub pushed: bool,
}

/// Exchanges commits with a remote.
///
/// Called after a message is saved. Callers report failures and carry on.
#[async_trait]
pub trait SourceSync: Send + Sync {
    async fn sync_with_remote(&self) -> Result<Synced, SyncError>;

    /// Short label for logs.
    fn name(&self) -> &str {
        "sync"
    }
}

/// Sync that does nothing, for boards without a remote.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSync;

#[async_trait]
impl SourceSync for NoSync {
    async fn sync_with_remote(&self) -> Result<Synced, SyncError> {
        Ok(Synced::default())
    }

    fn name(&self) -> &str {
        "none"
    }
}
