use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use thimble_core::{SourceSync, SyncError, Synced};

/// Output of one git invocation.
#[derive(Debug)]
struct GitOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

impl GitOutput {
    fn mentions_conflict(&self) -> bool {
        self.stdout.contains("CONFLICT") || self.stderr.contains("CONFLICT")
    }

    fn detail(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Syncs by driving the `git` command line in the board's working tree.
///
/// Local edits are stashed around the fetch/merge/push sequence and
/// restored afterwards.
#[derive(Debug, Clone)]
pub struct GitCliSync {
    working_dir: PathBuf,
    remote: String,
    branch: String,
}

impl GitCliSync {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            remote: "origin".to_string(),
            branch: "main".to_string(),
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    fn upstream(&self) -> String {
        format!("{}/{}", self.remote, self.branch)
    }

    async fn git(&self, args: &[&str]) -> Result<GitOutput, SyncError> {
        debug!(
            args = ?args,
            working_dir = %self.working_dir.display(),
            "Running git"
        );

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .output()
            .await?;

        let result = GitOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(
            exit_code = output.status.code().unwrap_or(-1),
            stdout = %result.stdout.trim(),
            stderr = %result.stderr.trim(),
            "git finished"
        );
        Ok(result)
    }

    /// Run a step that must succeed.
    async fn step(&self, step: &'static str, args: &[&str]) -> Result<GitOutput, SyncError> {
        let output = self.git(args).await?;
        if output.success {
            Ok(output)
        } else {
            Err(SyncError::Step {
                step,
                detail: output.detail(),
            })
        }
    }

    async fn rev_parse(&self, rev: &str) -> Option<String> {
        match self.git(&["rev-parse", rev]).await {
            Ok(out) if out.success => Some(out.stdout.trim().to_string()),
            _ => None,
        }
    }

    async fn stash(&self) -> Result<bool, SyncError> {
        let status = self.step("status", &["status", "--porcelain"]).await?;
        if status.stdout.trim().is_empty() {
            return Ok(false);
        }

        let out = self.step("stash", &["stash", "push", "--include-untracked"]).await?;
        if out.stdout.contains("No local changes to save") {
            return Ok(false);
        }
        info!("Stashed local changes");
        Ok(true)
    }

    async fn pop(&self) -> Result<(), SyncError> {
        let out = self.git(&["stash", "pop"]).await?;
        if out.mentions_conflict() {
            return Err(SyncError::StashConflict);
        }
        if !out.success && !out.stderr.contains("No stash entries found") {
            return Err(SyncError::Step {
                step: "stash pop",
                detail: out.detail(),
            });
        }
        Ok(())
    }

    async fn exchange(&self) -> Result<(bool, bool), SyncError> {
        self.step("fetch", &["fetch", self.remote.as_str()]).await?;

        let upstream = self.upstream();
        let local = self.rev_parse("HEAD").await;
        let remote = match self.rev_parse("@{u}").await {
            Some(rev) => Some(rev),
            None => self.rev_parse(&upstream).await,
        };

        let mut merged = false;
        if remote.is_some() && local != remote {
            let out = self.git(&["merge", "--no-edit", upstream.as_str()]).await?;
            if out.mentions_conflict() {
                match self.git(&["merge", "--abort"]).await {
                    Ok(abort) if abort.success => {}
                    Ok(abort) => warn!(detail = %abort.detail(), "Failed to abort merge"),
                    Err(e) => warn!(error = %e, "Failed to abort merge"),
                }
                return Err(SyncError::MergeConflict {
                    upstream,
                    detail: out.detail(),
                });
            }
            if !out.success {
                return Err(SyncError::Step {
                    step: "merge",
                    detail: out.detail(),
                });
            }
            merged = !out.stdout.contains("Already up to date");
        }

        let refspec = format!("HEAD:{}", self.branch);
        self.step("push", &["push", self.remote.as_str(), refspec.as_str()])
            .await?;

        Ok((merged, true))
    }
}

#[async_trait]
impl SourceSync for GitCliSync {
    async fn sync_with_remote(&self) -> Result<Synced, SyncError> {
        let stashed = self.stash().await?;

        let exchanged = self.exchange().await;

        if stashed {
            if let Err(e) = self.pop().await {
                if let Err(exchange_err) = &exchanged {
                    warn!(error = %exchange_err, "Sync failed before restoring stash");
                }
                return Err(e);
            }
        }

        let (merged, pushed) = exchanged?;
        info!(remote = %self.remote, branch = %self.branch, merged, "Synced with remote");

        Ok(Synced {
            stashed,
            merged,
            pushed,
        })
    }

    fn name(&self) -> &str {
        "git"
    }
}
