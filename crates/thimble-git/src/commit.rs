use std::path::{Path, PathBuf};

use chrono::Local;
use git2::{Repository, Signature, StatusOptions};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use thimble_core::decode;
use thimble_core::scan::METADATA_DIR;
use thimble_core::MetadataExtractor;

use crate::timestamps::{open_repo, GitError};

const FALLBACK_NAME: &str = "thimble";
const FALLBACK_EMAIL: &str = "thimble@localhost";

#[derive(Error, Debug)]
pub enum CommitError {
    #[error(transparent)]
    Repo(#[from] GitError),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Failed to build metadata for {path}: {source}")]
    Sidecar {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize metadata: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<std::io::Error> for CommitError {
    fn from(e: std::io::Error) -> Self {
        CommitError::Repo(GitError::IoError(e))
    }
}

/// Metadata stored next to each committed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSidecar {
    pub author: String,
    pub title: String,
    pub hashtags: Vec<String>,
    pub file_hash: String,
}

impl MessageSidecar {
    /// Build the sidecar for a message file's raw bytes.
    pub fn from_bytes(raw: &[u8], file_name: &str) -> Self {
        let text = decode(raw)
            .map(|d| d.text.into_owned())
            .unwrap_or_default();
        let extracted = MetadataExtractor::for_report().extract_text(&text);

        let title = text
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .unwrap_or(file_name)
            .to_string();

        Self {
            author: extracted.author,
            title,
            hashtags: extracted.hashtags,
            file_hash: hex::encode(Sha256::digest(raw)),
        }
    }

    /// `<dir>/metadata/<file>.json` for a message at `<dir>/<file>`.
    pub fn path_for(message: &Path) -> PathBuf {
        let mut name = message.file_name().unwrap_or_default().to_os_string();
        name.push(".json");
        message
            .parent()
            .unwrap_or(Path::new(""))
            .join(METADATA_DIR)
            .join(name)
    }
}

/// Result of a commit run.
#[derive(Debug, Clone, Serialize)]
pub struct CommitSummary {
    pub commit_id: String,
    pub message: String,
    /// Message files, relative to the working tree root.
    pub files: Vec<PathBuf>,
    /// Sidecars written, relative to the working tree root.
    pub sidecars: Vec<PathBuf>,
}

/// Commits new or changed message files together with their sidecars.
#[derive(Debug, Clone)]
pub struct MessageCommitter {
    repo_path: PathBuf,
    message_dir: PathBuf,
}

impl MessageCommitter {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
            message_dir: PathBuf::from("message"),
        }
    }

    /// Only files under `dir` (relative to the repository path) are picked up.
    pub fn with_message_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.message_dir = dir.into();
        self
    }

    /// Untracked or modified `.txt` files under the message directory.
    pub fn pending(&self) -> Result<Vec<PathBuf>, CommitError> {
        let repo = open_repo(&self.repo_path)?;
        self.pending_in(&repo)
    }

    fn pending_in(&self, repo: &Repository) -> Result<Vec<PathBuf>, CommitError> {
        let prefix = self.message_prefix(repo)?;

        let mut opts = StatusOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);
        let statuses = repo.statuses(Some(&mut opts))?;

        let mut files = Vec::new();
        for entry in statuses.iter() {
            let st = entry.status();
            let changed = st.is_wt_new() || st.is_wt_modified() || st.is_index_new() || st.is_index_modified();
            let Some(path) = entry.path().map(PathBuf::from) else {
                continue;
            };
            let in_metadata = path.components().any(|c| c.as_os_str() == METADATA_DIR);
            let is_txt = path.extension().is_some_and(|ext| ext == "txt");

            if changed && is_txt && !in_metadata && path.starts_with(&prefix) {
                files.push(path);
            }
        }
        files.sort();

        debug!(pending = files.len(), prefix = %prefix.display(), "Found pending message files");
        Ok(files)
    }

    /// Message directory relative to the working tree root.
    fn message_prefix(&self, repo: &Repository) -> Result<PathBuf, CommitError> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::NotARepo("bare repository".to_string()))?
            .canonicalize()?;
        let dir = self.repo_path.join(&self.message_dir);

        Ok(dir
            .canonicalize()
            .ok()
            .and_then(|abs| abs.strip_prefix(&workdir).ok().map(Path::to_path_buf))
            .unwrap_or_else(|| self.message_dir.clone()))
    }

    /// Write sidecars, stage, and commit. `Ok(None)` when nothing changed.
    pub fn commit(&self) -> Result<Option<CommitSummary>, CommitError> {
        let repo = open_repo(&self.repo_path)?;
        let files = self.pending_in(&repo)?;
        if files.is_empty() {
            info!("No new message files to commit");
            return Ok(None);
        }

        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::NotARepo("bare repository".to_string()))?
            .to_path_buf();

        let mut sidecars = Vec::new();
        for file in &files {
            let absolute = workdir.join(file);
            let raw = std::fs::read(&absolute).map_err(|source| CommitError::Sidecar {
                path: absolute.clone(),
                source,
            })?;
            let file_name = file.file_name().unwrap_or_default().to_string_lossy();
            let sidecar = MessageSidecar::from_bytes(&raw, &file_name);
            let relative = MessageSidecar::path_for(file);
            write_sidecar(&workdir.join(&relative), &sidecar)?;

            debug!(
                path = %file.display(),
                author = %sidecar.author,
                title = %sidecar.title,
                hashtags = sidecar.hashtags.len(),
                "Wrote message metadata"
            );
            sidecars.push(relative);
        }

        let mut index = repo.index()?;
        for path in files.iter().chain(sidecars.iter()) {
            index.add_path(path)?;
        }
        index.write()?;
        let tree = repo.find_tree(index.write_tree()?)?;

        let signature = repo
            .signature()
            .or_else(|_| Signature::now(FALLBACK_NAME, FALLBACK_EMAIL))?;
        let message = format!(
            "Auto-commit {} text files and metadata on {}",
            files.len(),
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) if e.code() == git2::ErrorCode::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = repo.commit(Some("HEAD"), &signature, &signature, &message, &tree, &parents)?;

        info!(commit = %oid, files = files.len(), "Committed message files");

        Ok(Some(CommitSummary {
            commit_id: oid.to_string(),
            message,
            files,
            sidecars,
        }))
    }
}

fn write_sidecar(path: &Path, sidecar: &MessageSidecar) -> Result<(), CommitError> {
    let json = serde_json::to_string_pretty(sidecar)?;
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
    };
    write().map_err(|source| CommitError::Sidecar {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_fields() {
        let raw = b"Lunch at noon #food\n#plans\n\nauthor: Ada";
        let sidecar = MessageSidecar::from_bytes(raw, "lunch.txt");

        assert_eq!(sidecar.author, "Ada");
        assert_eq!(sidecar.title, "Lunch at noon #food");
        assert_eq!(sidecar.hashtags, vec!["#food", "#plans"]);
        assert_eq!(
            sidecar.file_hash,
            hex::encode(Sha256::digest(raw.as_slice()))
        );
        assert_eq!(sidecar.file_hash.len(), 64);
    }

    #[test]
    fn test_sidecar_title_falls_back_to_file_name() {
        let sidecar = MessageSidecar::from_bytes(b"", "empty.txt");
        assert_eq!(sidecar.title, "empty.txt");
        assert_eq!(sidecar.author, "");
        assert!(sidecar.hashtags.is_empty());
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            MessageSidecar::path_for(Path::new("message/2024-01-01/hi.txt")),
            PathBuf::from("message/2024-01-01/metadata/hi.txt.json")
        );
    }
}
