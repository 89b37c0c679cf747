use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use git2::{Repository, Sort};
use thiserror::Error;
use tracing::debug;

use thimble_core::TimestampSource;

#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {0}")]
    NotARepo(String),

    #[error("Git operation failed: {0}")]
    GitOperationFailed(#[from] git2::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub(crate) fn open_repo(path: &Path) -> Result<Repository, GitError> {
    Repository::discover(path).map_err(|e| match e.code() {
        git2::ErrorCode::NotFound => GitError::NotARepo(path.display().to_string()),
        _ => GitError::GitOperationFailed(e),
    })
}

/// Last commit time of every file in the history reachable from `HEAD`.
///
/// Built once per run with a single walk of the history, newest commit
/// first, so each path keeps the time of the latest commit that touched it.
#[derive(Debug, Clone, Default)]
pub struct CommitTimestamps {
    workdir: PathBuf,
    times: HashMap<PathBuf, DateTime<Utc>>,
}

impl CommitTimestamps {
    pub fn load(repo_path: &Path) -> Result<Self, GitError> {
        let repo = open_repo(repo_path)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitError::NotARepo(format!("{} is a bare repository", repo_path.display())))?;
        let workdir = workdir.canonicalize()?;

        let mut times = HashMap::new();

        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        match revwalk.push_head() {
            Ok(()) => {}
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                debug!(repo = %workdir.display(), "Repository has no commits");
                return Ok(Self { workdir, times });
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                return Ok(Self { workdir, times });
            }
            Err(e) => return Err(e.into()),
        }

        let mut commits = 0usize;
        for oid in revwalk {
            let commit = repo.find_commit(oid?)?;
            let Some(time) = DateTime::from_timestamp(commit.time().seconds(), 0) else {
                continue;
            };
            let tree = commit.tree()?;
            let parent_tree = match commit.parent(0) {
                Ok(parent) => Some(parent.tree()?),
                Err(_) => None,
            };

            let other_parents = commit
                .parents()
                .skip(1)
                .map(|p| p.tree())
                .collect::<Result<Vec<_>, _>>()?;

            let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
            for delta in diff.deltas() {
                let Some(path) = delta.new_file().path() else {
                    continue;
                };
                // A merge only touches a path that differs from every parent.
                let id = delta.new_file().id();
                let from_other_parent = other_parents.iter().any(|t| {
                    t.get_path(path).map(|entry| entry.id() == id).unwrap_or(id.is_zero())
                });
                if !from_other_parent {
                    times.entry(path.to_path_buf()).or_insert(time);
                }
            }
            commits += 1;
        }

        debug!(
            repo = %workdir.display(),
            commits,
            files = times.len(),
            "Loaded commit timestamps"
        );

        Ok(Self { workdir, times })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Commit time for a path relative to the working tree root.
    pub fn get(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.times.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

impl TimestampSource for CommitTimestamps {
    fn timestamp(&self, relative: &Path, absolute: &Path) -> Option<DateTime<Utc>> {
        let in_workdir = absolute
            .canonicalize()
            .ok()
            .and_then(|p| p.strip_prefix(&self.workdir).ok().map(Path::to_path_buf));

        match in_workdir {
            Some(path) => self.get(&path),
            None => self.get(relative),
        }
    }
}
