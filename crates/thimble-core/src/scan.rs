use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::WalkBuilder;
use thiserror::Error;
use tracing::debug;

/// Name of the sidecar directory written by the commit tooling.
pub const METADATA_DIR: &str = "metadata";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Message directory {path} is not readable: {source}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Message directory {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("Failed to walk message directory: {0}")]
    Walk(#[from] ignore::Error),
}

/// Decides whether a directory is skipped during the scan.
pub type DirExclusion = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Default exclusion: directories named `metadata`.
pub fn exclude_metadata_dirs(dir: &Path) -> bool {
    dir.file_name().is_some_and(|name| name == METADATA_DIR)
}

/// Recursively lists the `.txt` files under a message directory.
///
/// The walk sees the tree as it is on disk: gitignore rules and hidden-file
/// filtering are off, and symlinks are not followed. Returned paths are in
/// no particular order.
#[derive(Clone)]
pub struct DirectoryScanner {
    root: PathBuf,
    exclude: DirExclusion,
}

impl std::fmt::Debug for DirectoryScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryScanner")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl DirectoryScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            exclude: Arc::new(exclude_metadata_dirs),
        }
    }

    /// Replace the directory exclusion predicate.
    pub fn with_exclusion<F>(mut self, exclude: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        self.exclude = Arc::new(exclude);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List every `.txt` file under the root.
    ///
    /// A missing root or any directory that cannot be read fails the scan.
    pub fn scan(&self) -> Result<Vec<PathBuf>, ScanError> {
        let meta = std::fs::metadata(&self.root).map_err(|source| ScanError::RootUnreadable {
            path: self.root.clone(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        let exclude = Arc::clone(&self.exclude);
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                !(is_dir && entry.depth() > 0 && exclude(entry.path()))
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            let is_file = entry.file_type().is_some_and(|t| t.is_file());
            if is_file && entry.file_name().to_string_lossy().ends_with(".txt") {
                files.push(entry.into_path());
            }
        }

        debug!(root = %self.root.display(), files = files.len(), "Scanned message directory");

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(mut paths: Vec<PathBuf>, root: &Path) -> Vec<String> {
        paths.sort();
        paths
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_scan_finds_nested_txt_files() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("2024-01-01/deeper")).unwrap();
        fs::write(root.join("top.txt"), "a").unwrap();
        fs::write(root.join("2024-01-01/one.txt"), "b").unwrap();
        fs::write(root.join("2024-01-01/deeper/two.txt"), "c").unwrap();
        fs::write(root.join("2024-01-01/notes.md"), "skip").unwrap();
        fs::write(root.join(".hidden.txt"), "seen").unwrap();

        let found = DirectoryScanner::new(root).scan().unwrap();

        assert_eq!(
            names(found, root),
            vec![".hidden.txt", "2024-01-01/deeper/two.txt", "2024-01-01/one.txt", "top.txt"]
        );
    }

    #[test]
    fn test_scan_skips_metadata_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("day/metadata")).unwrap();
        fs::write(root.join("day/msg.txt"), "a").unwrap();
        fs::write(root.join("day/metadata/msg.txt"), "sidecar").unwrap();

        let found = DirectoryScanner::new(root).scan().unwrap();

        assert_eq!(names(found, root), vec!["day/msg.txt"]);
    }

    #[test]
    fn test_custom_exclusion() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("archive")).unwrap();
        fs::create_dir_all(root.join("metadata")).unwrap();
        fs::write(root.join("archive/old.txt"), "a").unwrap();
        fs::write(root.join("metadata/kept.txt"), "b").unwrap();

        let scanner = DirectoryScanner::new(root)
            .with_exclusion(|dir| dir.file_name().is_some_and(|n| n == "archive"));
        let found = scanner.scan().unwrap();

        assert_eq!(names(found, root), vec!["metadata/kept.txt"]);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = DirectoryScanner::new(dir.path().join("nope")).scan().unwrap_err();
        assert!(matches!(err, ScanError::RootUnreadable { .. }));
    }

    #[test]
    fn test_file_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        let err = DirectoryScanner::new(&file).scan().unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory(_)));
    }
}
