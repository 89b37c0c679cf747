use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One mutex per output file, shared by everything that writes pages.
///
/// Two writers targeting the same file (a watch-triggered rebuild and a
/// post-triggered rebuild, say) take turns; different files never block
/// each other.
#[derive(Debug, Default)]
pub struct OutputLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl OutputLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex guarding `path`.
    pub fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let key = lock_key(path);
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key).or_default().clone()
    }

    /// Run `f` while holding the lock for `path`.
    pub fn with_lock<T>(&self, path: &Path, f: impl FnOnce() -> T) -> T {
        let lock = self.lock_for(path);
        let _guard: MutexGuard<'_, ()> = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of distinct output paths seen so far.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The output file may not exist yet, so only its parent is canonicalised.
fn lock_key(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let canonical = absolute
        .parent()
        .zip(absolute.file_name())
        .and_then(|(parent, name)| parent.canonicalize().ok().map(|p| p.join(name)));
    canonical.unwrap_or(absolute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_same_file_shares_a_lock() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let locks = OutputLocks::new();

        let direct = locks.lock_for(&dir.path().join("chat.html"));
        let roundabout = locks.lock_for(&dir.path().join("sub/../chat.html"));

        assert!(Arc::ptr_eq(&direct, &roundabout));
        assert_eq!(locks.len(), 1);
    }

    #[test]
    fn test_different_files_get_different_locks() {
        let dir = TempDir::new().unwrap();
        let locks = OutputLocks::new();

        let chat = locks.lock_for(&dir.path().join("chat.html"));
        let report = locks.lock_for(&dir.path().join("log.html"));

        assert!(!Arc::ptr_eq(&chat, &report));
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_with_lock_serialises_writers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat.html");
        let locks = Arc::new(OutputLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                let path = path.clone();
                thread::spawn(move || {
                    locks.with_lock(&path, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(10));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
