use std::path::Path;

use chrono::{DateTime, Utc};

/// Something that can date a message file.
///
/// `relative` is the path under the repository root, `absolute` the path
/// on disk. Returning `None` defers to the next source in a [`TimestampChain`].
pub trait TimestampSource: Send + Sync {
    fn timestamp(&self, relative: &Path, absolute: &Path) -> Option<DateTime<Utc>>;
}

/// Filesystem modification time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModifiedTime;

impl TimestampSource for ModifiedTime {
    fn timestamp(&self, _relative: &Path, absolute: &Path) -> Option<DateTime<Utc>> {
        let modified = std::fs::metadata(absolute).ok()?.modified().ok()?;
        Some(DateTime::<Utc>::from(modified))
    }
}

/// Ordered list of sources, first answer wins, current time as last resort.
#[derive(Default)]
pub struct TimestampChain {
    sources: Vec<Box<dyn TimestampSource>>,
}

impl TimestampChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source consulted after the ones already added.
    pub fn then(mut self, source: impl TimestampSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn resolve(&self, relative: &Path, absolute: &Path) -> DateTime<Utc> {
        self.sources
            .iter()
            .find_map(|source| source.timestamp(relative, absolute))
            .unwrap_or_else(Utc::now)
    }
}

impl std::fmt::Debug for TimestampChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimestampChain")
            .field("sources", &self.sources.len())
            .finish()
    }
}
