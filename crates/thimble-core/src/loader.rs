use std::path::{Path, PathBuf};

use tracing::warn;

use crate::extract::MetadataExtractor;
use crate::message::{ExtractedText, Message};
use crate::timestamps::TimestampChain;

/// Turns one scanned file into a [`Message`].
///
/// Implementations never fail: a file that cannot be read or decoded comes
/// back as a placeholder message.
pub trait MessageLoader {
    fn load(&self, path: &Path) -> Message;
}

/// Reads message files from disk.
#[derive(Debug)]
pub struct DiskLoader {
    repo_root: PathBuf,
    extractor: MetadataExtractor,
    timestamps: TimestampChain,
}

impl DiskLoader {
    pub fn new(repo_root: PathBuf, extractor: MetadataExtractor, timestamps: TimestampChain) -> Self {
        Self {
            repo_root,
            extractor,
            timestamps,
        }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn relative_path(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.repo_root)
            .unwrap_or(path)
            .to_path_buf()
    }
}

impl MessageLoader for DiskLoader {
    fn load(&self, path: &Path) -> Message {
        let relative = self.relative_path(path);
        let timestamp = self.timestamps.resolve(&relative, path);

        let text = match std::fs::read(path) {
            Ok(raw) => match self.extractor.try_extract(&raw) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to decode message file");
                    ExtractedText::placeholder()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read message file");
                ExtractedText::placeholder()
            }
        };

        Message::new(text, relative, timestamp)
    }
}

impl<L: MessageLoader + ?Sized> MessageLoader for &L {
    fn load(&self, path: &Path) -> Message {
        (**self).load(path)
    }
}
