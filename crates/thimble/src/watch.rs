use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use thimble_core::scan::METADATA_DIR;
use thimble_logging::{BoardEvent, Logger};

use crate::board::Board;

/// Quiet period that folds a burst of file events into one rebuild.
const DEBOUNCE: Duration = Duration::from_millis(250);

/// Whether `event` touches a message file under `root`.
fn is_message_change(event: &Event, root: &Path) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    relevant_kind && event.paths.iter().any(|p| is_message_path(p, root))
}

/// Only components below `root` count towards the metadata exclusion.
fn is_message_path(path: &Path, root: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.extension().is_some_and(|ext| ext == "txt")
        && !relative.components().any(|c| c.as_os_str() == METADATA_DIR)
}

/// Rebuild both pages whenever a message file changes, until Ctrl+C.
pub async fn watch(board: Arc<Board>, logger: Logger) -> Result<()> {
    let dir = board.settings().message_dir.clone();
    if !dir.is_dir() {
        anyhow::bail!("Message directory {} does not exist", dir.display());
    }

    // notify reports resolved paths
    let root = dir.canonicalize().unwrap_or_else(|_| dir.clone());

    let (tx, mut rx) = mpsc::unbounded_channel::<usize>();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if is_message_change(&event, &root) => {
            let _ = tx.send(event.paths.len());
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "File watcher error"),
    })
    .context("Failed to create file watcher")?;
    watcher
        .watch(&dir, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;

    logger.log(&BoardEvent::WatchStarted { dir: dir.clone() });
    rebuild(&board, logger).await;

    loop {
        tokio::select! {
            changed = rx.recv() => {
                let Some(mut changed) = changed else { break };
                tokio::time::sleep(DEBOUNCE).await;
                while let Ok(more) = rx.try_recv() {
                    changed += more;
                }
                debug!(changed, "Message files changed");
                logger.log(&BoardEvent::WatchTriggered { changed });
                rebuild(&board, logger).await;
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    logger.log(&BoardEvent::WatchStopped);
    Ok(())
}

/// Regenerate off the async runtime; failures are reported and the watch goes on.
async fn rebuild(board: &Arc<Board>, logger: Logger) {
    let board = Arc::clone(board);
    let result = tokio::task::spawn_blocking(move || board.regenerate(&logger)).await;

    let error = match result {
        Ok(Ok(())) => return,
        Ok(Err(e)) => format!("{:#}", e),
        Err(e) => e.to_string(),
    };
    logger.log(&BoardEvent::ErrorEncountered {
        context: "regenerate".to_string(),
        error,
    });
}
