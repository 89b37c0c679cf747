//! Wiring between resolved settings and the core pipelines.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use thimble_core::{
    ChatTemplates, DirectoryScanner, DiskLoader, Message, MetadataExtractor, ModifiedTime,
    OutputLocks, PageSummary, Pipeline, PipelineError, ReportTemplates, TimestampChain,
};
use thimble_git::CommitTimestamps;
use thimble_logging::{BoardEvent, Logger, PageKind};

use crate::config::Settings;

/// One board: its settings plus the output locks every page write goes through.
#[derive(Debug)]
pub struct Board {
    settings: Settings,
    locks: Arc<OutputLocks>,
}

impl Board {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            locks: Arc::new(OutputLocks::new()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Commit time, then mtime, then now.
    ///
    /// A board outside git simply has no commit times.
    fn timestamps(&self) -> TimestampChain {
        match CommitTimestamps::load(&self.settings.repo_path) {
            Ok(commits) => TimestampChain::new().then(commits).then(ModifiedTime),
            Err(e) => {
                debug!(error = %e, "No commit history, using modification times");
                TimestampChain::new().then(ModifiedTime)
            }
        }
    }

    fn pipeline(&self, extractor: MetadataExtractor) -> Pipeline<DiskLoader> {
        let loader = DiskLoader::new(self.settings.repo_path.clone(), extractor, self.timestamps());
        Pipeline::new(DirectoryScanner::new(&self.settings.message_dir), loader)
            .with_locks(Arc::clone(&self.locks))
    }

    pub fn write_chat(&self) -> Result<PageSummary> {
        let templates = ChatTemplates::load(self.settings.template_dir.as_deref())
            .map_err(PipelineError::from)
            .context("Failed to load chat templates")?;

        self.pipeline(MetadataExtractor::for_chat())
            .write_chat(&templates, &self.settings.chat)
            .context("Failed to generate chat page")
    }

    pub fn write_report(&self) -> Result<PageSummary> {
        let templates = ReportTemplates::load(self.settings.template_dir.as_deref())
            .map_err(PipelineError::from)
            .context("Failed to load report templates")?;

        self.pipeline(MetadataExtractor::for_report())
            .write_report(&templates, &self.settings.report)
            .context("Failed to generate report page")
    }

    /// Every message, newest first, with report-style defaults.
    pub fn messages(&self) -> Result<Vec<Message>> {
        self.pipeline(MetadataExtractor::for_report())
            .collect()
            .with_context(|| {
                format!(
                    "Failed to scan {}",
                    self.settings.message_dir.display()
                )
            })
    }

    /// Regenerate both pages, logging each result.
    pub fn regenerate(&self, logger: &Logger) -> Result<()> {
        let chat = self.write_chat()?;
        logger.log(&page_written(PageKind::Chat, &chat));
        let report = self.write_report()?;
        logger.log(&page_written(PageKind::Report, &report));
        Ok(())
    }
}

pub fn page_written(page: PageKind, summary: &PageSummary) -> BoardEvent {
    BoardEvent::PageWritten {
        page,
        path: summary.output_file.clone(),
        scanned: summary.scanned,
        shown: summary.shown,
        placeholders: summary.placeholders,
    }
}
