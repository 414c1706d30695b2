//! Analysis Pipeline
//! Load -> clean -> records -> summary, run once per data source.

use crate::config::AppConfig;
use crate::data::{
    CleanError, DataLoader, DataSource, LoaderError, NotificationCleaner, NotificationRecord,
    RecordError, SourceFormat,
};
use crate::stats::{DashboardSummary, SummaryOptions};
use std::time::Instant;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoaderError),
    #[error(transparent)]
    Clean(#[from] CleanError),
    #[error(transparent)]
    Records(#[from] RecordError),
}

/// Result of one load, ready for rendering.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub source_name: String,
    pub format: SourceFormat,
    /// CSV error that was swallowed because the spreadsheet reader succeeded.
    pub csv_error: Option<String>,
    pub summary: DashboardSummary,
}

impl AnalysisOutcome {
    /// One-line status for the window and logs.
    pub fn status_line(&self) -> String {
        let mut status = format!(
            "Loaded {} notifications from {} ({})",
            self.summary.total_notifications, self.source_name, self.format
        );
        if self.csv_error.is_some() {
            status.push_str(", CSV parse failed so the file was read as a spreadsheet");
        }
        status
    }
}

pub struct AnalysisPipeline;

impl AnalysisPipeline {
    pub fn run(source: &DataSource, config: &AppConfig) -> Result<AnalysisOutcome, PipelineError> {
        let started = Instant::now();

        let loaded = DataLoader::load(source)?;
        let cleaner = NotificationCleaner::with_utc_offset_minutes(config.utc_offset_minutes)?;
        let cleaned = cleaner.clean(loaded.frame)?;
        let records = NotificationRecord::from_frame(&cleaned)?;
        let options = SummaryOptions {
            utc_offset: cleaner.offset(),
            ..config.summary_options()
        };
        let summary = DashboardSummary::compute(&records, &options);

        info!(
            source = %loaded.source_name,
            rows = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis complete"
        );

        Ok(AnalysisOutcome {
            source_name: loaded.source_name,
            format: loaded.format,
            csv_error: loaded.csv_error,
            summary,
        })
    }
}
