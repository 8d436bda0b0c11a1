//! Export summary and reporting
//!
//! This module defines structures for tracking and reporting export results.

use std::path::PathBuf;
use std::time::Duration;

/// How an export run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The session never became ready; nothing was fetched
    NotConnected { reason: Option<String> },

    /// No records were available to export, so no file was written
    NoData,

    /// The report file was written
    Exported { path: PathBuf, rows: usize },

    /// Writing the report failed; a partial file may remain at `path`
    ExportFailed { path: PathBuf, error: String },
}

/// Summary of an export run
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub outcome: ReportOutcome,

    /// Number of records returned by the query
    pub records_fetched: usize,

    /// Error raised by the query, if any; the run continues with zero records
    pub fetch_error: Option<String>,

    /// Duration of the run
    pub duration: Duration,
}

impl ReportSummary {
    pub fn new(outcome: ReportOutcome) -> Self {
        Self {
            outcome,
            records_fetched: 0,
            fetch_error: None,
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Path of the written report, when one was written
    pub fn output_path(&self) -> Option<&PathBuf> {
        match &self.outcome {
            ReportOutcome::Exported { path, .. } => Some(path),
            _ => None,
        }
    }

    /// True only when a report file was written and the query succeeded
    pub fn is_successful(&self) -> bool {
        self.fetch_error.is_none() && matches!(self.outcome, ReportOutcome::Exported { .. })
    }

    /// Log the summary
    pub fn log_summary(&self) {
        match &self.outcome {
            ReportOutcome::Exported { path, rows } => tracing::info!(
                path = %path.display(),
                rows = rows,
                records_fetched = self.records_fetched,
                duration_ms = self.duration.as_millis() as u64,
                "Export completed"
            ),
            ReportOutcome::ExportFailed { path, error } => tracing::error!(
                path = %path.display(),
                error = %error,
                records_fetched = self.records_fetched,
                "Export failed"
            ),
            ReportOutcome::NoData => tracing::info!(
                fetch_failed = self.fetch_error.is_some(),
                duration_ms = self.duration.as_millis() as u64,
                "Export skipped, no records"
            ),
            ReportOutcome::NotConnected { reason } => tracing::warn!(
                reason = reason.as_deref().unwrap_or("unknown"),
                "Export skipped, not connected"
            ),
        }

        if let Some(error) = &self.fetch_error {
            tracing::warn!(error = %error, "Emission query failed");
        }
    }
}
