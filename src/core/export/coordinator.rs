//! Export coordinator - main orchestrator for the export process
//!
//! Runs the connect, fetch, map and write steps strictly in sequence and
//! reports each milestone through a [`ReportEvent`] callback so the caller
//! controls how status is shown.

use crate::adapters::dataverse::{ConnectionParams, DataverseSession, RecordSource};
use crate::config::ReportConfig;
use crate::core::export::csv_writer::write_csv;
use crate::core::export::fetch::fetch_emissions;
use crate::core::export::summary::{ReportOutcome, ReportSummary};
use crate::domain::{ReportError, Result};
use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Timestamp format used in report file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Milestones of an export run
#[derive(Debug)]
pub enum ReportEvent<'a> {
    Connected,
    ConnectionFailed { reason: Option<&'a str> },
    FetchFailed(&'a ReportError),
    NoData,
    Exported { path: &'a Path, rows: usize },
    ExportFailed(&'a ReportError),
}

impl fmt::Display for ReportEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportEvent::Connected => write!(
                f,
                "Connected to Microsoft Sustainability Manager. Fetching emissions data..."
            ),
            ReportEvent::ConnectionFailed { .. } => write!(f, "Failed to connect to Dataverse."),
            ReportEvent::FetchFailed(e) => write!(f, "⚠️ Error fetching emissions data: {e}"),
            ReportEvent::NoData => write!(f, "No emissions data found."),
            ReportEvent::Exported { path, .. } => write!(
                f,
                "✅ Emissions data successfully exported: {}",
                path.display()
            ),
            ReportEvent::ExportFailed(e) => write!(f, "⚠️ Error writing CSV file: {e}"),
        }
    }
}

/// Report file path: `<output_dir>/<prefix>_<yyyyMMdd_HHmmss>.csv`
pub fn report_path(output_dir: &Path, prefix: &str, started_at: &DateTime<Local>) -> PathBuf {
    output_dir.join(format!(
        "{prefix}_{}.csv",
        started_at.format(TIMESTAMP_FORMAT)
    ))
}

/// Export coordinator
pub struct ReportCoordinator {
    config: ReportConfig,
    started_at: DateTime<Local>,
}

impl ReportCoordinator {
    /// `started_at` is captured once at program start and names the report file
    pub fn new(config: ReportConfig, started_at: DateTime<Local>) -> Self {
        Self { config, started_at }
    }

    pub fn report_path(&self) -> PathBuf {
        report_path(
            Path::new(&self.config.export.output_dir),
            &self.config.export.file_prefix,
            &self.started_at,
        )
    }

    /// Connect to Dataverse and run the export
    ///
    /// # Errors
    ///
    /// Returns an error only when no session can be constructed at all, e.g.
    /// for a malformed URL or connection string. Every other failure is
    /// reported through `on_event` and reflected in the summary.
    pub async fn execute<F>(&self, on_event: F) -> Result<ReportSummary>
    where
        F: FnMut(&ReportEvent<'_>),
    {
        let params = ConnectionParams::from_config(&self.config.dataverse)?;
        tracing::info!(connection = %params, "Connecting to Dataverse");

        let session = DataverseSession::connect(params).await?;
        Ok(self.run(session, on_event).await)
    }

    /// Run the export against an already constructed source
    ///
    /// The source is dropped as soon as the query has finished, before any
    /// file is written.
    pub async fn run<S, F>(&self, source: S, mut on_event: F) -> ReportSummary
    where
        S: RecordSource,
        F: FnMut(&ReportEvent<'_>),
    {
        let start_time = Instant::now();
        tracing::info!("Starting export process");

        if !source.is_ready() {
            let reason = source.last_error().map(String::from);
            on_event(&ReportEvent::ConnectionFailed {
                reason: reason.as_deref(),
            });
            let summary = ReportSummary::new(ReportOutcome::NotConnected { reason })
                .with_duration(start_time.elapsed());
            summary.log_summary();
            return summary;
        }

        on_event(&ReportEvent::Connected);

        let fetched = fetch_emissions(&source).await;
        drop(source);

        let mut fetch_error = None;
        let records = match fetched {
            Ok(records) => records,
            Err(e) => {
                on_event(&ReportEvent::FetchFailed(&e));
                fetch_error = Some(e.to_string());
                Vec::new()
            }
        };

        let outcome = if records.is_empty() {
            on_event(&ReportEvent::NoData);
            ReportOutcome::NoData
        } else {
            let path = self.report_path();
            match write_csv(&records, &path) {
                Ok(rows) => {
                    on_event(&ReportEvent::Exported { path: &path, rows });
                    ReportOutcome::Exported { path, rows }
                }
                Err(e) => {
                    on_event(&ReportEvent::ExportFailed(&e));
                    ReportOutcome::ExportFailed {
                        path,
                        error: e.to_string(),
                    }
                }
            }
        };

        let mut summary = ReportSummary::new(outcome).with_duration(start_time.elapsed());
        summary.records_fetched = records.len();
        summary.fetch_error = fetch_error;
        summary.log_summary();
        summary
    }
}
