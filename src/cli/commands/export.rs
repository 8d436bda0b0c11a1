//! Export command implementation
//!
//! This module implements the `export` command: fetch every emission record
//! from Dataverse and write it to a timestamped CSV file.

use crate::config::load_config;
use crate::core::export::{ReportCoordinator, ReportEvent, ReportSummary};
use chrono::{DateTime, Local};
use clap::Args;

/// Arguments for the export command
#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Directory to write the report to (overrides export.output_dir)
    #[arg(short, long)]
    pub output_dir: Option<String>,
}

impl ExportArgs {
    /// Execute the export command
    ///
    /// Every outcome, including failures, is reported on stdout and returns
    /// exit code 0.
    pub async fn execute(
        &self,
        config_path: &str,
        started_at: DateTime<Local>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        if let Err(e) = self.run(config_path, started_at).await {
            tracing::error!(error = %e, "Export failed");
            println!("❌ Error: {e}");
        }

        Ok(0)
    }

    async fn run(
        &self,
        config_path: &str,
        started_at: DateTime<Local>,
    ) -> anyhow::Result<ReportSummary> {
        let mut config = load_config(config_path)?;

        if let Some(output_dir) = &self.output_dir {
            tracing::info!(output_dir = %output_dir, "Overriding output directory from CLI");
            config.export.output_dir = output_dir.clone();
        }

        let coordinator = ReportCoordinator::new(config, started_at);
        let summary = coordinator.execute(print_event).await?;
        Ok(summary)
    }
}

fn print_event(event: &ReportEvent<'_>) {
    if let ReportEvent::ConnectionFailed {
        reason: Some(reason),
    } = event
    {
        tracing::debug!(reason = %reason, "Connection failure detail");
    }
    println!("{event}");
}
