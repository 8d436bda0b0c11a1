// Emissions Report - Dataverse emissions to CSV exporter
// Copyright (c) 2025 Emissions Report Contributors
// Licensed under the MIT License

use chrono::{DateTime, Local};
use clap::Parser;
use emissions_report::cli::{Cli, Commands};
use emissions_report::config::{load_config, LoggingConfig};
use emissions_report::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Names the report file; taken once before anything else runs
    let started_at = Local::now();

    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging settings come from the config file when it loads; the export
    // command reports load failures itself
    let config = load_config(&cli.config).ok();
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "warn".to_string());
    let logging_config = config.map(|c| c.logging).unwrap_or_else(LoggingConfig::default);

    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Emissions Report - Dataverse emissions to CSV exporter"
    );

    let exit_code = match execute_command(&cli, started_at).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            println!("❌ Error: {e}");
            5 // Fatal error exit code
        }
    };

    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, started_at: DateTime<Local>) -> anyhow::Result<i32> {
    match cli.resolved_command() {
        Commands::Export(args) => args.execute(&cli.config, started_at).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
