//! CLI interface and argument parsing
//!
//! This module provides the command-line interface using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Emissions Report - Dataverse emissions to CSV exporter
#[derive(Parser, Debug)]
#[command(name = "emissions-report")]
#[command(version, about, long_about = None)]
#[command(author = "Emissions Report Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "emissions-report.toml",
        env = "EMISSIONS_REPORT_CONFIG"
    )]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "EMISSIONS_REPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute; defaults to `export`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// The requested command, or `export` with default arguments
    pub fn resolved_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Export(Default::default()))
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Export emissions from Dataverse to a timestamped CSV file
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
