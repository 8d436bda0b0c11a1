// Emissions Report - Dataverse emissions to CSV exporter
// Copyright (c) 2025 Emissions Report Contributors
// Licensed under the MIT License

//! # Emissions Report - Dataverse emissions to CSV
//!
//! Exports `msdyn_emission` records from a Microsoft Dataverse environment
//! (Microsoft Sustainability Manager) to a timestamped CSV file.
//!
//! ## Overview
//!
//! A run is a single, strictly sequential pipeline:
//! - **Connect** to Dataverse with interactive OAuth or a client secret
//! - **Fetch** every emission record with one unfiltered query
//! - **Map** each record to a flat six-field [`domain::EmissionRecord`]
//! - **Write** the records to `<prefix>_<yyyyMMdd_HHmmss>.csv`
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (fetch, transform, CSV export)
//! - [`adapters`] - Dataverse integration
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use emissions_report::config::load_config;
//! use emissions_report::core::export::ReportCoordinator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("emissions-report.toml")?;
//!     let coordinator = ReportCoordinator::new(config, chrono::Local::now());
//!
//!     let summary = coordinator.execute(|event| println!("{event}")).await?;
//!     println!("Fetched {} records", summary.records_fetched);
//!     Ok(())
//! }
//! ```
//!
//! ## Mapping
//!
//! Missing text values become `"N/A"`; a missing CO2E quantity becomes zero.
//!
//! ```rust
//! use emissions_report::core::transform::map_emission;
//! use emissions_report::domain::Entity;
//!
//! let record = map_emission(&Entity::new("msdyn_emission"));
//! assert_eq!(record.to_row(), ["N/A", "N/A", "N/A", "N/A", "0", "N/A"].map(String::from));
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`], an alias over
//! [`domain::ReportError`]:
//!
//! ```rust,no_run
//! use emissions_report::domain::ReportError;
//!
//! fn example() -> Result<(), ReportError> {
//!     let config = emissions_report::config::load_config("emissions-report.toml")?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
