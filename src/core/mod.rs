//! Core business logic.
//!
//! # Modules
//!
//! - [`export`] - Retrieval, CSV writing, and coordination of a report run
//! - [`transform`] - Mapping of retrieved records to report rows
//!
//! # Export Workflow
//!
//! 1. **Connect**: Sign in to Dataverse and confirm the session with `WhoAmI`
//! 2. **Fetch**: Run the single emissions query
//! 3. **Transform**: Map each record to an [`EmissionRecord`](crate::domain::EmissionRecord)
//! 4. **Write**: Serialize the records to a timestamped CSV file
//! 5. **Report**: Log an export summary
//!
//! # Example
//!
//! ```rust,no_run
//! use emissions_report::config::load_config;
//! use emissions_report::core::export::ReportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("emissions-report.toml")?;
//! let coordinator = ReportCoordinator::new(config, chrono::Local::now());
//!
//! let summary = coordinator.execute(|event| println!("{event}")).await?;
//! println!("Fetched: {}", summary.records_fetched);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod transform;
