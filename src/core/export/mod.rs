//! Export orchestration
//!
//! This module provides the core export logic, including:
//! - Retrieval of emission records
//! - CSV report writing
//! - Export coordination and summary reporting

pub mod coordinator;
pub mod csv_writer;
pub mod fetch;
pub mod summary;

pub use coordinator::{report_path, ReportCoordinator, ReportEvent};
pub use csv_writer::{write_csv, CsvExporter};
pub use fetch::{emission_query, fetch_emissions};
pub use summary::{ReportOutcome, ReportSummary};
