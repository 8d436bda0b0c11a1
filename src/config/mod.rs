//! Configuration management.
//!
//! The exporter reads a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `EMISSIONS_REPORT_<SECTION>_<KEY>` overrides
//! - Default values for optional settings
//!
//! # Example Configuration
//!
//! ```toml
//! [dataverse]
//! url = "https://contoso.crm.dynamics.com"
//! client_id = "51f81489-12ee-4a9e-aaae-a2591f45987d"
//!
//! [export]
//! output_dir = "."
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use emissions_report::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("emissions-report.toml")?;
//! println!("Dataverse URL: {}", config.dataverse.url);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, AuthType, DataverseConfig, ExportConfig, LoggingConfig, LoginPrompt,
    ReportConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
