//! External system integrations.
//!
//! - [`dataverse`] - Dataverse Web API integration (sign-in, session, queries)
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind traits so the export pipeline
//! can be tested with in-memory implementations. The pipeline only depends on
//! [`dataverse::RecordSource`].
//!
//! ```rust,no_run
//! use emissions_report::adapters::dataverse::{ConnectionParams, DataverseSession, RecordSource};
//! use emissions_report::config::DataverseConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DataverseConfig {
//!     url: "https://contoso.crm.dynamics.com".to_string(),
//!     client_id: "51f81489-12ee-4a9e-aaae-a2591f45987d".to_string(),
//!     ..Default::default()
//! };
//!
//! let session = DataverseSession::connect(ConnectionParams::from_config(&config)?).await?;
//! if session.is_ready() {
//!     // Run queries
//! }
//! # Ok(())
//! # }
//! ```

pub mod dataverse;
