//! Domain models and types.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Attribute bag** ([`Entity`], [`AttributeValue`]) for records as the service returns them
//! - **Report row** ([`EmissionRecord`]) with every field populated
//! - **Error types** ([`ReportError`], [`DataverseError`])
//! - **Result type alias** ([`Result`])
//!
//! # Attribute lookups
//!
//! Every lookup yields a value; missing names resolve to [`AttributeValue::Absent`]:
//!
//! ```rust
//! use emissions_report::domain::{AttributeValue, Entity};
//!
//! let entity = Entity::new("msdyn_emission")
//!     .with_attribute("msdyn_name", AttributeValue::String("Flight A1".to_string()));
//!
//! assert!(!entity.attribute("msdyn_name").is_absent());
//! assert!(entity.attribute("msdyn_scope").is_absent());
//! ```

pub mod attribute;
pub mod emission;
pub mod errors;
pub mod result;

// Re-export commonly used types for convenience
pub use attribute::{AttributeValue, Entity, EntityCollection, EntityReference, OptionSetValue};
pub use emission::{EmissionRecord, PLACEHOLDER};
pub use errors::{DataverseError, ReportError};
pub use result::Result;
