//! Record transformation
//!
//! Converts attribute bags retrieved from Dataverse into the flat records the
//! report is written from. Mapping is total: it never fails, whatever the
//! service returned.

pub mod emission;

pub use emission::{map_emission, map_emissions};
