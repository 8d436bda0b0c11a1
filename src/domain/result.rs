//! Result type alias
//!
//! Convenience alias that uses [`ReportError`] as the error type.

use super::errors::ReportError;

/// Result type alias for exporter operations
///
/// # Examples
///
/// ```
/// use emissions_report::domain::result::Result;
/// use emissions_report::domain::errors::ReportError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(ReportError::Configuration("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, ReportError>;
