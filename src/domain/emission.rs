//! Flat emission record written to the report

use bigdecimal::BigDecimal;

/// Fallback text for any string-valued field the service did not return
pub const PLACEHOLDER: &str = "N/A";

/// One row of the emissions report
///
/// Every field is always populated: missing text values carry [`PLACEHOLDER`]
/// and a missing quantity is zero. Records have no identity and compare by
/// content only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmissionRecord {
    pub name: String,
    pub origin_correlation_id: String,
    pub activity_name: String,

    /// Option-set code rendered as text
    pub scope: String,

    /// Emitted CO2-equivalent quantity
    pub co2e: BigDecimal,

    /// Display name of the referenced unit
    pub co2e_unit: String,
}

impl EmissionRecord {
    /// Column names of the report, in output order
    pub const HEADERS: [&'static str; 6] = [
        "Name",
        "OriginCorrelationId",
        "ActivityName",
        "Scope",
        "CO2E",
        "CO2EUnit",
    ];

    /// Render the record as CSV fields in [`Self::HEADERS`] order
    ///
    /// The quantity is written in plain positional notation with a period as
    /// decimal separator and its source scale, never in exponent form.
    pub fn to_row(&self) -> [String; 6] {
        [
            self.name.clone(),
            self.origin_correlation_id.clone(),
            self.activity_name.clone(),
            self.scope.clone(),
            self.co2e.to_plain_string(),
            self.co2e_unit.clone(),
        ]
    }

    /// True when any text field carries the placeholder
    pub fn has_placeholder(&self) -> bool {
        [
            &self.name,
            &self.origin_correlation_id,
            &self.activity_name,
            &self.scope,
            &self.co2e_unit,
        ]
        .iter()
        .any(|field| field.as_str() == PLACEHOLDER)
    }
}

impl Default for EmissionRecord {
    fn default() -> Self {
        Self {
            name: PLACEHOLDER.to_string(),
            origin_correlation_id: PLACEHOLDER.to_string(),
            activity_name: PLACEHOLDER.to_string(),
            scope: PLACEHOLDER.to_string(),
            co2e: BigDecimal::from(0),
            co2e_unit: PLACEHOLDER.to_string(),
        }
    }
}
