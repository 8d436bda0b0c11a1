//! Emission record mapping

use crate::domain::{AttributeValue, EmissionRecord, Entity, PLACEHOLDER};
use bigdecimal::BigDecimal;

/// Logical name of the emissions table
pub const ENTITY_NAME: &str = "msdyn_emission";

/// Logical names of the columns read from each emission record
pub mod fields {
    pub const NAME: &str = "msdyn_name";
    pub const ORIGIN_CORRELATION_ID: &str = "msdyn_origincorrelationid";
    pub const ACTIVITY_NAME: &str = "msdyn_activityname";
    pub const SCOPE: &str = "msdyn_scope";
    pub const CO2E: &str = "msdyn_co2e";
    pub const CO2E_UNIT: &str = "msdyn_co2eunit";
}

/// Map one retrieved record to a report row
///
/// Text fields fall back to [`PLACEHOLDER`] when absent. `Scope` is rendered as
/// its option-set code, `CO2EUnit` as the referenced unit's display name, and a
/// missing `CO2E` becomes zero rather than a placeholder.
///
/// # Examples
///
/// ```
/// use emissions_report::core::transform::map_emission;
/// use emissions_report::domain::{AttributeValue, Entity};
///
/// let entity = Entity::new("msdyn_emission")
///     .with_attribute("msdyn_name", AttributeValue::String("Flight A1".to_string()));
///
/// let record = map_emission(&entity);
/// assert_eq!(record.name, "Flight A1");
/// assert_eq!(record.scope, "N/A");
/// assert_eq!(record.co2e.to_string(), "0");
/// ```
pub fn map_emission(entity: &Entity) -> EmissionRecord {
    EmissionRecord {
        name: text(entity, fields::NAME),
        origin_correlation_id: text(entity, fields::ORIGIN_CORRELATION_ID),
        activity_name: text(entity, fields::ACTIVITY_NAME),
        scope: option_code(entity, fields::SCOPE),
        co2e: quantity(entity, fields::CO2E),
        co2e_unit: reference_name(entity, fields::CO2E_UNIT),
    }
}

/// Map records in the order they were retrieved
pub fn map_emissions(entities: &[Entity]) -> Vec<EmissionRecord> {
    entities.iter().map(map_emission).collect()
}

fn text(entity: &Entity, field: &str) -> String {
    match entity.attribute(field) {
        AttributeValue::String(value) => value.clone(),
        AttributeValue::Absent => PLACEHOLDER.to_string(),
        other => unexpected(entity, field, other),
    }
}

fn option_code(entity: &Entity, field: &str) -> String {
    match entity.attribute(field) {
        AttributeValue::OptionSet(code) => code.value().to_string(),
        AttributeValue::Absent => PLACEHOLDER.to_string(),
        other => unexpected(entity, field, other),
    }
}

fn reference_name(entity: &Entity, field: &str) -> String {
    match entity.attribute(field) {
        AttributeValue::EntityReference(reference) => reference
            .name
            .clone()
            .unwrap_or_else(|| PLACEHOLDER.to_string()),
        AttributeValue::Absent => PLACEHOLDER.to_string(),
        other => unexpected(entity, field, other),
    }
}

fn quantity(entity: &Entity, field: &str) -> BigDecimal {
    match entity.attribute(field) {
        AttributeValue::Decimal(value) => value.clone(),
        AttributeValue::Absent => BigDecimal::from(0),
        other => {
            tracing::debug!(
                id = ?entity.id,
                field = %field,
                value = ?other,
                "Unexpected attribute type, using zero"
            );
            BigDecimal::from(0)
        }
    }
}

fn unexpected(entity: &Entity, field: &str, value: &AttributeValue) -> String {
    tracing::debug!(
        id = ?entity.id,
        field = %field,
        value = ?value,
        "Unexpected attribute type, using placeholder"
    );
    PLACEHOLDER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntityReference, OptionSetValue};
    use std::str::FromStr;

    fn decimal(text: &str) -> BigDecimal {
        BigDecimal::from_str(text).unwrap()
    }

    fn full_entity() -> Entity {
        Entity::new(ENTITY_NAME)
            .with_attribute(fields::NAME, AttributeValue::String("Boiler 3".to_string()))
            .with_attribute(
                fields::ORIGIN_CORRELATION_ID,
                AttributeValue::String("corr-42".to_string()),
            )
            .with_attribute(
                fields::ACTIVITY_NAME,
                AttributeValue::String("Stationary combustion".to_string()),
            )
            .with_attribute(fields::SCOPE, AttributeValue::OptionSet(OptionSetValue::new(2)))
            .with_attribute(fields::CO2E, AttributeValue::Decimal(decimal("1234.5")))
            .with_attribute(
                fields::CO2E_UNIT,
                AttributeValue::EntityReference(EntityReference::new("u1").with_name("t")),
            )
    }

    #[test]
    fn test_fully_populated_record_has_no_placeholders() {
        let record = map_emission(&full_entity());

        assert!(!record.has_placeholder());
        assert_eq!(record.name, "Boiler 3");
        assert_eq!(record.origin_correlation_id, "corr-42");
        assert_eq!(record.activity_name, "Stationary combustion");
        assert_eq!(record.scope, "2");
        assert_eq!(record.co2e, decimal("1234.5"));
        assert_eq!(record.co2e_unit, "t");
    }

    #[test]
    fn test_flight_scenario() {
        let entity = Entity::new(ENTITY_NAME)
            .with_attribute(fields::NAME, AttributeValue::String("Flight A1".to_string()))
            .with_attribute(fields::CO2E, AttributeValue::Decimal(decimal("12.34")))
            .with_attribute(fields::SCOPE, AttributeValue::OptionSet(OptionSetValue::new(1)))
            .with_attribute(
                fields::CO2E_UNIT,
                AttributeValue::EntityReference(EntityReference::new("u1").with_name("kg")),
            );

        let record = map_emission(&entity);

        assert_eq!(
            record,
            EmissionRecord {
                name: "Flight A1".to_string(),
                origin_correlation_id: "N/A".to_string(),
                activity_name: "N/A".to_string(),
                scope: "1".to_string(),
                co2e: decimal("12.34"),
                co2e_unit: "kg".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_record_maps_to_placeholders_and_zero() {
        let record = map_emission(&Entity::new(ENTITY_NAME));
        assert_eq!(record, EmissionRecord::default());
        assert_eq!(record.co2e.to_string(), "0");
    }

    #[test]
    fn test_missing_text_fields_use_placeholder() {
        for field in [
            fields::NAME,
            fields::ORIGIN_CORRELATION_ID,
            fields::ACTIVITY_NAME,
            fields::SCOPE,
            fields::CO2E_UNIT,
        ] {
            let mut entity = full_entity();
            entity.set(field, AttributeValue::Absent);
            let row = map_emission(&entity).to_row();
            assert_eq!(row.iter().filter(|v| v.as_str() == PLACEHOLDER).count(), 1);
        }
    }

    #[test]
    fn test_missing_co2e_is_zero_not_placeholder() {
        let mut entity = full_entity();
        entity.set(fields::CO2E, AttributeValue::Absent);
        let record = map_emission(&entity);
        assert_eq!(record.co2e, BigDecimal::from(0));
        assert!(!record.has_placeholder());
    }

    #[test]
    fn test_unnamed_reference_and_wrong_types_fall_back() {
        let entity = Entity::new(ENTITY_NAME)
            .with_attribute(fields::NAME, AttributeValue::Decimal(decimal("1")))
            .with_attribute(fields::SCOPE, AttributeValue::String("Scope 1".to_string()))
            .with_attribute(fields::CO2E, AttributeValue::String("12".to_string()))
            .with_attribute(
                fields::CO2E_UNIT,
                AttributeValue::EntityReference(EntityReference::new("u1")),
            );

        assert_eq!(map_emission(&entity), EmissionRecord::default());
    }

    #[test]
    fn test_map_emissions_preserves_order() {
        let entities: Vec<Entity> = ["b", "a", "c"]
            .iter()
            .map(|name| {
                Entity::new(ENTITY_NAME)
                    .with_attribute(fields::NAME, AttributeValue::String(name.to_string()))
            })
            .collect();

        let names: Vec<String> = map_emissions(&entities)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }
}
