//! Emission retrieval

use crate::adapters::dataverse::{Column, ColumnKind, ColumnSet, QueryExpression, RecordSource};
use crate::core::transform::emission::{fields, ENTITY_NAME};
use crate::core::transform::map_emissions;
use crate::domain::{EmissionRecord, Result};

/// The fixed, unfiltered query over the emissions table
pub fn emission_query() -> QueryExpression {
    QueryExpression::new(
        ENTITY_NAME,
        ColumnSet::new(vec![
            Column::new(fields::NAME, ColumnKind::Text),
            Column::new(fields::ORIGIN_CORRELATION_ID, ColumnKind::Text),
            Column::new(fields::ACTIVITY_NAME, ColumnKind::Text),
            Column::new(fields::SCOPE, ColumnKind::OptionSet),
            Column::new(fields::CO2E, ColumnKind::Decimal),
            Column::new(fields::CO2E_UNIT, ColumnKind::Lookup),
        ]),
    )
}

/// Run the emission query once and map every returned record
///
/// # Errors
///
/// Returns the source's error unchanged; the caller decides how to continue.
pub async fn fetch_emissions(source: &dyn RecordSource) -> Result<Vec<EmissionRecord>> {
    let query = emission_query();
    tracing::debug!(path = %query.request_path(), "Fetching emissions");

    let collection = source.retrieve_multiple(&query).await?;
    Ok(map_emissions(&collection.entities))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttributeValue, DataverseError, Entity, EntityCollection};
    use async_trait::async_trait;

    struct StaticSource(Option<Vec<Entity>>);

    #[async_trait]
    impl RecordSource for StaticSource {
        fn is_ready(&self) -> bool {
            true
        }

        async fn retrieve_multiple(&self, query: &QueryExpression) -> Result<EntityCollection> {
            match &self.0 {
                Some(entities) => Ok(EntityCollection::new(&query.entity_name, entities.clone())),
                None => Err(DataverseError::ConnectionFailed("timeout".to_string()).into()),
            }
        }
    }

    #[test]
    fn test_emission_query_selects_fixed_columns() {
        assert_eq!(
            emission_query().request_path(),
            "msdyn_emissions?$select=msdyn_name,msdyn_origincorrelationid,msdyn_activityname,\
             msdyn_scope,msdyn_co2e,_msdyn_co2eunit_value"
        );
    }

    #[tokio::test]
    async fn test_fetch_maps_in_service_order() {
        let source = StaticSource(Some(vec![
            Entity::new(ENTITY_NAME)
                .with_attribute(fields::NAME, AttributeValue::String("second".to_string())),
            Entity::new(ENTITY_NAME),
        ]));

        let records = fetch_emissions(&source).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "second");
        assert_eq!(records[1], EmissionRecord::default());
    }

    #[tokio::test]
    async fn test_fetch_propagates_query_error() {
        let err = fetch_emissions(&StaticSource(None)).await.unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }
}
