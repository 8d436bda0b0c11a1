//! Dataverse Web API models
//!
//! Query descriptions and the decoding of OData JSON rows into the typed
//! attribute bag.

use crate::domain::{
    AttributeValue, DataverseError, Entity, EntityReference, OptionSetValue, Result,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Annotation carrying a value's display text
pub const FORMATTED_VALUE_ANNOTATION: &str = "OData.Community.Display.V1.FormattedValue";

/// Annotation carrying the target table of a lookup
pub const LOOKUP_LOGICAL_NAME_ANNOTATION: &str = "Microsoft.Dynamics.CRM.lookuplogicalname";

/// How a column's JSON value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Decimal,
    OptionSet,
    Lookup,
}

/// One requested column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub logical_name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(logical_name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            logical_name: logical_name.into(),
            kind,
        }
    }

    /// Name used in `$select` and in the response body
    ///
    /// Lookups are exposed by the Web API as `_<name>_value`.
    pub fn select_name(&self) -> String {
        match self.kind {
            ColumnKind::Lookup => format!("_{}_value", self.logical_name),
            _ => self.logical_name.clone(),
        }
    }
}

/// Ordered list of requested columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet(Vec<Column>);

impl ColumnSet {
    pub fn new(columns: Vec<Column>) -> Self {
        Self(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.0
    }

    /// Comma-separated `$select` value
    pub fn select_clause(&self) -> String {
        self.0
            .iter()
            .map(Column::select_name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Unfiltered retrieval of all records of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExpression {
    pub entity_name: String,
    pub columns: ColumnSet,
    entity_set_name: Option<String>,
}

impl QueryExpression {
    pub fn new(entity_name: impl Into<String>, columns: ColumnSet) -> Self {
        Self {
            entity_name: entity_name.into(),
            columns,
            entity_set_name: None,
        }
    }

    /// Use an explicit entity set name instead of the derived plural
    pub fn with_entity_set_name(mut self, name: impl Into<String>) -> Self {
        self.entity_set_name = Some(name.into());
        self
    }

    /// Collection name addressed in the Web API URL
    pub fn entity_set_name(&self) -> String {
        self.entity_set_name
            .clone()
            .unwrap_or_else(|| pluralize(&self.entity_name))
    }

    /// Path and query relative to the Web API root
    pub fn request_path(&self) -> String {
        format!(
            "{}?$select={}",
            self.entity_set_name(),
            self.columns.select_clause()
        )
    }

    /// Decode one OData row into an attribute bag
    ///
    /// Nulls and missing properties become absent attributes.
    ///
    /// # Errors
    ///
    /// Returns [`DataverseError::InvalidResponse`] when a present value does not
    /// have the JSON shape its column kind requires.
    pub fn decode_row(&self, row: &Map<String, Value>) -> Result<Entity> {
        let mut entity = Entity::new(&self.entity_name);

        if let Some(Value::String(id)) = row.get(&format!("{}id", self.entity_name)) {
            entity = entity.with_id(id.clone());
        }

        for column in self.columns.columns() {
            let key = column.select_name();
            let value = match row.get(&key) {
                None | Some(Value::Null) => continue,
                Some(value) => value,
            };

            let attribute = match column.kind {
                ColumnKind::Text => match value {
                    Value::String(s) => AttributeValue::String(s.clone()),
                    other => return Err(shape_error(&key, "a string", other)),
                },
                ColumnKind::Decimal => match value {
                    // Number keeps the source digits, so scale and precision survive
                    Value::Number(n) => {
                        let decimal = BigDecimal::from_str(&n.to_string()).map_err(|e| {
                            DataverseError::InvalidResponse(format!(
                                "Column '{key}' holds an unreadable number {n}: {e}"
                            ))
                        })?;
                        AttributeValue::Decimal(decimal)
                    }
                    other => return Err(shape_error(&key, "a number", other)),
                },
                ColumnKind::OptionSet => match value.as_i64().map(i32::try_from) {
                    Some(Ok(code)) => AttributeValue::OptionSet(OptionSetValue::new(code)),
                    _ => return Err(shape_error(&key, "an integer option code", value)),
                },
                ColumnKind::Lookup => match value {
                    Value::String(id) => {
                        let mut reference = EntityReference::new(id.clone());
                        if let Some(Value::String(name)) =
                            row.get(&format!("{key}@{FORMATTED_VALUE_ANNOTATION}"))
                        {
                            reference = reference.with_name(name.clone());
                        }
                        if let Some(Value::String(table)) =
                            row.get(&format!("{key}@{LOOKUP_LOGICAL_NAME_ANNOTATION}"))
                        {
                            reference = reference.with_logical_name(table.clone());
                        }
                        AttributeValue::EntityReference(reference)
                    }
                    other => return Err(shape_error(&key, "a record id", other)),
                },
            };

            entity.set(column.logical_name.clone(), attribute);
        }

        Ok(entity)
    }
}

fn shape_error(key: &str, expected: &str, found: &Value) -> crate::domain::ReportError {
    DataverseError::InvalidResponse(format!("Column '{key}' should be {expected}, got {found}"))
        .into()
}

/// Entity set name derived from a table's logical name
pub fn pluralize(logical_name: &str) -> String {
    if let Some(stem) = logical_name.strip_suffix('y') {
        if !stem.ends_with(|c: char| "aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }

    if ["s", "x", "z", "ch", "sh"]
        .iter()
        .any(|suffix| logical_name.ends_with(*suffix))
    {
        return format!("{logical_name}es");
    }

    format!("{logical_name}s")
}

/// Collection response body
#[derive(Debug, Deserialize)]
pub struct EntitySetResponse {
    #[serde(default)]
    pub value: Vec<Map<String, Value>>,

    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// `WhoAmI` function response
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct WhoAmIResponse {
    pub user_id: String,
    pub business_unit_id: String,
    pub organization_id: String,
}

/// Error body returned by the Web API
#[derive(Debug, Deserialize)]
pub struct ODataErrorResponse {
    pub error: ODataError,
}

#[derive(Debug, Deserialize)]
pub struct ODataError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
