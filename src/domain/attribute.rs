//! Attribute bag model for records retrieved from Dataverse
//!
//! A retrieved record is a set of named, typed values where any value may be
//! missing. Lookups never fail: a name that was not returned resolves to
//! [`AttributeValue::Absent`].

use bigdecimal::BigDecimal;
use std::collections::BTreeMap;
use std::fmt;

static ABSENT: AttributeValue = AttributeValue::Absent;

/// Integer code of a categorical (option-set) column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OptionSetValue(i32);

impl OptionSetValue {
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// Underlying numeric code
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for OptionSetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pointer to another record, resolved only as far as its display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityReference {
    /// Primary key of the referenced record
    pub id: String,

    /// Logical name of the referenced table, when the service reports it
    pub logical_name: Option<String>,

    /// Display name of the referenced record
    pub name: Option<String>,
}

impl EntityReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            logical_name: None,
            name: None,
        }
    }

    pub fn with_logical_name(mut self, logical_name: impl Into<String>) -> Self {
        self.logical_name = Some(logical_name.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Typed value of a single attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Decimal(BigDecimal),
    OptionSet(OptionSetValue),
    EntityReference(EntityReference),
    Absent,
}

impl AttributeValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, AttributeValue::Absent)
    }
}

/// One record retrieved from the service
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entity {
    /// Logical name of the table the record belongs to
    pub logical_name: String,

    /// Primary key, when returned by the service
    pub id: Option<String>,

    attributes: BTreeMap<String, AttributeValue>,
}

impl Entity {
    pub fn new(logical_name: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            id: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Builder-style insert, mainly for constructing records in tests
    pub fn with_attribute(mut self, name: impl Into<String>, value: AttributeValue) -> Self {
        self.set(name, value);
        self
    }

    /// Store a value; storing [`AttributeValue::Absent`] removes the name
    pub fn set(&mut self, name: impl Into<String>, value: AttributeValue) {
        let name = name.into();
        if value.is_absent() {
            self.attributes.remove(&name);
        } else {
            self.attributes.insert(name, value);
        }
    }

    /// Look up an attribute by logical name
    pub fn attribute(&self, name: &str) -> &AttributeValue {
        self.attributes.get(name).unwrap_or(&ABSENT)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Number of present attributes
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Records returned by a single retrieval, in service order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityCollection {
    pub entity_name: String,
    pub entities: Vec<Entity>,

    /// Set when the service reported more records than it returned
    pub more_records: bool,
}

impl EntityCollection {
    pub fn new(entity_name: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self {
            entity_name: entity_name.into(),
            entities,
            more_records: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
