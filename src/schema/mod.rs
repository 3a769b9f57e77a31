//! Schema layer.
//!
//! `EntityType` is the permitted property set of one entity type and turns
//! structured wire input into typed values. `SchemaStringProperty` lives one
//! level up: it describes a property declaratively and can materialize that
//! description as schema entities in the store.

pub mod string_property;

use crate::index::SortedSet;
use crate::model::Value;
use crate::property::PropertyKey;
use crate::{Error, Result};

pub use string_property::{SchemaStringProperty, HAS_PROPERTY, SCHEMA_PROPERTY_TYPE};

/// An entity type and the property keys it declares.
#[derive(Debug, Clone)]
pub struct EntityType {
    name: String,
    /// Sorted by name; position `i` matches `names[i]`.
    keys: Vec<PropertyKey>,
    names: SortedSet<String>,
}

impl EntityType {
    /// Build a type from its keys. Property names must be unique.
    pub fn new(name: impl Into<String>, keys: impl IntoIterator<Item = PropertyKey>) -> Result<Self> {
        let name = name.into();
        let mut keys: Vec<PropertyKey> = keys.into_iter().collect();
        keys.sort_by(|a, b| a.name().cmp(b.name()));

        if let Some(pair) = keys.windows(2).find(|w| w[0].name() == w[1].name()) {
            return Err(Error::SchemaError(format!(
                "{name} declares property '{}' more than once",
                pair[0].name()
            )));
        }

        let names = SortedSet::new(keys.iter().map(|k| k.name().to_string()).collect());
        Ok(Self { name, keys, names })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self, name: &str) -> Option<&PropertyKey> {
        self.names.index_of_by(name).and_then(|i| self.keys.get(i))
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.names.contains_by(name)
    }

    /// Declared keys in name order.
    pub fn keys(&self) -> &[PropertyKey] {
        &self.keys
    }

    /// Convert a structured wire form into typed values, key by key.
    ///
    /// Fails on the first key the type does not declare, the first key that
    /// cannot be set from input, or the first value that does not convert.
    pub fn convert_input(
        &self,
        input: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<(&PropertyKey, Value)>> {
        input
            .iter()
            .map(|(name, raw)| {
                let key = self.key(name).ok_or_else(|| Error::UnknownProperty {
                    type_name: self.name.clone(),
                    key: name.clone(),
                })?;
                Ok((key, key.from_input(raw)?))
            })
            .collect()
    }
}
