//! Search predicate model.
//!
//! A search is a list of exact-match attributes, implicitly AND-combined.
//! There is no OR and no negation here; richer boolean logic belongs to the
//! store's own query layer.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::model::{Entity, SecurityContext, Value, TYPE_KEY};
use crate::property::PropertyKey;
use crate::storage::Store;
use crate::Result;

/// What a search attribute compares against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchKey {
    /// The entity identifier (reserved, not a stored property).
    Id,
    /// A stored property by name.
    Property(String),
}

/// A single equality predicate over store-form values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchAttribute {
    pub key: SearchKey,
    pub value: Value,
}

impl SearchAttribute {
    pub fn matches(&self, entity: &Entity) -> bool {
        match &self.key {
            SearchKey::Id => self.value.as_str() == Some(entity.id.as_str()),
            SearchKey::Property(name) => entity.get(name) == Some(&self.value),
        }
    }
}

impl std::fmt::Display for SearchAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.key {
            SearchKey::Id => write!(f, "id = {}", self.value),
            SearchKey::Property(name) => write!(f, "{name} = {}", self.value),
        }
    }
}

/// Attribute lists are short; keep them inline.
pub type SearchAttributes = SmallVec<[SearchAttribute; 4]>;

/// Constructors for search attributes.
pub struct Search;

impl Search {
    /// Match the entity whose identifier equals `id`.
    pub fn exact_uuid(id: impl Into<String>) -> SearchAttribute {
        SearchAttribute { key: SearchKey::Id, value: Value::String(id.into()) }
    }

    /// Match entities whose `key` equals the typed `value`.
    ///
    /// The value is converted to its store form first, so the comparison
    /// happens in the same representation the store holds.
    pub fn exact_property(key: &PropertyKey, value: Value) -> Result<SearchAttribute> {
        Ok(SearchAttribute {
            key: SearchKey::Property(key.name().to_string()),
            value: key.to_store_value(value)?,
        })
    }

    /// Match entities of the given type.
    pub fn exact_type(type_name: &str) -> SearchAttribute {
        SearchAttribute {
            key: SearchKey::Property(TYPE_KEY.to_string()),
            value: Value::from(type_name),
        }
    }
}

/// Execute an AND-combined attribute list against `store`.
pub fn execute<S: Store + ?Sized>(
    store: &S,
    ctx: &SecurityContext,
    attrs: &[SearchAttribute],
) -> Result<ResultSet> {
    let results = store.search(ctx, attrs)?;
    debug!(predicates = attrs.len(), matches = results.len(), "search executed");
    Ok(results)
}

// ============================================================================
// ResultSet
// ============================================================================

/// Ordered, sized sequence of entities returned by a search.
///
/// No ordering is imposed beyond what the store returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    entities: Vec<Entity>,
}

impl ResultSet {
    pub fn new(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Entity> {
        self.entities.get(i)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    pub fn as_slice(&self) -> &[Entity] {
        &self.entities
    }

    pub fn into_vec(self) -> Vec<Entity> {
        self.entities
    }
}

impl From<Vec<Entity>> for ResultSet {
    fn from(entities: Vec<Entity>) -> Self {
        Self { entities }
    }
}

impl FromIterator<Entity> for ResultSet {
    fn from_iter<I: IntoIterator<Item = Entity>>(iter: I) -> Self {
        Self { entities: iter.into_iter().collect() }
    }
}

impl IntoIterator for ResultSet {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityId, PropertyMap};
    use crate::storage::MemoryStore;
    use crate::tx::run_in_transaction;
    use crate::Error;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn seed(store: &MemoryStore, rows: &[(&str, i64)]) -> Vec<EntityId> {
        let ctx = SecurityContext::superuser();
        run_in_transaction(store, &ctx, |tx| {
            let mut ids = Vec::new();
            for (name, age) in rows {
                let mut props = PropertyMap::new();
                props.insert(TYPE_KEY.into(), Value::from("Person"));
                props.insert("name".into(), Value::from(*name));
                props.insert("age".into(), Value::from(*age));
                if let Some(e) = store.create_entity(tx, "Person", props)? {
                    ids.push(e.id);
                }
            }
            Ok(ids)
        })
        .unwrap()
    }

    #[test]
    fn test_exact_uuid() {
        let store = MemoryStore::new();
        let ids = seed(&store, &[("Ada", 36), ("Bob", 40)]);
        let ctx = SecurityContext::anonymous();

        let found = execute(&store, &ctx, &[Search::exact_uuid(ids[1].as_str())]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found.get(0).map(|e| &e.id), Some(&ids[1]));

        let missing = execute(&store, &ctx, &[Search::exact_uuid("nope")]).unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_attributes_are_and_combined() {
        let store = MemoryStore::new();
        seed(&store, &[("Ada", 36), ("Ada", 40), ("Bob", 36)]);
        let ctx = SecurityContext::anonymous();
        let name = PropertyKey::string("name");
        let age = PropertyKey::integer("age");

        let attrs: SearchAttributes = [
            Search::exact_property(&name, Value::from("Ada")).unwrap(),
            Search::exact_property(&age, Value::from(36)).unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(execute(&store, &ctx, &attrs).unwrap().len(), 1);

        let only_name = [Search::exact_property(&name, Value::from("Ada")).unwrap()];
        assert_eq!(execute(&store, &ctx, &only_name).unwrap().len(), 2);

        // Empty predicate list matches everything
        assert_eq!(execute(&store, &ctx, &[]).unwrap().len(), 3);
    }

    #[test]
    fn test_exact_property_uses_store_form() {
        let born = PropertyKey::date_time("born");
        let dt = Utc.with_ymd_and_hms(1815, 12, 10, 0, 0, 0).unwrap();
        let attr = Search::exact_property(&born, Value::DateTime(dt)).unwrap();
        assert_eq!(attr.value, Value::Int(dt.timestamp_millis()));
    }

    #[test]
    fn test_exact_property_rejects_type_mismatch() {
        let age = PropertyKey::integer("age");
        let err = Search::exact_property(&age, Value::from("old")).unwrap_err();
        assert!(matches!(err, Error::Conversion { ref key, .. } if key == "age"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Search::exact_uuid("abc").to_string(), "id = \"abc\"");
        assert_eq!(Search::exact_type("Person").to_string(), "type = \"Person\"");
    }
}
