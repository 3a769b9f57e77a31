//! Schema-meta string property.
//!
//! Describes a string property of some entity type at the schema level. The
//! description can come from a declarative map (`{"type": "string", ...}`)
//! or from an existing `SchemaProperty` entity, and can be written back to
//! the store as a `SchemaProperty` entity linked to its schema node.

use serde_json::{Map, Value as Json};

use crate::model::{Entity, PropertyMap, Value, TYPE_KEY};
use crate::property::{PropertyKey, PropertyMetadata, SortType, ValueType};
use crate::storage::Store;
use crate::{Error, Result};

/// Entity type of materialized schema properties.
pub const SCHEMA_PROPERTY_TYPE: &str = "SchemaProperty";

/// Relationship from a schema node to each of its schema properties.
pub const HAS_PROPERTY: &str = "HAS_PROPERTY";

const DECLARED_TYPE: &str = "string";
const STORED_TYPE: &str = "String";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaStringProperty {
    parent: String,
    name: String,
    format: Option<String>,
    default_value: Option<String>,
    required: bool,
    unique: bool,
    indexed: bool,
}

impl SchemaStringProperty {
    pub fn new(parent: impl Into<String>, name: impl Into<String>) -> Self {
        Self { parent: parent.into(), name: name.into(), ..Self::default() }
    }

    /// Name of the entity type that declares this property.
    pub fn parent(&self) -> &str { &self.parent }
    pub fn format(&self) -> Option<&str> { self.format.as_deref() }
    pub fn default_value(&self) -> Option<&str> { self.default_value.as_deref() }
    pub fn is_required(&self) -> bool { self.required }
    pub fn is_unique(&self) -> bool { self.unique }
    pub fn is_indexed(&self) -> bool { self.indexed }

    /// Read a declarative description.
    pub fn deserialize_map(&mut self, source: &Map<String, Json>) -> Result<()> {
        if let Some(declared) = source.get("type") {
            if declared.as_str() != Some(DECLARED_TYPE) {
                return Err(Error::SchemaError(format!(
                    "{}.{}: expected type \"{DECLARED_TYPE}\", got {declared}",
                    self.parent, self.name
                )));
            }
        }

        self.format = self.optional_string(source, "format")?;
        self.default_value = self.optional_string(source, "default")?;
        self.required = self.flag(source, "required")?;
        self.unique = self.flag(source, "unique")?;
        self.indexed = self.flag(source, "indexed")?;
        Ok(())
    }

    /// Read an already materialized `SchemaProperty` entity.
    pub fn deserialize_entity(&mut self, property: &Entity) -> Result<()> {
        if property.type_name != SCHEMA_PROPERTY_TYPE {
            return Err(Error::SchemaError(format!(
                "{} is a {}, not a {SCHEMA_PROPERTY_TYPE}",
                property.id, property.type_name
            )));
        }
        if let Some(stored) = property.get("propertyType") {
            if stored.as_str() != Some(STORED_TYPE) {
                return Err(Error::SchemaError(format!(
                    "{}: propertyType {stored} is not {STORED_TYPE}",
                    property.id
                )));
            }
        }

        if let Some(name) = property.get("name").and_then(Value::as_str) {
            self.name = name.to_string();
        }
        self.format = property.get("format").and_then(Value::as_str).map(str::to_owned);
        self.default_value = property.get("defaultValue").and_then(Value::as_str).map(str::to_owned);
        self.required = property.get("notNull").and_then(Value::as_bool).unwrap_or(false);
        self.unique = property.get("unique").and_then(Value::as_bool).unwrap_or(false);
        self.indexed = property.get("indexed").and_then(Value::as_bool).unwrap_or(false);
        Ok(())
    }

    /// Declarative description; `deserialize_map` reads it back.
    pub fn serialize(&self) -> Map<String, Json> {
        let mut map = Map::new();
        map.insert("type".into(), Json::from(DECLARED_TYPE));
        if let Some(format) = &self.format {
            map.insert("format".into(), Json::from(format.as_str()));
        }
        if let Some(default) = &self.default_value {
            map.insert("default".into(), Json::from(default.as_str()));
        }
        for (flag, set) in [("required", self.required), ("unique", self.unique), ("indexed", self.indexed)] {
            if set {
                map.insert(flag.into(), Json::Bool(true));
            }
        }
        map
    }

    /// Materialize this description as a `SchemaProperty` entity attached to
    /// `schema_node`, inside the caller's transaction.
    pub fn create_database_schema<S: Store + ?Sized>(
        &self,
        store: &S,
        tx: &mut S::Tx,
        schema_node: &Entity,
    ) -> Result<Entity> {
        let mut props = PropertyMap::new();
        props.insert(TYPE_KEY.into(), Value::from(SCHEMA_PROPERTY_TYPE));
        props.insert("name".into(), Value::from(self.name.as_str()));
        props.insert("propertyType".into(), Value::from(STORED_TYPE));
        props.insert("notNull".into(), Value::Bool(self.required));
        props.insert("unique".into(), Value::Bool(self.unique));
        props.insert("indexed".into(), Value::Bool(self.indexed));
        if let Some(format) = &self.format {
            props.insert("format".into(), Value::from(format.as_str()));
        }
        if let Some(default) = &self.default_value {
            props.insert("defaultValue".into(), Value::from(default.as_str()));
        }

        let property = store
            .create_entity(tx, SCHEMA_PROPERTY_TYPE, props)?
            .ok_or_else(|| Error::CreationFailed {
                type_name: SCHEMA_PROPERTY_TYPE.into(),
                property: Some(self.name.clone()),
            })?;
        store.create_relationship(tx, HAS_PROPERTY, &schema_node.id, &property.id, PropertyMap::new())?;
        Ok(property)
    }

    /// The instance-level key this description defines.
    pub fn to_property_key(&self) -> PropertyKey {
        PropertyKey::string(self.name.as_str())
    }

    fn optional_string(&self, source: &Map<String, Json>, field: &str) -> Result<Option<String>> {
        match source.get(field) {
            None | Some(Json::Null) => Ok(None),
            Some(Json::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.invalid(field, other)),
        }
    }

    fn flag(&self, source: &Map<String, Json>, field: &str) -> Result<bool> {
        match source.get(field) {
            None | Some(Json::Null) => Ok(false),
            Some(Json::Bool(b)) => Ok(*b),
            Some(other) => Err(self.invalid(field, other)),
        }
    }

    fn invalid(&self, field: &str, value: &Json) -> Error {
        Error::SchemaError(format!("{}.{}: invalid {field} {value}", self.parent, self.name))
    }
}

impl PropertyMetadata for SchemaStringProperty {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> Option<&'static str> {
        Some(DECLARED_TYPE)
    }

    fn value_type(&self) -> Option<ValueType> {
        Some(ValueType::String)
    }

    fn sort_type(&self) -> Option<SortType> {
        Some(SortType::String)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_deserialize_map() {
        let mut prop = SchemaStringProperty::new("Person", "email");
        let source = json!({"type": "string", "format": "email", "unique": true});
        prop.deserialize_map(source.as_object().unwrap()).unwrap();

        assert_eq!(prop.format(), Some("email"));
        assert!(prop.is_unique());
        assert!(!prop.is_required());
        assert_eq!(prop.serialize(), *source.as_object().unwrap());
    }

    #[test]
    fn test_deserialize_map_rejects_other_types() {
        let mut prop = SchemaStringProperty::new("Person", "age");
        let err = prop.deserialize_map(json!({"type": "integer"}).as_object().unwrap()).unwrap_err();
        assert!(matches!(err, Error::SchemaError(_)));

        let err = prop.deserialize_map(json!({"required": "yes"}).as_object().unwrap()).unwrap_err();
        assert!(matches!(err, Error::SchemaError(_)));
    }

    #[test]
    fn test_deserialize_entity() {
        let entity = Entity::new("p1", SCHEMA_PROPERTY_TYPE)
            .with_property("name", "title")
            .with_property("propertyType", "String")
            .with_property("notNull", true)
            .with_property("defaultValue", "untitled");

        let mut prop = SchemaStringProperty::new("Page", "placeholder");
        prop.deserialize_entity(&entity).unwrap();
        assert_eq!(prop.name(), "title");
        assert!(prop.is_required());
        assert_eq!(prop.default_value(), Some("untitled"));
        assert_eq!(prop.to_property_key(), PropertyKey::string("title"));

        let wrong = Entity::new("p2", SCHEMA_PROPERTY_TYPE).with_property("propertyType", "Integer");
        assert!(prop.deserialize_entity(&wrong).is_err());
    }

    #[test]
    fn test_metadata() {
        let prop = SchemaStringProperty::new("Person", "email");
        assert_eq!(prop.type_name(), Some("string"));
        assert_eq!(prop.value_type(), Some(ValueType::String));
        assert_eq!(prop.sort_type(), Some(SortType::String));
        assert!(prop.is_settable());
    }
}
