//! # Property Keys
//!
//! A `PropertyKey` is a named accessor for one entity field. Each key has a
//! closed `PropertyKind`, and the kind decides which converters apply:
//!
//! | Kind | Store converter | Input converter |
//! |------|-----------------|-----------------|
//! | String / Integer / Float / Boolean | identity with type check | coercing |
//! | DateTime | `DateTime<Utc>` ↔ epoch millis | RFC 3339 or millis |
//! | StartNode / EndNode | relationship → endpoint entity | none (read-only) |
//!
//! Endpoint properties have no input converter: a relationship's endpoints
//! change only through relationship creation, never through a property write.

pub mod converter;
pub mod endpoint;

use serde::{Deserialize, Serialize};

use crate::model::{Endpoint, Entity, FromValue, SecurityContext, Value};
use crate::storage::Store;
use crate::{Error, Result};

pub use converter::{InputConverter, PropertyConverter, ScalarConverter, StoreConverter};
pub use endpoint::EndpointConverter;

// ============================================================================
// Value and sort types
// ============================================================================

/// Semantic value type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
    Entity,
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueType::String => "String",
            ValueType::Integer => "Integer",
            ValueType::Float => "Float",
            ValueType::Boolean => "Boolean",
            ValueType::DateTime => "DateTime",
            ValueType::Entity => "Entity",
        };
        f.write_str(name)
    }
}

/// Ordering hint for comparators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortType {
    /// Lexical order of the string form.
    String,
    /// Integral order (also used for timestamps).
    Long,
    /// Floating point order.
    Double,
}

// ============================================================================
// Metadata (schema export)
// ============================================================================

/// Metadata every property definition exposes, whether it describes instance
/// data or schema metadata.
pub trait PropertyMetadata {
    fn name(&self) -> &str;

    /// Schema-export tag. `None` for derived properties.
    fn type_name(&self) -> Option<&'static str>;

    fn value_type(&self) -> Option<ValueType>;

    fn sort_type(&self) -> Option<SortType>;

    /// Whether external input may write this property.
    fn is_settable(&self) -> bool {
        true
    }

    fn descriptor(&self) -> PropertyDescriptor {
        PropertyDescriptor {
            name: self.name().to_string(),
            type_name: self.type_name().map(str::to_owned),
            value_type: self.value_type(),
            sort_type: self.sort_type(),
            settable: self.is_settable(),
        }
    }
}

/// Serializable snapshot of `PropertyMetadata`, consumed by schema exporters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_type: Option<SortType>,
    pub settable: bool,
}

// ============================================================================
// PropertyKey
// ============================================================================

/// Closed set of property kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyKind {
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
    /// One end of the relationship that owns the property.
    Endpoint(Endpoint),
}

impl PropertyKind {
    pub fn value_type(self) -> ValueType {
        match self {
            PropertyKind::String => ValueType::String,
            PropertyKind::Integer => ValueType::Integer,
            PropertyKind::Float => ValueType::Float,
            PropertyKind::Boolean => ValueType::Boolean,
            PropertyKind::DateTime => ValueType::DateTime,
            PropertyKind::Endpoint(_) => ValueType::Entity,
        }
    }
}

/// Named, typed accessor for an entity field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    name: String,
    kind: PropertyKind,
}

impl PropertyKey {
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self { name: name.into(), kind }
    }

    pub fn string(name: impl Into<String>) -> Self { Self::new(name, PropertyKind::String) }
    pub fn integer(name: impl Into<String>) -> Self { Self::new(name, PropertyKind::Integer) }
    pub fn float(name: impl Into<String>) -> Self { Self::new(name, PropertyKind::Float) }
    pub fn boolean(name: impl Into<String>) -> Self { Self::new(name, PropertyKind::Boolean) }
    pub fn date_time(name: impl Into<String>) -> Self { Self::new(name, PropertyKind::DateTime) }

    /// Origin of the owning relationship.
    pub fn start_node(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Endpoint(Endpoint::Start))
    }

    /// Target of the owning relationship.
    pub fn end_node(name: impl Into<String>) -> Self {
        Self::new(name, PropertyKind::Endpoint(Endpoint::End))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PropertyKind {
        self.kind
    }

    // ========================================================================
    // Converters
    // ========================================================================

    /// Store-side converter. `entity` is the entity the value belongs to;
    /// endpoint properties need it to find the relationship's endpoints.
    pub fn database_converter<'a, S: Store + ?Sized>(
        &'a self,
        store: &'a S,
        ctx: &'a SecurityContext,
        entity: Option<&'a Entity>,
    ) -> StoreConverter<'a, S> {
        match self.kind {
            PropertyKind::Endpoint(endpoint) => StoreConverter::Endpoint(EndpointConverter::new(
                &self.name, store, ctx, entity, endpoint,
            )),
            kind => StoreConverter::Scalar(ScalarConverter::new(&self.name, kind.value_type())),
        }
    }

    /// Input-side converter, or `None` if the property cannot be set from input.
    pub fn input_converter(&self) -> Option<InputConverter<'_>> {
        match self.kind {
            PropertyKind::Endpoint(_) => None,
            kind => Some(InputConverter::new(&self.name, kind.value_type())),
        }
    }

    /// Coerce a wire value into this property's typed form.
    pub fn from_input(&self, input: &serde_json::Value) -> Result<Value> {
        let converter = self.input_converter().ok_or_else(|| Error::ReadOnlyProperty {
            key: self.name.clone(),
        })?;
        converter.convert(input.clone())
    }

    /// Convert a typed value into the form the store holds.
    pub fn to_store_value(&self, value: Value) -> Result<Value> {
        match self.kind {
            PropertyKind::Endpoint(_) => Err(Error::ReadOnlyProperty { key: self.name.clone() }),
            kind => ScalarConverter::new(&self.name, kind.value_type()).convert(value),
        }
    }

    /// Normalize a legacy or foreign stored value into canonical store form.
    ///
    /// Returns `None` when the property has no stored value of its own.
    /// Values that are already canonical, or that cannot be repaired, pass
    /// through unchanged; the store converter reports the latter.
    pub fn fix_database_property(&self, value: &Value) -> Option<Value> {
        let fixed = match (self.kind, value) {
            (PropertyKind::Endpoint(_), _) => return None,
            (PropertyKind::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::Int),
            (PropertyKind::Integer, Value::Float(f)) if f.fract() == 0.0 => Some(Value::Int(*f as i64)),
            (PropertyKind::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),
            (PropertyKind::Float, Value::String(s)) => s.trim().parse::<f64>().ok().map(Value::Float),
            (PropertyKind::Boolean, Value::String(s)) => s.trim().parse::<bool>().ok().map(Value::Bool),
            (PropertyKind::DateTime, Value::String(s)) => chrono::DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| Value::Int(dt.timestamp_millis())),
            (PropertyKind::DateTime, Value::DateTime(dt)) => Some(Value::Int(dt.timestamp_millis())),
            _ => None,
        };
        Some(fixed.unwrap_or_else(|| value.clone()))
    }

    // ========================================================================
    // Typed access
    // ========================================================================

    /// Read this property from `entity` in typed form.
    pub fn read<S: Store + ?Sized>(
        &self,
        store: &S,
        ctx: &SecurityContext,
        entity: &Entity,
    ) -> Result<Value> {
        let stored = entity
            .get(&self.name)
            .and_then(|v| self.fix_database_property(v))
            .unwrap_or(Value::Null);
        self.database_converter(store, ctx, Some(entity)).revert(stored)
    }

    /// Read this property as a concrete Rust type. Absent values are `None`.
    pub fn read_as<T: FromValue, S: Store + ?Sized>(
        &self,
        store: &S,
        ctx: &SecurityContext,
        entity: &Entity,
    ) -> Result<Option<T>> {
        match self.read(store, ctx, entity)? {
            Value::Null => Ok(None),
            value => T::from_value(&value).map(Some),
        }
    }
}

impl PropertyMetadata for PropertyKey {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> Option<&'static str> {
        match self.kind {
            PropertyKind::String => Some("String"),
            PropertyKind::Integer => Some("Integer"),
            PropertyKind::Float => Some("Double"),
            PropertyKind::Boolean => Some("Boolean"),
            PropertyKind::DateTime => Some("Date"),
            PropertyKind::Endpoint(_) => None,
        }
    }

    fn value_type(&self) -> Option<ValueType> {
        Some(self.kind.value_type())
    }

    fn sort_type(&self) -> Option<SortType> {
        match self.kind {
            PropertyKind::String => Some(SortType::String),
            PropertyKind::Integer | PropertyKind::DateTime => Some(SortType::Long),
            PropertyKind::Float => Some(SortType::Double),
            PropertyKind::Boolean | PropertyKind::Endpoint(_) => None,
        }
    }

    fn is_settable(&self) -> bool {
        self.input_converter().is_some()
    }
}
