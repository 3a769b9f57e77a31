//! Entity — a store-owned handle with identifier, type and properties.

use serde::{Deserialize, Serialize};
use super::{PropertyMap, Value};

/// Reserved property holding an entity's type name.
pub const TYPE_KEY: &str = "type";

/// Opaque entity identifier (32 lowercase hex digits for generated ids).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(v: &str) -> Self { Self(v.to_owned()) }
}

impl From<String> for EntityId {
    fn from(v: String) -> Self { Self(v) }
}

/// Which end of a directed relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endpoint {
    Start,
    End,
}

/// Endpoints of a relationship entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoints {
    pub start: EntityId,
    pub end: EntityId,
}

impl Endpoints {
    pub fn get(&self, endpoint: Endpoint) -> &EntityId {
        match endpoint {
            Endpoint::Start => &self.start,
            Endpoint::End => &self.end,
        }
    }
}

/// An entity in the graph. Relationship entities carry their endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub type_name: String,
    pub properties: PropertyMap,
    pub endpoints: Option<Endpoints>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, type_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_name: type_name.into(),
            properties: PropertyMap::new(),
            endpoints: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_endpoints(mut self, start: EntityId, end: EntityId) -> Self {
        self.endpoints = Some(Endpoints { start, end });
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}
