//! # Reference Resolution
//!
//! Turns an inbound reference value into a concrete entity.
//!
//! | Source | Search |
//! |--------|--------|
//! | absent | none; optionally create a new entity in a transaction |
//! | structured (`{"name": "Ada"}`) | one property predicate per entry, AND-combined |
//! | scalar (`"3f2a…"`, `42`) | identifier predicate on its string form |
//!
//! | Matches | Outcome |
//! |---------|---------|
//! | 0 | `Error::EntityNotFound` |
//! | 1 | that entity |
//! | ≥2 | warning and `None`, or `Error::AmbiguousMatch` under `MatchPolicy::Strict` |
//!
//! Searches are not restricted to the target type unless
//! `ResolverConfig::scope_to_target` is set. Without it an identifier of
//! another type resolves to that entity, and structured matches count
//! entities of every type when deciding between one and many.
//!
//! Concurrent resolutions of the same absent reference with creation enabled
//! may each create an entity. Callers that need one entity per identity must
//! serialize those calls themselves.

pub mod config;
pub mod id_strategy;

use serde_json::{Map, Value as Json};

use crate::model::{Entity, SecurityContext};
use crate::schema::EntityType;
use crate::storage::Store;
use crate::Result;

pub use config::{MatchPolicy, ResolverConfig};
pub use id_strategy::IdDeserializationStrategy;

/// An inbound reference value in wire form.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// No value given.
    Absent,
    /// Property name → raw value.
    Structured(Map<String, Json>),
    /// Anything else; its string form is an identifier.
    Scalar(Json),
}

impl Source {
    /// Identifier form of a scalar: strings unquoted, everything else as JSON text.
    pub fn scalar_string(value: &Json) -> String {
        match value {
            Json::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Text used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Source::Absent => "null".to_string(),
            Source::Structured(map) => Json::Object(map.clone()).to_string(),
            Source::Scalar(value) => Self::scalar_string(value),
        }
    }
}

impl From<Json> for Source {
    fn from(value: Json) -> Self {
        match value {
            Json::Null => Source::Absent,
            Json::Object(map) => Source::Structured(map),
            other => Source::Scalar(other),
        }
    }
}

impl From<Option<Json>> for Source {
    fn from(value: Option<Json>) -> Self {
        value.map_or(Source::Absent, Source::from)
    }
}

impl From<&str> for Source {
    fn from(id: &str) -> Self {
        Source::Scalar(Json::String(id.to_owned()))
    }
}

impl From<String> for Source {
    fn from(id: String) -> Self {
        Source::Scalar(Json::String(id))
    }
}

/// Resolve-or-create policy for inbound reference values.
pub trait DeserializationStrategy {
    /// Resolve `source` to an entity of `target`, or to `None` when there is
    /// nothing to set.
    fn resolve<S: Store + ?Sized>(
        &self,
        store: &S,
        ctx: &SecurityContext,
        target: &EntityType,
        source: Source,
    ) -> Result<Option<Entity>>;
}
