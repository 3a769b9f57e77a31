//! # graph-ogm — Object-to-Graph Mapping Core
//!
//! Maps loosely-typed wire values onto strongly-typed entities stored in a
//! property graph, and resolves references between entities by search or by
//! transactional creation.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `Store` is the contract between the mapping core and storage
//! 2. **Three representations**: wire (`serde_json::Value`) → typed (`Value`) → store form,
//!    bridged by per-property converters
//! 3. **Closed property kinds**: converter dispatch is a `match` over `PropertyKind`
//! 4. **Scoped transactions**: creation runs under a guard that rolls back on every failing exit
//!
//! ## Quick Start
//!
//! ```rust
//! use graph_ogm::{Graph, EntityType, PropertyKey, IdDeserializationStrategy, SecurityContext, Source};
//!
//! # fn example() -> graph_ogm::Result<()> {
//! let graph = Graph::open_memory();
//! let ctx = SecurityContext::superuser();
//! let person = EntityType::new("Person", [PropertyKey::string("name")])?;
//!
//! // Absent input + create-if-not-existing creates a fresh Person.
//! let strategy = IdDeserializationStrategy::new(None, true);
//! let created = graph.resolve(&ctx, &person, &strategy, Source::Absent)?;
//! let created = created.expect("store accepted the type");
//!
//! // A scalar input is treated as an identifier.
//! let strategy = IdDeserializationStrategy::new(None, false);
//! let found = graph.resolve(&ctx, &person, &strategy, Source::from(created.id.as_str()))?;
//! assert_eq!(found.map(|e| e.id), Some(created.id));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Storage Backends
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | Memory | `storage::memory` | In-memory store with staged transactions |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod index;
pub mod property;
pub mod schema;
pub mod search;
pub mod filter;
pub mod resolve;
pub mod storage;
pub mod tx;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Entity, EntityId, Endpoint, Endpoints, Value, PropertyMap,
    SecurityContext, FromValue, TYPE_KEY,
};

// ============================================================================
// Re-exports: Properties and schema
// ============================================================================

pub use property::{
    PropertyKey, PropertyKind, PropertyMetadata, PropertyDescriptor,
    PropertyConverter, ValueType, SortType,
};
pub use schema::{EntityType, SchemaStringProperty};

// ============================================================================
// Re-exports: Search, filter, resolution
// ============================================================================

pub use search::{Search, SearchAttribute, SearchAttributes, SearchKey, ResultSet};
pub use filter::{Filter, EntityComparator, PredicateFilter, PropertyComparator, VisibilityFilter};
pub use resolve::{
    DeserializationStrategy, IdDeserializationStrategy, MatchPolicy, ResolverConfig, Source,
};

// ============================================================================
// Re-exports: Storage and transactions
// ============================================================================

pub use storage::{Store, MemoryStore};
pub use tx::{Transaction, TxGuard, TxMode, TxId, run_in_transaction};

// ============================================================================
// Top-level Graph handle
// ============================================================================

/// The primary entry point. A `Graph` wraps a store and exposes search,
/// transactional creation and reference resolution.
pub struct Graph<S: Store> {
    store: S,
}

impl<S: Store> Graph<S> {
    /// Create a Graph with the given store.
    pub fn with_backend(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying store (for advanced use).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run an AND-combined equality search.
    pub fn search(&self, ctx: &SecurityContext, attrs: &[SearchAttribute]) -> Result<ResultSet> {
        search::execute(&self.store, ctx, attrs)
    }

    /// Create an entity in its own transaction.
    ///
    /// Returns `Ok(None)` if the store declined to create the entity.
    pub fn create_entity(
        &self,
        ctx: &SecurityContext,
        type_name: &str,
        mut props: PropertyMap,
    ) -> Result<Option<Entity>> {
        props.insert(TYPE_KEY.to_string(), Value::from(type_name));
        run_in_transaction(&self.store, ctx, |tx| {
            self.store.create_entity(tx, type_name, props)
        })
    }

    /// Create a relationship in its own transaction.
    pub fn create_relationship(
        &self,
        ctx: &SecurityContext,
        rel_type: &str,
        start: &EntityId,
        end: &EntityId,
        props: PropertyMap,
    ) -> Result<Entity> {
        run_in_transaction(&self.store, ctx, |tx| {
            self.store.create_relationship(tx, rel_type, start, end, props)
        })
    }

    /// Resolve an inbound reference value with the given strategy.
    pub fn resolve<D: DeserializationStrategy>(
        &self,
        ctx: &SecurityContext,
        target: &EntityType,
        strategy: &D,
        source: Source,
    ) -> Result<Option<Entity>> {
        strategy.resolve(&self.store, ctx, target, source)
    }
}

/// In-memory graph for testing and embedding.
impl Graph<MemoryStore> {
    pub fn open_memory() -> Self {
        Self::with_backend(MemoryStore::new())
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{type_name}: no entity found for {value}")]
    EntityNotFound { type_name: String, value: String },

    #[error("{type_name}: {count} entities match {value}, expected exactly one")]
    AmbiguousMatch { type_name: String, value: String, count: usize },

    #[error("Unable to create entity of type {type_name} (property: {property:?})")]
    CreationFailed { type_name: String, property: Option<String> },

    #[error("Cannot convert {value} for property '{key}': expected {expected}")]
    Conversion { key: String, value: String, expected: String },

    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("{type_name} has no property '{key}'")]
    UnknownProperty { type_name: String, key: String },

    #[error("Property '{key}' cannot be set from input")]
    ReadOnlyProperty { key: String },

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Transaction error: {0}")]
    TxError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
