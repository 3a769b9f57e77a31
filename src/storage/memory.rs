//! In-memory store.
//!
//! This is the reference implementation of `Store`.
//! Committed entities live in a single `RwLock`-protected table; each
//! transaction stages its writes privately and publishes them in one step
//! on commit.
//!
//! ## Limitations
//!
//! - **No access control**: the `SecurityContext` is accepted and ignored.
//! - **No property indexes**: every search is a full scan in insertion order.
//! - **No isolation beyond read-committed**: two transactions may each create
//!   an entity with the same attributes; nothing deduplicates them.
//!
//! Use this store for:
//! - Testing property conversion, search and resolution
//! - Embedding the mapping core in applications that don't need persistence

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use tracing::trace;

use crate::index::SortedSet;
use crate::model::*;
use crate::search::{ResultSet, SearchAttribute};
use crate::tx::{Transaction, TxId, TxMode};
use crate::{Error, Result};
use super::Store;

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory property graph storage.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    committed: RwLock<Table>,
    /// When set, `create_entity` declines types outside this set.
    creatable_types: Option<SortedSet<String>>,
    next_tx_id: AtomicU64,
}

#[derive(Default)]
struct Table {
    /// Insertion order is the natural search order.
    entities: Vec<Entity>,
    by_id: HashMap<EntityId, usize>,
}

impl Table {
    fn get(&self, id: &EntityId) -> Option<&Entity> {
        self.by_id.get(id).and_then(|&pos| self.entities.get(pos))
    }

    fn insert(&mut self, entity: Entity) {
        self.by_id.insert(entity.id.clone(), self.entities.len());
        self.entities.push(entity);
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A store that only creates entities of the listed types.
    pub fn with_creatable_types<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::build(Some(types.into_iter().map(Into::into).collect()))
    }

    fn build(creatable_types: Option<SortedSet<String>>) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                committed: RwLock::new(Table::default()),
                creatable_types,
                next_tx_id: AtomicU64::new(1),
            }),
        }
    }

    fn accepts_type(&self, type_name: &str) -> bool {
        self.inner
            .creatable_types
            .as_ref()
            .map_or(true, |types| types.contains_by(type_name))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MemoryTx
// ============================================================================

/// In-memory transaction: writes are staged here until commit.
pub struct MemoryTx {
    id: TxId,
    mode: TxMode,
    pending: Vec<Entity>,
}

impl MemoryTx {
    fn ensure_writable(&self) -> Result<()> {
        match self.mode {
            TxMode::ReadWrite => Ok(()),
            TxMode::ReadOnly => Err(Error::TxError(format!("{} is read-only", self.id))),
        }
    }

    fn pending(&self, id: &EntityId) -> Option<&Entity> {
        self.pending.iter().find(|e| &e.id == id)
    }
}

impl Transaction for MemoryTx {
    fn mode(&self) -> TxMode { self.mode }
    fn id(&self) -> TxId { self.id }
}

// ============================================================================
// Store impl
// ============================================================================

impl Store for MemoryStore {
    type Tx = MemoryTx;

    fn begin_tx(&self, _ctx: &SecurityContext, mode: TxMode) -> Result<MemoryTx> {
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed));
        Ok(MemoryTx { id, mode, pending: Vec::new() })
    }

    fn commit_tx(&self, tx: MemoryTx) -> Result<()> {
        if tx.pending.is_empty() {
            return Ok(());
        }
        let mut table = self.inner.committed.write();
        trace!(tx = %tx.id, writes = tx.pending.len(), "publishing staged writes");
        for entity in tx.pending {
            table.insert(entity);
        }
        Ok(())
    }

    fn rollback_tx(&self, tx: MemoryTx) -> Result<()> {
        trace!(tx = %tx.id, discarded = tx.pending.len(), "discarding staged writes");
        Ok(())
    }

    // ========================================================================
    // Writes
    // ========================================================================

    fn create_entity(
        &self,
        tx: &mut MemoryTx,
        type_name: &str,
        attrs: PropertyMap,
    ) -> Result<Option<Entity>> {
        tx.ensure_writable()?;
        if !self.accepts_type(type_name) {
            return Ok(None);
        }

        let entity = Entity {
            id: EntityId::generate(),
            type_name: type_name.to_string(),
            properties: attrs,
            endpoints: None,
        };
        tx.pending.push(entity.clone());
        Ok(Some(entity))
    }

    fn create_relationship(
        &self,
        tx: &mut MemoryTx,
        rel_type: &str,
        start: &EntityId,
        end: &EntityId,
        props: PropertyMap,
    ) -> Result<Entity> {
        tx.ensure_writable()?;

        // Both endpoints must exist, committed or staged in this transaction
        {
            let table = self.inner.committed.read();
            let exists = |id: &EntityId| table.get(id).is_some() || tx.pending(id).is_some();
            if !exists(start) {
                return Err(Error::NotFound(format!("Start entity {start}")));
            }
            if !exists(end) {
                return Err(Error::NotFound(format!("End entity {end}")));
            }
        }

        let mut properties = props;
        properties.insert(TYPE_KEY.to_string(), Value::from(rel_type));
        let rel = Entity {
            id: EntityId::generate(),
            type_name: rel_type.to_string(),
            properties,
            endpoints: Some(Endpoints { start: start.clone(), end: end.clone() }),
        };
        tx.pending.push(rel.clone());
        Ok(rel)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    fn get_entity(&self, _ctx: &SecurityContext, id: &EntityId) -> Result<Option<Entity>> {
        Ok(self.inner.committed.read().get(id).cloned())
    }

    fn search(&self, _ctx: &SecurityContext, attrs: &[SearchAttribute]) -> Result<ResultSet> {
        // Brute force scan (no property indexes)
        let table = self.inner.committed.read();
        Ok(table
            .entities
            .iter()
            .filter(|e| attrs.iter().all(|attr| attr.matches(e)))
            .cloned()
            .collect())
    }

    fn entity_count(&self, _ctx: &SecurityContext) -> Result<u64> {
        Ok(self.inner.committed.read().entities.len() as u64)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::Search;
    use pretty_assertions::assert_eq;

    fn ctx() -> SecurityContext {
        SecurityContext::superuser()
    }

    fn create(db: &MemoryStore, type_name: &str, props: PropertyMap) -> Option<Entity> {
        let mut tx = db.begin_tx(&ctx(), TxMode::ReadWrite).unwrap();
        let entity = db.create_entity(&mut tx, type_name, props).unwrap();
        db.commit_tx(tx).unwrap();
        entity
    }

    #[test]
    fn test_create_and_get_entity() {
        let db = MemoryStore::new();
        let mut props = PropertyMap::new();
        props.insert("name".into(), Value::from("Ada"));

        let created = create(&db, "Person", props).unwrap();
        let fetched = db.get_entity(&ctx(), &created.id).unwrap().unwrap();

        assert_eq!(fetched.type_name, "Person");
        assert_eq!(fetched.get("name"), Some(&Value::from("Ada")));
        assert_eq!(created.id.as_str().len(), 32);
    }

    #[test]
    fn test_staged_writes_invisible_until_commit() {
        let db = MemoryStore::new();
        let mut tx = db.begin_tx(&ctx(), TxMode::ReadWrite).unwrap();
        let created = db.create_entity(&mut tx, "Person", PropertyMap::new()).unwrap().unwrap();

        assert!(db.get_entity(&ctx(), &created.id).unwrap().is_none());
        assert_eq!(db.entity_count(&ctx()).unwrap(), 0);

        db.commit_tx(tx).unwrap();
        assert!(db.get_entity(&ctx(), &created.id).unwrap().is_some());
    }

    #[test]
    fn test_rollback_discards_writes() {
        let db = MemoryStore::new();
        let mut tx = db.begin_tx(&ctx(), TxMode::ReadWrite).unwrap();
        db.create_entity(&mut tx, "Person", PropertyMap::new()).unwrap();
        db.rollback_tx(tx).unwrap();
        assert_eq!(db.entity_count(&ctx()).unwrap(), 0);
    }

    #[test]
    fn test_creatable_types_decline_others() {
        let db = MemoryStore::with_creatable_types(["Person", "Folder"]);
        assert!(create(&db, "Person", PropertyMap::new()).is_some());
        assert!(create(&db, "Widget", PropertyMap::new()).is_none());
        assert_eq!(db.entity_count(&ctx()).unwrap(), 1);
    }

    #[test]
    fn test_relationship_endpoints_may_be_staged() {
        let db = MemoryStore::new();
        let mut tx = db.begin_tx(&ctx(), TxMode::ReadWrite).unwrap();
        let a = db.create_entity(&mut tx, "Folder", PropertyMap::new()).unwrap().unwrap();
        let b = db.create_entity(&mut tx, "File", PropertyMap::new()).unwrap().unwrap();
        let rel = db.create_relationship(&mut tx, "CONTAINS", &a.id, &b.id, PropertyMap::new()).unwrap();
        db.commit_tx(tx).unwrap();

        let rel = db.get_entity(&ctx(), &rel.id).unwrap().unwrap();
        assert_eq!(rel.endpoints, Some(Endpoints { start: a.id, end: b.id }));
        assert_eq!(rel.get(TYPE_KEY), Some(&Value::from("CONTAINS")));
    }

    #[test]
    fn test_relationship_requires_endpoints() {
        let db = MemoryStore::new();
        let a = create(&db, "Folder", PropertyMap::new()).unwrap();
        let mut tx = db.begin_tx(&ctx(), TxMode::ReadWrite).unwrap();
        let missing = EntityId::from("does-not-exist");
        let result = db.create_relationship(&mut tx, "CONTAINS", &a.id, &missing, PropertyMap::new());
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_search_preserves_insertion_order() {
        let db = MemoryStore::new();
        let mut ids = Vec::new();
        for name in ["c", "a", "b"] {
            let mut props = PropertyMap::new();
            props.insert(TYPE_KEY.into(), Value::from("Tag"));
            props.insert("name".into(), Value::from(name));
            ids.push(create(&db, "Tag", props).unwrap().id);
        }

        let found = db.search(&ctx(), &[Search::exact_type("Tag")]).unwrap();
        let found: Vec<EntityId> = found.iter().map(|e| e.id.clone()).collect();
        assert_eq!(found, ids);
    }
}
