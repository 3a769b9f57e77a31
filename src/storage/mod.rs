//! # Store Trait
//!
//! This is THE contract between the mapping core and any graph store.
//! The core only needs predicate search, entity lookup and transactional
//! creation; everything else stays behind the store.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryStore` | `memory` | In-memory for testing/embedding |
//!
//! Every read takes the caller's [`SecurityContext`]; stores that enforce
//! access control do so here. The core passes it through untouched.

pub mod memory;

use crate::model::*;
use crate::search::{ResultSet, SearchAttribute};
use crate::tx::{Transaction, TxMode};
use crate::Result;

pub use memory::MemoryStore;

// ============================================================================
// Store Trait
// ============================================================================

/// The universal storage contract.
///
/// All calls are synchronous. Reads see committed state only; writes made
/// through a transaction become visible when it commits and are discarded
/// when it rolls back.
pub trait Store: Send + Sync {
    /// The transaction type for this store.
    type Tx: Transaction;

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Begin a new transaction on behalf of `ctx`.
    fn begin_tx(&self, ctx: &SecurityContext, mode: TxMode) -> Result<Self::Tx>;

    /// Commit a transaction, publishing its writes.
    fn commit_tx(&self, tx: Self::Tx) -> Result<()>;

    /// Roll back a transaction, discarding its writes.
    fn rollback_tx(&self, tx: Self::Tx) -> Result<()>;

    // ========================================================================
    // Writes
    // ========================================================================

    /// Create an entity of `type_name` with initial attributes.
    ///
    /// `Ok(None)` means the store declined to create it (for instance an
    /// unknown type); it is not an error at this level.
    fn create_entity(
        &self,
        tx: &mut Self::Tx,
        type_name: &str,
        attrs: PropertyMap,
    ) -> Result<Option<Entity>>;

    /// Create a directed relationship between two existing entities.
    fn create_relationship(
        &self,
        tx: &mut Self::Tx,
        rel_type: &str,
        start: &EntityId,
        end: &EntityId,
        props: PropertyMap,
    ) -> Result<Entity>;

    // ========================================================================
    // Reads
    // ========================================================================

    /// Get an entity by identifier. Returns None if not found.
    fn get_entity(&self, ctx: &SecurityContext, id: &EntityId) -> Result<Option<Entity>>;

    /// Return every entity matching all `attrs` (AND semantics), in the
    /// store's natural order.
    fn search(&self, ctx: &SecurityContext, attrs: &[SearchAttribute]) -> Result<ResultSet>;

    /// Total number of committed entities.
    fn entity_count(&self, ctx: &SecurityContext) -> Result<u64>;
}
