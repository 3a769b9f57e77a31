//! Transaction management.
//!
//! Writes always go through a [`TxGuard`]: the guard commits only when asked
//! to and rolls back when dropped, so an early `?` return or a panic inside
//! the transactional operation never leaves a half-applied write behind.

use serde::{Deserialize, Serialize};
use tracing::{error, trace};

use crate::model::SecurityContext;
use crate::storage::Store;
use crate::Result;

/// Transaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// Opaque transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub u64);

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

/// Transaction trait that all stores must implement.
pub trait Transaction: Send {
    fn mode(&self) -> TxMode;
    fn id(&self) -> TxId;
}

/// Scoped transaction: rollback on drop unless committed.
pub struct TxGuard<'s, S: Store + ?Sized> {
    store: &'s S,
    tx: Option<S::Tx>,
}

impl<'s, S: Store + ?Sized> TxGuard<'s, S> {
    pub fn begin(store: &'s S, ctx: &SecurityContext, mode: TxMode) -> Result<Self> {
        let tx = store.begin_tx(ctx, mode)?;
        trace!(tx = %tx.id(), ?mode, "transaction started");
        Ok(Self { store, tx: Some(tx) })
    }

    /// The open transaction. Only `None` after `commit`/`rollback`, which consume the guard.
    pub fn tx_mut(&mut self) -> &mut S::Tx {
        match self.tx.as_mut() {
            Some(tx) => tx,
            None => unreachable!("transaction taken before the guard was consumed"),
        }
    }

    pub fn commit(mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => {
                let id = tx.id();
                self.store.commit_tx(tx)?;
                trace!(tx = %id, "transaction committed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn rollback(mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => self.store.rollback_tx(tx),
            None => Ok(()),
        }
    }
}

impl<S: Store + ?Sized> Drop for TxGuard<'_, S> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let id = tx.id();
            match self.store.rollback_tx(tx) {
                Ok(()) => trace!(tx = %id, "transaction rolled back"),
                Err(e) => error!(tx = %id, error = %e, "rollback failed"),
            }
        }
    }
}

/// Run `op` inside a read-write transaction.
///
/// Commits when `op` succeeds. When `op` fails the transaction is rolled back
/// and the error is returned unchanged.
pub fn run_in_transaction<S, T, F>(store: &S, ctx: &SecurityContext, op: F) -> Result<T>
where
    S: Store + ?Sized,
    F: FnOnce(&mut S::Tx) -> Result<T>,
{
    let mut guard = TxGuard::begin(store, ctx, TxMode::ReadWrite)?;
    let value = op(guard.tx_mut())?;
    guard.commit()?;
    Ok(value)
}
