use crate::chain::ChainError;
use crate::ledger::{Ledger, Receipt};
use crate::transaction::Transaction;
use authset_core::{Address, AuthorityResult};
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared access to one ledger.
///
/// Submissions take the write lock, so transactions from any number of
/// threads land in a single total order. Reads (the consensus engine asking
/// for the current set) only take the read lock.
#[derive(Debug, Clone, Default)]
pub struct LedgerHandle {
    inner: Arc<RwLock<Ledger>>,
}

impl LedgerHandle {
    pub fn new(ledger: Ledger) -> Self {
        LedgerHandle {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    pub fn submit(&self, tx: &Transaction) -> AuthorityResult<Receipt> {
        self.inner.write().execute(tx)
    }

    pub fn advance_blocks(&self, blocks: u64) -> Result<u64, ChainError> {
        self.inner.write().advance_blocks(blocks)
    }

    /// Binding validator set of the registry at `registry`.
    pub fn validators(&self, registry: &Address) -> Option<Vec<Address>> {
        self.inner
            .read()
            .registry(registry)
            .map(|registry| registry.validators().to_vec())
    }

    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&self.inner.read())
    }
}
