//! Outbound value transfer.
//!
//! The execution environment owns account balances. The registry only asks
//! it to move custodial value to an account and learns whether that worked.
//! A [`Ledger`] implementation may call back into the registry while a
//! transfer is in flight; the registry's guard handles that.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use quill_core::{AccountId, Amount};
use thiserror::Error;

/// Why a transfer did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// The recipient refused the value.
    #[error("recipient {0} rejected the transfer")]
    Rejected(AccountId),

    /// The recipient's balance would overflow.
    #[error("recipient {0} balance overflow")]
    Overflow(AccountId),

    /// Any other environment failure.
    #[error("ledger failure: {0}")]
    Ledger(String),
}

/// A checked "send value to account" primitive.
pub trait Ledger: Send + Sync {
    /// Move `amount` from registry custody to `to`.
    fn transfer(&self, to: &AccountId, amount: Amount) -> Result<(), TransferError>;
}

impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    fn transfer(&self, to: &AccountId, amount: Amount) -> Result<(), TransferError> {
        (**self).transfer(to, amount)
    }
}

/// In-memory ledger that credits accounts.
///
/// Accounts can be marked as rejecting to exercise failure paths.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: RwLock<MemoryLedgerInner>,
}

#[derive(Debug, Default)]
struct MemoryLedgerInner {
    credited: HashMap<AccountId, Amount>,
    rejecting: HashSet<AccountId>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total value credited to `account` so far.
    pub fn credited(&self, account: &AccountId) -> Amount {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.credited.get(account).copied().unwrap_or(0)
    }

    /// Make future transfers to `account` fail.
    pub fn reject(&self, account: AccountId) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.rejecting.insert(account);
    }

    /// Undo [`reject`](Self::reject).
    pub fn accept(&self, account: &AccountId) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.rejecting.remove(account);
    }
}

impl Ledger for MemoryLedger {
    fn transfer(&self, to: &AccountId, amount: Amount) -> Result<(), TransferError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| TransferError::Ledger(format!("lock poisoned: {}", e)))?;

        if inner.rejecting.contains(to) {
            return Err(TransferError::Rejected(*to));
        }

        let entry = inner.credited.entry(*to).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(TransferError::Overflow(*to))?;
        Ok(())
    }
}
