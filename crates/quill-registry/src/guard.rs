//! Single-entry execution lock for operations that call out.
//!
//! `tip` and `withdraw` hand control to the [`Ledger`](crate::Ledger) while
//! a transfer is in flight. Whatever runs there may call back into the
//! registry. Entering a guarded operation while another one holds the
//! guard fails immediately instead of blocking.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{RegistryError, Result};

/// Non-reentrant flag shared by all guarded operations of one registry.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

impl ReentrancyGuard {
    /// A released guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard, or fail with [`RegistryError::Reentrancy`] if it is held.
    ///
    /// The guard is released when the returned token drops, on every exit
    /// path including early returns and unwinding.
    pub fn enter(&self) -> Result<GuardToken<'_>> {
        self.entered
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| GuardToken { guard: self })
            .map_err(|_| RegistryError::Reentrancy)
    }

    #[cfg(test)]
    fn is_held(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Proof of holding the guard. Releases it on drop.
#[must_use = "the guard is released as soon as the token is dropped"]
#[derive(Debug)]
pub struct GuardToken<'a> {
    guard: &'a ReentrancyGuard,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.entered.store(false, Ordering::Release);
    }
}
