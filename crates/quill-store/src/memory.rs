//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use quill_core::{AccountId, ItemId, ItemRecord, NameHash};

use crate::error::{Result, StoreError};
use crate::traits::{Counters, Mutation, Store, WriteBatch};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Records indexed by id.
    items: BTreeMap<ItemId, ItemRecord>,

    /// Explicit editors per item.
    editors: HashMap<ItemId, BTreeSet<AccountId>>,

    /// Voters per item.
    voters: HashMap<ItemId, HashSet<AccountId>>,

    /// Name registry.
    names: HashMap<NameHash, ItemId>,

    /// Allocator and treasury.
    counters: Counters,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::InvalidData(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::InvalidData(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStoreInner {
    /// Dry-run a batch against current state plus earlier batch entries.
    ///
    /// Returns the counters the batch would leave behind.
    fn check(&self, batch: &WriteBatch) -> Result<Counters> {
        let mut counters = self.counters;
        let mut inserted: HashSet<ItemId> = HashSet::new();
        let mut claimed: HashSet<NameHash> = HashSet::new();
        let mut voted: HashSet<(ItemId, AccountId)> = HashSet::new();

        let exists = |id: &ItemId, inserted: &HashSet<ItemId>| {
            self.items.contains_key(id) || inserted.contains(id)
        };

        for mutation in batch.iter() {
            match mutation {
                Mutation::InsertItem { id, .. } => {
                    if exists(id, &inserted) {
                        return Err(StoreError::Conflict(format!("item {} already exists", id)));
                    }
                    inserted.insert(*id);
                }
                Mutation::ClaimName { name_hash, id } => {
                    if !exists(id, &inserted) {
                        return Err(StoreError::NotFound(id.to_string()));
                    }
                    if self.names.contains_key(name_hash) || !claimed.insert(*name_hash) {
                        return Err(StoreError::Conflict(format!(
                            "name {:?} already claimed",
                            name_hash
                        )));
                    }
                }
                Mutation::AddVoter { id, account } => {
                    if !exists(id, &inserted) {
                        return Err(StoreError::NotFound(id.to_string()));
                    }
                    let already = self
                        .voters
                        .get(id)
                        .is_some_and(|set| set.contains(account));
                    if already || !voted.insert((*id, *account)) {
                        return Err(StoreError::Conflict(format!(
                            "{} already voted on {}",
                            account, id
                        )));
                    }
                }
                Mutation::SetFingerprint { id, .. }
                | Mutation::SetAttachment { id, .. }
                | Mutation::AddEditor { id, .. }
                | Mutation::RemoveEditor { id, .. } => {
                    if !exists(id, &inserted) {
                        return Err(StoreError::NotFound(id.to_string()));
                    }
                }
                Mutation::SetNextId(_)
                | Mutation::Receive(_)
                | Mutation::Debit(_)
                | Mutation::Refund(_) => counters.apply(mutation)?,
            }
        }

        Ok(counters)
    }

    /// Apply a batch that has passed [`check`](Self::check).
    fn apply(&mut self, batch: WriteBatch, counters: Counters) {
        for mutation in batch {
            match mutation {
                Mutation::InsertItem { id, record } => {
                    self.items.insert(id, record);
                }
                Mutation::SetFingerprint { id, fingerprint } => {
                    if let Some(record) = self.items.get_mut(&id) {
                        record.fingerprint = fingerprint;
                    }
                }
                Mutation::SetAttachment { id, reference } => {
                    if let Some(record) = self.items.get_mut(&id) {
                        record.attachment = Some(reference);
                    }
                }
                Mutation::AddEditor { id, account } => {
                    self.editors.entry(id).or_default().insert(account);
                }
                Mutation::RemoveEditor { id, account } => {
                    if let Some(set) = self.editors.get_mut(&id) {
                        set.remove(&account);
                    }
                }
                Mutation::ClaimName { name_hash, id } => {
                    self.names.insert(name_hash, id);
                }
                Mutation::AddVoter { id, account } => {
                    let set = self.voters.entry(id).or_default();
                    set.insert(account);
                    let count = set.len() as u64;
                    if let Some(record) = self.items.get_mut(&id) {
                        record.upvotes = count;
                    }
                }
                Mutation::SetNextId(_)
                | Mutation::Receive(_)
                | Mutation::Debit(_)
                | Mutation::Refund(_) => {}
            }
        }
        self.counters = counters;
    }
}

impl Store for MemoryStore {
    fn get_item(&self, id: ItemId) -> Result<Option<ItemRecord>> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    fn has_item(&self, id: ItemId) -> Result<bool> {
        Ok(self.read()?.items.contains_key(&id))
    }

    fn is_editor(&self, id: ItemId, account: &AccountId) -> Result<bool> {
        Ok(self
            .read()?
            .editors
            .get(&id)
            .is_some_and(|set| set.contains(account)))
    }

    fn editors(&self, id: ItemId) -> Result<Vec<AccountId>> {
        Ok(self
            .read()?
            .editors
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    fn has_voted(&self, id: ItemId, account: &AccountId) -> Result<bool> {
        Ok(self
            .read()?
            .voters
            .get(&id)
            .is_some_and(|set| set.contains(account)))
    }

    fn voter_count(&self, id: ItemId) -> Result<u64> {
        Ok(self
            .read()?
            .voters
            .get(&id)
            .map(|set| set.len() as u64)
            .unwrap_or(0))
    }

    fn resolve_name(&self, name_hash: &NameHash) -> Result<Option<ItemId>> {
        Ok(self.read()?.names.get(name_hash).copied())
    }

    fn counters(&self) -> Result<Counters> {
        Ok(self.read()?.counters)
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut inner = self.write()?;
        let counters = inner.check(&batch)?;
        inner.apply(batch, counters);
        Ok(())
    }
}
