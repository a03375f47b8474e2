//! Store trait: the abstract interface for registry persistence.
//!
//! This trait allows the registry to be storage-agnostic. Implementations
//! include SQLite (primary) and in-memory (for tests).

use quill_core::{AccountId, Amount, Fingerprint, ItemId, ItemRecord, NameHash};

use crate::error::{Result, StoreError};

/// Allocator and treasury counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    /// The id the next created item receives.
    pub next_id: ItemId,

    /// Lifetime sum of value received, attributed or not.
    pub total_donations: Amount,

    /// Value currently held in custody.
    pub balance: Amount,
}

impl Default for Counters {
    fn default() -> Self {
        Self {
            next_id: ItemId::FIRST,
            total_donations: 0,
            balance: 0,
        }
    }
}

impl Counters {
    /// The highest id handed out so far, if any.
    pub fn last_id(&self) -> Option<ItemId> {
        ItemId::new(self.next_id.get() - 1)
    }

    /// Apply a treasury or allocator mutation. Item mutations are ignored.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<()> {
        match mutation {
            Mutation::SetNextId(next) => {
                self.next_id = *next;
            }
            Mutation::Receive(amount) => {
                let balance = self
                    .balance
                    .checked_add(*amount)
                    .ok_or(StoreError::Overflow("balance"))?;
                let total_donations = self
                    .total_donations
                    .checked_add(*amount)
                    .ok_or(StoreError::Overflow("total_donations"))?;
                self.balance = balance;
                self.total_donations = total_donations;
            }
            Mutation::Debit(amount) => {
                self.balance = self.balance.checked_sub(*amount).ok_or(
                    StoreError::InsufficientBalance {
                        balance: self.balance,
                        requested: *amount,
                    },
                )?;
            }
            Mutation::Refund(amount) => {
                self.balance = self
                    .balance
                    .checked_add(*amount)
                    .ok_or(StoreError::Overflow("balance"))?;
            }
            _ => {}
        }
        Ok(())
    }
}

/// A single change to registry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Create a record. Fails if the id is taken.
    InsertItem { id: ItemId, record: ItemRecord },
    /// Replace an item's content fingerprint.
    SetFingerprint {
        id: ItemId,
        fingerprint: Fingerprint,
    },
    /// Replace an item's attachment reference.
    SetAttachment { id: ItemId, reference: String },
    /// Add an editor (no-op if present).
    AddEditor { id: ItemId, account: AccountId },
    /// Remove an editor (no-op if absent).
    RemoveEditor { id: ItemId, account: AccountId },
    /// Map a name to an item. Fails if the name is taken.
    ClaimName { name_hash: NameHash, id: ItemId },
    /// Record a vote and bump the item's count. Fails on a repeat vote.
    AddVoter { id: ItemId, account: AccountId },
    /// Move the allocator forward.
    SetNextId(ItemId),
    /// Accept value into custody; counts toward total donations.
    Receive(Amount),
    /// Remove value from custody.
    Debit(Amount),
    /// Return previously debited value to custody; not a donation.
    Refund(Amount),
}

impl Mutation {
    /// The item this mutation touches, if any.
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            Mutation::InsertItem { id, .. }
            | Mutation::SetFingerprint { id, .. }
            | Mutation::SetAttachment { id, .. }
            | Mutation::AddEditor { id, .. }
            | Mutation::RemoveEditor { id, .. }
            | Mutation::ClaimName { id, .. }
            | Mutation::AddVoter { id, .. } => Some(*id),
            Mutation::SetNextId(_)
            | Mutation::Receive(_)
            | Mutation::Debit(_)
            | Mutation::Refund(_) => None,
        }
    }
}

/// An ordered set of mutations committed all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    mutations: Vec<Mutation>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mutation.
    pub fn push(&mut self, mutation: Mutation) -> &mut Self {
        self.mutations.push(mutation);
        self
    }

    /// Builder-style append.
    pub fn with(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    /// Iterate mutations in commit order.
    pub fn iter(&self) -> impl Iterator<Item = &Mutation> {
        self.mutations.iter()
    }

    /// Number of mutations.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

impl IntoIterator for WriteBatch {
    type Item = Mutation;
    type IntoIter = std::vec::IntoIter<Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.mutations.into_iter()
    }
}

/// The Store trait: synchronous interface for registry persistence.
///
/// # Design Notes
///
/// - **Reads are point lookups**: the registry never scans.
/// - **Writes are batches**: [`Store::commit`] is the only mutating method
///   and must be atomic.
/// - **Existence**: an item exists iff [`Store::get_item`] returns `Some`.
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Item Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Get an item's record.
    fn get_item(&self, id: ItemId) -> Result<Option<ItemRecord>>;

    /// Check if an item exists.
    fn has_item(&self, id: ItemId) -> Result<bool> {
        Ok(self.get_item(id)?.is_some())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permission Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Check if `account` is an explicit editor of `id`.
    fn is_editor(&self, id: ItemId, account: &AccountId) -> Result<bool>;

    /// List explicit editors of `id`, sorted.
    fn editors(&self, id: ItemId) -> Result<Vec<AccountId>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Engagement Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Check if `account` has upvoted `id`.
    fn has_voted(&self, id: ItemId, account: &AccountId) -> Result<bool>;

    /// Size of the voter set of `id`.
    fn voter_count(&self, id: ItemId) -> Result<u64>;

    // ─────────────────────────────────────────────────────────────────────────
    // Name Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Look up the item a name is bound to.
    fn resolve_name(&self, name_hash: &NameHash) -> Result<Option<ItemId>>;

    // ─────────────────────────────────────────────────────────────────────────
    // Counters and Commit
    // ─────────────────────────────────────────────────────────────────────────

    /// Read the allocator and treasury counters.
    fn counters(&self) -> Result<Counters>;

    /// Apply a batch atomically.
    fn commit(&self, batch: WriteBatch) -> Result<()>;
}
