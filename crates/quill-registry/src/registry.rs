//! The Registry: the permissioned mutation engine.
//!
//! The Registry brings together a store, a ledger for outbound value and a
//! notification sink. Every mutating operation follows the same shape:
//!
//! 1. Take the execution lock
//! 2. Read and validate against current state
//! 3. Build one [`WriteBatch`] and commit it atomically
//! 4. Publish notifications
//!
//! A failure at any step before the commit leaves no trace.

use std::sync::{Mutex, MutexGuard, PoisonError};

use quill_core::{
    normalize_name, validate_batch, validate_content, validate_name, validate_reference,
    AccountId, Amount, Event, EventEnvelope, Fingerprint, ItemId, ItemRecord, ItemView, NameHash,
    MAX_SIZE,
};
use quill_perms::{authorize, Action, Roles};
use quill_store::{Counters, Mutation, Store, WriteBatch};

use crate::config::RegistryConfig;
use crate::context::CallContext;
use crate::error::{RegistryError, Result};
use crate::guard::{GuardToken, ReentrancyGuard};
use crate::ledger::Ledger;
use crate::sink::EventSink;

/// The main Registry struct.
///
/// All operations take `&self`; share a registry across threads with `Arc`.
/// Mutations are serialized by an internal lock that is never held across
/// an outbound transfer, so a [`Ledger`] may call back into the registry.
/// Such nested calls succeed for unguarded operations and fail with
/// [`RegistryError::Reentrancy`] for `tip` and `withdraw`.
pub struct Registry<S: Store, L: Ledger, E: EventSink> {
    /// The storage backend.
    store: S,
    /// Outbound value transfer.
    ledger: L,
    /// Notification sink.
    sink: E,
    /// Configuration.
    config: RegistryConfig,
    /// Serializes read-validate-commit-publish.
    exec: Mutex<()>,
    /// Single-entry lock for operations that call out.
    guard: ReentrancyGuard,
}

impl<S: Store, L: Ledger, E: EventSink> Registry<S, L, E> {
    /// Create a new registry instance.
    pub fn new(store: S, ledger: L, sink: E, config: RegistryConfig) -> Self {
        Self {
            store,
            ledger,
            sink,
            config,
            exec: Mutex::new(()),
            guard: ReentrancyGuard::new(),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the ledger reference.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Get the sink reference.
    pub fn sink(&self) -> &E {
        &self.sink
    }

    /// Get the construction-time configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The account allowed to withdraw.
    pub fn beneficiary(&self) -> AccountId {
        self.config.beneficiary
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Creation
    // ─────────────────────────────────────────────────────────────────────────

    /// Publish a standalone item. The caller becomes owner and author.
    ///
    /// Attached value becomes the item's donation and enters the treasury.
    /// Only the content is bounded; the title goes to the log as given.
    /// Returns the new item's id.
    pub fn write(&self, ctx: &CallContext, title: &str, content: &str) -> Result<ItemId> {
        let _exec = self.lock();

        validate_content(content, MAX_SIZE)?;

        let counters = self.store.counters()?;
        let id = counters.next_id;
        let fingerprint = Fingerprint::of(content.as_bytes());
        let record = ItemRecord::new(ctx.caller, ctx.caller, ctx.timestamp, ctx.value, fingerprint);

        let mut batch = WriteBatch::new();
        batch
            .push(Mutation::InsertItem { id, record })
            .push(Mutation::SetNextId(successor(id)?));
        receive_into(&mut batch, ctx.value);
        self.store.commit(batch)?;

        tracing::debug!(%id, caller = %ctx.caller, donation = ctx.value, "item written");

        self.emit(
            ctx,
            Event::Created {
                id,
                owner: ctx.caller,
                author: ctx.caller,
                title: title.to_owned(),
                content: content.to_owned(),
                fingerprint,
                donation: ctx.value,
            },
        );

        Ok(id)
    }

    /// Publish a reply under `parent`.
    ///
    /// The reply belongs to the parent's owner; the caller is its author.
    /// Replies carry no title.
    pub fn reply(&self, ctx: &CallContext, parent: ItemId, content: &str) -> Result<ItemId> {
        let _exec = self.lock();

        validate_content(content, MAX_SIZE)?;
        let owner = self.load(parent)?.owner;

        let counters = self.store.counters()?;
        let id = counters.next_id;
        let fingerprint = Fingerprint::of(content.as_bytes());
        let record = ItemRecord::new(owner, ctx.caller, ctx.timestamp, ctx.value, fingerprint);

        let mut batch = WriteBatch::new();
        batch
            .push(Mutation::InsertItem { id, record })
            .push(Mutation::SetNextId(successor(id)?));
        receive_into(&mut batch, ctx.value);
        self.store.commit(batch)?;

        tracing::debug!(%id, %parent, caller = %ctx.caller, "reply written");

        self.emit(
            ctx,
            Event::Created {
                id,
                owner,
                author: ctx.caller,
                title: String::new(),
                content: content.to_owned(),
                fingerprint,
                donation: ctx.value,
            },
        );
        self.emit(
            ctx,
            Event::Replied {
                id,
                parent,
                author: ctx.caller,
            },
        );

        Ok(id)
    }

    /// Publish several items in one call.
    ///
    /// Every pair is validated before anything is created. Each item gets
    /// `value / count` as its donation; the whole attached value enters the
    /// treasury, so the division remainder stays pooled. Returns the new ids
    /// in input order.
    pub fn write_many<T, C>(
        &self,
        ctx: &CallContext,
        titles: &[T],
        contents: &[C],
    ) -> Result<Vec<ItemId>>
    where
        T: AsRef<str>,
        C: AsRef<str>,
    {
        let _exec = self.lock();

        validate_batch(titles, contents, MAX_SIZE)?;

        let count = contents.len();
        let share = ctx.value / count as Amount;
        let first = self.store.counters()?.next_id;

        let mut batch = WriteBatch::new();
        let mut ids = Vec::with_capacity(count);
        let mut events = Vec::with_capacity(count + 1);
        let mut next = first;

        for (title, content) in titles.iter().zip(contents) {
            let (title, content) = (title.as_ref(), content.as_ref());
            let id = next;
            let fingerprint = Fingerprint::of(content.as_bytes());
            let record = ItemRecord::new(ctx.caller, ctx.caller, ctx.timestamp, share, fingerprint);

            batch.push(Mutation::InsertItem { id, record });
            events.push(Event::Created {
                id,
                owner: ctx.caller,
                author: ctx.caller,
                title: title.to_owned(),
                content: content.to_owned(),
                fingerprint,
                donation: share,
            });
            ids.push(id);
            next = successor(id)?;
        }

        batch.push(Mutation::SetNextId(next));
        receive_into(&mut batch, ctx.value);
        self.store.commit(batch)?;

        tracing::debug!(first = %first, count, caller = %ctx.caller, "batch written");

        events.push(Event::BatchCreated {
            first_id: first,
            count: count as u64,
        });
        for event in events {
            self.emit(ctx, event);
        }

        Ok(ids)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Permissions and Content
    // ─────────────────────────────────────────────────────────────────────────

    /// Grant `account` edit rights on `id`. Owner only.
    ///
    /// Adding an existing editor, or the owner, succeeds without change and
    /// still notifies.
    pub fn add_editor(&self, ctx: &CallContext, id: ItemId, account: AccountId) -> Result<()> {
        let _exec = self.lock();

        let record = self.load(id)?;
        let roles = Roles::resolve(&record, &ctx.caller, false);
        authorize(Action::ManageEditors, &roles, &ctx.caller)?;

        // The owner is implicitly authorized and never stored as an editor.
        if account != record.owner {
            self.store
                .commit(WriteBatch::new().with(Mutation::AddEditor { id, account }))?;
        }

        tracing::debug!(%id, editor = %account, "editor added");
        self.emit(ctx, Event::EditorAdded { id, editor: account });
        Ok(())
    }

    /// Revoke `account`'s edit rights on `id`. Owner only. Idempotent.
    pub fn remove_editor(&self, ctx: &CallContext, id: ItemId, account: AccountId) -> Result<()> {
        let _exec = self.lock();

        let record = self.load(id)?;
        let roles = Roles::resolve(&record, &ctx.caller, false);
        authorize(Action::ManageEditors, &roles, &ctx.caller)?;

        self.store
            .commit(WriteBatch::new().with(Mutation::RemoveEditor { id, account }))?;

        tracing::debug!(%id, editor = %account, "editor removed");
        self.emit(ctx, Event::EditorRemoved { id, editor: account });
        Ok(())
    }

    /// Replace the content of `id`. Owner or editor.
    ///
    /// Only the fingerprint changes in the store; the full content goes to
    /// the log. Returns the new fingerprint.
    pub fn edit(&self, ctx: &CallContext, id: ItemId, content: &str) -> Result<Fingerprint> {
        let _exec = self.lock();

        validate_content(content, MAX_SIZE)?;
        let record = self.load(id)?;
        let roles = self.roles(id, &record, &ctx.caller)?;
        authorize(Action::Edit, &roles, &ctx.caller)?;

        let fingerprint = Fingerprint::of(content.as_bytes());
        self.store
            .commit(WriteBatch::new().with(Mutation::SetFingerprint { id, fingerprint }))?;

        tracing::debug!(%id, caller = %ctx.caller, %fingerprint, "item edited");
        self.emit(
            ctx,
            Event::Edited {
                id,
                editor: ctx.caller,
                content: content.to_owned(),
                fingerprint,
            },
        );
        Ok(fingerprint)
    }

    /// Set the attachment reference of `id`. Owner, author, or editor.
    pub fn attach(&self, ctx: &CallContext, id: ItemId, reference: &str) -> Result<()> {
        let _exec = self.lock();

        validate_reference(reference)?;
        let record = self.load(id)?;
        let roles = self.roles(id, &record, &ctx.caller)?;
        authorize(Action::Attach, &roles, &ctx.caller)?;

        self.store.commit(WriteBatch::new().with(Mutation::SetAttachment {
            id,
            reference: reference.to_owned(),
        }))?;

        tracing::debug!(%id, caller = %ctx.caller, "attachment set");
        self.emit(
            ctx,
            Event::Attached {
                id,
                reference: reference.to_owned(),
            },
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Names
    // ─────────────────────────────────────────────────────────────────────────

    /// Bind a vanity name to `id`. Owner only; first claim wins forever.
    pub fn claim_name(&self, ctx: &CallContext, id: ItemId, name: &str) -> Result<NameHash> {
        let _exec = self.lock();

        validate_name(name)?;
        let record = self.load(id)?;
        let roles = Roles::resolve(&record, &ctx.caller, false);
        authorize(Action::ClaimName, &roles, &ctx.caller)?;

        let name_hash = NameHash::derive(name);
        if let Some(existing) = self.store.resolve_name(&name_hash)? {
            return Err(RegistryError::NameTaken {
                name: normalize_name(name),
                existing,
            });
        }

        self.store
            .commit(WriteBatch::new().with(Mutation::ClaimName { name_hash, id }))?;

        tracing::debug!(%id, name, "name claimed");
        self.emit(
            ctx,
            Event::NameClaimed {
                id,
                name: name.to_owned(),
                name_hash,
            },
        );
        Ok(name_hash)
    }

    /// Look up the item a name is bound to.
    pub fn resolve_name(&self, name: &str) -> Result<Option<ItemId>> {
        if normalize_name(name).is_empty() {
            return Ok(None);
        }
        Ok(self.store.resolve_name(&NameHash::derive(name))?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Engagement and Treasury
    // ─────────────────────────────────────────────────────────────────────────

    /// Upvote `id` once per account. Returns the new total.
    pub fn upvote(&self, ctx: &CallContext, id: ItemId) -> Result<u64> {
        let _exec = self.lock();

        self.load(id)?;
        if self.store.has_voted(id, &ctx.caller)? {
            return Err(RegistryError::AlreadyVoted {
                id,
                voter: ctx.caller,
            });
        }

        self.store.commit(WriteBatch::new().with(Mutation::AddVoter {
            id,
            account: ctx.caller,
        }))?;
        let total = self.store.voter_count(id)?;

        tracing::debug!(%id, voter = %ctx.caller, total, "upvoted");
        self.emit(
            ctx,
            Event::Upvoted {
                id,
                voter: ctx.caller,
                total,
            },
        );
        Ok(total)
    }

    /// Forward the attached value to the owner of `id`.
    ///
    /// Guarded: fails with [`RegistryError::Reentrancy`] while another tip or
    /// withdrawal is in flight. The tip does not touch the treasury or the
    /// item's donation. If the transfer fails nothing is recorded.
    pub fn tip(&self, ctx: &CallContext, id: ItemId) -> Result<()> {
        let _token = self.enter_guarded("tip")?;

        if ctx.value == 0 {
            return Err(RegistryError::ZeroValue);
        }

        let owner = {
            let _exec = self.lock();
            self.load(id)?.owner
        };

        if let Err(source) = self.ledger.transfer(&owner, ctx.value) {
            tracing::warn!(%id, to = %owner, amount = ctx.value, error = %source, "tip transfer failed");
            return Err(RegistryError::Transfer {
                to: owner,
                amount: ctx.value,
                source,
            });
        }

        let _exec = self.lock();
        tracing::info!(%id, from = %ctx.caller, to = %owner, amount = ctx.value, "tip sent");
        self.emit(
            ctx,
            Event::Tipped {
                id,
                from: ctx.caller,
                to: owner,
                amount: ctx.value,
            },
        );
        Ok(())
    }

    /// Send the whole pooled balance to the beneficiary.
    ///
    /// Guarded like [`tip`](Self::tip). The balance is debited before the
    /// transfer and restored if the transfer fails. Returns the amount sent.
    pub fn withdraw(&self, ctx: &CallContext) -> Result<Amount> {
        let _token = self.enter_guarded("withdraw")?;

        let beneficiary = self.config.beneficiary;
        let amount = {
            let _exec = self.lock();

            if ctx.caller != beneficiary {
                return Err(RegistryError::NotBeneficiary(ctx.caller));
            }
            let amount = self.store.counters()?.balance;
            if amount == 0 {
                return Err(RegistryError::EmptyBalance);
            }
            self.store
                .commit(WriteBatch::new().with(Mutation::Debit(amount)))?;
            amount
        };

        if let Err(source) = self.ledger.transfer(&beneficiary, amount) {
            let _exec = self.lock();
            tracing::warn!(to = %beneficiary, amount, error = %source, "withdraw transfer failed");
            if let Err(e) = self
                .store
                .commit(WriteBatch::new().with(Mutation::Refund(amount)))
            {
                tracing::error!(amount, error = %e, "failed to restore balance after transfer failure");
                return Err(e.into());
            }
            return Err(RegistryError::Transfer {
                to: beneficiary,
                amount,
                source,
            });
        }

        let _exec = self.lock();
        tracing::info!(to = %beneficiary, amount, "balance withdrawn");
        self.emit(
            ctx,
            Event::Withdrawn {
                to: beneficiary,
                amount,
            },
        );
        Ok(amount)
    }

    /// Accept value sent with no item attached.
    ///
    /// Counts toward total donations and lands in the pooled balance. A call
    /// with no value is a no-op.
    pub fn receive(&self, ctx: &CallContext) -> Result<()> {
        if ctx.value == 0 {
            return Ok(());
        }

        let _exec = self.lock();
        self.store
            .commit(WriteBatch::new().with(Mutation::Receive(ctx.value)))?;

        tracing::info!(from = %ctx.caller, amount = ctx.value, "donation received");
        self.emit(
            ctx,
            Event::DonationReceived {
                from: ctx.caller,
                amount: ctx.value,
            },
        );
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Everything the store knows about `id`. Never includes content.
    pub fn read_item(&self, id: ItemId) -> Result<ItemView> {
        Ok(ItemView::from_record(id, self.load(id)?))
    }

    /// Allocated ids in `[from, to]`, clamped to what exists.
    ///
    /// `from == 0` is treated as 1. The result is empty when `to < from` or
    /// `from` is past the highest allocated id.
    pub fn list_ids_in_range(&self, from: u64, to: u64) -> Result<Vec<ItemId>> {
        let Some(last) = self.store.counters()?.last_id() else {
            return Ok(Vec::new());
        };

        let from = from.max(1);
        if to < from || from > last.get() {
            return Ok(Vec::new());
        }
        let to = to.min(last.get());

        Ok((from..=to).filter_map(ItemId::new).collect())
    }

    /// Explicit editors of `id`, sorted. The owner is never listed.
    pub fn editors(&self, id: ItemId) -> Result<Vec<AccountId>> {
        self.load(id)?;
        Ok(self.store.editors(id)?)
    }

    /// Whether `account` is an explicit editor of `id`. False for missing items.
    pub fn is_editor(&self, id: ItemId, account: &AccountId) -> Result<bool> {
        Ok(self.store.is_editor(id, account)?)
    }

    /// Whether `account` has upvoted `id`. False for missing items.
    pub fn has_voted(&self, id: ItemId, account: &AccountId) -> Result<bool> {
        Ok(self.store.has_voted(id, account)?)
    }

    /// Lifetime value received by the registry.
    pub fn total_donations(&self) -> Result<Amount> {
        Ok(self.store.counters()?.total_donations)
    }

    /// Value currently held for withdrawal.
    pub fn balance(&self) -> Result<Amount> {
        Ok(self.store.counters()?.balance)
    }

    /// The id the next created item will receive.
    pub fn next_id(&self) -> Result<ItemId> {
        Ok(self.store.counters()?.next_id)
    }

    /// Allocator and treasury counters in one read.
    pub fn counters(&self) -> Result<Counters> {
        Ok(self.store.counters()?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal
    // ─────────────────────────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, ()> {
        // Batches are all-or-nothing; a poisoned lock guards no torn state.
        self.exec.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter_guarded(&self, op: &'static str) -> Result<GuardToken<'_>> {
        self.guard.enter().map_err(|e| {
            tracing::warn!(op, "reentrant call rejected");
            e
        })
    }

    fn load(&self, id: ItemId) -> Result<ItemRecord> {
        self.store
            .get_item(id)?
            .ok_or(RegistryError::ItemNotFound(id))
    }

    fn roles(&self, id: ItemId, record: &ItemRecord, caller: &AccountId) -> Result<Roles> {
        let is_editor = record.owner != *caller && self.store.is_editor(id, caller)?;
        Ok(Roles::resolve(record, caller, is_editor))
    }

    fn emit(&self, ctx: &CallContext, event: Event) {
        self.sink
            .publish(&EventEnvelope::new(ctx.timestamp, ctx.caller, event));
    }
}

fn successor(id: ItemId) -> Result<ItemId> {
    id.next().ok_or(RegistryError::IdsExhausted)
}

fn receive_into(batch: &mut WriteBatch, value: Amount) {
    if value > 0 {
        batch.push(Mutation::Receive(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;
    use crate::sink::MemorySink;
    use crate::ErrorKind;
    use quill_core::EventKind;
    use quill_store::MemoryStore;

    type TestRegistry = Registry<MemoryStore, MemoryLedger, MemorySink>;

    fn account(byte: u8) -> AccountId {
        AccountId::from_bytes([byte; 32])
    }

    fn registry() -> TestRegistry {
        Registry::new(
            MemoryStore::new(),
            MemoryLedger::new(),
            MemorySink::new(),
            RegistryConfig::new(account(0xBE)),
        )
    }

    fn call(byte: u8) -> CallContext {
        CallContext::new(account(byte), 1_000)
    }

    #[test]
    fn test_write_allocates_and_notifies() {
        let registry = registry();
        let id = registry.write(&call(1).with_value(9), "t", "hello").unwrap();

        assert_eq!(id, ItemId::FIRST);
        assert_eq!(registry.next_id().unwrap().get(), 2);
        assert_eq!(registry.balance().unwrap(), 9);
        assert_eq!(registry.total_donations().unwrap(), 9);
        assert_eq!(registry.sink().kinds(), vec![EventKind::Created]);

        let view = registry.read_item(id).unwrap();
        assert!(view.verify(b"hello"));
        assert_eq!(view.donation, 9);
    }

    #[test]
    fn test_oversized_content_allocates_nothing() {
        let registry = registry();

        let err = registry
            .write(&call(1), "", &"x".repeat(MAX_SIZE + 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(registry.next_id().unwrap(), ItemId::FIRST);
        assert!(registry.sink().is_empty());
    }

    #[test]
    fn test_owner_is_never_stored_as_editor() {
        let registry = registry();
        let id = registry.write(&call(1), "", "x").unwrap();

        registry.add_editor(&call(1), id, account(1)).unwrap();
        assert!(registry.editors(id).unwrap().is_empty());
        assert_eq!(registry.sink().last().unwrap().kind(), EventKind::EditorAdded);
    }

    #[test]
    fn test_successor_reports_exhaustion() {
        let last = ItemId::new(u64::MAX).unwrap();
        assert!(matches!(successor(last), Err(RegistryError::IdsExhausted)));
        assert_eq!(successor(ItemId::FIRST).unwrap().get(), 2);
    }

    #[test]
    fn test_resolve_blank_name() {
        let registry = registry();
        assert_eq!(registry.resolve_name("   ").unwrap(), None);
    }

    #[test]
    fn test_receive_zero_is_noop() {
        let registry = registry();
        registry.receive(&call(1)).unwrap();
        assert!(registry.sink().is_empty());
        assert_eq!(registry.total_donations().unwrap(), 0);
    }
}
