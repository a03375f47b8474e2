//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::atomic::{AtomicI64, Ordering};

use quill_core::{AccountId, Amount, ItemId};
use quill_perms::Roles;
use quill_registry::{CallContext, MemoryLedger, MemorySink, Registry, RegistryConfig};
use quill_store::{MemoryStore, Store};

/// A registry wired to in-memory backends.
pub type MemoryRegistry = Registry<MemoryStore, MemoryLedger, MemorySink>;

/// Starting point of the fixture clock (Unix ms).
pub const EPOCH_MS: i64 = 1_736_870_400_000;

/// A test fixture with a beneficiary, a registry, and a clock.
///
/// Every context handed out carries a timestamp one millisecond after the
/// previous one.
pub struct TestFixture {
    pub beneficiary: AccountId,
    pub registry: MemoryRegistry,
    clock: AtomicI64,
}

impl TestFixture {
    /// Create a new fixture with a random beneficiary.
    pub fn new() -> Self {
        Self::with_beneficiary(AccountId::from_bytes(rand::random()))
    }

    /// Create with a fixed beneficiary.
    pub fn with_beneficiary(beneficiary: AccountId) -> Self {
        Self {
            beneficiary,
            registry: Registry::new(
                MemoryStore::new(),
                MemoryLedger::new(),
                MemorySink::new(),
                RegistryConfig::new(beneficiary),
            ),
            clock: AtomicI64::new(EPOCH_MS),
        }
    }

    /// Deterministic account for party `index`.
    pub fn account(index: u8) -> AccountId {
        let mut bytes = [0u8; 32];
        bytes[0] = index;
        bytes[31] = 0xA5;
        AccountId::from_bytes(bytes)
    }

    /// A call from `who` with no value.
    pub fn ctx(&self, who: &AccountId) -> CallContext {
        CallContext::new(*who, self.clock.fetch_add(1, Ordering::Relaxed))
    }

    /// A call from `who` carrying `value`.
    pub fn paid(&self, who: &AccountId, value: Amount) -> CallContext {
        self.ctx(who).with_value(value)
    }

    /// The beneficiary's call context.
    pub fn beneficiary_ctx(&self) -> CallContext {
        self.ctx(&self.beneficiary)
    }

    /// Publish an untitled item.
    ///
    /// Panics on failure; fixtures are for tests.
    pub fn publish(&self, who: &AccountId, content: &str) -> ItemId {
        self.registry
            .write(&self.ctx(who), "", content)
            .expect("fixture publish failed")
    }

    /// Publish a thread by `owner` and one reply per entry of `repliers`.
    pub fn thread(&self, owner: &AccountId, repliers: &[AccountId]) -> (ItemId, Vec<ItemId>) {
        let root = self.publish(owner, "thread root");
        let replies = repliers
            .iter()
            .enumerate()
            .map(|(i, who)| {
                self.registry
                    .reply(&self.ctx(who), root, &format!("reply {}", i))
                    .expect("fixture reply failed")
            })
            .collect();
        (root, replies)
    }

    /// How `who` relates to `id`.
    pub fn roles(&self, who: &AccountId, id: ItemId) -> Roles {
        let record = self
            .registry
            .store()
            .get_item(id)
            .expect("store read failed")
            .expect("item missing");
        let is_editor = self
            .registry
            .is_editor(id, who)
            .expect("store read failed");
        Roles::resolve(&record, who, is_editor)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic accounts for multi-party tests.
pub fn multi_party_accounts(count: usize) -> Vec<AccountId> {
    (0..count).map(|i| TestFixture::account(i as u8)).collect()
}
