//! Shared setup for registry integration tests.

#![allow(dead_code)]

use quill_registry::store::MemoryStore;
use quill_registry::{
    AccountId, CallContext, MemoryLedger, MemorySink, Registry, RegistryConfig,
};

pub type TestRegistry = Registry<MemoryStore, MemoryLedger, MemorySink>;

pub const ALICE: u8 = 0xA1;
pub const BOB: u8 = 0xB0;
pub const CAROL: u8 = 0xC0;
pub const MALLORY: u8 = 0x66;
pub const TREASURY: u8 = 0xBE;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn account(byte: u8) -> AccountId {
    AccountId::from_bytes([byte; 32])
}

pub fn call(byte: u8) -> CallContext {
    CallContext::new(account(byte), 1_700_000_000_000)
}

pub fn paid(byte: u8, value: u128) -> CallContext {
    call(byte).with_value(value)
}

pub fn registry() -> TestRegistry {
    init_tracing();
    Registry::new(
        MemoryStore::new(),
        MemoryLedger::new(),
        MemorySink::new(),
        RegistryConfig::new(account(TREASURY)),
    )
}

/// A registry holding items 1..=n, all written by Alice.
pub fn registry_with_items(n: usize) -> TestRegistry {
    let registry = registry();
    for i in 0..n {
        registry
            .write(&call(ALICE), "", &format!("item {}", i + 1))
            .unwrap();
    }
    registry.sink().clear();
    registry
}
