//! # Quill Registry
//!
//! A minimal-state, event-sourced content registry.
//!
//! ## Overview
//!
//! Clients publish arbitrarily large text items. The registry persists only
//! a small fixed record per item (owner, author, timestamp, donation,
//! content fingerprint, attachment, vote count) plus a vanity name index.
//! Full content goes out through an [`EventSink`] to an append-only log and
//! is verified against the stored fingerprint by whoever reads it back.
//!
//! ## Key Concepts
//!
//! - **Item**: created by `write`, `reply` or `write_many`; never destroyed
//! - **Owner / Editors**: the owner may do anything; editors may edit and attach
//! - **Names**: first claim wins, forever
//! - **Treasury**: donations pool until the beneficiary withdraws them
//! - **Guard**: `tip` and `withdraw` reject reentrant calls from the ledger
//!
//! ## Usage
//!
//! ```rust
//! use quill_registry::{CallContext, MemoryLedger, MemorySink, Registry, RegistryConfig};
//! use quill_registry::core::AccountId;
//! use quill_registry::store::MemoryStore;
//!
//! let alice = AccountId::from_bytes([1; 32]);
//! let treasury = AccountId::from_bytes([2; 32]);
//!
//! let registry = Registry::new(
//!     MemoryStore::new(),
//!     MemoryLedger::new(),
//!     MemorySink::new(),
//!     RegistryConfig::new(treasury),
//! );
//!
//! let ctx = CallContext::new(alice, 1_700_000_000_000).with_value(100);
//! let id = registry.write(&ctx, "hello", "first post").unwrap();
//!
//! let view = registry.read_item(id).unwrap();
//! assert!(view.verify(b"first post"));
//! assert_eq!(registry.balance().unwrap(), 100);
//! ```
//!
//! ## Re-exports
//!
//! - `quill_registry::core` - Core primitives (ItemId, Fingerprint, Event, etc.)
//! - `quill_registry::store` - Storage abstraction and SQLite
//! - `quill_registry::perms` - Authorization policy

pub mod config;
pub mod context;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod registry;
pub mod sink;

// Re-export component crates
pub use quill_core as core;
pub use quill_perms as perms;
pub use quill_store as store;

// Re-export main types for convenience
pub use config::RegistryConfig;
pub use context::CallContext;
pub use error::{ErrorKind, RegistryError, Result};
pub use guard::{GuardToken, ReentrancyGuard};
pub use ledger::{Ledger, MemoryLedger, TransferError};
pub use registry::Registry;
pub use sink::{EventSink, MemorySink, TracingSink};

// Re-export commonly used core types
pub use quill_core::{
    AccountId, Amount, Event, EventEnvelope, EventKind, Fingerprint, ItemId, ItemView, NameHash,
    Timestamp, MAX_SIZE,
};
