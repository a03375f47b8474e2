//! # Quill Store
//!
//! Storage abstraction for the Quill registry. Provides a trait-based
//! interface for item persistence with SQLite and in-memory implementations.
//!
//! ## Overview
//!
//! The registry reads through the [`Store`] trait and writes by building a
//! [`WriteBatch`] that the store commits atomically: either every mutation
//! in the batch lands, or none does. The primary implementation is
//! [`SqliteStore`], with [`MemoryStore`] for tests and embedding.
//!
//! ## Key Types
//!
//! - [`Store`] - The trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`WriteBatch`] / [`Mutation`] - A unit of atomic change
//! - [`Counters`] - Allocator and treasury counters
//!
//! ## Usage
//!
//! ```rust,no_run
//! use quill_store::{SqliteStore, Store, WriteBatch};
//!
//! fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("quill.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let counters = store.counters().unwrap();
//!     assert_eq!(counters.next_id.get(), 1);
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic batches**: a failed commit leaves the store untouched
//! - **Store-level uniqueness**: name claims and votes are rejected with
//!   `Conflict` by the store itself, not only by the registry
//! - **Vote counts**: `AddVoter` maintains the record's `upvotes` in the
//!   same commit as the voter set

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{Counters, Mutation, Store, WriteBatch};
