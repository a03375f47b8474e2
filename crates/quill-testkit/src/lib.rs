//! # Quill Testkit
//!
//! Testing utilities for the Quill registry.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Log entries with their expected canonical bytes
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: A wired in-memory registry with a deterministic clock
//!
//! ## Golden Vectors
//!
//! ```rust
//! use quill_testkit::vectors::{all_vectors, verify_all_vectors};
//!
//! let checked = verify_all_vectors().unwrap();
//! assert!(checked >= all_vectors().len());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use quill_testkit::generators::PublishParams;
//!
//! proptest! {
//!     #[test]
//!     fn publish_never_loses_value(params: PublishParams) {
//!         // ...
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use quill_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! let alice = TestFixture::account(1);
//! let id = fixture.publish(&alice, "first post");
//! assert_eq!(fixture.registry.read_item(id).unwrap().owner, alice);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_accounts, MemoryRegistry, TestFixture};
pub use generators::PublishParams;
pub use vectors::{all_vectors, verify_all_vectors, vectors_json, GoldenVector};
