//! # Quill Core
//!
//! Pure primitives for the Quill registry: item records, content fingerprints,
//! notifications, and canonicalization.
//!
//! This crate contains no I/O, no storage, no value transfer. It is pure
//! computation over the registry's data model.
//!
//! ## Key Types
//!
//! - [`ItemId`] - Dense, positive identifier of a published item
//! - [`AccountId`] - 32-byte identity of a caller supplied by the environment
//! - [`Fingerprint`] - Blake3 commitment to an item's current content
//! - [`NameHash`] - Blake3 commitment to a normalized vanity name
//! - [`ItemRecord`] - The fixed-size record persisted per item
//! - [`Event`] - A notification destined for the external log
//!
//! ## Canonicalization
//!
//! Notifications are encoded using deterministic CBOR. See [`canonical`] module.

pub mod canonical;
pub mod crypto;
pub mod error;
pub mod event;
pub mod item;
pub mod types;
pub mod validation;

pub use canonical::{canonical_event_bytes, decode_event};
pub use crypto::{normalize_name, Fingerprint, NameHash};
pub use error::{CoreError, ValidationError};
pub use event::{Event, EventEnvelope, EventKind};
pub use item::{ItemRecord, ItemView};
pub use types::{AccountId, Amount, ItemId, Timestamp};
pub use validation::{
    validate_batch, validate_content, validate_name, validate_reference, MAX_SIZE,
};
