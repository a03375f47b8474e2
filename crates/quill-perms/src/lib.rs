//! # Quill Permissions
//!
//! Two-tier authorization for registry mutations.
//!
//! ## Overview
//!
//! Every item has exactly one owner, fixed at creation and never
//! transferable, plus an explicit set of editors managed by the owner. The
//! owner is implicitly authorized for everything and is never stored in the
//! editor set. Attachments additionally admit the entry's author.
//!
//! ## Key Concepts
//!
//! - **Roles**: the relationship between a caller and one item
//! - **Action**: a gated mutation kind
//! - **authorize**: the single decision point, returning `PermissionDenied`
//!
//! ## Usage
//!
//! ```rust
//! use quill_core::{AccountId, Fingerprint, ItemRecord};
//! use quill_perms::{authorize, Action, Roles};
//!
//! let owner = AccountId::from_bytes([1; 32]);
//! let record = ItemRecord::new(owner, owner, 0, 0, Fingerprint::of(b"x"));
//!
//! let roles = Roles::resolve(&record, &owner, false);
//! assert!(authorize(Action::ManageEditors, &roles, &owner).is_ok());
//! ```

pub mod error;
pub mod policy;

pub use error::{PermsError, Result};
pub use policy::{authorize, Action, Roles};
