//! Item records: the fixed-size state persisted per published item.

use serde::{Deserialize, Serialize};

use crate::crypto::Fingerprint;
use crate::types::{AccountId, Amount, ItemId, Timestamp};

/// The persisted record of one item.
///
/// `owner`, `author`, `created_at` and `donation` are written once at
/// creation. `fingerprint`, `attachment` and `upvotes` change only through
/// authorized registry operations. Editors and voters live beside the record
/// in the store, keyed by item id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Thread owner. Replies inherit the parent's owner.
    pub owner: AccountId,

    /// Account that wrote this entry.
    pub author: AccountId,

    /// Creation time (Unix ms).
    pub created_at: Timestamp,

    /// Value attributed to the item at creation.
    pub donation: Amount,

    /// Digest of the most recently accepted content.
    pub fingerprint: Fingerprint,

    /// Optional opaque locator, last write wins.
    pub attachment: Option<String>,

    /// Number of distinct upvoters.
    pub upvotes: u64,
}

impl ItemRecord {
    /// Create a fresh record with no attachment and no votes.
    pub fn new(
        owner: AccountId,
        author: AccountId,
        created_at: Timestamp,
        donation: Amount,
        fingerprint: Fingerprint,
    ) -> Self {
        Self {
            owner,
            author,
            created_at,
            donation,
            fingerprint,
            attachment: None,
            upvotes: 0,
        }
    }
}

/// What a reader gets back for an item: every stored field, never content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    pub id: ItemId,
    pub fingerprint: Fingerprint,
    pub attachment: Option<String>,
    pub owner: AccountId,
    pub author: AccountId,
    pub created_at: Timestamp,
    pub donation: Amount,
    pub upvotes: u64,
}

impl ItemView {
    /// Build a view from a stored record.
    pub fn from_record(id: ItemId, record: ItemRecord) -> Self {
        Self {
            id,
            fingerprint: record.fingerprint,
            attachment: record.attachment,
            owner: record.owner,
            author: record.author,
            created_at: record.created_at,
            donation: record.donation,
            upvotes: record.upvotes,
        }
    }

    /// Check content recovered from the log against this item's commitment.
    pub fn verify(&self, content: &[u8]) -> bool {
        self.fingerprint.matches(content)
    }
}
