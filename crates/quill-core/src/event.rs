//! Notifications: the registry's only output to the external log.
//!
//! Full titles and content appear here and nowhere else. The registry emits
//! events and never reads them back.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::canonical::canonical_event_bytes;
use crate::crypto::{Fingerprint, NameHash};
use crate::types::{AccountId, Amount, ItemId, Timestamp};

/// Discriminator for event interpretation on the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum EventKind {
    // Content kinds (0x0000 - 0x00FF)
    /// A new item was created.
    Created = 0x0001,
    /// A created item is a reply to a parent item.
    Replied = 0x0002,
    /// Summary of a batch creation.
    BatchCreated = 0x0003,
    /// An item's content was replaced.
    Edited = 0x0004,
    /// An attachment reference was set.
    Attached = 0x0005,

    // Permission and naming kinds (0x0100 - 0x01FF)
    /// An editor was granted.
    EditorAdded = 0x0100,
    /// An editor was removed.
    EditorRemoved = 0x0101,
    /// A vanity name was claimed.
    NameClaimed = 0x0102,

    // Engagement and treasury kinds (0x0200 - 0x02FF)
    /// An upvote was cast.
    Upvoted = 0x0200,
    /// Value was forwarded to an item owner.
    Tipped = 0x0201,
    /// The pooled balance was paid out.
    Withdrawn = 0x0202,
    /// Bare inbound value was accepted.
    DonationReceived = 0x0203,
}

impl EventKind {
    /// Convert to u16 for serialization.
    pub fn to_u16(self) -> u16 {
        self as u16
    }

    /// Try to parse from u16.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0001 => Some(Self::Created),
            0x0002 => Some(Self::Replied),
            0x0003 => Some(Self::BatchCreated),
            0x0004 => Some(Self::Edited),
            0x0005 => Some(Self::Attached),
            0x0100 => Some(Self::EditorAdded),
            0x0101 => Some(Self::EditorRemoved),
            0x0102 => Some(Self::NameClaimed),
            0x0200 => Some(Self::Upvoted),
            0x0201 => Some(Self::Tipped),
            0x0202 => Some(Self::Withdrawn),
            0x0203 => Some(Self::DonationReceived),
            _ => None,
        }
    }

    /// Check if this is a content kind.
    pub fn is_content(self) -> bool {
        (self.to_u16() & 0xFF00) == 0x0000
    }

    /// Check if this is a permission or naming kind.
    pub fn is_permission(self) -> bool {
        (self.to_u16() & 0xFF00) == 0x0100
    }

    /// Check if this is a fund movement or vote.
    pub fn is_engagement(self) -> bool {
        (self.to_u16() & 0xFF00) == 0x0200
    }
}

/// A single notification payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Created {
        id: ItemId,
        owner: AccountId,
        author: AccountId,
        title: String,
        content: String,
        fingerprint: Fingerprint,
        donation: Amount,
    },
    Replied {
        id: ItemId,
        parent: ItemId,
        author: AccountId,
    },
    BatchCreated {
        first_id: ItemId,
        count: u64,
    },
    Edited {
        id: ItemId,
        editor: AccountId,
        content: String,
        fingerprint: Fingerprint,
    },
    Attached {
        id: ItemId,
        reference: String,
    },
    EditorAdded {
        id: ItemId,
        editor: AccountId,
    },
    EditorRemoved {
        id: ItemId,
        editor: AccountId,
    },
    NameClaimed {
        id: ItemId,
        name: String,
        name_hash: NameHash,
    },
    Upvoted {
        id: ItemId,
        voter: AccountId,
        total: u64,
    },
    Tipped {
        id: ItemId,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    },
    Withdrawn {
        to: AccountId,
        amount: Amount,
    },
    DonationReceived {
        from: AccountId,
        amount: Amount,
    },
}

impl Event {
    /// The discriminator of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Created { .. } => EventKind::Created,
            Event::Replied { .. } => EventKind::Replied,
            Event::BatchCreated { .. } => EventKind::BatchCreated,
            Event::Edited { .. } => EventKind::Edited,
            Event::Attached { .. } => EventKind::Attached,
            Event::EditorAdded { .. } => EventKind::EditorAdded,
            Event::EditorRemoved { .. } => EventKind::EditorRemoved,
            Event::NameClaimed { .. } => EventKind::NameClaimed,
            Event::Upvoted { .. } => EventKind::Upvoted,
            Event::Tipped { .. } => EventKind::Tipped,
            Event::Withdrawn { .. } => EventKind::Withdrawn,
            Event::DonationReceived { .. } => EventKind::DonationReceived,
        }
    }

    /// The item this event concerns, if any.
    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            Event::Created { id, .. }
            | Event::Replied { id, .. }
            | Event::Edited { id, .. }
            | Event::Attached { id, .. }
            | Event::EditorAdded { id, .. }
            | Event::EditorRemoved { id, .. }
            | Event::NameClaimed { id, .. }
            | Event::Upvoted { id, .. }
            | Event::Tipped { id, .. } => Some(*id),
            Event::BatchCreated { first_id, .. } => Some(*first_id),
            Event::Withdrawn { .. } | Event::DonationReceived { .. } => None,
        }
    }
}

/// An event plus the call context it was produced under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Environment time of the producing call (Unix ms).
    pub timestamp: Timestamp,

    /// The caller of the producing operation.
    pub actor: AccountId,

    /// The payload.
    pub event: Event,
}

impl EventEnvelope {
    /// Wrap an event.
    pub fn new(timestamp: Timestamp, actor: AccountId, event: Event) -> Self {
        Self {
            timestamp,
            actor,
            event,
        }
    }

    /// Shorthand for `self.event.kind()`.
    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }

    /// Canonical CBOR encoding, as written to the log.
    pub fn canonical_bytes(&self) -> Bytes {
        Bytes::from(canonical_event_bytes(self))
    }

    /// Blake3 digest of the canonical encoding; identifies the log entry.
    pub fn digest(&self) -> Fingerprint {
        Fingerprint::of(&canonical_event_bytes(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            EventKind::Created,
            EventKind::Replied,
            EventKind::BatchCreated,
            EventKind::Edited,
            EventKind::Attached,
            EventKind::EditorAdded,
            EventKind::EditorRemoved,
            EventKind::NameClaimed,
            EventKind::Upvoted,
            EventKind::Tipped,
            EventKind::Withdrawn,
            EventKind::DonationReceived,
        ] {
            assert_eq!(EventKind::from_u16(kind.to_u16()), Some(kind));
        }
        assert_eq!(EventKind::from_u16(0xFFFF), None);
    }

    #[test]
    fn test_kind_families() {
        assert!(EventKind::Edited.is_content());
        assert!(EventKind::NameClaimed.is_permission());
        assert!(EventKind::Tipped.is_engagement());
        assert!(!EventKind::Tipped.is_content());
    }

    #[test]
    fn test_item_id_of_treasury_events_is_none() {
        let account = AccountId::from_bytes([0x01; 32]);
        assert_eq!(Event::Withdrawn { to: account, amount: 1 }.item_id(), None);
        assert_eq!(
            Event::Upvoted {
                id: ItemId::FIRST,
                voter: account,
                total: 1
            }
            .item_id(),
            Some(ItemId::FIRST)
        );
    }

    #[test]
    fn test_digest_depends_on_timestamp() {
        let account = AccountId::from_bytes([0x02; 32]);
        let event = Event::DonationReceived {
            from: account,
            amount: 7,
        };
        let a = EventEnvelope::new(1, account, event.clone());
        let b = EventEnvelope::new(2, account, event);
        assert_ne!(a.digest(), b.digest());
        assert_eq!(a.digest(), a.clone().digest());
    }
}
