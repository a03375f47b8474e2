//! Canonical CBOR encoding for notifications.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 milliseconds)
//!
//! Amounts are `u128` and do not fit a CBOR integer in general, so they are
//! always written as 16-byte big-endian byte strings.
//!
//! Log readers decode entries with [`decode_event`] and check item content
//! against the fingerprint the store holds.

use ciborium::value::{Integer, Value};

use crate::crypto::{Fingerprint, NameHash};
use crate::error::CoreError;
use crate::event::{Event, EventEnvelope, EventKind};
use crate::types::{AccountId, Amount, ItemId};

/// Envelope field keys.
mod envelope_keys {
    pub const KIND: u64 = 0;
    pub const TIMESTAMP: u64 = 1;
    pub const ACTOR: u64 = 2;
    pub const BODY: u64 = 3;
}

/// Body field keys, shared by every event kind.
///
/// Keys 0-23 encode as single bytes in CBOR.
mod keys {
    pub const ID: u64 = 0;
    pub const OWNER: u64 = 1;
    pub const AUTHOR: u64 = 2;
    pub const TITLE: u64 = 3;
    pub const CONTENT: u64 = 4;
    pub const FINGERPRINT: u64 = 5;
    pub const AMOUNT: u64 = 6;
    pub const PARENT: u64 = 7;
    pub const COUNT: u64 = 8;
    pub const ACCOUNT: u64 = 9;
    pub const NAME: u64 = 10;
    pub const NAME_HASH: u64 = 11;
    pub const REFERENCE: u64 = 12;
    pub const TOTAL: u64 = 13;
    pub const RECIPIENT: u64 = 14;
}

/// Encode an envelope to canonical CBOR bytes.
pub fn canonical_event_bytes(envelope: &EventEnvelope) -> Vec<u8> {
    let value = Value::Map(vec![
        (
            key(envelope_keys::KIND),
            Value::Integer(envelope.kind().to_u16().into()),
        ),
        (
            key(envelope_keys::TIMESTAMP),
            Value::Integer(envelope.timestamp.into()),
        ),
        (key(envelope_keys::ACTOR), account(&envelope.actor)),
        (key(envelope_keys::BODY), body_to_cbor_value(&envelope.event)),
    ]);

    let mut buf = Vec::new();
    encode_value_to(&mut buf, &value);
    buf
}

fn key(k: u64) -> Value {
    Value::Integer(k.into())
}

fn account(a: &AccountId) -> Value {
    Value::Bytes(a.0.to_vec())
}

fn item(id: ItemId) -> Value {
    Value::Integer(id.get().into())
}

fn amount(a: Amount) -> Value {
    Value::Bytes(a.to_be_bytes().to_vec())
}

/// Convert an event body to a CBOR map with integer keys.
fn body_to_cbor_value(event: &Event) -> Value {
    let entries = match event {
        Event::Created {
            id,
            owner,
            author,
            title,
            content,
            fingerprint,
            donation,
        } => vec![
            (key(keys::ID), item(*id)),
            (key(keys::OWNER), account(owner)),
            (key(keys::AUTHOR), account(author)),
            (key(keys::TITLE), Value::Text(title.clone())),
            (key(keys::CONTENT), Value::Text(content.clone())),
            (key(keys::FINGERPRINT), Value::Bytes(fingerprint.0.to_vec())),
            (key(keys::AMOUNT), amount(*donation)),
        ],
        Event::Replied { id, parent, author } => vec![
            (key(keys::ID), item(*id)),
            (key(keys::PARENT), item(*parent)),
            (key(keys::AUTHOR), account(author)),
        ],
        Event::BatchCreated { first_id, count } => vec![
            (key(keys::ID), item(*first_id)),
            (key(keys::COUNT), Value::Integer((*count).into())),
        ],
        Event::Edited {
            id,
            editor,
            content,
            fingerprint,
        } => vec![
            (key(keys::ID), item(*id)),
            (key(keys::ACCOUNT), account(editor)),
            (key(keys::CONTENT), Value::Text(content.clone())),
            (key(keys::FINGERPRINT), Value::Bytes(fingerprint.0.to_vec())),
        ],
        Event::Attached { id, reference } => vec![
            (key(keys::ID), item(*id)),
            (key(keys::REFERENCE), Value::Text(reference.clone())),
        ],
        Event::EditorAdded { id, editor } | Event::EditorRemoved { id, editor } => vec![
            (key(keys::ID), item(*id)),
            (key(keys::ACCOUNT), account(editor)),
        ],
        Event::NameClaimed {
            id,
            name,
            name_hash,
        } => vec![
            (key(keys::ID), item(*id)),
            (key(keys::NAME), Value::Text(name.clone())),
            (key(keys::NAME_HASH), Value::Bytes(name_hash.0.to_vec())),
        ],
        Event::Upvoted { id, voter, total } => vec![
            (key(keys::ID), item(*id)),
            (key(keys::ACCOUNT), account(voter)),
            (key(keys::TOTAL), Value::Integer((*total).into())),
        ],
        Event::Tipped {
            id,
            from,
            to,
            amount: value,
        } => vec![
            (key(keys::ID), item(*id)),
            (key(keys::ACCOUNT), account(from)),
            (key(keys::RECIPIENT), account(to)),
            (key(keys::AMOUNT), amount(*value)),
        ],
        Event::Withdrawn { to, amount: value } => vec![
            (key(keys::RECIPIENT), account(to)),
            (key(keys::AMOUNT), amount(*value)),
        ],
        Event::DonationReceived { from, amount: value } => vec![
            (key(keys::ACCOUNT), account(from)),
            (key(keys::AMOUNT), amount(*value)),
        ],
    };

    Value::Map(entries)
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr),
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        // Only the variants above are ever produced by this module.
        _ => unreachable!("unsupported CBOR value type in canonical encoding"),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n = i128::from(i);

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item);
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let mut pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| {
            let mut key_buf = Vec::new();
            encode_value_to(&mut key_buf, k);
            (key_buf, v)
        })
        .collect();

    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}

/// Decode an envelope from canonical bytes.
pub fn decode_event(bytes: &[u8]) -> Result<EventEnvelope, CoreError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let envelope = Fields::from_value(&value, "envelope")?;
    let raw_kind = envelope.uint(envelope_keys::KIND, "kind")?;
    let raw_kind =
        u16::try_from(raw_kind).map_err(|_| malformed(format!("kind {raw_kind} out of range")))?;
    let kind = EventKind::from_u16(raw_kind).ok_or(CoreError::UnknownEventKind(raw_kind))?;
    let timestamp = envelope.int(envelope_keys::TIMESTAMP, "timestamp")?;
    let actor = envelope.account(envelope_keys::ACTOR, "actor")?;

    let body_value = envelope
        .get(envelope_keys::BODY)
        .ok_or_else(|| malformed("missing body"))?;
    let body = Fields::from_value(body_value, "body")?;

    let event = match kind {
        EventKind::Created => Event::Created {
            id: body.item(keys::ID, "id")?,
            owner: body.account(keys::OWNER, "owner")?,
            author: body.account(keys::AUTHOR, "author")?,
            title: body.text(keys::TITLE, "title")?,
            content: body.text(keys::CONTENT, "content")?,
            fingerprint: Fingerprint(body.hash(keys::FINGERPRINT, "fingerprint")?),
            donation: body.amount(keys::AMOUNT, "donation")?,
        },
        EventKind::Replied => Event::Replied {
            id: body.item(keys::ID, "id")?,
            parent: body.item(keys::PARENT, "parent")?,
            author: body.account(keys::AUTHOR, "author")?,
        },
        EventKind::BatchCreated => Event::BatchCreated {
            first_id: body.item(keys::ID, "first_id")?,
            count: body.uint(keys::COUNT, "count")?,
        },
        EventKind::Edited => Event::Edited {
            id: body.item(keys::ID, "id")?,
            editor: body.account(keys::ACCOUNT, "editor")?,
            content: body.text(keys::CONTENT, "content")?,
            fingerprint: Fingerprint(body.hash(keys::FINGERPRINT, "fingerprint")?),
        },
        EventKind::Attached => Event::Attached {
            id: body.item(keys::ID, "id")?,
            reference: body.text(keys::REFERENCE, "reference")?,
        },
        EventKind::EditorAdded => Event::EditorAdded {
            id: body.item(keys::ID, "id")?,
            editor: body.account(keys::ACCOUNT, "editor")?,
        },
        EventKind::EditorRemoved => Event::EditorRemoved {
            id: body.item(keys::ID, "id")?,
            editor: body.account(keys::ACCOUNT, "editor")?,
        },
        EventKind::NameClaimed => Event::NameClaimed {
            id: body.item(keys::ID, "id")?,
            name: body.text(keys::NAME, "name")?,
            name_hash: NameHash(body.hash(keys::NAME_HASH, "name_hash")?),
        },
        EventKind::Upvoted => Event::Upvoted {
            id: body.item(keys::ID, "id")?,
            voter: body.account(keys::ACCOUNT, "voter")?,
            total: body.uint(keys::TOTAL, "total")?,
        },
        EventKind::Tipped => Event::Tipped {
            id: body.item(keys::ID, "id")?,
            from: body.account(keys::ACCOUNT, "from")?,
            to: body.account(keys::RECIPIENT, "to")?,
            amount: body.amount(keys::AMOUNT, "amount")?,
        },
        EventKind::Withdrawn => Event::Withdrawn {
            to: body.account(keys::RECIPIENT, "to")?,
            amount: body.amount(keys::AMOUNT, "amount")?,
        },
        EventKind::DonationReceived => Event::DonationReceived {
            from: body.account(keys::ACCOUNT, "from")?,
            amount: body.amount(keys::AMOUNT, "amount")?,
        },
    };

    Ok(EventEnvelope {
        timestamp,
        actor,
        event,
    })
}

fn malformed(msg: impl Into<String>) -> CoreError {
    CoreError::DecodingError(msg.into())
}

/// Integer-keyed view over a decoded CBOR map.
struct Fields<'a>(&'a [(Value, Value)]);

impl<'a> Fields<'a> {
    fn from_value(value: &'a Value, what: &str) -> Result<Self, CoreError> {
        match value {
            Value::Map(entries) => Ok(Self(entries)),
            _ => Err(malformed(format!("{what}: expected map"))),
        }
    }

    fn get(&self, k: u64) -> Option<&'a Value> {
        self.0
            .iter()
            .find(|(key, _)| matches!(key, Value::Integer(i) if i128::from(*i) == k as i128))
            .map(|(_, v)| v)
    }

    fn int(&self, k: u64, what: &str) -> Result<i64, CoreError> {
        match self.get(k) {
            Some(Value::Integer(i)) => {
                i64::try_from(*i).map_err(|_| malformed(format!("{what} out of range")))
            }
            _ => Err(malformed(format!("missing {what}"))),
        }
    }

    fn uint(&self, k: u64, what: &str) -> Result<u64, CoreError> {
        match self.get(k) {
            Some(Value::Integer(i)) => {
                u64::try_from(*i).map_err(|_| malformed(format!("{what} out of range")))
            }
            _ => Err(malformed(format!("missing {what}"))),
        }
    }

    fn item(&self, k: u64, what: &str) -> Result<ItemId, CoreError> {
        let raw = self.uint(k, what)?;
        ItemId::new(raw).ok_or_else(|| malformed(format!("{what} must be positive")))
    }

    fn text(&self, k: u64, what: &str) -> Result<String, CoreError> {
        match self.get(k) {
            Some(Value::Text(s)) => Ok(s.clone()),
            _ => Err(malformed(format!("missing {what}"))),
        }
    }

    fn hash(&self, k: u64, what: &str) -> Result<[u8; 32], CoreError> {
        match self.get(k) {
            Some(Value::Bytes(b)) => b
                .as_slice()
                .try_into()
                .map_err(|_| malformed(format!("{what}: expected 32 bytes"))),
            _ => Err(malformed(format!("missing {what}"))),
        }
    }

    fn account(&self, k: u64, what: &str) -> Result<AccountId, CoreError> {
        self.hash(k, what).map(AccountId)
    }

    fn amount(&self, k: u64, what: &str) -> Result<Amount, CoreError> {
        match self.get(k) {
            Some(Value::Bytes(b)) => {
                let arr: [u8; 16] = b
                    .as_slice()
                    .try_into()
                    .map_err(|_| malformed(format!("{what}: expected 16 bytes")))?;
                Ok(Amount::from_be_bytes(arr))
            }
            _ => Err(malformed(format!("missing {what}"))),
        }
    }
}
