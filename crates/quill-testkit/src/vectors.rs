//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical encoding of log entries, so any
//! consumer decoding the log can check itself against the same bytes.

use anyhow::{ensure, Context};
use serde::Serialize;

use quill_core::{decode_event, AccountId, Event, EventEnvelope, ItemId, NameHash};

/// A golden test vector.
#[derive(Debug, Clone, Serialize)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// The entry to encode.
    pub envelope: EventEnvelope,
    /// Expected canonical bytes (hex).
    pub expected_hex: &'static str,
}

fn item(raw: u64) -> ItemId {
    ItemId::new(raw).unwrap_or(ItemId::FIRST)
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "DonationReceived of 1000",
            envelope: EventEnvelope::new(
                1736870400000, // 2025-01-14T16:00:00Z
                AccountId::from_bytes([0x42; 32]),
                Event::DonationReceived {
                    from: AccountId::from_bytes([0x42; 32]),
                    amount: 1000,
                },
            ),
            expected_hex: "a400190203011b00000194658b1000025820424242424242424242424242424242\
                           424242424242424242424242424242424203a20650000000000000000000000000\
                           000003e809582042424242424242424242424242424242424242424242424242\
                           42424242424242",
        },
        GoldenVector {
            name: "BatchCreated at epoch zero",
            envelope: EventEnvelope::new(
                0,
                AccountId::from_bytes([0x00; 32]),
                Event::BatchCreated {
                    first_id: ItemId::FIRST,
                    count: 3,
                },
            ),
            expected_hex: "a40003010002582000000000000000000000000000000000000000000000000000\
                           0000000000000003a200010803",
        },
        GoldenVector {
            name: "Attached reference",
            envelope: EventEnvelope::new(
                1736870401000,
                AccountId::from_bytes([0x01; 32]),
                Event::Attached {
                    id: item(24),
                    reference: "ipfs://bafy".to_string(),
                },
            ),
            expected_hex: "a40005011b00000194658b13e80258200101010101010101010101010101010101\
                           01010101010101010101010101010103a20018180c6b697066733a2f2f62616679",
        },
        GoldenVector {
            name: "Withdrawn of the full u128 range",
            envelope: EventEnvelope::new(
                1,
                AccountId::from_bytes([0xBE; 32]),
                Event::Withdrawn {
                    to: AccountId::from_bytes([0xBE; 32]),
                    amount: u128::MAX,
                },
            ),
            expected_hex: "a4001902020101025820bebebebebebebebebebebebebebebebebebebebebebebe\
                           bebebebebebebebebe03a20650ffffffffffffffffffffffffffffffff0e5820be\
                           bebebebebebebebebebebebebebebebebebebebebebebebebebebebebebebe",
        },
        GoldenVector {
            name: "Upvoted before the epoch",
            envelope: EventEnvelope::new(
                -1,
                AccountId::from_bytes([0x07; 32]),
                Event::Upvoted {
                    id: ItemId::FIRST,
                    voter: AccountId::from_bytes([0x07; 32]),
                    total: 500,
                },
            ),
            expected_hex: "a40019020001200258200707070707070707070707070707070707070707070707\
                           07070707070707070703a300010958200707070707070707070707070707070707\
                           0707070707070707070707070707070d1901f4",
        },
    ]
}

/// Spellings that must all land on the same name registry key.
pub fn name_vectors() -> Vec<(&'static str, Vec<&'static str>)> {
    vec![
        ("alice", vec!["alice", "Alice", "ALICE", "  alice ", "\taLiCe\n"]),
        ("quill-home", vec!["quill-home", "Quill-Home", " QUILL-HOME"]),
    ]
}

/// Verify every golden vector.
///
/// Checks the canonical bytes against the expected hex, that the bytes
/// decode back to the same entry, and that every name spelling derives
/// the key of its normal form. Returns the number of vectors checked.
pub fn verify_all_vectors() -> anyhow::Result<usize> {
    let mut checked = 0;

    for vector in all_vectors() {
        let bytes = vector.envelope.canonical_bytes();
        let hex = hex::encode(&bytes);
        ensure!(
            hex == vector.expected_hex,
            "vector '{}' encoded to {}, expected {}",
            vector.name,
            hex,
            vector.expected_hex
        );

        let decoded = decode_event(&bytes)
            .with_context(|| format!("vector '{}' failed to decode", vector.name))?;
        ensure!(
            decoded == vector.envelope,
            "vector '{}' did not survive decoding",
            vector.name
        );
        checked += 1;
    }

    for (normal, spellings) in name_vectors() {
        let expected = NameHash::derive(normal);
        for spelling in spellings {
            ensure!(
                NameHash::derive(spelling) == expected,
                "name {:?} did not normalize to {:?}",
                spelling,
                normal
            );
        }
        checked += 1;
    }

    Ok(checked)
}

/// Render the vectors as JSON, for consumers outside this workspace.
pub fn vectors_json() -> anyhow::Result<String> {
    let rendered: Vec<serde_json::Value> = all_vectors()
        .iter()
        .map(|v| {
            serde_json::json!({
                "name": v.name,
                "kind": v.envelope.kind().to_u16(),
                "digest": v.envelope.digest().to_hex(),
                "canonical": v.expected_hex,
            })
        })
        .collect();
    serde_json::to_string_pretty(&rendered).context("rendering vectors")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_verify() {
        let checked = verify_all_vectors().unwrap();
        assert_eq!(checked, all_vectors().len() + name_vectors().len());
    }

    #[test]
    fn test_vectors_are_deterministic() {
        for vector in all_vectors() {
            let again = vector.envelope.clone();
            assert_eq!(
                vector.envelope.canonical_bytes(),
                again.canonical_bytes(),
                "Vector '{}' produced different canonical bytes",
                vector.name
            );
            assert_eq!(vector.envelope.digest(), again.digest());
        }
    }

    #[test]
    fn test_vector_digests_are_distinct() {
        let vectors = all_vectors();
        for (i, a) in vectors.iter().enumerate() {
            for b in &vectors[i + 1..] {
                assert_ne!(a.envelope.digest(), b.envelope.digest(), "{} vs {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn test_actor_changes_bytes() {
        let vector = &all_vectors()[0];
        let mut other = vector.envelope.clone();
        other.actor = AccountId::from_bytes([0x43; 32]);
        assert_ne!(hex::encode(other.canonical_bytes()), vector.expected_hex);
    }

    #[test]
    fn test_vectors_json() {
        let json = vectors_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entries = parsed.as_array().unwrap();
        assert_eq!(entries.len(), all_vectors().len());
        assert_eq!(entries[1]["kind"], 0x0003);
        assert_eq!(entries[1]["canonical"], all_vectors()[1].expected_hex);
    }
}
