//! Proptest generators for property-based testing.

use proptest::prelude::*;

use quill_core::{
    AccountId, Amount, Event, EventEnvelope, Fingerprint, ItemId, NameHash, Timestamp, MAX_SIZE,
};

/// Generate a random AccountId.
pub fn account() -> impl Strategy<Value = AccountId> {
    any::<[u8; 32]>().prop_map(AccountId::from_bytes)
}

/// Generate a small pool of accounts, so collisions (repeat voters,
/// owner-as-editor) actually happen.
pub fn party() -> impl Strategy<Value = AccountId> {
    (0u8..4).prop_map(|i| AccountId::from_bytes([i; 32]))
}

/// Generate a valid ItemId.
pub fn item_id() -> impl Strategy<Value = ItemId> {
    (1u64..=u64::MAX).prop_map(|raw| ItemId::new(raw).unwrap_or(ItemId::FIRST))
}

/// Generate any amount, including ones above u64.
pub fn amount() -> impl Strategy<Value = Amount> {
    prop_oneof![Just(0), 1u128..1_000, any::<u128>()]
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = Timestamp> {
    0i64..=i64::MAX / 2
}

/// Generate content that passes validation against `max_len` bytes.
pub fn content(max_len: usize) -> impl Strategy<Value = String> {
    let max_len = max_len.clamp(4, MAX_SIZE);
    prop::collection::vec(any::<char>(), 1..=max_len).prop_map(move |chars| {
        let mut content = String::new();
        for c in chars {
            if content.len() + c.len_utf8() > max_len {
                break;
            }
            content.push(c);
        }
        content
    })
}

/// Generate a title; may be empty.
pub fn title() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ]{0,40}".prop_map(String::from)
}

/// Generate a vanity name with random case and padding.
pub fn vanity_name() -> impl Strategy<Value = String> {
    ("[a-z][a-z0-9-]{0,15}", any::<bool>(), 0usize..3).prop_map(|(base, upper, pad)| {
        let cased = if upper { base.to_uppercase() } else { base };
        format!("{}{}{}", " ".repeat(pad), cased, " ".repeat(pad))
    })
}

/// Generate any notification body.
pub fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        (item_id(), account(), account(), title(), content(64), amount()).prop_map(
            |(id, owner, author, title, content, donation)| Event::Created {
                id,
                owner,
                author,
                fingerprint: Fingerprint::of(content.as_bytes()),
                title,
                content,
                donation,
            }
        ),
        (item_id(), item_id(), account())
            .prop_map(|(id, parent, author)| Event::Replied { id, parent, author }),
        (item_id(), 1u64..1_000).prop_map(|(first_id, count)| Event::BatchCreated { first_id, count }),
        (item_id(), account(), content(64)).prop_map(|(id, editor, content)| Event::Edited {
            id,
            editor,
            fingerprint: Fingerprint::of(content.as_bytes()),
            content,
        }),
        (item_id(), "[a-z]{2,6}://[a-z0-9]{1,20}")
            .prop_map(|(id, reference)| Event::Attached { id, reference }),
        (item_id(), account()).prop_map(|(id, editor)| Event::EditorAdded { id, editor }),
        (item_id(), account()).prop_map(|(id, editor)| Event::EditorRemoved { id, editor }),
        (item_id(), vanity_name()).prop_map(|(id, name)| Event::NameClaimed {
            id,
            name_hash: NameHash::derive(&name),
            name,
        }),
        (item_id(), account(), any::<u64>())
            .prop_map(|(id, voter, total)| Event::Upvoted { id, voter, total }),
        (item_id(), account(), account(), amount())
            .prop_map(|(id, from, to, amount)| Event::Tipped { id, from, to, amount }),
        (account(), amount()).prop_map(|(to, amount)| Event::Withdrawn { to, amount }),
        (account(), amount()).prop_map(|(from, amount)| Event::DonationReceived { from, amount }),
    ]
}

/// Parameters for a publish call.
#[derive(Debug, Clone)]
pub struct PublishParams {
    pub author: AccountId,
    pub title: String,
    pub content: String,
    pub value: Amount,
    pub timestamp: Timestamp,
}

impl Arbitrary for PublishParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (party(), title(), content(256), 0u128..1_000_000, timestamp())
            .prop_map(|(author, title, content, value, timestamp)| PublishParams {
                author,
                title,
                content,
                value,
                timestamp,
            })
            .boxed()
    }
}

/// Wrap a generated event in an envelope.
pub fn envelope() -> impl Strategy<Value = EventEnvelope> {
    (timestamp(), account(), event())
        .prop_map(|(timestamp, actor, event)| EventEnvelope::new(timestamp, actor, event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{decode_event, normalize_name, validate_content, validate_name};

    use crate::fixtures::TestFixture;

    proptest! {
        #[test]
        fn test_generated_content_is_valid(content in content(128)) {
            prop_assert!(validate_content(&content, 128).is_ok());
        }

        #[test]
        fn test_vanity_names_collide_with_normal_form(name in vanity_name()) {
            prop_assert!(validate_name(&name).is_ok());
            prop_assert_eq!(NameHash::derive(&name), NameHash::derive(&normalize_name(&name)));
        }

        #[test]
        fn test_log_entries_decode(envelope in envelope()) {
            let bytes = envelope.canonical_bytes();
            let decoded = decode_event(&bytes).unwrap();
            prop_assert_eq!(decoded.digest(), envelope.digest());
            prop_assert_eq!(decoded, envelope);
        }

        #[test]
        fn test_published_item_matches_params(params: PublishParams) {
            let fixture = TestFixture::new();
            let ctx = quill_registry::CallContext::new(params.author, params.timestamp)
                .with_value(params.value);
            let id = fixture.registry.write(&ctx, &params.title, &params.content).unwrap();

            let view = fixture.registry.read_item(id).unwrap();
            prop_assert!(view.verify(params.content.as_bytes()));
            prop_assert_eq!(view.owner, params.author);
            prop_assert_eq!(view.created_at, params.timestamp);
            prop_assert_eq!(view.donation, params.value);
            prop_assert_eq!(fixture.registry.balance().unwrap(), params.value);
        }
    }
}
