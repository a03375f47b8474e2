//! End-to-end behavior of registry operations over the in-memory store.

mod common;

use common::*;
use quill_registry::{ErrorKind, Event, EventKind, Fingerprint, ItemId, RegistryError};

fn id(raw: u64) -> ItemId {
    ItemId::new(raw).unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Creation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_write_returns_pre_call_counter() {
    let registry = registry();

    for expected in 1..=3 {
        let before = registry.next_id().unwrap();
        let created = registry.write(&call(ALICE), "title", "body").unwrap();
        assert_eq!(created, before);
        assert_eq!(created.get(), expected);
        assert_eq!(registry.next_id().unwrap().get(), expected + 1);
    }
}

#[test]
fn test_round_trip_fingerprint() {
    let registry = registry();
    let content = "a fairly long body ".repeat(100);
    let item = registry.write(&paid(ALICE, 5), "t", &content).unwrap();

    let view = registry.read_item(item).unwrap();
    assert_eq!(view.fingerprint, Fingerprint::of(content.as_bytes()));
    assert_eq!(view.owner, account(ALICE));
    assert_eq!(view.author, account(ALICE));
    assert_eq!(view.donation, 5);
    assert_eq!(view.created_at, 1_700_000_000_000);
    assert_eq!(view.upvotes, 0);
    assert_eq!(view.attachment, None);
}

#[test]
fn test_created_notification_carries_full_payload() {
    let registry = registry();
    registry.write(&paid(ALICE, 3), "Hello", "World").unwrap();

    let envelope = registry.sink().last().unwrap();
    assert_eq!(envelope.actor, account(ALICE));
    match envelope.event {
        Event::Created {
            title,
            content,
            fingerprint,
            donation,
            ..
        } => {
            assert_eq!(title, "Hello");
            assert_eq!(content, "World");
            assert_eq!(fingerprint, Fingerprint::of(b"World"));
            assert_eq!(donation, 3);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_empty_and_oversized_content_rejected() {
    let registry = registry();

    let empty = registry.write(&call(ALICE), "t", "").unwrap_err();
    assert_eq!(empty.kind(), ErrorKind::InvalidInput);

    let big = "x".repeat(quill_registry::MAX_SIZE + 1);
    let oversized = registry.write(&call(ALICE), "t", &big).unwrap_err();
    assert_eq!(oversized.kind(), ErrorKind::InvalidInput);

    let exact = "x".repeat(quill_registry::MAX_SIZE);
    registry.write(&call(ALICE), "", &exact).unwrap();

    assert_eq!(registry.next_id().unwrap().get(), 2);
}

#[test]
fn test_title_length_is_unbounded() {
    let registry = registry();
    let title = "t".repeat(quill_registry::MAX_SIZE + 1);

    let single = registry.write(&call(ALICE), &title, "valid content").unwrap();
    let batch = registry
        .write_many(&call(ALICE), &[title.as_str(), ""], &["one", "two"])
        .unwrap();

    assert_eq!(single, id(1));
    assert_eq!(batch, vec![id(2), id(3)]);
    assert!(matches!(
        &registry.sink().events()[0].event,
        Event::Created { title: logged, .. } if *logged == title
    ));
}

#[test]
fn test_reply_belongs_to_thread_owner() {
    let registry = registry();
    let thread = registry.write(&call(ALICE), "thread", "op").unwrap();
    registry.sink().clear();

    let reply = registry.reply(&paid(BOB, 4), thread, "re: op").unwrap();

    let view = registry.read_item(reply).unwrap();
    assert_eq!(view.owner, account(ALICE));
    assert_eq!(view.author, account(BOB));
    assert_eq!(view.donation, 4);

    assert_eq!(
        registry.sink().kinds(),
        vec![EventKind::Created, EventKind::Replied]
    );
    let events = registry.sink().events();
    assert!(matches!(&events[0].event, Event::Created { title, .. } if title.is_empty()));
    assert!(matches!(events[1].event, Event::Replied { parent, .. } if parent == thread));
}

#[test]
fn test_reply_to_missing_parent() {
    let registry = registry();
    let err = registry.reply(&call(BOB), id(42), "orphan").unwrap_err();

    assert!(matches!(err, RegistryError::ItemNotFound(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(registry.next_id().unwrap(), ItemId::FIRST);
}

#[test]
fn test_write_many_splits_value() {
    let registry = registry();
    let ids = registry
        .write_many(&paid(ALICE, 10), &["a", "b", "c"], &["x", "y", "z"])
        .unwrap();

    assert_eq!(ids, vec![id(1), id(2), id(3)]);
    assert_eq!(registry.next_id().unwrap().get(), 4);
    for item in &ids {
        assert_eq!(registry.read_item(*item).unwrap().donation, 3);
    }

    // Remainder stays pooled with the rest.
    assert_eq!(registry.balance().unwrap(), 10);
    assert_eq!(registry.total_donations().unwrap(), 10);

    let kinds = registry.sink().kinds();
    assert_eq!(
        kinds,
        vec![
            EventKind::Created,
            EventKind::Created,
            EventKind::Created,
            EventKind::BatchCreated
        ]
    );
    assert!(matches!(
        registry.sink().last().unwrap().event,
        Event::BatchCreated { first_id, count: 3 } if first_id == id(1)
    ));
}

#[test]
fn test_write_many_length_mismatch() {
    let registry = registry();
    let err = registry
        .write_many(&call(ALICE), &["a", "b"], &["x"])
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(registry.next_id().unwrap(), ItemId::FIRST);
    assert!(registry.sink().is_empty());
}

#[test]
fn test_write_many_bad_element_creates_nothing() {
    let registry = registry();
    let err = registry
        .write_many(&paid(ALICE, 9), &["a", "b", "c"], &["x", "", "z"])
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(registry.next_id().unwrap(), ItemId::FIRST);
    assert_eq!(registry.balance().unwrap(), 0);

    let empty: [&str; 0] = [];
    let err = registry.write_many(&call(ALICE), &empty, &empty).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// ─────────────────────────────────────────────────────────────────────────────
// Permissions
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_edit_by_owner_and_editor() {
    let registry = registry_with_items(1);

    let first = registry.edit(&call(ALICE), id(1), "v2").unwrap();
    assert_eq!(first, Fingerprint::of(b"v2"));
    assert_ne!(first, Fingerprint::of(b"item 1"));

    registry.add_editor(&call(ALICE), id(1), account(BOB)).unwrap();
    assert!(registry.is_editor(id(1), &account(BOB)).unwrap());

    let second = registry.edit(&call(BOB), id(1), "v3").unwrap();
    let view = registry.read_item(id(1)).unwrap();
    assert_eq!(view.fingerprint, second);
    assert_eq!(view.fingerprint, Fingerprint::of(b"v3"));
    assert_eq!(view.owner, account(ALICE));
    assert_eq!(view.author, account(ALICE));
}

#[test]
fn test_removed_editor_loses_access() {
    let registry = registry_with_items(1);
    registry.add_editor(&call(ALICE), id(1), account(BOB)).unwrap();
    registry.remove_editor(&call(ALICE), id(1), account(BOB)).unwrap();

    let err = registry.edit(&call(BOB), id(1), "nope").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn test_editor_toggles_are_idempotent_and_notify() {
    let registry = registry_with_items(1);

    registry.add_editor(&call(ALICE), id(1), account(BOB)).unwrap();
    registry.add_editor(&call(ALICE), id(1), account(BOB)).unwrap();
    assert_eq!(registry.editors(id(1)).unwrap(), vec![account(BOB)]);

    registry.remove_editor(&call(ALICE), id(1), account(CAROL)).unwrap();
    registry.remove_editor(&call(ALICE), id(1), account(BOB)).unwrap();
    registry.remove_editor(&call(ALICE), id(1), account(BOB)).unwrap();
    assert!(registry.editors(id(1)).unwrap().is_empty());

    assert_eq!(
        registry.sink().kinds(),
        vec![
            EventKind::EditorAdded,
            EventKind::EditorAdded,
            EventKind::EditorRemoved,
            EventKind::EditorRemoved,
            EventKind::EditorRemoved
        ]
    );
}

#[test]
fn test_stranger_rejected_without_state_change() {
    let registry = registry_with_items(1);
    let before = registry.read_item(id(1)).unwrap();

    let attempts = [
        registry.edit(&call(MALLORY), id(1), "pwned").map(|_| ()),
        registry.add_editor(&call(MALLORY), id(1), account(MALLORY)),
        registry.remove_editor(&call(MALLORY), id(1), account(ALICE)),
        registry.claim_name(&call(MALLORY), id(1), "alice").map(|_| ()),
        registry.attach(&call(MALLORY), id(1), "ipfs://evil"),
    ];
    for attempt in attempts {
        assert_eq!(attempt.unwrap_err().kind(), ErrorKind::Unauthorized);
    }

    assert_eq!(registry.read_item(id(1)).unwrap(), before);
    assert!(registry.editors(id(1)).unwrap().is_empty());
    assert_eq!(registry.resolve_name("alice").unwrap(), None);
    assert!(registry.sink().is_empty());
}

#[test]
fn test_editor_cannot_manage_editors_or_claim() {
    let registry = registry_with_items(1);
    registry.add_editor(&call(ALICE), id(1), account(BOB)).unwrap();

    let add = registry.add_editor(&call(BOB), id(1), account(CAROL));
    assert_eq!(add.unwrap_err().kind(), ErrorKind::Unauthorized);

    let claim = registry.claim_name(&call(BOB), id(1), "bob");
    assert_eq!(claim.unwrap_err().kind(), ErrorKind::Unauthorized);
}

#[test]
fn test_mutations_on_missing_item() {
    let registry = registry();
    let missing = id(7);

    assert_eq!(
        registry.edit(&call(ALICE), missing, "x").unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        registry.upvote(&call(ALICE), missing).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        registry.read_item(missing).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        registry
            .attach(&call(ALICE), missing, "ref")
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Attachments
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_attach_by_reply_author() {
    let registry = registry_with_items(1);
    let reply = registry.reply(&call(BOB), id(1), "hi").unwrap();

    // Bob authored the reply but Alice owns it; both may attach.
    registry.attach(&call(BOB), reply, "ar://one").unwrap();
    registry.attach(&call(ALICE), reply, "ar://two").unwrap();
    assert_eq!(
        registry.read_item(reply).unwrap().attachment.as_deref(),
        Some("ar://two")
    );

    // Authorship of the reply grants nothing on the parent.
    let err = registry.attach(&call(BOB), id(1), "ar://x").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    // And authorship alone never grants edit.
    let err = registry.edit(&call(BOB), reply, "rewrite").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[test]
fn test_attach_rejects_empty_reference() {
    let registry = registry_with_items(1);
    let err = registry.attach(&call(ALICE), id(1), "").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(registry.read_item(id(1)).unwrap().attachment, None);
}

// ─────────────────────────────────────────────────────────────────────────────
// Names
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_first_name_claim_wins() {
    let registry = registry_with_items(2);
    registry.claim_name(&call(ALICE), id(1), "Quill").unwrap();

    let err = registry.claim_name(&call(ALICE), id(2), "quill").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(registry.resolve_name("QUILL ").unwrap(), Some(id(1)));
}

#[test]
fn test_name_claim_notifies_raw_and_hash() {
    let registry = registry_with_items(1);
    let hash = registry.claim_name(&call(ALICE), id(1), " Alice ").unwrap();

    match registry.sink().last().unwrap().event {
        Event::NameClaimed {
            id: claimed,
            name,
            name_hash,
        } => {
            assert_eq!(claimed, id(1));
            assert_eq!(name, " Alice ");
            assert_eq!(name_hash, hash);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_unclaimed_and_blank_names() {
    let registry = registry_with_items(1);
    assert_eq!(registry.resolve_name("nobody").unwrap(), None);

    let err = registry.claim_name(&call(ALICE), id(1), "  ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// ─────────────────────────────────────────────────────────────────────────────
// Votes
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_double_upvote_conflicts() {
    let registry = registry_with_items(1);

    assert_eq!(registry.upvote(&call(BOB), id(1)).unwrap(), 1);
    let err = registry.upvote(&call(BOB), id(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert_eq!(registry.read_item(id(1)).unwrap().upvotes, 1);
    assert!(registry.has_voted(id(1), &account(BOB)).unwrap());
    assert!(!registry.has_voted(id(1), &account(CAROL)).unwrap());

    assert_eq!(registry.upvote(&call(CAROL), id(1)).unwrap(), 2);
    assert!(matches!(
        registry.sink().last().unwrap().event,
        Event::Upvoted { total: 2, .. }
    ));
}

#[test]
fn test_owner_may_upvote_own_item() {
    let registry = registry_with_items(1);
    assert_eq!(registry.upvote(&call(ALICE), id(1)).unwrap(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Treasury
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_tip_pays_owner_not_treasury() {
    let registry = registry_with_items(1);
    let reply = registry.reply(&call(BOB), id(1), "re").unwrap();
    registry.sink().clear();

    registry.tip(&paid(CAROL, 25), reply).unwrap();

    // The reply's owner is the thread owner.
    assert_eq!(registry.ledger().credited(&account(ALICE)), 25);
    assert_eq!(registry.ledger().credited(&account(BOB)), 0);
    assert_eq!(registry.balance().unwrap(), 0);
    assert_eq!(registry.total_donations().unwrap(), 0);
    assert_eq!(registry.read_item(reply).unwrap().donation, 0);

    match registry.sink().last().unwrap().event {
        Event::Tipped {
            from, to, amount, ..
        } => {
            assert_eq!(from, account(CAROL));
            assert_eq!(to, account(ALICE));
            assert_eq!(amount, 25);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[test]
fn test_tip_requires_value_and_item() {
    let registry = registry_with_items(1);

    let err = registry.tip(&call(BOB), id(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = registry.tip(&paid(BOB, 1), id(9)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(registry.sink().is_empty());
}

#[test]
fn test_failed_tip_leaves_no_trace() {
    let registry = registry_with_items(1);
    registry.ledger().reject(account(ALICE));

    let err = registry.tip(&paid(BOB, 5), id(1)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransferFailed);
    assert!(registry.sink().is_empty());

    // The guard was released on the error path.
    registry.ledger().accept(&account(ALICE));
    registry.tip(&paid(BOB, 5), id(1)).unwrap();
    assert_eq!(registry.ledger().credited(&account(ALICE)), 5);
}

#[test]
fn test_withdraw_pays_beneficiary() {
    let registry = registry();
    registry.write(&paid(ALICE, 40), "", "x").unwrap();
    registry.receive(&paid(BOB, 2)).unwrap();
    assert_eq!(registry.balance().unwrap(), 42);
    assert_eq!(registry.total_donations().unwrap(), 42);

    let sent = registry.withdraw(&call(TREASURY)).unwrap();
    assert_eq!(sent, 42);
    assert_eq!(registry.ledger().credited(&account(TREASURY)), 42);
    assert_eq!(registry.balance().unwrap(), 0);
    assert_eq!(registry.total_donations().unwrap(), 42);
    assert_eq!(registry.sink().last().unwrap().kind(), EventKind::Withdrawn);
}

#[test]
fn test_withdraw_rules() {
    let registry = registry();

    let err = registry.withdraw(&call(TREASURY)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    registry.receive(&paid(BOB, 7)).unwrap();
    let err = registry.withdraw(&call(MALLORY)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert_eq!(registry.balance().unwrap(), 7);
}

#[test]
fn test_failed_withdraw_restores_balance() {
    let registry = registry();
    registry.receive(&paid(BOB, 11)).unwrap();
    registry.ledger().reject(account(TREASURY));
    registry.sink().clear();

    let err = registry.withdraw(&call(TREASURY)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransferFailed);
    assert_eq!(registry.balance().unwrap(), 11);
    assert_eq!(registry.total_donations().unwrap(), 11);
    assert!(registry.sink().is_empty());

    registry.ledger().accept(&account(TREASURY));
    assert_eq!(registry.withdraw(&call(TREASURY)).unwrap(), 11);
}

// ─────────────────────────────────────────────────────────────────────────────
// Reads
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_list_ids_in_range() {
    let registry = registry_with_items(10);
    let all: Vec<ItemId> = (1..=10).map(id).collect();

    assert!(registry.list_ids_in_range(5, 3).unwrap().is_empty());
    assert_eq!(registry.list_ids_in_range(0, 100).unwrap(), all);
    assert!(registry.list_ids_in_range(11, 20).unwrap().is_empty());
    assert_eq!(
        registry.list_ids_in_range(3, 5).unwrap(),
        vec![id(3), id(4), id(5)]
    );
    assert_eq!(registry.list_ids_in_range(10, 10).unwrap(), vec![id(10)]);
    assert!(registry.list_ids_in_range(0, 0).unwrap().is_empty());
    assert_eq!(
        registry.list_ids_in_range(0, u64::MAX).unwrap().len(),
        10
    );
}

#[test]
fn test_list_on_empty_registry() {
    let registry = registry();
    assert!(registry.list_ids_in_range(0, 100).unwrap().is_empty());
}

#[test]
fn test_notifications_are_stamped_with_call_context() {
    let registry = registry();
    let ctx = quill_registry::CallContext::new(account(CAROL), 99);
    registry.write(&ctx, "", "stamped").unwrap();

    let envelope = registry.sink().last().unwrap();
    assert_eq!(envelope.timestamp, 99);
    assert_eq!(envelope.actor, account(CAROL));
    assert_eq!(envelope.event.item_id(), Some(id(1)));
}
