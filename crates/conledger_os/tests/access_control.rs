#![forbid(unsafe_code)]

mod common;

use common::{actor, Harness};
use conledger_kernel_contracts::events::LedgerEventKind;
use conledger_kernel_contracts::MonotonicTimeNs;
use conledger_os::LedgerError;

#[test]
fn at_access_01_owner_is_first_provider_at_genesis() {
    let h = Harness::new();
    assert_eq!(h.ledger.owner(), &h.owner);
    assert!(h.ledger.is_provider(&h.owner));
    assert!(h.ledger.is_provider(&h.provider));
    assert!(!h.ledger.is_paused());
    assert_eq!(h.ledger.cooldown_ns(), 30_000_000_000);
    assert_eq!(h.event_names(), vec!["provider_added"]);
}

#[test]
fn at_access_02_non_owner_admin_calls_fail_without_side_effects() {
    let mut h = Harness::new();
    let t = h.tick();
    let provider = h.provider.clone();
    let before = h.ledger.events().len();

    assert_eq!(
        h.ledger.add_provider(&provider, t, actor("provider_b")),
        Err(LedgerError::NotOwner {
            actor: provider.clone(),
        })
    );
    assert!(matches!(
        h.ledger.set_paused(&provider, t, true),
        Err(LedgerError::NotOwner { .. })
    ));
    assert!(matches!(
        h.ledger.set_cooldown(&provider, t, 1),
        Err(LedgerError::NotOwner { .. })
    ));
    assert!(matches!(
        h.ledger.transfer_ownership(&provider, t, provider.clone()),
        Err(LedgerError::NotOwner { .. })
    ));
    assert!(matches!(
        h.ledger.open_batch(&provider, t),
        Err(LedgerError::NotOwner { .. })
    ));

    assert!(!h.ledger.is_provider(&actor("provider_b")));
    assert!(!h.ledger.is_paused());
    assert_eq!(h.ledger.owner(), &h.owner);
    assert_eq!(h.ledger.events().len(), before);
}

#[test]
fn at_access_03_add_and_remove_always_emit() {
    let mut h = Harness::new();
    let owner = h.owner.clone();
    let b = actor("provider_b");

    let t = h.tick();
    h.ledger.add_provider(&owner, t, b.clone()).unwrap();
    let t = h.tick();
    h.ledger.add_provider(&owner, t, b.clone()).unwrap();
    assert!(h.ledger.is_provider(&b));

    let t = h.tick();
    h.ledger.remove_provider(&owner, t, b.clone()).unwrap();
    let t = h.tick();
    h.ledger.remove_provider(&owner, t, b.clone()).unwrap();
    assert!(!h.ledger.is_provider(&b));

    assert_eq!(
        h.event_names(),
        vec![
            "provider_added",
            "provider_added",
            "provider_added",
            "provider_removed",
            "provider_removed"
        ]
    );
}

#[test]
fn at_access_04_transfer_moves_admin_rights() {
    let mut h = Harness::new();
    let old_owner = h.owner.clone();
    let new_owner = actor("insurer_successor");

    let t = h.tick();
    h.ledger
        .transfer_ownership(&old_owner, t, new_owner.clone())
        .unwrap();
    assert_eq!(h.ledger.owner(), &new_owner);
    assert_eq!(
        h.ledger.events().last().map(|e| &e.kind),
        Some(&LedgerEventKind::OwnershipTransferred {
            previous_owner: old_owner.clone(),
            new_owner: new_owner.clone(),
        })
    );

    let t = h.tick();
    assert!(matches!(
        h.ledger.open_batch(&old_owner, t),
        Err(LedgerError::NotOwner { .. })
    ));
    assert!(h.ledger.open_batch(&new_owner, t).is_ok());
}

#[test]
fn at_access_05_pause_blocks_lifecycle_and_submissions_not_admin() {
    let mut h = Harness::new();
    let owner = h.owner.clone();
    let provider = h.provider.clone();
    let b = h.open();

    let t = h.tick();
    h.ledger.set_paused(&owner, t, true).unwrap();
    assert!(h.ledger.is_paused());

    let submission = h.policy(b, 1, 1, 1);
    let t = h.tick();
    assert_eq!(h.ledger.open_batch(&owner, t), Err(LedgerError::Paused));
    assert_eq!(h.ledger.close_batch(&owner, t, b), Err(LedgerError::Paused));
    assert_eq!(
        h.ledger.submit_policy(&provider, t, submission),
        Err(LedgerError::Paused)
    );
    assert_eq!(
        h.ledger.request_batch_totals_decryption(&provider, t, b),
        Err(LedgerError::Paused)
    );

    h.ledger.set_cooldown(&owner, t, 5).unwrap();
    let provider_c = actor("provider_c");
    h.ledger.add_provider(&owner, t, provider_c).unwrap();
    h.ledger.set_paused(&owner, t, false).unwrap();

    let t = h.tick();
    assert_eq!(h.ledger.submit_policy(&provider, t, submission), Ok(0));
}

#[test]
fn at_access_06_zero_cooldown_is_rejected() {
    let mut h = Harness::new();
    let owner = h.owner.clone();
    let before = h.ledger.events().len();
    let t = h.tick();
    assert_eq!(
        h.ledger.set_cooldown(&owner, t, 0),
        Err(LedgerError::InvalidParameter {
            field: "cooldown_ns",
            reason: "must be > 0",
        })
    );
    assert_eq!(h.ledger.cooldown_ns(), 30_000_000_000);
    assert_eq!(h.ledger.events().len(), before);

    h.ledger.set_cooldown(&owner, t, 1_000).unwrap();
    assert_eq!(h.ledger.cooldown_ns(), 1_000);
    assert_eq!(
        h.ledger.events().last().map(|e| &e.kind),
        Some(&LedgerEventKind::CooldownSet { cooldown_ns: 1_000 })
    );
}

#[test]
fn at_access_07_submission_cooldown_boundary() {
    let mut h = Harness::new();
    let owner = h.owner.clone();
    let provider = h.provider.clone();
    let t = h.tick();
    h.ledger.set_cooldown(&owner, t, 100).unwrap();
    let b = h.open();

    let first = h.policy(b, 1, 1, 1);
    let second = h.policy(b, 2, 2, 2);
    let third = h.claim(b, 3, 0);
    let base = h.tick().0;

    h.ledger
        .submit_policy(&provider, MonotonicTimeNs(base), first)
        .unwrap();
    assert_eq!(
        h.ledger.last_submission_at(&provider),
        Some(MonotonicTimeNs(base))
    );
    let early = MonotonicTimeNs(base + 99);
    assert_eq!(
        h.ledger.submit_policy(&provider, early, second),
        Err(LedgerError::CooldownActive {
            actor: provider.clone(),
            ready_at: MonotonicTimeNs(base + 100),
        })
    );
    // Claims share the same submission stamp.
    assert!(matches!(
        h.ledger.submit_claim(&provider, MonotonicTimeNs(base + 50), third),
        Err(LedgerError::CooldownActive { .. })
    ));
    let ready = MonotonicTimeNs(base + 100);
    assert_eq!(
        h.ledger.submit_policy(&provider, ready, second),
        Ok(1)
    );
}

#[test]
fn at_access_08_decryption_cooldown_is_tracked_separately() {
    let mut h = Harness::new();
    let b = h.closed_reference_batch();
    let provider = h.provider.clone();

    let last_submit = h.ledger.last_submission_at(&provider).unwrap();
    assert_eq!(h.ledger.last_decryption_request_at(&provider), None);

    // A fresh submission stamp does not delay the first decryption request.
    let ticket = h
        .ledger
        .request_batch_totals_decryption(&provider, last_submit, b)
        .unwrap();
    assert_eq!(h.ledger.last_decryption_request_at(&provider), Some(last_submit));

    let cooldown = h.ledger.cooldown_ns();
    assert_eq!(
        h.ledger.request_batch_totals_decryption(
            &provider,
            MonotonicTimeNs(last_submit.0 + cooldown - 1),
            b
        ),
        Err(LedgerError::CooldownActive {
            actor: provider.clone(),
            ready_at: MonotonicTimeNs(last_submit.0 + cooldown),
        })
    );
    let context = h.ledger.decryption_context(ticket.request_id);
    assert_eq!(context.map(|c| c.batch_id), Some(b));
}

#[test]
fn at_access_09_removed_provider_cannot_submit() {
    let mut h = Harness::new();
    let owner = h.owner.clone();
    let provider = h.provider.clone();
    let b = h.open();
    let t = h.tick();
    h.ledger
        .remove_provider(&owner, t, provider.clone())
        .unwrap();

    let submission = h.claim(b, 10, 0);
    let t = h.tick();
    assert_eq!(
        h.ledger.submit_claim(&provider, t, submission),
        Err(LedgerError::NotProvider { actor: provider })
    );
    assert_eq!(h.ledger.claim_count(b), 0);
}
