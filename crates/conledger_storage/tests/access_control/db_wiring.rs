#![forbid(unsafe_code)]

use conledger_kernel_contracts::access::{AccessControlRecord, ActorId};
use conledger_kernel_contracts::MonotonicTimeNs;
use conledger_storage::ledger::{LedgerStore, StorageError};
use conledger_storage::repo::AccessControlRepo;

fn actor(id: &str) -> ActorId {
    ActorId::new(id).unwrap()
}

fn store(owner: &str, cooldown_ns: u64) -> LedgerStore {
    let access = AccessControlRecord::v1(actor(owner), cooldown_ns).unwrap();
    LedgerStore::new_in_memory(access).unwrap()
}

#[test]
fn at_access_db_01_genesis_owner_is_provider() {
    let s = store("insurer_root", 30);
    let row = s.access_control_row();
    assert_eq!(row.owner, actor("insurer_root"));
    assert!(row.is_provider(&actor("insurer_root")));
    assert_eq!(row.cooldown_ns, 30);
    assert!(!row.paused);
}

#[test]
fn at_access_db_02_provider_set_is_idempotent() {
    let mut s = store("insurer_root", 30);
    assert!(s.insert_provider_row(actor("provider_a")).unwrap());
    assert!(!s.insert_provider_row(actor("provider_a")).unwrap());
    assert!(s.remove_provider_row(&actor("provider_a")));
    assert!(!s.remove_provider_row(&actor("provider_a")));
    assert!(!s.access_control_row().is_provider(&actor("provider_a")));
}

#[test]
fn at_access_db_03_zero_cooldown_rejected_and_state_kept() {
    let mut s = store("insurer_root", 30);
    assert!(matches!(
        s.set_cooldown_row(0),
        Err(StorageError::ContractViolation(_))
    ));
    assert_eq!(s.access_control_row().cooldown_ns, 30);
    s.set_cooldown_row(45).unwrap();
    assert_eq!(s.access_control_row().cooldown_ns, 45);
}

#[test]
fn at_access_db_04_rate_limit_stamps_are_per_actor_and_per_kind() {
    let mut s = store("insurer_root", 30);
    let a = actor("provider_a");
    let b = actor("provider_b");
    s.stamp_submission_row(a.clone(), MonotonicTimeNs(100));
    s.stamp_decryption_request_row(b.clone(), MonotonicTimeNs(200));

    assert_eq!(s.last_submission_row(&a), Some(MonotonicTimeNs(100)));
    assert_eq!(s.last_decryption_request_row(&a), None);
    assert_eq!(s.last_submission_row(&b), None);
    assert_eq!(s.last_decryption_request_row(&b), Some(MonotonicTimeNs(200)));

    s.stamp_submission_row(a.clone(), MonotonicTimeNs(90));
    assert_eq!(s.last_submission_row(&a), Some(MonotonicTimeNs(100)));
}

#[test]
fn at_access_db_05_owner_transfer_and_pause() {
    let mut s = store("insurer_root", 30);
    s.set_owner_row(actor("insurer_next")).unwrap();
    s.set_paused_row(true);
    let row = s.access_control_row();
    assert_eq!(row.owner, actor("insurer_next"));
    assert!(row.paused);
}
