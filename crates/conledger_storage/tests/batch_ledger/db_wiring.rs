#![forbid(unsafe_code)]

use conledger_kernel_contracts::access::{AccessControlRecord, ActorId};
use conledger_kernel_contracts::batch::{
    BatchId, ClaimRecordInput, ClaimSubmission, PolicyRecordInput, PolicySubmission,
};
use conledger_kernel_contracts::fhe::Ciphertext;
use conledger_kernel_contracts::MonotonicTimeNs;
use conledger_storage::ledger::{LedgerStore, StorageError};
use conledger_storage::repo::BatchLedgerRepo;

fn provider() -> ActorId {
    ActorId::new("provider_a").unwrap()
}

fn store() -> LedgerStore {
    let owner = ActorId::new("insurer_root").unwrap();
    LedgerStore::new_in_memory(AccessControlRecord::v1(owner, 30).unwrap()).unwrap()
}

fn ct(b: u8) -> Ciphertext {
    Ciphertext::from_raw([b; 32])
}

fn policy(t: u64, batch_id: BatchId, tag: u8) -> PolicyRecordInput {
    PolicyRecordInput::v1(
        MonotonicTimeNs(t),
        provider(),
        PolicySubmission {
            batch_id,
            coverage: ct(tag),
            risk_factor: ct(tag.wrapping_add(1)),
            premium: ct(tag.wrapping_add(2)),
        },
    )
    .unwrap()
}

fn claim(t: u64, batch_id: BatchId, tag: u8) -> ClaimRecordInput {
    ClaimRecordInput::v1(
        MonotonicTimeNs(t),
        provider(),
        ClaimSubmission {
            batch_id,
            claim_amount: ct(tag),
            policy_ref: ct(tag.wrapping_add(1)),
        },
    )
    .unwrap()
}

#[test]
fn at_batch_db_01_batches_are_dense_and_start_open() {
    let mut s = store();
    let b1 = s.append_batch_row(MonotonicTimeNs(10)).unwrap();
    let b2 = s.append_batch_row(MonotonicTimeNs(11)).unwrap();
    assert_eq!((b1, b2), (BatchId(1), BatchId(2)));
    assert!(s.batch_rows().iter().all(|b| b.open));
    assert!(s.batch_row(BatchId(0)).is_none());
}

#[test]
fn at_batch_db_02_close_is_one_way() {
    let mut s = store();
    let b = s.append_batch_row(MonotonicTimeNs(10)).unwrap();
    s.close_batch_row(b, MonotonicTimeNs(20)).unwrap();
    let row = s.batch_row(b).unwrap();
    assert!(!row.open);
    assert_eq!(row.closed_at, Some(MonotonicTimeNs(20)));

    assert!(matches!(
        s.close_batch_row(b, MonotonicTimeNs(21)),
        Err(StorageError::StateTransitionViolation {
            table: "batches.open",
            ..
        })
    ));
    assert_eq!(s.batch_row(b).unwrap().closed_at, Some(MonotonicTimeNs(20)));
}

#[test]
fn at_batch_db_03_unknown_batch_is_foreign_key_violation() {
    let mut s = store();
    assert!(matches!(
        s.close_batch_row(BatchId(1), MonotonicTimeNs(5)),
        Err(StorageError::ForeignKeyViolation { .. })
    ));
    assert!(matches!(
        s.append_claim_row(claim(5, BatchId(1), 9)),
        Err(StorageError::ForeignKeyViolation {
            table: "claims.batch_id",
            ..
        })
    ));
}

#[test]
fn at_batch_db_04_lists_keep_insertion_order_per_batch() {
    let mut s = store();
    let b1 = s.append_batch_row(MonotonicTimeNs(1)).unwrap();
    let b2 = s.append_batch_row(MonotonicTimeNs(2)).unwrap();

    assert_eq!(s.append_policy_row(policy(3, b1, 10)).unwrap(), 0);
    assert_eq!(s.append_policy_row(policy(4, b2, 20)).unwrap(), 0);
    assert_eq!(s.append_policy_row(policy(5, b1, 30)).unwrap(), 1);
    assert_eq!(s.append_claim_row(claim(6, b1, 40)).unwrap(), 0);

    let rows = s.policy_rows(b1);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].coverage, ct(10));
    assert_eq!(rows[1].coverage, ct(30));
    assert_eq!(rows[1].index, 1);
    assert_eq!(s.policy_rows(b2).len(), 1);
    assert_eq!(s.claim_rows(b1)[0].claim_amount, ct(40));
    assert!(s.claim_rows(b2).is_empty());
}

#[test]
fn at_batch_db_05_append_only_enforced() {
    let mut s = store();
    let b = s.append_batch_row(MonotonicTimeNs(1)).unwrap();
    let p = s.append_policy_row(policy(2, b, 1)).unwrap();
    let c = s.append_claim_row(claim(3, b, 2)).unwrap();
    assert!(matches!(
        s.attempt_overwrite_policy_row(b, p),
        Err(StorageError::AppendOnlyViolation { table: "policies" })
    ));
    assert!(matches!(
        s.attempt_overwrite_claim_row(b, c),
        Err(StorageError::AppendOnlyViolation { table: "claims" })
    ));
}
