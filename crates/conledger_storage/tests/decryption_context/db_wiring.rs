#![forbid(unsafe_code)]

use conledger_kernel_contracts::access::{AccessControlRecord, ActorId};
use conledger_kernel_contracts::batch::BatchId;
use conledger_kernel_contracts::decryption::{DecryptionContext, DecryptionRequestId, StateHash};
use conledger_kernel_contracts::events::{LedgerEventId, LedgerEventInput, LedgerEventKind};
use conledger_kernel_contracts::MonotonicTimeNs;
use conledger_storage::ledger::{LedgerStore, StorageError};
use conledger_storage::repo::{BatchLedgerRepo, DecryptionContextRepo, LedgerEventRepo};

fn store_with_batch() -> (LedgerStore, BatchId) {
    let owner = ActorId::new("insurer_root").unwrap();
    let mut s = LedgerStore::new_in_memory(AccessControlRecord::v1(owner, 30).unwrap()).unwrap();
    let b = s.append_batch_row(MonotonicTimeNs(1)).unwrap();
    (s, b)
}

fn pending(id: u64, batch_id: BatchId) -> DecryptionContext {
    DecryptionContext::pending_v1(
        DecryptionRequestId(id),
        batch_id,
        StateHash([id as u8; 32]),
        MonotonicTimeNs(10),
    )
    .unwrap()
}

#[test]
fn at_decrypt_db_01_one_context_per_request_id() {
    let (mut s, b) = store_with_batch();
    s.insert_decryption_context_row(pending(7, b)).unwrap();
    assert!(matches!(
        s.insert_decryption_context_row(pending(7, b)),
        Err(StorageError::DuplicateKey {
            table: "decryption_contexts.request_id",
            ..
        })
    ));
    assert_eq!(s.decryption_context_rows().len(), 1);
}

#[test]
fn at_decrypt_db_02_context_requires_existing_batch() {
    let (mut s, _) = store_with_batch();
    assert!(matches!(
        s.insert_decryption_context_row(pending(1, BatchId(9))),
        Err(StorageError::ForeignKeyViolation { .. })
    ));
}

#[test]
fn at_decrypt_db_03_processed_flip_happens_once() {
    let (mut s, b) = store_with_batch();
    let id = DecryptionRequestId(3);
    s.insert_decryption_context_row(pending(3, b)).unwrap();
    s.mark_decryption_context_processed_row(id, MonotonicTimeNs(20)).unwrap();
    let row = s.decryption_context_row(id).unwrap();
    assert!(row.processed);
    assert_eq!(row.processed_at, Some(MonotonicTimeNs(20)));

    assert!(matches!(
        s.mark_decryption_context_processed_row(id, MonotonicTimeNs(21)),
        Err(StorageError::StateTransitionViolation { .. })
    ));
    let processed_at = s.decryption_context_row(id).unwrap().processed_at;
    assert_eq!(processed_at, Some(MonotonicTimeNs(20)));
    assert!(matches!(
        s.mark_decryption_context_processed_row(DecryptionRequestId(4), MonotonicTimeNs(21)),
        Err(StorageError::ForeignKeyViolation { .. })
    ));
}

#[test]
fn at_decrypt_db_04_contexts_are_never_deleted() {
    let (mut s, b) = store_with_batch();
    s.insert_decryption_context_row(pending(5, b)).unwrap();
    assert!(matches!(
        s.attempt_delete_decryption_context_row(DecryptionRequestId(5)),
        Err(StorageError::AppendOnlyViolation { .. })
    ));
    assert!(s.decryption_context_row(DecryptionRequestId(5)).is_some());
}

#[test]
fn at_decrypt_db_05_event_log_is_dense_and_append_only() {
    let (mut s, b) = store_with_batch();
    let opened = LedgerEventKind::BatchOpened { batch_id: b };
    let closed = LedgerEventKind::BatchClosed { batch_id: b };
    let e1 = s
        .append_ledger_event_row(LedgerEventInput::v1(MonotonicTimeNs(1), opened).unwrap())
        .unwrap();
    let e2 = s
        .append_ledger_event_row(LedgerEventInput::v1(MonotonicTimeNs(2), closed).unwrap())
        .unwrap();
    assert_eq!((e1, e2), (LedgerEventId(1), LedgerEventId(2)));
    assert_eq!(s.ledger_event_rows().len(), 2);
    assert!(matches!(
        s.attempt_overwrite_ledger_event_row(e1),
        Err(StorageError::AppendOnlyViolation {
            table: "ledger_events",
        })
    ));
}
