#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use conledger_kernel_contracts::access::{AccessControlRecord, ActorId};
use conledger_kernel_contracts::batch::{
    BatchId, BatchRecord, ClaimRecord, ClaimRecordInput, PolicyRecord, PolicyRecordInput,
};
use conledger_kernel_contracts::decryption::{DecryptionContext, DecryptionRequestId};
use conledger_kernel_contracts::events::{LedgerEvent, LedgerEventId, LedgerEventInput};
use conledger_kernel_contracts::MonotonicTimeNs;

use crate::ledger::{LedgerStore, StorageError};

/// Typed repository interface for owner/provider/pause/cooldown state and
/// the per-actor rate-limit stamps.
pub trait AccessControlRepo {
    fn access_control_row(&self) -> &AccessControlRecord;
    fn set_owner_row(&mut self, owner: ActorId) -> Result<(), StorageError>;
    fn insert_provider_row(&mut self, provider: ActorId) -> Result<bool, StorageError>;
    fn remove_provider_row(&mut self, provider: &ActorId) -> bool;
    fn set_paused_row(&mut self, paused: bool);
    fn set_cooldown_row(&mut self, cooldown_ns: u64) -> Result<(), StorageError>;
    fn last_submission_row(&self, actor: &ActorId) -> Option<MonotonicTimeNs>;
    fn last_decryption_request_row(&self, actor: &ActorId) -> Option<MonotonicTimeNs>;
    fn stamp_submission_row(&mut self, actor: ActorId, now: MonotonicTimeNs);
    fn stamp_decryption_request_row(&mut self, actor: ActorId, now: MonotonicTimeNs);
}

/// Typed repository interface for batches and their append-only lists.
pub trait BatchLedgerRepo {
    fn append_batch_row(&mut self, opened_at: MonotonicTimeNs) -> Result<BatchId, StorageError>;
    fn close_batch_row(
        &mut self,
        batch_id: BatchId,
        closed_at: MonotonicTimeNs,
    ) -> Result<(), StorageError>;
    fn batch_row(&self, batch_id: BatchId) -> Option<&BatchRecord>;
    fn batch_rows(&self) -> &[BatchRecord];
    fn append_policy_row(&mut self, input: PolicyRecordInput) -> Result<u32, StorageError>;
    fn append_claim_row(&mut self, input: ClaimRecordInput) -> Result<u32, StorageError>;
    fn policy_rows(&self, batch_id: BatchId) -> &[PolicyRecord];
    fn claim_rows(&self, batch_id: BatchId) -> &[ClaimRecord];
    fn attempt_overwrite_policy_row(
        &mut self,
        batch_id: BatchId,
        index: u32,
    ) -> Result<(), StorageError>;
    fn attempt_overwrite_claim_row(
        &mut self,
        batch_id: BatchId,
        index: u32,
    ) -> Result<(), StorageError>;
}

/// Typed repository interface for pending/processed decryption contexts.
pub trait DecryptionContextRepo {
    fn insert_decryption_context_row(&mut self, ctx: DecryptionContext) -> Result<(), StorageError>;
    fn decryption_context_row(&self, request_id: DecryptionRequestId) -> Option<&DecryptionContext>;
    fn decryption_context_rows(&self) -> &BTreeMap<DecryptionRequestId, DecryptionContext>;
    fn mark_decryption_context_processed_row(
        &mut self,
        request_id: DecryptionRequestId,
        processed_at: MonotonicTimeNs,
    ) -> Result<(), StorageError>;
    fn attempt_delete_decryption_context_row(
        &mut self,
        request_id: DecryptionRequestId,
    ) -> Result<(), StorageError>;
}

/// Typed repository interface for the append-only notification log.
pub trait LedgerEventRepo {
    fn append_ledger_event_row(
        &mut self,
        input: LedgerEventInput,
    ) -> Result<LedgerEventId, StorageError>;
    fn ledger_event_rows(&self) -> &[LedgerEvent];
    fn attempt_overwrite_ledger_event_row(
        &mut self,
        event_id: LedgerEventId,
    ) -> Result<(), StorageError>;
}

impl AccessControlRepo for LedgerStore {
    fn access_control_row(&self) -> &AccessControlRecord {
        self.access_control()
    }

    fn set_owner_row(&mut self, owner: ActorId) -> Result<(), StorageError> {
        self.set_owner(owner)
    }

    fn insert_provider_row(&mut self, provider: ActorId) -> Result<bool, StorageError> {
        self.insert_provider(provider)
    }

    fn remove_provider_row(&mut self, provider: &ActorId) -> bool {
        self.remove_provider(provider)
    }

    fn set_paused_row(&mut self, paused: bool) {
        self.set_paused(paused)
    }

    fn set_cooldown_row(&mut self, cooldown_ns: u64) -> Result<(), StorageError> {
        self.set_cooldown_ns(cooldown_ns)
    }

    fn last_submission_row(&self, actor: &ActorId) -> Option<MonotonicTimeNs> {
        self.last_submission_at(actor)
    }

    fn last_decryption_request_row(&self, actor: &ActorId) -> Option<MonotonicTimeNs> {
        self.last_decryption_request_at(actor)
    }

    fn stamp_submission_row(&mut self, actor: ActorId, now: MonotonicTimeNs) {
        self.stamp_last_submission(actor, now)
    }

    fn stamp_decryption_request_row(&mut self, actor: ActorId, now: MonotonicTimeNs) {
        self.stamp_last_decryption_request(actor, now)
    }
}

impl BatchLedgerRepo for LedgerStore {
    fn append_batch_row(&mut self, opened_at: MonotonicTimeNs) -> Result<BatchId, StorageError> {
        self.append_batch(opened_at)
    }

    fn close_batch_row(
        &mut self,
        batch_id: BatchId,
        closed_at: MonotonicTimeNs,
    ) -> Result<(), StorageError> {
        LedgerStore::close_batch_row(self, batch_id, closed_at)
    }

    fn batch_row(&self, batch_id: BatchId) -> Option<&BatchRecord> {
        LedgerStore::batch_row(self, batch_id)
    }

    fn batch_rows(&self) -> &[BatchRecord] {
        LedgerStore::batch_rows(self)
    }

    fn append_policy_row(&mut self, input: PolicyRecordInput) -> Result<u32, StorageError> {
        LedgerStore::append_policy_row(self, input)
    }

    fn append_claim_row(&mut self, input: ClaimRecordInput) -> Result<u32, StorageError> {
        LedgerStore::append_claim_row(self, input)
    }

    fn policy_rows(&self, batch_id: BatchId) -> &[PolicyRecord] {
        LedgerStore::policy_rows(self, batch_id)
    }

    fn claim_rows(&self, batch_id: BatchId) -> &[ClaimRecord] {
        LedgerStore::claim_rows(self, batch_id)
    }

    fn attempt_overwrite_policy_row(
        &mut self,
        batch_id: BatchId,
        index: u32,
    ) -> Result<(), StorageError> {
        LedgerStore::attempt_overwrite_policy_row(self, batch_id, index)
    }

    fn attempt_overwrite_claim_row(
        &mut self,
        batch_id: BatchId,
        index: u32,
    ) -> Result<(), StorageError> {
        LedgerStore::attempt_overwrite_claim_row(self, batch_id, index)
    }
}

impl DecryptionContextRepo for LedgerStore {
    fn insert_decryption_context_row(
        &mut self,
        ctx: DecryptionContext,
    ) -> Result<(), StorageError> {
        self.insert_decryption_context(ctx)
    }

    fn decryption_context_row(
        &self,
        request_id: DecryptionRequestId,
    ) -> Option<&DecryptionContext> {
        self.decryption_context(request_id)
    }

    fn decryption_context_rows(&self) -> &BTreeMap<DecryptionRequestId, DecryptionContext> {
        self.decryption_contexts()
    }

    fn mark_decryption_context_processed_row(
        &mut self,
        request_id: DecryptionRequestId,
        processed_at: MonotonicTimeNs,
    ) -> Result<(), StorageError> {
        self.mark_decryption_context_processed(request_id, processed_at)
    }

    fn attempt_delete_decryption_context_row(
        &mut self,
        request_id: DecryptionRequestId,
    ) -> Result<(), StorageError> {
        self.attempt_delete_decryption_context(request_id)
    }
}

impl LedgerEventRepo for LedgerStore {
    fn append_ledger_event_row(
        &mut self,
        input: LedgerEventInput,
    ) -> Result<LedgerEventId, StorageError> {
        self.append_ledger_event(input)
    }

    fn ledger_event_rows(&self) -> &[LedgerEvent] {
        self.ledger_events()
    }

    fn attempt_overwrite_ledger_event_row(
        &mut self,
        event_id: LedgerEventId,
    ) -> Result<(), StorageError> {
        self.attempt_overwrite_ledger_event(event_id)
    }
}
