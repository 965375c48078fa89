#![forbid(unsafe_code)]

use conledger_kernel_contracts::access::ActorId;
use conledger_kernel_contracts::batch::{
    BatchId, ClaimRecordInput, ClaimSubmission, PolicyRecordInput, PolicySubmission,
};
use conledger_kernel_contracts::events::LedgerEventKind;
use conledger_kernel_contracts::fhe::{Ciphertext, EncryptedArithmetic};
use conledger_kernel_contracts::MonotonicTimeNs;
use conledger_storage::ledger::LedgerStore;

use crate::access::{
    require_not_paused, require_owner, require_provider, require_submission_cooldown,
};
use crate::error::LedgerError;
use crate::notify;

/// Batch lifecycle and encrypted submissions.
#[derive(Debug, Default, Clone)]
pub struct BatchLedgerRuntime;

impl BatchLedgerRuntime {
    pub fn open_batch(
        &self,
        store: &mut LedgerStore,
        caller: &ActorId,
        now: MonotonicTimeNs,
    ) -> Result<BatchId, LedgerError> {
        require_owner(store, caller)?;
        require_not_paused(store)?;

        let next_id = BatchId(store.last_batch_id().map_or(1, |b| b.0.saturating_add(1)));
        let event = notify::prepare(now, LedgerEventKind::BatchOpened { batch_id: next_id })?;
        let batch_id = store.append_batch(now)?;
        debug_assert_eq!(batch_id, next_id);
        notify::publish(store, event)?;
        tracing::info!(batch_id = batch_id.0, "batch opened");
        Ok(batch_id)
    }

    pub fn close_batch(
        &self,
        store: &mut LedgerStore,
        caller: &ActorId,
        now: MonotonicTimeNs,
        batch_id: BatchId,
    ) -> Result<(), LedgerError> {
        require_owner(store, caller)?;
        require_not_paused(store)?;

        let batch = store
            .batch_row(batch_id)
            .ok_or(LedgerError::BatchOutOfRange { batch_id })?;
        if !batch.open {
            return Err(LedgerError::BatchAlreadyClosed { batch_id });
        }
        let event = notify::prepare(now, LedgerEventKind::BatchClosed { batch_id })?;
        store.close_batch_row(batch_id, now)?;
        notify::publish(store, event)?;
        tracing::info!(
            batch_id = batch_id.0,
            policies = store.policy_rows(batch_id).len(),
            claims = store.claim_rows(batch_id).len(),
            "batch closed"
        );
        Ok(())
    }

    /// Appends an encrypted policy to an open batch and returns its index.
    pub fn submit_policy<F: EncryptedArithmetic + ?Sized>(
        &self,
        store: &mut LedgerStore,
        fhe: &F,
        caller: &ActorId,
        now: MonotonicTimeNs,
        submission: PolicySubmission,
    ) -> Result<u32, LedgerError> {
        require_submission_gates(store, caller, now, submission.batch_id)?;
        require_initialized(fhe, "coverage", &submission.coverage)?;
        require_initialized(fhe, "risk_factor", &submission.risk_factor)?;
        require_initialized(fhe, "premium", &submission.premium)?;

        let batch_id = submission.batch_id;
        let input = PolicyRecordInput::v1(now, caller.clone(), submission)?;
        let event = notify::prepare(
            now,
            LedgerEventKind::PolicySubmitted {
                provider: caller.clone(),
                batch_id,
                index: next_index(store.policy_rows(batch_id).len())?,
            },
        )?;
        let index = store.append_policy_row(input)?;
        store.stamp_last_submission(caller.clone(), now);
        notify::publish(store, event)?;
        tracing::info!(provider = %caller, batch_id = batch_id.0, index, "policy submitted");
        Ok(index)
    }

    /// Appends an encrypted claim to an open batch and returns its index.
    /// The policy reference is stored as given and never checked.
    pub fn submit_claim<F: EncryptedArithmetic + ?Sized>(
        &self,
        store: &mut LedgerStore,
        fhe: &F,
        caller: &ActorId,
        now: MonotonicTimeNs,
        submission: ClaimSubmission,
    ) -> Result<u32, LedgerError> {
        require_submission_gates(store, caller, now, submission.batch_id)?;
        require_initialized(fhe, "claim_amount", &submission.claim_amount)?;
        require_initialized(fhe, "policy_ref", &submission.policy_ref)?;

        let batch_id = submission.batch_id;
        let input = ClaimRecordInput::v1(now, caller.clone(), submission)?;
        let event = notify::prepare(
            now,
            LedgerEventKind::ClaimSubmitted {
                provider: caller.clone(),
                batch_id,
                index: next_index(store.claim_rows(batch_id).len())?,
            },
        )?;
        let index = store.append_claim_row(input)?;
        store.stamp_last_submission(caller.clone(), now);
        notify::publish(store, event)?;
        tracing::info!(provider = %caller, batch_id = batch_id.0, index, "claim submitted");
        Ok(index)
    }
}

fn require_submission_gates(
    store: &LedgerStore,
    caller: &ActorId,
    now: MonotonicTimeNs,
    batch_id: BatchId,
) -> Result<(), LedgerError> {
    require_provider(store, caller)?;
    require_not_paused(store)?;
    require_submission_cooldown(store, caller, now)?;
    match store.batch_row(batch_id) {
        Some(batch) if batch.open => Ok(()),
        _ => Err(LedgerError::InvalidBatch { batch_id }),
    }
}

fn require_initialized<F: EncryptedArithmetic + ?Sized>(
    fhe: &F,
    field: &'static str,
    value: &Ciphertext,
) -> Result<(), LedgerError> {
    if !fhe.is_initialized(value) {
        return Err(LedgerError::UninitializedCiphertext { field });
    }
    Ok(())
}

fn next_index(len: usize) -> Result<u32, LedgerError> {
    u32::try_from(len).map_err(|_| LedgerError::InvalidParameter {
        field: "batch.records",
        reason: "record list is full",
    })
}
