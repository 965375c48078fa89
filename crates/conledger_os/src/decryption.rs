#![forbid(unsafe_code)]

use conledger_engines::aggregator::{aggregate_batch, derive_state_hash};
use conledger_kernel_contracts::access::{ActorId, SystemIdentity};
use conledger_kernel_contracts::batch::BatchId;
use conledger_kernel_contracts::decryption::{
    BatchTotals, CallbackSelector, DecryptionContext, DecryptionOracle, DecryptionRequestId,
    StateHash,
};
use conledger_kernel_contracts::events::LedgerEventKind;
use conledger_kernel_contracts::fhe::{CiphertextHandle, EncryptedArithmetic};
use conledger_kernel_contracts::MonotonicTimeNs;
use conledger_storage::ledger::LedgerStore;
use serde::Serialize;

use crate::access::{
    require_action_time, require_decryption_cooldown, require_not_paused, require_provider,
};
use crate::error::LedgerError;
use crate::notify;

/// Outcome of a successful decryption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecryptionTicket {
    pub request_id: DecryptionRequestId,
    pub batch_id: BatchId,
    pub state_hash: StateHash,
}

/// Two halves of the decryption protocol: commit to a batch's aggregate
/// state and ask the oracle, then accept the oracle's answer only if that
/// state still holds and the proof checks out.
#[derive(Debug, Clone)]
pub struct DecryptionRuntime {
    system_identity: SystemIdentity,
}

impl DecryptionRuntime {
    pub fn new(system_identity: SystemIdentity) -> Self {
        Self { system_identity }
    }

    pub fn system_identity(&self) -> &SystemIdentity {
        &self.system_identity
    }

    /// Recomputes the aggregate handles and state hash of a batch from the
    /// current stored lists.
    pub fn batch_state<F: EncryptedArithmetic + ?Sized>(
        &self,
        store: &LedgerStore,
        fhe: &mut F,
        batch_id: BatchId,
    ) -> ([CiphertextHandle; 3], StateHash) {
        let policies = store.policy_rows(batch_id);
        let claims = store.claim_rows(batch_id);
        let totals = aggregate_batch(fhe, policies, claims);
        let handles = totals.ordered_handles(&*fhe);
        let state_hash = derive_state_hash(&handles, &self.system_identity);
        (handles, state_hash)
    }

    pub fn request_batch_totals_decryption<F, O>(
        &self,
        store: &mut LedgerStore,
        fhe: &mut F,
        oracle: &mut O,
        caller: &ActorId,
        now: MonotonicTimeNs,
        batch_id: BatchId,
    ) -> Result<DecryptionTicket, LedgerError>
    where
        F: EncryptedArithmetic + ?Sized,
        O: DecryptionOracle + ?Sized,
    {
        require_provider(store, caller)?;
        require_not_paused(store)?;
        require_decryption_cooldown(store, caller, now)?;
        require_action_time(now)?;
        let batch = store
            .batch_row(batch_id)
            .ok_or(LedgerError::InvalidBatch { batch_id })?;
        if batch.open {
            return Err(LedgerError::BatchStillOpen { batch_id });
        }

        let (handles, state_hash) = self.batch_state(store, fhe, batch_id);
        let request_id = oracle
            .request_decryption(&handles, CallbackSelector::BatchTotals)
            .map_err(|e| LedgerError::OracleUnavailable {
                reason: e.to_string(),
            })?;

        if store.decryption_context(request_id).is_some() {
            tracing::warn!(
                request_id = request_id.0,
                "oracle reissued a known request id"
            );
            return Err(LedgerError::DuplicateContext { request_id });
        }
        let ctx = DecryptionContext::pending_v1(request_id, batch_id, state_hash, now)?;
        let event = notify::prepare(
            now,
            LedgerEventKind::DecryptionRequested {
                request_id,
                batch_id,
                state_hash,
            },
        )?;
        store.insert_decryption_context(ctx)?;
        store.stamp_last_decryption_request(caller.clone(), now);
        notify::publish(store, event)?;
        tracing::info!(
            provider = %caller,
            batch_id = batch_id.0,
            request_id = request_id.0,
            state_hash = %state_hash,
            "decryption requested"
        );
        Ok(DecryptionTicket {
            request_id,
            batch_id,
            state_hash,
        })
    }

    /// Accepts the oracle's answer for `request_id`. Anyone may deliver it;
    /// the proof is what authenticates it.
    #[allow(clippy::too_many_arguments)]
    pub fn on_decryption_callback<F, O>(
        &self,
        store: &mut LedgerStore,
        fhe: &mut F,
        oracle: &O,
        now: MonotonicTimeNs,
        request_id: DecryptionRequestId,
        cleartexts: &[u8],
        proof: &[u8],
    ) -> Result<BatchTotals, LedgerError>
    where
        F: EncryptedArithmetic + ?Sized,
        O: DecryptionOracle + ?Sized,
    {
        let result = self.verify_callback(store, fhe, oracle, now, request_id, cleartexts, proof);
        if let Err(err) = &result {
            if err.is_integrity_failure() {
                tracing::warn!(
                    request_id = request_id.0,
                    reason_code = err.reason_code().0,
                    error = %err,
                    "decryption callback rejected"
                );
            }
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn verify_callback<F, O>(
        &self,
        store: &mut LedgerStore,
        fhe: &mut F,
        oracle: &O,
        now: MonotonicTimeNs,
        request_id: DecryptionRequestId,
        cleartexts: &[u8],
        proof: &[u8],
    ) -> Result<BatchTotals, LedgerError>
    where
        F: EncryptedArithmetic + ?Sized,
        O: DecryptionOracle + ?Sized,
    {
        let ctx = store
            .decryption_context(request_id)
            .ok_or(LedgerError::UnknownRequest { request_id })?;
        if ctx.processed {
            return Err(LedgerError::ReplayDetected { request_id });
        }
        let batch_id = ctx.batch_id;
        let committed = ctx.state_hash;

        let (_, recomputed) = self.batch_state(store, fhe, batch_id);
        if recomputed != committed {
            return Err(LedgerError::StateMismatch {
                request_id,
                committed,
                recomputed,
            });
        }
        if !oracle.verify_signatures(request_id, cleartexts, proof) {
            return Err(LedgerError::InvalidProof { request_id });
        }
        let totals = BatchTotals::decode_cleartexts(cleartexts)?;

        let event = notify::prepare(
            now,
            LedgerEventKind::DecryptionCompleted {
                request_id,
                batch_id,
                totals,
            },
        )?;
        store.mark_decryption_context_processed(request_id, now)?;
        notify::publish(store, event)?;
        tracing::info!(
            request_id = request_id.0,
            batch_id = batch_id.0,
            total_coverage = totals.total_coverage,
            total_premium = totals.total_premium,
            total_claims = totals.total_claims,
            "decryption completed"
        );
        Ok(totals)
    }
}
