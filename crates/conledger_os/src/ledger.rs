#![forbid(unsafe_code)]

use std::collections::BTreeSet;

use conledger_kernel_contracts::access::{AccessControlRecord, ActorId, SystemIdentity};
use conledger_kernel_contracts::batch::{
    BatchId, BatchRecord, ClaimRecord, ClaimSubmission, PolicyRecord, PolicySubmission,
};
use conledger_kernel_contracts::decryption::{
    BatchTotals, DecryptionContext, DecryptionOracle, DecryptionRequestId, StateHash,
};
use conledger_kernel_contracts::events::LedgerEvent;
use conledger_kernel_contracts::fhe::EncryptedArithmetic;
use conledger_kernel_contracts::MonotonicTimeNs;
use conledger_storage::ledger::LedgerStore;

use crate::access::AccessControlRuntime;
use crate::batch_ledger::BatchLedgerRuntime;
use crate::config::LedgerConfig;
use crate::decryption::{DecryptionRuntime, DecryptionTicket};
use crate::error::LedgerError;

/// One ledger instance: the store plus the encrypted-arithmetic backend and
/// the decryption oracle it was wired with.
///
/// Every mutating call is all-or-nothing. On `Err` the store, including its
/// notification log, is exactly as it was before the call.
#[derive(Debug)]
pub struct ConfidentialLedger<F, O> {
    store: LedgerStore,
    fhe: F,
    oracle: O,
    access: AccessControlRuntime,
    batches: BatchLedgerRuntime,
    decryption: DecryptionRuntime,
}

impl<F, O> ConfidentialLedger<F, O>
where
    F: EncryptedArithmetic,
    O: DecryptionOracle,
{
    /// Genesis: `owner` owns the ledger and is its first provider, the
    /// ledger is unpaused and the cooldown comes from `config`.
    pub fn new(
        config: &LedgerConfig,
        owner: ActorId,
        fhe: F,
        oracle: O,
    ) -> Result<Self, LedgerError> {
        let access = AccessControlRecord::v1(owner, config.initial_cooldown_ns)?;
        let store = LedgerStore::new_in_memory(access)?;
        tracing::info!(
            owner = %store.access_control().owner,
            system_identity = config.system_identity.as_str(),
            cooldown_ns = config.initial_cooldown_ns,
            "ledger initialized"
        );
        Ok(Self {
            store,
            fhe,
            oracle,
            access: AccessControlRuntime,
            batches: BatchLedgerRuntime,
            decryption: DecryptionRuntime::new(config.system_identity.clone()),
        })
    }

    // ------------------------
    // Access control
    // ------------------------

    pub fn transfer_ownership(
        &mut self,
        caller: &ActorId,
        now: MonotonicTimeNs,
        new_owner: ActorId,
    ) -> Result<(), LedgerError> {
        self.access.transfer_ownership(&mut self.store, caller, now, new_owner)
    }

    pub fn add_provider(
        &mut self,
        caller: &ActorId,
        now: MonotonicTimeNs,
        provider: ActorId,
    ) -> Result<(), LedgerError> {
        self.access.add_provider(&mut self.store, caller, now, provider)
    }

    pub fn remove_provider(
        &mut self,
        caller: &ActorId,
        now: MonotonicTimeNs,
        provider: ActorId,
    ) -> Result<(), LedgerError> {
        self.access.remove_provider(&mut self.store, caller, now, provider)
    }

    pub fn set_paused(
        &mut self,
        caller: &ActorId,
        now: MonotonicTimeNs,
        paused: bool,
    ) -> Result<(), LedgerError> {
        self.access.set_paused(&mut self.store, caller, now, paused)
    }

    pub fn set_cooldown(
        &mut self,
        caller: &ActorId,
        now: MonotonicTimeNs,
        cooldown_ns: u64,
    ) -> Result<(), LedgerError> {
        self.access.set_cooldown(&mut self.store, caller, now, cooldown_ns)
    }

    // ------------------------
    // Batches and submissions
    // ------------------------

    pub fn open_batch(
        &mut self,
        caller: &ActorId,
        now: MonotonicTimeNs,
    ) -> Result<BatchId, LedgerError> {
        self.batches.open_batch(&mut self.store, caller, now)
    }

    pub fn close_batch(
        &mut self,
        caller: &ActorId,
        now: MonotonicTimeNs,
        batch_id: BatchId,
    ) -> Result<(), LedgerError> {
        self.batches.close_batch(&mut self.store, caller, now, batch_id)
    }

    pub fn submit_policy(
        &mut self,
        caller: &ActorId,
        now: MonotonicTimeNs,
        submission: PolicySubmission,
    ) -> Result<u32, LedgerError> {
        self.batches.submit_policy(&mut self.store, &self.fhe, caller, now, submission)
    }

    pub fn submit_claim(
        &mut self,
        caller: &ActorId,
        now: MonotonicTimeNs,
        submission: ClaimSubmission,
    ) -> Result<u32, LedgerError> {
        self.batches.submit_claim(&mut self.store, &self.fhe, caller, now, submission)
    }

    // ------------------------
    // Decryption protocol
    // ------------------------

    pub fn request_batch_totals_decryption(
        &mut self,
        caller: &ActorId,
        now: MonotonicTimeNs,
        batch_id: BatchId,
    ) -> Result<DecryptionTicket, LedgerError> {
        self.decryption.request_batch_totals_decryption(
            &mut self.store,
            &mut self.fhe,
            &mut self.oracle,
            caller,
            now,
            batch_id,
        )
    }

    pub fn on_decryption_callback(
        &mut self,
        now: MonotonicTimeNs,
        request_id: DecryptionRequestId,
        cleartexts: &[u8],
        proof: &[u8],
    ) -> Result<BatchTotals, LedgerError> {
        self.decryption.on_decryption_callback(
            &mut self.store,
            &mut self.fhe,
            &self.oracle,
            now,
            request_id,
            cleartexts,
            proof,
        )
    }

    /// State hash the batch would commit to if decryption were requested now.
    pub fn current_state_hash(&mut self, batch_id: BatchId) -> StateHash {
        self.decryption
            .batch_state(&self.store, &mut self.fhe, batch_id)
            .1
    }

    // ------------------------
    // Read accessors
    // ------------------------

    pub fn owner(&self) -> &ActorId {
        &self.store.access_control().owner
    }

    pub fn providers(&self) -> &BTreeSet<ActorId> {
        &self.store.access_control().providers
    }

    pub fn is_provider(&self, actor: &ActorId) -> bool {
        self.store.access_control().is_provider(actor)
    }

    pub fn is_paused(&self) -> bool {
        self.store.access_control().paused
    }

    pub fn cooldown_ns(&self) -> u64 {
        self.store.access_control().cooldown_ns
    }

    pub fn system_identity(&self) -> &SystemIdentity {
        self.decryption.system_identity()
    }

    pub fn batch(&self, batch_id: BatchId) -> Option<&BatchRecord> {
        self.store.batch_row(batch_id)
    }

    pub fn batch_count(&self) -> u64 {
        self.store.last_batch_id().map_or(0, |b| b.0)
    }

    pub fn policies(&self, batch_id: BatchId) -> &[PolicyRecord] {
        self.store.policy_rows(batch_id)
    }

    pub fn claims(&self, batch_id: BatchId) -> &[ClaimRecord] {
        self.store.claim_rows(batch_id)
    }

    pub fn policy_count(&self, batch_id: BatchId) -> usize {
        self.store.policy_rows(batch_id).len()
    }

    pub fn claim_count(&self, batch_id: BatchId) -> usize {
        self.store.claim_rows(batch_id).len()
    }

    pub fn decryption_context(
        &self,
        request_id: DecryptionRequestId,
    ) -> Option<&DecryptionContext> {
        self.store.decryption_context(request_id)
    }

    pub fn is_request_processed(&self, request_id: DecryptionRequestId) -> bool {
        self.store
            .decryption_context(request_id)
            .is_some_and(|ctx| ctx.processed)
    }

    pub fn last_submission_at(&self, actor: &ActorId) -> Option<MonotonicTimeNs> {
        self.store.last_submission_at(actor)
    }

    pub fn last_decryption_request_at(&self, actor: &ActorId) -> Option<MonotonicTimeNs> {
        self.store.last_decryption_request_at(actor)
    }

    pub fn events(&self) -> &[LedgerEvent] {
        self.store.ledger_events()
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Raw store access, bypassing every runtime gate. Only the store's own
    /// foreign-key and append-only rules apply.
    pub fn store_mut(&mut self) -> &mut LedgerStore {
        &mut self.store
    }

    pub fn fhe(&self) -> &F {
        &self.fhe
    }

    pub fn fhe_mut(&mut self) -> &mut F {
        &mut self.fhe
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }
}
