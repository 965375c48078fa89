#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use conledger_kernel_contracts::access::{validate_cooldown_ns, AccessControlRecord, ActorId};
use conledger_kernel_contracts::batch::{
    BatchId, BatchRecord, ClaimRecord, ClaimRecordInput, PolicyRecord, PolicyRecordInput,
};
use conledger_kernel_contracts::decryption::{DecryptionContext, DecryptionRequestId};
use conledger_kernel_contracts::events::{LedgerEvent, LedgerEventId, LedgerEventInput};
use conledger_kernel_contracts::{ContractViolation, MonotonicTimeNs, Validate};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("foreign key violation on {table}: {key}")]
    ForeignKeyViolation { table: &'static str, key: String },
    #[error("duplicate key on {table}: {key}")]
    DuplicateKey { table: &'static str, key: String },
    #[error("append-only table {table} cannot be rewritten")]
    AppendOnlyViolation { table: &'static str },
    #[error("illegal state transition on {table}: {key}")]
    StateTransitionViolation { table: &'static str, key: String },
    #[error(transparent)]
    ContractViolation(#[from] ContractViolation),
}

/// In-memory ledger arena.
///
/// Batches live in a dense vector addressed by `BatchId - 1`; per-batch
/// policy and claim lists are append-only and keep insertion order. The
/// open/closed gate for submissions is enforced by the batch runtime, the
/// store only checks that the batch exists.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    access: AccessControlRecord,
    batches: Vec<BatchRecord>,
    policies: BTreeMap<BatchId, Vec<PolicyRecord>>,
    claims: BTreeMap<BatchId, Vec<ClaimRecord>>,
    decryption_contexts: BTreeMap<DecryptionRequestId, DecryptionContext>,
    last_submission_at: BTreeMap<ActorId, MonotonicTimeNs>,
    last_decryption_request_at: BTreeMap<ActorId, MonotonicTimeNs>,
    ledger_events: Vec<LedgerEvent>,
    next_event_id: u64,
}

impl LedgerStore {
    pub fn new_in_memory(access: AccessControlRecord) -> Result<Self, StorageError> {
        access.validate()?;
        Ok(Self {
            access,
            batches: Vec::new(),
            policies: BTreeMap::new(),
            claims: BTreeMap::new(),
            decryption_contexts: BTreeMap::new(),
            last_submission_at: BTreeMap::new(),
            last_decryption_request_at: BTreeMap::new(),
            ledger_events: Vec::new(),
            next_event_id: 1,
        })
    }

    // ------------------------
    // Access control
    // ------------------------

    pub fn access_control(&self) -> &AccessControlRecord {
        &self.access
    }

    pub fn set_owner(&mut self, owner: ActorId) -> Result<(), StorageError> {
        owner.validate()?;
        self.access.owner = owner;
        Ok(())
    }

    /// Returns false when the provider was already registered.
    pub fn insert_provider(&mut self, provider: ActorId) -> Result<bool, StorageError> {
        provider.validate()?;
        Ok(self.access.providers.insert(provider))
    }

    /// Returns false when the provider was not registered.
    pub fn remove_provider(&mut self, provider: &ActorId) -> bool {
        self.access.providers.remove(provider)
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.access.paused = paused;
    }

    pub fn set_cooldown_ns(&mut self, cooldown_ns: u64) -> Result<(), StorageError> {
        validate_cooldown_ns(cooldown_ns)?;
        self.access.cooldown_ns = cooldown_ns;
        Ok(())
    }

    // ------------------------
    // Rate-limit timestamps
    // ------------------------

    pub fn last_submission_at(&self, actor: &ActorId) -> Option<MonotonicTimeNs> {
        self.last_submission_at.get(actor).copied()
    }

    pub fn last_decryption_request_at(&self, actor: &ActorId) -> Option<MonotonicTimeNs> {
        self.last_decryption_request_at.get(actor).copied()
    }

    /// Stamps are monotonic: an earlier `now` never moves a stamp backwards.
    pub fn stamp_last_submission(&mut self, actor: ActorId, now: MonotonicTimeNs) {
        let slot = self.last_submission_at.entry(actor).or_insert(now);
        *slot = (*slot).max(now);
    }

    pub fn stamp_last_decryption_request(&mut self, actor: ActorId, now: MonotonicTimeNs) {
        let slot = self.last_decryption_request_at.entry(actor).or_insert(now);
        *slot = (*slot).max(now);
    }

    // ------------------------
    // Batches
    // ------------------------

    pub fn append_batch(&mut self, opened_at: MonotonicTimeNs) -> Result<BatchId, StorageError> {
        let batch_id = BatchId(self.batches.len() as u64 + 1);
        let row = BatchRecord::open_v1(batch_id, opened_at)?;
        self.batches.push(row);
        Ok(batch_id)
    }

    pub fn batch_row(&self, batch_id: BatchId) -> Option<&BatchRecord> {
        let idx = batch_id.0.checked_sub(1)?;
        self.batches.get(usize::try_from(idx).ok()?)
    }

    pub fn batch_rows(&self) -> &[BatchRecord] {
        &self.batches
    }

    pub fn last_batch_id(&self) -> Option<BatchId> {
        self.batches.last().map(|b| b.batch_id)
    }

    /// One-way open -> closed flip.
    pub fn close_batch_row(
        &mut self,
        batch_id: BatchId,
        closed_at: MonotonicTimeNs,
    ) -> Result<(), StorageError> {
        let idx = batch_id
            .0
            .checked_sub(1)
            .and_then(|i| usize::try_from(i).ok())
            .filter(|i| *i < self.batches.len())
            .ok_or_else(|| StorageError::ForeignKeyViolation {
                table: "batches.batch_id",
                key: batch_id.to_string(),
            })?;
        let current = &self.batches[idx];
        if !current.open {
            return Err(StorageError::StateTransitionViolation {
                table: "batches.open",
                key: batch_id.to_string(),
            });
        }
        let mut next = current.clone();
        next.open = false;
        next.closed_at = Some(closed_at);
        next.validate()?;
        self.batches[idx] = next;
        Ok(())
    }

    fn require_batch(&self, table: &'static str, batch_id: BatchId) -> Result<(), StorageError> {
        if self.batch_row(batch_id).is_none() {
            return Err(StorageError::ForeignKeyViolation {
                table,
                key: batch_id.to_string(),
            });
        }
        Ok(())
    }

    // ------------------------
    // Policies and claims
    // ------------------------

    /// Appends at the end of the batch's policy list and returns the
    /// zero-based position.
    pub fn append_policy_row(&mut self, input: PolicyRecordInput) -> Result<u32, StorageError> {
        input.validate()?;
        self.require_batch("policies.batch_id", input.batch_id)?;
        let rows = self.policies.entry(input.batch_id).or_default();
        let index = position_for(rows.len(), "policies.index")?;
        let row = PolicyRecord::from_input_v1(index, input)?;
        rows.push(row);
        Ok(index)
    }

    pub fn append_claim_row(&mut self, input: ClaimRecordInput) -> Result<u32, StorageError> {
        input.validate()?;
        self.require_batch("claims.batch_id", input.batch_id)?;
        let rows = self.claims.entry(input.batch_id).or_default();
        let index = position_for(rows.len(), "claims.index")?;
        let row = ClaimRecord::from_input_v1(index, input)?;
        rows.push(row);
        Ok(index)
    }

    pub fn policy_rows(&self, batch_id: BatchId) -> &[PolicyRecord] {
        self.policies
            .get(&batch_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn claim_rows(&self, batch_id: BatchId) -> &[ClaimRecord] {
        self.claims.get(&batch_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn attempt_overwrite_policy_row(
        &mut self,
        _batch_id: BatchId,
        _index: u32,
    ) -> Result<(), StorageError> {
        Err(StorageError::AppendOnlyViolation { table: "policies" })
    }

    pub fn attempt_overwrite_claim_row(
        &mut self,
        _batch_id: BatchId,
        _index: u32,
    ) -> Result<(), StorageError> {
        Err(StorageError::AppendOnlyViolation { table: "claims" })
    }

    // ------------------------
    // Decryption contexts
    // ------------------------

    pub fn insert_decryption_context(
        &mut self,
        ctx: DecryptionContext,
    ) -> Result<(), StorageError> {
        ctx.validate()?;
        if ctx.processed {
            return Err(StorageError::ContractViolation(
                ContractViolation::InvalidValue {
                    field: "decryption_context.processed",
                    reason: "new contexts must start unprocessed",
                },
            ));
        }
        self.require_batch("decryption_contexts.batch_id", ctx.batch_id)?;
        if self.decryption_contexts.contains_key(&ctx.request_id) {
            return Err(StorageError::DuplicateKey {
                table: "decryption_contexts.request_id",
                key: ctx.request_id.to_string(),
            });
        }
        self.decryption_contexts.insert(ctx.request_id, ctx);
        Ok(())
    }

    pub fn decryption_context(
        &self,
        request_id: DecryptionRequestId,
    ) -> Option<&DecryptionContext> {
        self.decryption_contexts.get(&request_id)
    }

    pub fn decryption_contexts(&self) -> &BTreeMap<DecryptionRequestId, DecryptionContext> {
        &self.decryption_contexts
    }

    /// The single permitted mutation of a context: unprocessed -> processed.
    pub fn mark_decryption_context_processed(
        &mut self,
        request_id: DecryptionRequestId,
        processed_at: MonotonicTimeNs,
    ) -> Result<(), StorageError> {
        let ctx = self.decryption_contexts.get_mut(&request_id).ok_or_else(|| {
            StorageError::ForeignKeyViolation {
                table: "decryption_contexts.request_id",
                key: request_id.to_string(),
            }
        })?;
        if ctx.processed {
            return Err(StorageError::StateTransitionViolation {
                table: "decryption_contexts.processed",
                key: request_id.to_string(),
            });
        }
        ctx.processed = true;
        ctx.processed_at = Some(processed_at);
        Ok(())
    }

    pub fn attempt_delete_decryption_context(
        &mut self,
        _request_id: DecryptionRequestId,
    ) -> Result<(), StorageError> {
        Err(StorageError::AppendOnlyViolation {
            table: "decryption_contexts",
        })
    }

    // ------------------------
    // Notification log
    // ------------------------

    pub fn append_ledger_event(
        &mut self,
        input: LedgerEventInput,
    ) -> Result<LedgerEventId, StorageError> {
        let event_id = LedgerEventId(self.next_event_id);
        let row = LedgerEvent::from_input_v1(event_id, input)?;
        self.next_event_id = self.next_event_id.saturating_add(1);
        self.ledger_events.push(row);
        Ok(event_id)
    }

    pub fn ledger_events(&self) -> &[LedgerEvent] {
        &self.ledger_events
    }

    pub fn attempt_overwrite_ledger_event(
        &mut self,
        _event_id: LedgerEventId,
    ) -> Result<(), StorageError> {
        Err(StorageError::AppendOnlyViolation {
            table: "ledger_events",
        })
    }
}

fn position_for(len: usize, field: &'static str) -> Result<u32, StorageError> {
    u32::try_from(len).map_err(|_| {
        StorageError::ContractViolation(ContractViolation::InvalidValue {
            field,
            reason: "batch list is full",
        })
    })
}
