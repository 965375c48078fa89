#![forbid(unsafe_code)]

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::batch::BatchId;
use crate::common::{validate_time, write_hex};
use crate::fhe::CiphertextHandle;
use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const DECRYPTION_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Width of one cleartext slot in an oracle callback payload.
pub const CLEARTEXT_SLOT_LEN: usize = 32;
/// Number of totals revealed per batch: coverage, premium, claims.
pub const BATCH_TOTALS_SLOTS: usize = 3;
pub const BATCH_TOTALS_CLEARTEXT_LEN: usize = CLEARTEXT_SLOT_LEN * BATCH_TOTALS_SLOTS;

/// Request identifier assigned by the decryption oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DecryptionRequestId(pub u64);

impl fmt::Display for DecryptionRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Commitment over the ordered ciphertext handles sent for decryption,
/// salted with the deployment's system identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateHash(pub [u8; 32]);

impl fmt::Display for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

impl Serialize for StateHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Entry point the oracle must deliver its answer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackSelector {
    BatchTotals,
}

/// Correlates an oracle request with the batch and state hash it vouches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionContext {
    pub schema_version: SchemaVersion,
    pub request_id: DecryptionRequestId,
    pub batch_id: BatchId,
    pub state_hash: StateHash,
    pub requested_at: MonotonicTimeNs,
    pub processed: bool,
    pub processed_at: Option<MonotonicTimeNs>,
}

impl DecryptionContext {
    pub fn pending_v1(
        request_id: DecryptionRequestId,
        batch_id: BatchId,
        state_hash: StateHash,
        requested_at: MonotonicTimeNs,
    ) -> Result<Self, ContractViolation> {
        let c = Self {
            schema_version: DECRYPTION_CONTRACT_VERSION,
            request_id,
            batch_id,
            state_hash,
            requested_at,
            processed: false,
            processed_at: None,
        };
        c.validate()?;
        Ok(c)
    }
}

impl Validate for DecryptionContext {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != DECRYPTION_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "decryption_context.schema_version",
                reason: "must match DECRYPTION_CONTRACT_VERSION",
            });
        }
        self.batch_id.validate()?;
        validate_time("decryption_context.requested_at", self.requested_at)?;
        if self.processed != self.processed_at.is_some() {
            return Err(ContractViolation::InvalidValue {
                field: "decryption_context.processed_at",
                reason: "must be present exactly when processed",
            });
        }
        Ok(())
    }
}

/// Cleartext aggregate sums of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchTotals {
    pub total_coverage: u64,
    pub total_premium: u64,
    pub total_claims: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CleartextDecodeError {
    #[error("cleartext payload too short: expected at least {expected} bytes, got {got}")]
    TooShort { expected: usize, got: usize },
    #[error("cleartext slot {slot} does not fit in 64 bits")]
    SlotOverflow { slot: usize },
}

impl BatchTotals {
    /// Reads three 32-byte big-endian unsigned slots at offsets 0, 32 and 64.
    /// Trailing bytes past the third slot are ignored.
    pub fn decode_cleartexts(cleartexts: &[u8]) -> Result<Self, CleartextDecodeError> {
        if cleartexts.len() < BATCH_TOTALS_CLEARTEXT_LEN {
            return Err(CleartextDecodeError::TooShort {
                expected: BATCH_TOTALS_CLEARTEXT_LEN,
                got: cleartexts.len(),
            });
        }
        Ok(Self {
            total_coverage: decode_slot(cleartexts, 0)?,
            total_premium: decode_slot(cleartexts, 1)?,
            total_claims: decode_slot(cleartexts, 2)?,
        })
    }

    pub fn encode_cleartexts(&self) -> Vec<u8> {
        encode_cleartext_slots(&[self.total_coverage, self.total_premium, self.total_claims])
    }
}

fn decode_slot(cleartexts: &[u8], slot: usize) -> Result<u64, CleartextDecodeError> {
    let start = slot * CLEARTEXT_SLOT_LEN;
    let word = &cleartexts[start..start + CLEARTEXT_SLOT_LEN];
    let (high, low) = word.split_at(CLEARTEXT_SLOT_LEN - 8);
    if high.iter().any(|b| *b != 0) {
        return Err(CleartextDecodeError::SlotOverflow { slot });
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(low);
    Ok(u64::from_be_bytes(buf))
}

/// Lays values out as consecutive 32-byte big-endian slots.
pub fn encode_cleartext_slots(values: &[u64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * CLEARTEXT_SLOT_LEN);
    for v in values {
        out.extend_from_slice(&[0u8; CLEARTEXT_SLOT_LEN - 8]);
        out.extend_from_slice(&v.to_be_bytes());
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("decryption oracle unavailable: {0}")]
    Unavailable(String),
    #[error("decryption oracle has no request {0}")]
    UnknownRequest(DecryptionRequestId),
    #[error("decryption oracle cannot decrypt handle {0}")]
    UndecryptableHandle(CiphertextHandle),
}

/// Boundary with the off-path decryption service.
///
/// `request_decryption` is fire-and-forget: the answer arrives later through
/// the ledger's callback entry point, correlated by the returned id.
pub trait DecryptionOracle {
    fn request_decryption(
        &mut self,
        handles: &[CiphertextHandle],
        callback: CallbackSelector,
    ) -> Result<DecryptionRequestId, OracleError>;

    /// True only if `proof` authenticates `cleartexts` as the oracle's
    /// decryption for `request_id`.
    fn verify_signatures(
        &self,
        request_id: DecryptionRequestId,
        cleartexts: &[u8],
        proof: &[u8],
    ) -> bool;
}
