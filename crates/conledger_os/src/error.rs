#![forbid(unsafe_code)]

use conledger_kernel_contracts::access::ActorId;
use conledger_kernel_contracts::batch::BatchId;
use conledger_kernel_contracts::decryption::{CleartextDecodeError, DecryptionRequestId, StateHash};
use conledger_kernel_contracts::{ContractViolation, MonotonicTimeNs, ReasonCodeId};
use conledger_storage::ledger::StorageError;
use thiserror::Error;

pub mod reason_codes {
    use conledger_kernel_contracts::ReasonCodeId;

    // Authorization.
    pub const LEDGER_NOT_OWNER: ReasonCodeId = ReasonCodeId(0x1E00_0001);
    pub const LEDGER_NOT_PROVIDER: ReasonCodeId = ReasonCodeId(0x1E00_0002);

    // Lifecycle.
    pub const LEDGER_PAUSED: ReasonCodeId = ReasonCodeId(0x1E00_0101);
    pub const LEDGER_INVALID_BATCH: ReasonCodeId = ReasonCodeId(0x1E00_0102);
    pub const LEDGER_BATCH_OUT_OF_RANGE: ReasonCodeId = ReasonCodeId(0x1E00_0103);
    pub const LEDGER_BATCH_ALREADY_CLOSED: ReasonCodeId = ReasonCodeId(0x1E00_0104);
    pub const LEDGER_BATCH_STILL_OPEN: ReasonCodeId = ReasonCodeId(0x1E00_0105);

    // Rate limiting.
    pub const LEDGER_COOLDOWN_ACTIVE: ReasonCodeId = ReasonCodeId(0x1E00_0201);

    // Input validity.
    pub const LEDGER_UNINITIALIZED_CIPHERTEXT: ReasonCodeId = ReasonCodeId(0x1E00_0301);
    pub const LEDGER_INVALID_PARAMETER: ReasonCodeId = ReasonCodeId(0x1E00_0302);

    // Integrity.
    pub const LEDGER_REPLAY_DETECTED: ReasonCodeId = ReasonCodeId(0x1E00_0401);
    pub const LEDGER_UNKNOWN_REQUEST: ReasonCodeId = ReasonCodeId(0x1E00_0402);
    pub const LEDGER_STATE_MISMATCH: ReasonCodeId = ReasonCodeId(0x1E00_0403);
    pub const LEDGER_INVALID_PROOF: ReasonCodeId = ReasonCodeId(0x1E00_0404);
    pub const LEDGER_DUPLICATE_CONTEXT: ReasonCodeId = ReasonCodeId(0x1E00_0405);
    pub const LEDGER_CLEARTEXT_DECODE: ReasonCodeId = ReasonCodeId(0x1E00_0406);

    // Collaborators and internal.
    pub const LEDGER_ORACLE_UNAVAILABLE: ReasonCodeId = ReasonCodeId(0x1E00_0501);
    pub const LEDGER_STORAGE: ReasonCodeId = ReasonCodeId(0x1E00_0502);
    pub const LEDGER_CONTRACT: ReasonCodeId = ReasonCodeId(0x1E00_0503);
}

/// Every way a ledger operation can be refused. A refused call leaves the
/// store, including the notification log, untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{actor} is not the owner")]
    NotOwner { actor: ActorId },
    #[error("{actor} is not a registered provider")]
    NotProvider { actor: ActorId },
    #[error("ledger is paused")]
    Paused,
    #[error("batch {batch_id} does not exist or is not open")]
    InvalidBatch { batch_id: BatchId },
    #[error("batch {batch_id} was never issued")]
    BatchOutOfRange { batch_id: BatchId },
    #[error("batch {batch_id} is already closed")]
    BatchAlreadyClosed { batch_id: BatchId },
    #[error("batch {batch_id} must be closed before decryption")]
    BatchStillOpen { batch_id: BatchId },
    #[error("cooldown active for {actor} until {ready_at}")]
    CooldownActive {
        actor: ActorId,
        ready_at: MonotonicTimeNs,
    },
    #[error("ciphertext field {field} is not initialized")]
    UninitializedCiphertext { field: &'static str },
    #[error("invalid parameter {field}: {reason}")]
    InvalidParameter {
        field: &'static str,
        reason: &'static str,
    },
    #[error("decryption request {request_id} was already processed")]
    ReplayDetected { request_id: DecryptionRequestId },
    #[error("no decryption context for request {request_id}")]
    UnknownRequest { request_id: DecryptionRequestId },
    #[error("state mismatch for request {request_id}: committed {committed}, now {recomputed}")]
    StateMismatch {
        request_id: DecryptionRequestId,
        committed: StateHash,
        recomputed: StateHash,
    },
    #[error("decryption proof rejected for request {request_id}")]
    InvalidProof { request_id: DecryptionRequestId },
    #[error("decryption context for request {request_id} already exists")]
    DuplicateContext { request_id: DecryptionRequestId },
    #[error("cleartext payload rejected: {0}")]
    CleartextDecode(#[from] CleartextDecodeError),
    #[error("decryption oracle refused request: {reason}")]
    OracleUnavailable { reason: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

impl LedgerError {
    pub fn reason_code(&self) -> ReasonCodeId {
        match self {
            LedgerError::NotOwner { .. } => reason_codes::LEDGER_NOT_OWNER,
            LedgerError::NotProvider { .. } => reason_codes::LEDGER_NOT_PROVIDER,
            LedgerError::Paused => reason_codes::LEDGER_PAUSED,
            LedgerError::InvalidBatch { .. } => reason_codes::LEDGER_INVALID_BATCH,
            LedgerError::BatchOutOfRange { .. } => reason_codes::LEDGER_BATCH_OUT_OF_RANGE,
            LedgerError::BatchAlreadyClosed { .. } => reason_codes::LEDGER_BATCH_ALREADY_CLOSED,
            LedgerError::BatchStillOpen { .. } => reason_codes::LEDGER_BATCH_STILL_OPEN,
            LedgerError::CooldownActive { .. } => reason_codes::LEDGER_COOLDOWN_ACTIVE,
            LedgerError::UninitializedCiphertext { .. } => {
                reason_codes::LEDGER_UNINITIALIZED_CIPHERTEXT
            }
            LedgerError::InvalidParameter { .. } => reason_codes::LEDGER_INVALID_PARAMETER,
            LedgerError::ReplayDetected { .. } => reason_codes::LEDGER_REPLAY_DETECTED,
            LedgerError::UnknownRequest { .. } => reason_codes::LEDGER_UNKNOWN_REQUEST,
            LedgerError::StateMismatch { .. } => reason_codes::LEDGER_STATE_MISMATCH,
            LedgerError::InvalidProof { .. } => reason_codes::LEDGER_INVALID_PROOF,
            LedgerError::DuplicateContext { .. } => reason_codes::LEDGER_DUPLICATE_CONTEXT,
            LedgerError::CleartextDecode(_) => reason_codes::LEDGER_CLEARTEXT_DECODE,
            LedgerError::OracleUnavailable { .. } => reason_codes::LEDGER_ORACLE_UNAVAILABLE,
            LedgerError::Storage(_) => reason_codes::LEDGER_STORAGE,
            LedgerError::Contract(_) => reason_codes::LEDGER_CONTRACT,
        }
    }

    /// True for the integrity class: replay, mismatch, bad proof, unknown
    /// request, duplicate context, undecodable cleartexts.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            LedgerError::ReplayDetected { .. }
                | LedgerError::UnknownRequest { .. }
                | LedgerError::StateMismatch { .. }
                | LedgerError::InvalidProof { .. }
                | LedgerError::DuplicateContext { .. }
                | LedgerError::CleartextDecode(_)
        )
    }
}
