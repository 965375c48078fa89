#![forbid(unsafe_code)]

use serde::Serialize;

use crate::access::{validate_cooldown_ns, ActorId};
use crate::batch::BatchId;
use crate::common::validate_time;
use crate::decryption::{BatchTotals, DecryptionRequestId, StateHash};
use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const EVENTS_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LedgerEventId(pub u64);

/// Observable notifications. Each one is an immutable fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEventKind {
    OwnershipTransferred {
        previous_owner: ActorId,
        new_owner: ActorId,
    },
    ProviderAdded {
        provider: ActorId,
    },
    ProviderRemoved {
        provider: ActorId,
    },
    PauseToggled {
        paused: bool,
    },
    CooldownSet {
        cooldown_ns: u64,
    },
    BatchOpened {
        batch_id: BatchId,
    },
    BatchClosed {
        batch_id: BatchId,
    },
    PolicySubmitted {
        provider: ActorId,
        batch_id: BatchId,
        index: u32,
    },
    ClaimSubmitted {
        provider: ActorId,
        batch_id: BatchId,
        index: u32,
    },
    DecryptionRequested {
        request_id: DecryptionRequestId,
        batch_id: BatchId,
        state_hash: StateHash,
    },
    DecryptionCompleted {
        request_id: DecryptionRequestId,
        batch_id: BatchId,
        #[serde(flatten)]
        totals: BatchTotals,
    },
}

impl LedgerEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEventKind::OwnershipTransferred { .. } => "ownership_transferred",
            LedgerEventKind::ProviderAdded { .. } => "provider_added",
            LedgerEventKind::ProviderRemoved { .. } => "provider_removed",
            LedgerEventKind::PauseToggled { .. } => "pause_toggled",
            LedgerEventKind::CooldownSet { .. } => "cooldown_set",
            LedgerEventKind::BatchOpened { .. } => "batch_opened",
            LedgerEventKind::BatchClosed { .. } => "batch_closed",
            LedgerEventKind::PolicySubmitted { .. } => "policy_submitted",
            LedgerEventKind::ClaimSubmitted { .. } => "claim_submitted",
            LedgerEventKind::DecryptionRequested { .. } => "decryption_requested",
            LedgerEventKind::DecryptionCompleted { .. } => "decryption_completed",
        }
    }
}

impl Validate for LedgerEventKind {
    fn validate(&self) -> Result<(), ContractViolation> {
        match self {
            LedgerEventKind::OwnershipTransferred {
                previous_owner,
                new_owner,
            } => {
                previous_owner.validate()?;
                new_owner.validate()
            }
            LedgerEventKind::ProviderAdded { provider }
            | LedgerEventKind::ProviderRemoved { provider } => provider.validate(),
            LedgerEventKind::PauseToggled { .. } => Ok(()),
            LedgerEventKind::CooldownSet { cooldown_ns } => validate_cooldown_ns(*cooldown_ns),
            LedgerEventKind::BatchOpened { batch_id }
            | LedgerEventKind::BatchClosed { batch_id } => batch_id.validate(),
            LedgerEventKind::PolicySubmitted {
                provider, batch_id, ..
            }
            | LedgerEventKind::ClaimSubmitted {
                provider, batch_id, ..
            } => {
                provider.validate()?;
                batch_id.validate()
            }
            LedgerEventKind::DecryptionRequested { batch_id, .. }
            | LedgerEventKind::DecryptionCompleted { batch_id, .. } => batch_id.validate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEventInput {
    pub schema_version: SchemaVersion,
    pub created_at: MonotonicTimeNs,
    pub kind: LedgerEventKind,
}

impl LedgerEventInput {
    pub fn v1(
        created_at: MonotonicTimeNs,
        kind: LedgerEventKind,
    ) -> Result<Self, ContractViolation> {
        let e = Self {
            schema_version: EVENTS_CONTRACT_VERSION,
            created_at,
            kind,
        };
        e.validate()?;
        Ok(e)
    }
}

impl Validate for LedgerEventInput {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != EVENTS_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "ledger_event_input.schema_version",
                reason: "must match EVENTS_CONTRACT_VERSION",
            });
        }
        validate_time("ledger_event_input.created_at", self.created_at)?;
        self.kind.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerEvent {
    pub event_id: LedgerEventId,
    pub created_at: MonotonicTimeNs,
    #[serde(flatten)]
    pub kind: LedgerEventKind,
}

impl LedgerEvent {
    pub fn from_input_v1(
        event_id: LedgerEventId,
        input: LedgerEventInput,
    ) -> Result<Self, ContractViolation> {
        input.validate()?;
        if event_id.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "ledger_event.event_id",
                reason: "must be > 0",
            });
        }
        Ok(Self {
            event_id,
            created_at: input.created_at,
            kind: input.kind,
        })
    }
}
