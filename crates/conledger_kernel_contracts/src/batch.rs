#![forbid(unsafe_code)]

use std::fmt;

use serde::Serialize;

use crate::access::ActorId;
use crate::common::validate_time;
use crate::fhe::Ciphertext;
use crate::{ContractViolation, MonotonicTimeNs, SchemaVersion, Validate};

pub const BATCH_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Dense batch sequence number. Issued ids start at 1; 0 is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct BatchId(pub u64);

impl Validate for BatchId {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0 == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "batch_id",
                reason: "must be > 0",
            });
        }
        Ok(())
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    pub schema_version: SchemaVersion,
    pub batch_id: BatchId,
    pub open: bool,
    pub opened_at: MonotonicTimeNs,
    pub closed_at: Option<MonotonicTimeNs>,
}

impl BatchRecord {
    pub fn open_v1(
        batch_id: BatchId,
        opened_at: MonotonicTimeNs,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: BATCH_CONTRACT_VERSION,
            batch_id,
            open: true,
            opened_at,
            closed_at: None,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for BatchRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != BATCH_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "batch_record.schema_version",
                reason: "must match BATCH_CONTRACT_VERSION",
            });
        }
        self.batch_id.validate()?;
        validate_time("batch_record.opened_at", self.opened_at)?;
        match (self.open, self.closed_at) {
            (true, Some(_)) => Err(ContractViolation::InvalidValue {
                field: "batch_record.closed_at",
                reason: "must be absent while the batch is open",
            }),
            (false, None) => Err(ContractViolation::InvalidValue {
                field: "batch_record.closed_at",
                reason: "must be present once the batch is closed",
            }),
            (false, Some(closed_at)) if closed_at < self.opened_at => {
                Err(ContractViolation::InvalidValue {
                    field: "batch_record.closed_at",
                    reason: "must not precede opened_at",
                })
            }
            _ => Ok(()),
        }
    }
}

/// Encrypted policy fields as supplied by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicySubmission {
    pub batch_id: BatchId,
    pub coverage: Ciphertext,
    pub risk_factor: Ciphertext,
    pub premium: Ciphertext,
}

/// Encrypted claim fields as supplied by a provider. `policy_ref` stays
/// encrypted and is not cross-checked against the batch's policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimSubmission {
    pub batch_id: BatchId,
    pub claim_amount: Ciphertext,
    pub policy_ref: Ciphertext,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRecordInput {
    pub schema_version: SchemaVersion,
    pub submitted_at: MonotonicTimeNs,
    pub submitted_by: ActorId,
    pub batch_id: BatchId,
    pub coverage: Ciphertext,
    pub risk_factor: Ciphertext,
    pub premium: Ciphertext,
}

impl PolicyRecordInput {
    pub fn v1(
        submitted_at: MonotonicTimeNs,
        submitted_by: ActorId,
        submission: PolicySubmission,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: BATCH_CONTRACT_VERSION,
            submitted_at,
            submitted_by,
            batch_id: submission.batch_id,
            coverage: submission.coverage,
            risk_factor: submission.risk_factor,
            premium: submission.premium,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for PolicyRecordInput {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != BATCH_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "policy_record_input.schema_version",
                reason: "must match BATCH_CONTRACT_VERSION",
            });
        }
        validate_time("policy_record_input.submitted_at", self.submitted_at)?;
        self.submitted_by.validate()?;
        self.batch_id.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRecord {
    pub schema_version: SchemaVersion,
    pub batch_id: BatchId,
    /// Zero-based insertion position within the batch.
    pub index: u32,
    pub submitted_at: MonotonicTimeNs,
    pub submitted_by: ActorId,
    pub coverage: Ciphertext,
    pub risk_factor: Ciphertext,
    pub premium: Ciphertext,
}

impl PolicyRecord {
    pub fn from_input_v1(index: u32, input: PolicyRecordInput) -> Result<Self, ContractViolation> {
        input.validate()?;
        Ok(Self {
            schema_version: BATCH_CONTRACT_VERSION,
            batch_id: input.batch_id,
            index,
            submitted_at: input.submitted_at,
            submitted_by: input.submitted_by,
            coverage: input.coverage,
            risk_factor: input.risk_factor,
            premium: input.premium,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRecordInput {
    pub schema_version: SchemaVersion,
    pub submitted_at: MonotonicTimeNs,
    pub submitted_by: ActorId,
    pub batch_id: BatchId,
    pub claim_amount: Ciphertext,
    pub policy_ref: Ciphertext,
}

impl ClaimRecordInput {
    pub fn v1(
        submitted_at: MonotonicTimeNs,
        submitted_by: ActorId,
        submission: ClaimSubmission,
    ) -> Result<Self, ContractViolation> {
        let r = Self {
            schema_version: BATCH_CONTRACT_VERSION,
            submitted_at,
            submitted_by,
            batch_id: submission.batch_id,
            claim_amount: submission.claim_amount,
            policy_ref: submission.policy_ref,
        };
        r.validate()?;
        Ok(r)
    }
}

impl Validate for ClaimRecordInput {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != BATCH_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "claim_record_input.schema_version",
                reason: "must match BATCH_CONTRACT_VERSION",
            });
        }
        validate_time("claim_record_input.submitted_at", self.submitted_at)?;
        self.submitted_by.validate()?;
        self.batch_id.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRecord {
    pub schema_version: SchemaVersion,
    pub batch_id: BatchId,
    pub index: u32,
    pub submitted_at: MonotonicTimeNs,
    pub submitted_by: ActorId,
    pub claim_amount: Ciphertext,
    pub policy_ref: Ciphertext,
}

impl ClaimRecord {
    pub fn from_input_v1(index: u32, input: ClaimRecordInput) -> Result<Self, ContractViolation> {
        input.validate()?;
        Ok(Self {
            schema_version: BATCH_CONTRACT_VERSION,
            batch_id: input.batch_id,
            index,
            submitted_at: input.submitted_at,
            submitted_by: input.submitted_by,
            claim_amount: input.claim_amount,
            policy_ref: input.policy_ref,
        })
    }
}
