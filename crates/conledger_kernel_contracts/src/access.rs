#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::common::validate_id;
use crate::{ContractViolation, SchemaVersion, Validate};

pub const ACCESS_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

/// Identity of a caller: the owner, an insurance provider, or anyone else.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(v.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for ActorId {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("actor_id", &self.0, 128)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deployment-instance identity folded into every state hash, so a hash
/// committed by one deployment never verifies on another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SystemIdentity(String);

impl SystemIdentity {
    pub fn new(v: impl Into<String>) -> Result<Self, ContractViolation> {
        let v = Self(v.into());
        v.validate()?;
        Ok(v)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Validate for SystemIdentity {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_id("system_identity", &self.0, 256)
    }
}

/// Owner, provider allow-list, pause switch and the shared cooldown interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControlRecord {
    pub schema_version: SchemaVersion,
    pub owner: ActorId,
    pub providers: BTreeSet<ActorId>,
    pub paused: bool,
    pub cooldown_ns: u64,
}

impl AccessControlRecord {
    /// Genesis access state. The owner starts out as a registered provider.
    pub fn v1(owner: ActorId, cooldown_ns: u64) -> Result<Self, ContractViolation> {
        let mut providers = BTreeSet::new();
        providers.insert(owner.clone());
        let r = Self {
            schema_version: ACCESS_CONTRACT_VERSION,
            owner,
            providers,
            paused: false,
            cooldown_ns,
        };
        r.validate()?;
        Ok(r)
    }

    pub fn is_owner(&self, actor: &ActorId) -> bool {
        &self.owner == actor
    }

    pub fn is_provider(&self, actor: &ActorId) -> bool {
        self.providers.contains(actor)
    }
}

impl Validate for AccessControlRecord {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != ACCESS_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "access_control_record.schema_version",
                reason: "must match ACCESS_CONTRACT_VERSION",
            });
        }
        self.owner.validate()?;
        for p in &self.providers {
            p.validate()?;
        }
        validate_cooldown_ns(self.cooldown_ns)
    }
}

pub fn validate_cooldown_ns(cooldown_ns: u64) -> Result<(), ContractViolation> {
    if cooldown_ns == 0 {
        return Err(ContractViolation::InvalidValue {
            field: "access_control_record.cooldown_ns",
            reason: "must be > 0",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_registered_as_provider_at_genesis() {
        let owner = ActorId::new("insurer_owner").unwrap();
        let rec = AccessControlRecord::v1(owner.clone(), 30).unwrap();
        assert!(rec.is_owner(&owner));
        assert!(rec.is_provider(&owner));
        assert!(!rec.paused);
    }

    #[test]
    fn zero_cooldown_is_rejected() {
        let owner = ActorId::new("insurer_owner").unwrap();
        assert!(matches!(
            AccessControlRecord::v1(owner, 0),
            Err(ContractViolation::InvalidValue {
                field: "access_control_record.cooldown_ns",
                ..
            })
        ));
    }

    #[test]
    fn blank_actor_id_is_rejected() {
        assert!(ActorId::new("   ").is_err());
        assert!(SystemIdentity::new("").is_err());
    }
}
