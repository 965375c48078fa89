#![forbid(unsafe_code)]

use std::env;

use conledger_kernel_contracts::access::SystemIdentity;
use conledger_kernel_contracts::ContractViolation;

pub const DEFAULT_SYSTEM_IDENTITY: &str = "conledger.local.v1";
pub const DEFAULT_COOLDOWN_SECS: u64 = 30;

const NS_PER_SEC: u64 = 1_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Salt folded into every state hash.
    pub system_identity: SystemIdentity,
    /// Cooldown installed at genesis; the owner can change it later.
    pub initial_cooldown_ns: u64,
}

impl LedgerConfig {
    pub fn mvp_v1() -> Result<Self, ContractViolation> {
        Ok(Self {
            system_identity: SystemIdentity::new(DEFAULT_SYSTEM_IDENTITY)?,
            initial_cooldown_ns: secs_to_ns(DEFAULT_COOLDOWN_SECS),
        })
    }

    /// Reads `CONLEDGER_SYSTEM_IDENTITY` and `CONLEDGER_COOLDOWN_SECS`.
    /// Unset, blank or unusable values fall back to the defaults.
    pub fn from_env() -> Result<Self, ContractViolation> {
        Self::from_env_values(
            env::var("CONLEDGER_SYSTEM_IDENTITY").ok(),
            env::var("CONLEDGER_COOLDOWN_SECS").ok(),
        )
    }

    fn from_env_values(
        system_identity: Option<String>,
        cooldown_secs: Option<String>,
    ) -> Result<Self, ContractViolation> {
        let system_identity = system_identity
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_SYSTEM_IDENTITY);
        Ok(Self {
            system_identity: SystemIdentity::new(system_identity)?,
            initial_cooldown_ns: secs_to_ns(parse_cooldown_secs(cooldown_secs)),
        })
    }
}

fn parse_cooldown_secs(raw: Option<String>) -> u64 {
    raw.as_deref()
        .map(str::trim)
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_COOLDOWN_SECS)
}

pub fn secs_to_ns(secs: u64) -> u64 {
    secs.saturating_mul(NS_PER_SEC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = LedgerConfig::from_env_values(None, None).unwrap();
        assert_eq!(cfg, LedgerConfig::mvp_v1().unwrap());
        assert_eq!(cfg.initial_cooldown_ns, 30 * NS_PER_SEC);
    }

    #[test]
    fn explicit_values_are_honored() {
        let cfg = LedgerConfig::from_env_values(
            Some(" deployment_eu_1 ".to_string()),
            Some("120".to_string()),
        )
        .unwrap();
        assert_eq!(cfg.system_identity.as_str(), "deployment_eu_1");
        assert_eq!(cfg.initial_cooldown_ns, 120 * NS_PER_SEC);
    }

    #[test]
    fn unusable_cooldown_falls_back_to_default() {
        for raw in ["0", "-5", "soon", ""] {
            let cfg = LedgerConfig::from_env_values(None, Some(raw.to_string())).unwrap();
            assert_eq!(cfg.initial_cooldown_ns, secs_to_ns(DEFAULT_COOLDOWN_SECS));
        }
    }
}
