#![allow(dead_code)]

use conledger_engines::reference_oracle::{OracleFulfillment, ReferenceDecryptionOracle};
use conledger_engines::symbolic_fhe::SymbolicFhe;
use conledger_kernel_contracts::access::ActorId;
use conledger_kernel_contracts::batch::{BatchId, ClaimSubmission, PolicySubmission};
use conledger_kernel_contracts::decryption::DecryptionRequestId;
use conledger_kernel_contracts::MonotonicTimeNs;
use conledger_os::{ConfidentialLedger, LedgerConfig};

pub type TestLedger = ConfidentialLedger<SymbolicFhe, ReferenceDecryptionOracle>;

pub const ORACLE_SEED: [u8; 32] = [7; 32];

pub fn actor(id: &str) -> ActorId {
    ActorId::new(id).unwrap()
}

/// A ledger owned by `insurer_owner` with `provider_a` registered, and a
/// clock that advances by one full cooldown per tick.
pub struct Harness {
    pub ledger: TestLedger,
    pub owner: ActorId,
    pub provider: ActorId,
    now: u64,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::mvp_v1().unwrap())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        let owner = actor("insurer_owner");
        let provider = actor("provider_a");
        let ledger = ConfidentialLedger::new(
            &config,
            owner.clone(),
            SymbolicFhe::new(),
            ReferenceDecryptionOracle::from_seed(ORACLE_SEED),
        )
        .unwrap();
        let mut h = Self {
            ledger,
            owner,
            provider,
            now: 0,
        };
        let t = h.tick();
        let (owner, provider) = (h.owner.clone(), h.provider.clone());
        h.ledger.add_provider(&owner, t, provider).unwrap();
        h
    }

    pub fn now(&self) -> MonotonicTimeNs {
        MonotonicTimeNs(self.now)
    }

    pub fn tick(&mut self) -> MonotonicTimeNs {
        self.now += self.ledger.cooldown_ns();
        MonotonicTimeNs(self.now)
    }

    pub fn policy(
        &mut self,
        batch_id: BatchId,
        coverage: u64,
        risk: u64,
        premium: u64,
    ) -> PolicySubmission {
        let fhe = self.ledger.fhe_mut();
        PolicySubmission {
            batch_id,
            coverage: fhe.encrypt(coverage),
            risk_factor: fhe.encrypt(risk),
            premium: fhe.encrypt(premium),
        }
    }

    pub fn claim(&mut self, batch_id: BatchId, amount: u64, policy_ref: u64) -> ClaimSubmission {
        let fhe = self.ledger.fhe_mut();
        ClaimSubmission {
            batch_id,
            claim_amount: fhe.encrypt(amount),
            policy_ref: fhe.encrypt(policy_ref),
        }
    }

    pub fn open(&mut self) -> BatchId {
        let t = self.tick();
        let owner = self.owner.clone();
        self.ledger.open_batch(&owner, t).unwrap()
    }

    pub fn close(&mut self, batch_id: BatchId) {
        let t = self.tick();
        let owner = self.owner.clone();
        self.ledger.close_batch(&owner, t, batch_id).unwrap();
    }

    pub fn submit_policy(
        &mut self,
        batch_id: BatchId,
        coverage: u64,
        risk: u64,
        premium: u64,
    ) -> u32 {
        let submission = self.policy(batch_id, coverage, risk, premium);
        let t = self.tick();
        let provider = self.provider.clone();
        self.ledger.submit_policy(&provider, t, submission).unwrap()
    }

    pub fn submit_claim(&mut self, batch_id: BatchId, amount: u64, policy_ref: u64) -> u32 {
        let submission = self.claim(batch_id, amount, policy_ref);
        let t = self.tick();
        let provider = self.provider.clone();
        self.ledger.submit_claim(&provider, t, submission).unwrap()
    }

    /// Batch 1 of the reference scenario: two policies, one claim, closed.
    pub fn closed_reference_batch(&mut self) -> BatchId {
        let b = self.open();
        self.submit_policy(b, 100, 5, 10);
        self.submit_policy(b, 200, 3, 20);
        self.submit_claim(b, 50, 0);
        self.close(b);
        b
    }

    pub fn request(&mut self, batch_id: BatchId) -> DecryptionRequestId {
        let t = self.tick();
        let provider = self.provider.clone();
        self.ledger
            .request_batch_totals_decryption(&provider, t, batch_id)
            .unwrap()
            .request_id
    }

    pub fn fulfill(&self, request_id: DecryptionRequestId) -> OracleFulfillment {
        self.ledger
            .oracle()
            .fulfill(request_id, self.ledger.fhe())
            .unwrap()
    }

    pub fn event_names(&self) -> Vec<&'static str> {
        self.ledger.events().iter().map(|e| e.kind.name()).collect()
    }
}
