#![forbid(unsafe_code)]

use conledger_kernel_contracts::access::SystemIdentity;
use conledger_kernel_contracts::batch::{ClaimRecord, PolicyRecord};
use conledger_kernel_contracts::decryption::{StateHash, BATCH_TOTALS_SLOTS};
use conledger_kernel_contracts::fhe::{Ciphertext, CiphertextHandle, EncryptedArithmetic};
use sha2::{Digest, Sha256};

/// Encrypted running totals of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptedBatchTotals {
    pub total_coverage: Ciphertext,
    pub total_premium: Ciphertext,
    pub total_claims: Ciphertext,
}

impl EncryptedBatchTotals {
    /// Serialized handles in the fixed oracle order: coverage, premium, claims.
    pub fn ordered_handles<F: EncryptedArithmetic + ?Sized>(
        &self,
        fhe: &F,
    ) -> [CiphertextHandle; BATCH_TOTALS_SLOTS] {
        [
            fhe.serialize(&self.total_coverage),
            fhe.serialize(&self.total_premium),
            fhe.serialize(&self.total_claims),
        ]
    }
}

/// Folds a batch's lists into encrypted totals, strictly in insertion order.
///
/// Each accumulator starts at `zero()`; empty lists leave it there. Risk
/// factors and policy references are carried by the records but never summed.
pub fn aggregate_batch<F: EncryptedArithmetic + ?Sized>(
    fhe: &mut F,
    policies: &[PolicyRecord],
    claims: &[ClaimRecord],
) -> EncryptedBatchTotals {
    let mut total_coverage = fhe.zero();
    let mut total_premium = fhe.zero();
    let mut total_claims = fhe.zero();

    for p in policies {
        total_coverage = fhe.add(&total_coverage, &p.coverage);
        total_premium = fhe.add(&total_premium, &p.premium);
    }
    for c in claims {
        total_claims = fhe.add(&total_claims, &c.claim_amount);
    }

    tracing::debug!(
        policies = policies.len(),
        claims = claims.len(),
        "batch aggregation folded"
    );

    EncryptedBatchTotals {
        total_coverage,
        total_premium,
        total_claims,
    }
}

/// SHA-256 over the ordered handles followed by the length-prefixed system
/// identity.
pub fn derive_state_hash(
    handles: &[CiphertextHandle],
    system_identity: &SystemIdentity,
) -> StateHash {
    let mut hasher = Sha256::new();
    for h in handles {
        hasher.update(h.as_bytes());
    }
    let identity = system_identity.as_bytes();
    hasher.update((identity.len() as u64).to_be_bytes());
    hasher.update(identity);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    StateHash(out)
}
