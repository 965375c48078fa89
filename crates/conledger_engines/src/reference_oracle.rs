#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use conledger_kernel_contracts::decryption::{
    encode_cleartext_slots, CallbackSelector, DecryptionOracle, DecryptionRequestId, OracleError,
};
use conledger_kernel_contracts::fhe::CiphertextHandle;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::symbolic_fhe::SymbolicFhe;

const PROOF_DOMAIN: &[u8] = b"conledger.oracle.cleartexts.v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOracleRequest {
    pub handles: Vec<CiphertextHandle>,
    pub callback: CallbackSelector,
}

/// What the oracle hands back to the ledger's callback entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleFulfillment {
    pub request_id: DecryptionRequestId,
    pub cleartexts: Vec<u8>,
    pub proof: Vec<u8>,
}

/// Single-signer decryption oracle used by tests and the simulator.
///
/// Request ids are dense from 1. The proof is an Ed25519 signature over the
/// request id and the cleartext bytes; it says nothing about which handles
/// were decrypted.
#[derive(Debug)]
pub struct ReferenceDecryptionOracle {
    signing_key: SigningKey,
    next_request_id: u64,
    requests: BTreeMap<DecryptionRequestId, PendingOracleRequest>,
}

impl ReferenceDecryptionOracle {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
            next_request_id: 1,
            requests: BTreeMap::new(),
        }
    }

    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
            next_request_id: 1,
            requests: BTreeMap::new(),
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn pending_request(
        &self,
        request_id: DecryptionRequestId,
    ) -> Option<&PendingOracleRequest> {
        self.requests.get(&request_id)
    }

    /// Decrypts every handle of a request and signs the encoded cleartexts.
    pub fn fulfill(
        &self,
        request_id: DecryptionRequestId,
        fhe: &SymbolicFhe,
    ) -> Result<OracleFulfillment, OracleError> {
        let pending = self
            .requests
            .get(&request_id)
            .ok_or(OracleError::UnknownRequest(request_id))?;
        let values = pending
            .handles
            .iter()
            .map(|h| fhe.reveal(h).ok_or(OracleError::UndecryptableHandle(*h)))
            .collect::<Result<Vec<u64>, OracleError>>()?;
        let cleartexts = encode_cleartext_slots(&values);
        let proof = self.sign_cleartexts(request_id, &cleartexts);
        tracing::debug!(
            request_id = request_id.0,
            slots = values.len(),
            "oracle fulfilled request"
        );
        Ok(OracleFulfillment {
            request_id,
            cleartexts,
            proof,
        })
    }

    /// Signs arbitrary cleartexts for a request id. The signature is genuine
    /// regardless of whether the bytes match the submitted handles.
    pub fn sign_cleartexts(&self, request_id: DecryptionRequestId, cleartexts: &[u8]) -> Vec<u8> {
        let msg = proof_message(request_id, cleartexts);
        self.signing_key.sign(&msg).to_bytes().to_vec()
    }
}

impl DecryptionOracle for ReferenceDecryptionOracle {
    fn request_decryption(
        &mut self,
        handles: &[CiphertextHandle],
        callback: CallbackSelector,
    ) -> Result<DecryptionRequestId, OracleError> {
        if handles.is_empty() {
            return Err(OracleError::Unavailable(
                "request carries no ciphertext handles".to_string(),
            ));
        }
        let request_id = DecryptionRequestId(self.next_request_id);
        self.next_request_id = self.next_request_id.saturating_add(1);
        self.requests.insert(
            request_id,
            PendingOracleRequest {
                handles: handles.to_vec(),
                callback,
            },
        );
        Ok(request_id)
    }

    fn verify_signatures(
        &self,
        request_id: DecryptionRequestId,
        cleartexts: &[u8],
        proof: &[u8],
    ) -> bool {
        let Ok(signature) = Signature::from_slice(proof) else {
            return false;
        };
        let msg = proof_message(request_id, cleartexts);
        self.verifying_key().verify(&msg, &signature).is_ok()
    }
}

fn proof_message(request_id: DecryptionRequestId, cleartexts: &[u8]) -> Vec<u8> {
    let mut msg = Vec::with_capacity(PROOF_DOMAIN.len() + 8 + cleartexts.len());
    msg.extend_from_slice(PROOF_DOMAIN);
    msg.extend_from_slice(&request_id.0.to_be_bytes());
    msg.extend_from_slice(cleartexts);
    msg
}
