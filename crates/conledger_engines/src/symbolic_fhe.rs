#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use conledger_kernel_contracts::fhe::{
    Ciphertext, CiphertextHandle, EncryptedArithmetic, CIPHERTEXT_HANDLE_LEN,
};
use sha2::{Digest, Sha256};

const OP_ZERO: &[u8] = b"conledger.fhe.zero.v1";
const OP_ENCRYPT: &[u8] = b"conledger.fhe.encrypt.v1";
const OP_ADD: &[u8] = b"conledger.fhe.add.v1";

/// Plaintext-backed stand-in for an FHE coprocessor.
///
/// Handles are derived symbolically: every result handle is SHA-256 over the
/// operation tag and the operand handles, so the same fold over the same
/// inputs in the same order always produces the same handle, and a different
/// order produces a different one. The cleartext behind each handle is kept
/// in a private table that only [`SymbolicFhe::reveal`] reads. Addition wraps
/// at 64 bits.
#[derive(Debug, Default, Clone)]
pub struct SymbolicFhe {
    plaintexts: BTreeMap<[u8; CIPHERTEXT_HANDLE_LEN], u64>,
    next_nonce: u64,
}

impl SymbolicFhe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh encryption. Two encryptions of the same value get distinct
    /// handles.
    pub fn encrypt(&mut self, value: u64) -> Ciphertext {
        let nonce = self.next_nonce;
        self.next_nonce = self.next_nonce.wrapping_add(1);
        let raw = derive_handle(OP_ENCRYPT, &[&value.to_be_bytes(), &nonce.to_be_bytes()]);
        self.plaintexts.insert(raw, value);
        Ciphertext::from_raw(raw)
    }

    pub fn reveal(&self, handle: &CiphertextHandle) -> Option<u64> {
        self.plaintexts.get(handle.as_bytes()).copied()
    }
}

impl EncryptedArithmetic for SymbolicFhe {
    fn zero(&mut self) -> Ciphertext {
        let raw = derive_handle(OP_ZERO, &[]);
        self.plaintexts.insert(raw, 0);
        Ciphertext::from_raw(raw)
    }

    fn add(&mut self, lhs: &Ciphertext, rhs: &Ciphertext) -> Ciphertext {
        let raw = derive_handle(OP_ADD, &[lhs.raw(), rhs.raw()]);
        // Unknown operands yield a handle with no cleartext; the oracle will
        // refuse to decrypt it.
        let lhs_value = self.plaintexts.get(lhs.raw()).copied();
        let rhs_value = self.plaintexts.get(rhs.raw()).copied();
        if let (Some(a), Some(b)) = (lhs_value, rhs_value) {
            self.plaintexts.insert(raw, a.wrapping_add(b));
        }
        Ciphertext::from_raw(raw)
    }

    fn is_initialized(&self, value: &Ciphertext) -> bool {
        *value != Ciphertext::uninitialized()
    }

    fn serialize(&self, value: &Ciphertext) -> CiphertextHandle {
        CiphertextHandle(*value.raw())
    }
}

fn derive_handle(op: &[u8], operands: &[&[u8]]) -> [u8; CIPHERTEXT_HANDLE_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(op);
    for operand in operands {
        hasher.update((operand.len() as u32).to_be_bytes());
        hasher.update(operand);
    }
    let mut out = [0u8; CIPHERTEXT_HANDLE_LEN];
    out.copy_from_slice(&hasher.finalize());
    out
}
