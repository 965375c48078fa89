#![forbid(unsafe_code)]

use std::fmt;

use serde::{Serialize, Serializer};

use crate::common::write_hex;

pub const CIPHERTEXT_HANDLE_LEN: usize = 32;

/// Opaque encrypted unsigned integer as held by the ledger.
///
/// The ledger never looks inside; only an [`EncryptedArithmetic`] backend
/// can combine or serialize it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ciphertext([u8; CIPHERTEXT_HANDLE_LEN]);

impl Ciphertext {
    pub const fn from_raw(raw: [u8; CIPHERTEXT_HANDLE_LEN]) -> Self {
        Self(raw)
    }

    /// The handle value used by backends for never-constructed ciphertexts.
    pub const fn uninitialized() -> Self {
        Self([0u8; CIPHERTEXT_HANDLE_LEN])
    }

    pub fn raw(&self) -> &[u8; CIPHERTEXT_HANDLE_LEN] {
        &self.0
    }
}

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Ciphertext(")?;
        write_hex(f, &self.0[..8])?;
        f.write_str("..)")
    }
}

/// Fixed-width serialized form of a [`Ciphertext`]; what gets hashed and
/// what gets sent to the decryption oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CiphertextHandle(pub [u8; CIPHERTEXT_HANDLE_LEN]);

impl CiphertextHandle {
    pub fn as_bytes(&self) -> &[u8; CIPHERTEXT_HANDLE_LEN] {
        &self.0
    }
}

impl fmt::Display for CiphertextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_hex(f, &self.0)
    }
}

impl Serialize for CiphertextHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Encrypted-integer capability consumed by the aggregator.
///
/// `add` and `zero` take `&mut self` because backends usually register the
/// produced ciphertext (symbolic execution, key-switch caches).
/// Implementations must be deterministic: the same operands in the same
/// order yield bit-identical handles.
pub trait EncryptedArithmetic {
    fn zero(&mut self) -> Ciphertext;
    fn add(&mut self, lhs: &Ciphertext, rhs: &Ciphertext) -> Ciphertext;
    fn is_initialized(&self, value: &Ciphertext) -> bool;
    fn serialize(&self, value: &Ciphertext) -> CiphertextHandle;
}
