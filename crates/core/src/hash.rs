//! SHA-256 hashing utilities for the ledger.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A named alias for a 32-byte(u8) array, used to represent a 256-bit hash.
pub type H256 = [u8; 32];

/// A wrapper type for H256 with Display and Debug formatting.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Hash(pub H256);

impl Hash {
    /// The zero hash (all zeros), used as the genesis sentinel previous hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a new Hash from raw bytes.
    pub fn from_bytes(bytes: H256) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &H256 {
        &self.0
    }

    /// Convert to a hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash(0x{})", &self.to_hex()[..8])
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<H256> for Hash {
    fn from(bytes: H256) -> Self {
        Self(bytes)
    }
}

impl From<Hash> for H256 {
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Hash arbitrary data using SHA-256.
pub fn hash(data: &[u8]) -> Hash {
    let digest = Sha256::digest(data);
    Hash(digest.into())
}

/// Hash a serializable value over its canonical JSON encoding.
///
/// Compact JSON with BTreeMap-backed maps is key-sorted, so two structurally
/// equal values always hash identically. Proposer and verifier both go
/// through this function.
pub fn hash_json<T: Serialize>(value: &T) -> Hash {
    let encoded = serde_json::to_vec(value).expect("canonical JSON encoding should not fail");
    hash(&encoded)
}
