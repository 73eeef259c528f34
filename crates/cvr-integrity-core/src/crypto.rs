//! SHA-256 digests and the combinable hash primitive.
//!
//! Every digest that crosses a crate boundary is rendered as 64 lowercase hex
//! characters. Parent digests are computed over the concatenated *hex* text of
//! their children, not the raw bytes, so the whole tree can be reproduced with
//! nothing more than `sha256sum`.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{CoreError, Result};

/// A 32-byte SHA-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sha256Hash(pub [u8; 32]);

impl Sha256Hash {
    /// Compute the SHA-256 hash of data.
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hasher.finalize().into())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        if s.len() != 64 {
            return Err(CoreError::InvalidDigest(format!(
                "expected 64 hex characters, got {}",
                s.len()
            )));
        }
        let mut arr = [0u8; 32];
        hex::decode_to_slice(s, &mut arr).map_err(|e| CoreError::InvalidDigest(e.to_string()))?;
        Ok(Self(arr))
    }

    /// SHA-256 of the empty input.
    pub fn empty() -> Self {
        Self::hash(&[])
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SHA256({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for Sha256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Sha256Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A digest paired with the key that positions it among its siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinableHash {
    pub hash: Sha256Hash,
    pub sort_key: String,
}

impl CombinableHash {
    pub fn new(hash: Sha256Hash, sort_key: impl Into<String>) -> Self {
        Self {
            hash,
            sort_key: sort_key.into(),
        }
    }
}

/// Combine sibling digests into their parent digest.
///
/// Entries are sorted by `sort_key` (Unicode scalar order), ties broken by the
/// digest itself, and the hex digests are concatenated and hashed. The result
/// depends only on the set of entries, never on iteration order.
///
/// Zero entries yield the SHA-256 of the empty input.
pub fn compute_combined_hash<I>(entries: I) -> Sha256Hash
where
    I: IntoIterator<Item = CombinableHash>,
{
    let mut entries: Vec<CombinableHash> = entries.into_iter().collect();
    entries.sort_by(|a, b| {
        a.sort_key
            .cmp(&b.sort_key)
            .then_with(|| a.hash.cmp(&b.hash))
    });

    let mut hasher = Sha256::new();
    for entry in &entries {
        hasher.update(entry.hash.to_hex().as_bytes());
    }
    Sha256Hash(hasher.finalize().into())
}
