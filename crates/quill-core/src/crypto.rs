//! Hashing primitives for the Quill registry.
//!
//! Wraps Blake3 with strong types. A [`Fingerprint`] commits to content
//! bytes; a [`NameHash`] commits to a normalized vanity name.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain prefix for vanity name hashing.
const NAME_DOMAIN: &[u8] = b"quill-name-v0:";

/// A 32-byte Blake3 digest of an item's content.
///
/// The store keeps only this commitment. Full content lives in the external
/// log and is checked against the fingerprint by whoever reads it back.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    /// Compute the fingerprint of the given content.
    pub fn of(content: &[u8]) -> Self {
        Self(*blake3::hash(content).as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// Check whether `content` is the payload this fingerprint commits to.
    pub fn matches(&self, content: &[u8]) -> bool {
        Self::of(content) == *self
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Fingerprint {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// A 32-byte key of the name registry.
///
/// Derived from Blake3(domain || normalize_name(name)), so names differing
/// only in case or surrounding whitespace collide.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameHash(pub [u8; 32]);

impl NameHash {
    /// Derive the registry key for a raw name.
    pub fn derive(name: &str) -> Self {
        let normalized = normalize_name(name);
        let mut hasher = blake3::Hasher::new();
        hasher.update(NAME_DOMAIN);
        hasher.update(normalized.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameHash({})", &self.to_hex()[..16])
    }
}

impl AsRef<[u8]> for NameHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for NameHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

/// Normalize a vanity name: trim surrounding whitespace, then lowercase.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
