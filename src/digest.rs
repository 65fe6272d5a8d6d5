//! Content digests.
//!
//! A digest is only ever compared for equality against the previous digest
//! of the same site. It is not a security boundary.

use std::fmt;

use blake3::Hasher;
use serde::{Deserialize, Serialize};

/// Fixed-size digest of a page body, stored as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Wraps an already-computed hex digest (e.g. one read back from disk).
    #[must_use]
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Returns the hex representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produces a digest for fetched content.
///
/// Implementations must be deterministic: equal input gives an equal digest.
pub trait ContentHasher: Send + Sync {
    /// Digest of `content`.
    fn digest(&self, content: &str) -> ContentDigest;
}

/// Default hasher backed by BLAKE3.
#[derive(Debug, Default, Clone, Copy)]
pub struct Blake3Hasher;

impl ContentHasher for Blake3Hasher {
    fn digest(&self, content: &str) -> ContentDigest {
        let mut h = Hasher::new();
        h.update(content.as_bytes());
        ContentDigest(h.finalize().to_hex().to_string())
    }
}
