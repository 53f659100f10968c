//! # Content Digest — SHA-256 Fingerprints
//!
//! Verifying keys and mock proofs are fingerprinted with SHA-256. Whole
//! documents are digested only through [`CanonicalBytes`], so two JSON texts
//! that differ only in whitespace or key order share a fingerprint.
//!
//! [`Sha256Accumulator`] covers the composite case where canonical bytes are
//! concatenated with domain tags or decimal scalars before hashing.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;

/// A 32-byte SHA-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

/// Compute a SHA-256 digest from canonical bytes.
///
/// Accepts only `&CanonicalBytes`, not raw `&[u8]`, so document fingerprints
/// always flow through canonicalization.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    let mut acc = Sha256Accumulator::new();
    acc.update(data.as_bytes());
    acc.finalize()
}

/// Compute a SHA-256 hex string from canonical bytes.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    sha256_digest(data).to_hex()
}

/// Incremental SHA-256 over a sequence of byte slices.
#[derive(Debug, Clone, Default)]
pub struct Sha256Accumulator {
    hasher: Sha256,
}

impl Sha256Accumulator {
    /// Start an empty accumulation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes.
    pub fn update(&mut self, bytes: &[u8]) -> &mut Self {
        self.hasher.update(bytes);
        self
    }

    /// Finish and return the digest.
    pub fn finalize(self) -> ContentDigest {
        let hash = self.hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hash);
        ContentDigest(bytes)
    }

    /// Finish and return the lowercase hex digest.
    pub fn finalize_hex(self) -> String {
        self.finalize().to_hex()
    }
}
