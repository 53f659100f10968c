//! Errors raised by the reference tree.

use mixpool_core::ProtocolError;
use thiserror::Error;

/// Error in the reference Merkle tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Every leaf slot of the fixed-depth tree is occupied.
    #[error("tree is full: all {capacity} leaves are occupied")]
    TreeFull {
        /// Number of leaves in a full tree.
        capacity: u64,
    },

    /// A witness was requested for a leaf that has not been appended.
    #[error("leaf index {index} out of range for a tree of {len} leaves")]
    LeafIndexOutOfRange {
        /// Requested leaf index.
        index: u64,
        /// Number of leaves currently in the tree.
        len: u64,
    },

    /// A witness whose path and address disagree, or that is deeper than any
    /// supported tree.
    #[error("malformed witness: {0}")]
    MalformedWitness(String),
}

impl From<CryptoError> for ProtocolError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::MalformedWitness(msg) => ProtocolError::Format(msg),
            other => ProtocolError::InvariantViolation(other.to_string()),
        }
    }
}
