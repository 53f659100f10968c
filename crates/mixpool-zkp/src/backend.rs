//! # Proving Backend Capability
//!
//! The proving/verifying engine is an opaque capability with four operations.
//! Any conforming implementation (in-process, subprocess, remote) can sit
//! behind a `ProofService`.
//!
//! ## Boundary Encoding
//!
//! Every scalar crosses this boundary as canonical base-10 ASCII text, the
//! address as a `{0,1}` string, keys and proofs as canonical JSON text.
//! Nothing on this surface carries a fixed-width integer.
//!
//! ## Security Invariant
//!
//! The trait requires `Send + Sync`: a backend is shared read-only by every
//! call on a service. Implementations must not mutate shared state per call.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mixpool_core::ProtocolError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error reaching or talking to a backend.
///
/// A backend *declining* to prove is not an error; it is `Ok(None)` from
/// [`ProvingBackend::prove`].
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend could not be started or reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with something outside the wire contract.
    #[error("backend protocol violation: {0}")]
    Protocol(String),

    /// Key material could not be read or does not belong to this backend.
    #[error("key material error: {0}")]
    Key(String),

    /// The backend does not implement this operation.
    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    /// I/O failure while talking to the backend.
    #[error("backend I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BackendError> for ProtocolError {
    fn from(err: BackendError) -> Self {
        ProtocolError::Backend(err.to_string())
    }
}

/// Arguments of a backend prove call, already validated and encoded.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendProveRequest {
    /// Proving key location.
    pub proving_key: PathBuf,
    /// Tree root, decimal.
    pub root: String,
    /// External data hash, decimal.
    pub exthash: String,
    /// Leaf preimage, decimal. Secret.
    pub spend_preimage: String,
    /// `{0,1}` string of length `tree_depth`. Secret.
    pub address_bits: String,
    /// `tree_depth` sibling hashes, decimal. Secret.
    pub path: Vec<String>,
}

impl fmt::Debug for BackendProveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendProveRequest")
            .field("proving_key", &self.proving_key)
            .field("root", &self.root)
            .field("exthash", &self.exthash)
            .field("path_len", &self.path.len())
            .finish_non_exhaustive()
    }
}

/// The operation surface a proving/verifying engine must provide.
pub trait ProvingBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// The circuit's fixed tree depth. Constant for the backend's lifetime.
    fn tree_depth(&self) -> Result<usize, BackendError>;

    /// Produce a serialized proof, or `None` if the witness does not satisfy
    /// the circuit.
    fn prove(&self, request: &BackendProveRequest) -> Result<Option<String>, BackendError>;

    /// Check a serialized proof against a serialized verifying key.
    fn verify(&self, verifying_key: &str, proof: &str) -> Result<bool, BackendError>;

    /// Derive the nullifier for `(secret, leaf_index)`; all text is decimal.
    fn nullifier(&self, secret: &str, leaf_index: &str) -> Result<String, BackendError>;

    /// Write a matched proving-key / verifying-key pair.
    fn generate_keys(&self, _proving_key: &Path, _verifying_key: &Path) -> Result<(), BackendError> {
        Err(BackendError::Unsupported("generate_keys"))
    }
}

impl<B: ProvingBackend + ?Sized> ProvingBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn tree_depth(&self) -> Result<usize, BackendError> {
        (**self).tree_depth()
    }

    fn prove(&self, request: &BackendProveRequest) -> Result<Option<String>, BackendError> {
        (**self).prove(request)
    }

    fn verify(&self, verifying_key: &str, proof: &str) -> Result<bool, BackendError> {
        (**self).verify(verifying_key, proof)
    }

    fn nullifier(&self, secret: &str, leaf_index: &str) -> Result<String, BackendError> {
        (**self).nullifier(secret, leaf_index)
    }

    fn generate_keys(&self, proving_key: &Path, verifying_key: &Path) -> Result<(), BackendError> {
        (**self).generate_keys(proving_key, verifying_key)
    }
}

impl<B: ProvingBackend + ?Sized> ProvingBackend for Arc<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn tree_depth(&self) -> Result<usize, BackendError> {
        (**self).tree_depth()
    }

    fn prove(&self, request: &BackendProveRequest) -> Result<Option<String>, BackendError> {
        (**self).prove(request)
    }

    fn verify(&self, verifying_key: &str, proof: &str) -> Result<bool, BackendError> {
        (**self).verify(verifying_key, proof)
    }

    fn nullifier(&self, secret: &str, leaf_index: &str) -> Result<String, BackendError> {
        (**self).nullifier(secret, leaf_index)
    }

    fn generate_keys(&self, proving_key: &Path, verifying_key: &Path) -> Result<(), BackendError> {
        (**self).generate_keys(proving_key, verifying_key)
    }
}
