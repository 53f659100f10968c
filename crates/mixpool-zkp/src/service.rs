//! # Proof Service — The Protocol Facade
//!
//! `ProofService` exposes `prove`, `verify`, `nullifier` and `tree_depth`,
//! and enforces every input-shape invariant before a call crosses into the
//! backend.
//!
//! ## Validation Order (prove)
//!
//! Cheap checks first, and all of them before the backend is touched:
//!
//! 1. `path` has exactly `TreeDepth` elements (`Format`).
//! 2. The address joins to `^[01]+$` of length `TreeDepth` (`Format`).
//! 3. With field-order enforcement on, every scalar is below the BN254
//!    modulus (`FieldRange`).
//! 4. A proving key resolves: per-call, else the default (`MissingKey`).
//!
//! ## Logging
//!
//! Only public values are logged: `root`, `exthash`, lengths and outcomes.
//! The preimage, path and address bits never reach a log line.
//!
//! ## Concurrency
//!
//! The service holds no mutable state. With a `Send + Sync` backend it may be
//! shared across threads and every call runs independently.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use mixpool_core::{AddressBits, FieldElement, MerkleWitness, ProtocolError, TreeDepth};

use crate::backend::{BackendProveRequest, ProvingBackend};
use crate::config::ServiceConfig;
use crate::keys::{ProvingKeyRef, VerifyingKey, VerifyingKeySource, VerifyingKeyStore};
use crate::proof::Proof;
use crate::request::{scalar_from_value, ProveRequest};

/// Facade over a proving backend and the pool's verifying key.
pub struct ProofService<B: ProvingBackend> {
    backend: B,
    verifying_key: VerifyingKeyStore,
    default_proving_key: Option<ProvingKeyRef>,
    tree_depth: TreeDepth,
    enforce_field_order: bool,
}

impl<B: ProvingBackend> ProofService<B> {
    /// Bind a backend, a verifying key and an optional default proving key.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the default proving key does not exist.
    /// - `TypeMismatch` if the verifying key is none of the accepted forms.
    /// - `InvariantViolation` if the backend's depth is outside `[1, 32]`.
    /// - `Backend` if the backend cannot report its depth.
    pub fn new(
        backend: B,
        verifying_key: impl Into<VerifyingKeySource>,
        default_proving_key: Option<PathBuf>,
    ) -> Result<Self, ProtocolError> {
        let default_proving_key = default_proving_key
            .map(ProvingKeyRef::existing)
            .transpose()?;
        let verifying_key = VerifyingKeyStore::load(verifying_key)?;
        let tree_depth = TreeDepth::new(backend.tree_depth()?)?;

        info!(
            backend = backend.name(),
            %tree_depth,
            vk_fingerprint = %verifying_key.key().fingerprint().to_hex(),
            default_proving_key = ?default_proving_key.as_ref().map(|k| k.path().display().to_string()),
            "proof service ready"
        );

        Ok(Self {
            backend,
            verifying_key,
            default_proving_key,
            tree_depth,
            enforce_field_order: false,
        })
    }

    /// Reject scalars at or above the field modulus before calling the backend.
    pub fn with_field_order_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_field_order = enforce;
        self
    }

    /// The circuit's fixed tree depth.
    pub fn tree_depth(&self) -> TreeDepth {
        self.tree_depth
    }

    /// The verifying key every `verify` call uses.
    pub fn verifying_key(&self) -> &VerifyingKey {
        self.verifying_key.key()
    }

    /// The bound backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn check_field(&self, input: &'static str, value: &FieldElement) -> Result<(), ProtocolError> {
        if self.enforce_field_order {
            value.require_in_field(input)
        } else {
            Ok(())
        }
    }

    /// Derive the nullifier for `(secret, leaf_index)`.
    pub fn nullifier(
        &self,
        secret: &FieldElement,
        leaf_index: &FieldElement,
    ) -> Result<FieldElement, ProtocolError> {
        self.check_field("secret", secret)?;
        self.check_field("leaf_index", leaf_index)?;
        let text = self
            .backend
            .nullifier(&secret.to_decimal(), &leaf_index.to_decimal())?;
        FieldElement::from_decimal(text.trim()).map_err(|e| {
            ProtocolError::Backend(format!("nullifier output is not decimal text: {e}"))
        })
    }

    /// `nullifier` over dynamic values; anything but a non-negative JSON
    /// integer, numeric strings included, is `TypeMismatch`.
    pub fn nullifier_value(
        &self,
        secret: &Value,
        leaf_index: &Value,
    ) -> Result<FieldElement, ProtocolError> {
        let secret = scalar_from_value("secret", secret)?;
        let leaf_index = scalar_from_value("leaf_index", leaf_index)?;
        self.nullifier(&secret, &leaf_index)
    }

    /// Produce a proof of membership and knowledge of the leaf preimage.
    ///
    /// # Errors
    ///
    /// `Format`, `FieldRange` and `MissingKey` before the backend is called
    /// (see the module docs); `Proving` if the backend returns no proof;
    /// `Backend` if it cannot be reached or returns unparseable output.
    pub fn prove(&self, request: &ProveRequest) -> Result<Proof, ProtocolError> {
        let witness = MerkleWitness::new(request.path.clone(), request.address.clone(), self.tree_depth)?;

        self.check_field("root", &request.root)?;
        self.check_field("spend_preimage", &request.spend_preimage)?;
        self.check_field("exthash", &request.exthash)?;
        for element in &witness.path {
            self.check_field("path", element)?;
        }

        let proving_key = request
            .proving_key
            .clone()
            .map(ProvingKeyRef::trusted)
            .or_else(|| self.default_proving_key.clone())
            .ok_or(ProtocolError::MissingKey)?;

        let backend_request = encode_request(request, &witness.address_bits, &witness.path, &proving_key);

        debug!(
            root = %request.root,
            exthash = %request.exthash,
            tree_depth = %self.tree_depth,
            proving_key = %proving_key.path().display(),
            "proving"
        );
        let started = Instant::now();
        let output = self.backend.prove(&backend_request)?;
        let elapsed_ms = millis(started.elapsed());

        let Some(text) = output else {
            warn!(root = %request.root, elapsed_ms, "backend produced no proof");
            return Err(ProtocolError::Proving(
                "backend produced no proof; the witness does not satisfy the circuit".to_string(),
            ));
        };
        let proof = Proof::from_json(&text)
            .map_err(|e| ProtocolError::Backend(format!("backend returned an unusable proof: {e}")))?;
        info!(root = %request.root, elapsed_ms, "proof generated");
        Ok(proof)
    }

    /// Check a proof against the service's verifying key.
    ///
    /// A proof that does not verify is `Ok(false)`, never an error.
    pub fn verify(&self, proof: &Proof) -> Result<bool, ProtocolError> {
        let verified = self
            .backend
            .verify(self.verifying_key.to_json(), proof.to_json())?;
        debug!(verified, "verification complete");
        Ok(verified)
    }

    /// `verify` over a dynamic value; a non-proof is `TypeMismatch`.
    pub fn verify_value(&self, proof: &Value) -> Result<bool, ProtocolError> {
        let proof = Proof::from_value(proof.clone())?;
        self.verify(&proof)
    }
}

impl ProofService<Box<dyn ProvingBackend>> {
    /// Build a service from configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ProtocolError> {
        let backend = config.build_backend();
        let service = Self::new(
            backend,
            config.verifying_key.clone(),
            config.proving_key.clone(),
        )?;
        Ok(service.with_field_order_enforcement(config.enforce_field_order))
    }
}

/// Whole milliseconds, saturating at `u64::MAX`.
fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn encode_request(
    request: &ProveRequest,
    address_bits: &AddressBits,
    path: &[FieldElement],
    proving_key: &ProvingKeyRef,
) -> BackendProveRequest {
    BackendProveRequest {
        proving_key: proving_key.path().to_path_buf(),
        root: request.root.to_decimal(),
        exthash: request.exthash.to_decimal(),
        spend_preimage: request.spend_preimage.to_decimal(),
        address_bits: address_bits.as_str().to_string(),
        path: path.iter().map(FieldElement::to_decimal).collect(),
    }
}
