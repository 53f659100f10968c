//! # Mock Proving Backend
//!
//! A deterministic, transparent backend for development and testing. It
//! checks the full spend statement, exactly as the circuit would, and emits
//! a SHA-256-bound "proof" of it.
//!
//! ## Statement
//!
//! ```text
//! leaf      = H(secret)
//! root     == merkle_authenticate(path, address_bits, leaf)
//! nullifier = H(leaf_index(address_bits), secret)
//! pub_hash  = H(root, nullifier, exthash)        // the single public input
//! ```
//!
//! An unsatisfied statement yields no proof (`Ok(None)`).
//!
//! ## Proof Format
//!
//! ```json
//! {"scheme":"mock-sha256","circuit_id":"…","input":["<pub_hash>"],
//!  "root":"…","nullifier":"…","exthash":"…","digest":"<hex>"}
//! ```
//!
//! `digest = SHA256(vk_tag || canonical(proof without digest))`. The
//! `vk_tag` is random per key pair, so a proof only verifies under the key
//! pair that produced it.
//!
//! ## Security Warning
//!
//! **NOT ZERO-KNOWLEDGE.** Anyone holding the verifying key can forge a
//! proof for any public values. The secret and the path never appear in the
//! proof, but the mock MUST NOT be used where soundness is required.

use std::path::Path;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use mixpool_core::{
    CanonicalBytes, FieldElement, MerkleWitness, Sha256Accumulator, TreeDepth,
};
use mixpool_crypto::{compute_root, derive_nullifier, leaf_commitment, public_input_hash};

use crate::backend::{BackendError, BackendProveRequest, ProvingBackend};

/// Scheme tag of mock keys and proofs.
pub const MOCK_SCHEME: &str = "mock-sha256";

/// Circuit identifier of the spend statement.
pub const MOCK_CIRCUIT_ID: &str = "mixpool-spend-v1";

/// Depth of the production circuit.
pub const DEFAULT_TREE_DEPTH: usize = 29;

/// Key material shared by the proving and verifying halves of a mock pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockKey {
    /// Always [`MOCK_SCHEME`].
    pub scheme: String,
    /// Always [`MOCK_CIRCUIT_ID`].
    pub circuit_id: String,
    /// Depth the key was generated for.
    pub tree_depth: usize,
    /// Random hex tag binding proofs to this key pair.
    pub vk_tag: String,
}

impl MockKey {
    fn generate(tree_depth: usize) -> Self {
        let mut tag = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut tag);
        Self {
            scheme: MOCK_SCHEME.to_string(),
            circuit_id: MOCK_CIRCUIT_ID.to_string(),
            tree_depth,
            vk_tag: tag.iter().map(|b| format!("{b:02x}")).collect(),
        }
    }

    fn is_for(&self, tree_depth: usize) -> bool {
        self.scheme == MOCK_SCHEME && self.circuit_id == MOCK_CIRCUIT_ID && self.tree_depth == tree_depth
    }
}

/// The public part of a mock proof, before the digest is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Statement {
    scheme: String,
    circuit_id: String,
    input: Vec<FieldElement>,
    root: FieldElement,
    nullifier: FieldElement,
    exthash: FieldElement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MockProof {
    #[serde(flatten)]
    statement: Statement,
    digest: String,
}

fn statement_digest(vk_tag: &str, statement: &Statement) -> Result<String, BackendError> {
    let canonical = CanonicalBytes::new(statement)
        .map_err(|e| BackendError::Protocol(format!("cannot canonicalize statement: {e}")))?;
    let mut acc = Sha256Accumulator::new();
    acc.update(vk_tag.as_bytes()).update(canonical.as_bytes());
    Ok(acc.finalize_hex())
}

/// Deterministic mock backend of a fixed depth.
#[derive(Debug, Clone)]
pub struct MockBackend {
    tree_depth: usize,
}

impl MockBackend {
    /// A backend for a circuit of the given depth.
    pub fn new(tree_depth: usize) -> Self {
        Self { tree_depth }
    }

    fn read_key(path: &Path) -> Result<MockKey, BackendError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            BackendError::Key(format!("cannot read proving key {}: {e}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            BackendError::Key(format!("{} is not a mock key: {e}", path.display()))
        })
    }

    fn parse_scalar(name: &str, text: &str) -> Result<FieldElement, BackendError> {
        FieldElement::from_decimal(text)
            .map_err(|e| BackendError::Protocol(format!("{name} is not decimal text: {e}")))
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(DEFAULT_TREE_DEPTH)
    }
}

impl ProvingBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn tree_depth(&self) -> Result<usize, BackendError> {
        Ok(self.tree_depth)
    }

    fn prove(&self, request: &BackendProveRequest) -> Result<Option<String>, BackendError> {
        let key = Self::read_key(&request.proving_key)?;
        if !key.is_for(self.tree_depth) {
            return Err(BackendError::Key(format!(
                "proving key {} is not for {MOCK_CIRCUIT_ID} at depth {}",
                request.proving_key.display(),
                self.tree_depth
            )));
        }

        let root = Self::parse_scalar("root", &request.root)?;
        let exthash = Self::parse_scalar("exthash", &request.exthash)?;
        let secret = Self::parse_scalar("spend_preimage", &request.spend_preimage)?;
        let path = request
            .path
            .iter()
            .map(|p| Self::parse_scalar("path", p))
            .collect::<Result<Vec<_>, _>>()?;

        let depth = TreeDepth::new(self.tree_depth)
            .map_err(|e| BackendError::Protocol(e.to_string()))?;
        let witness = match MerkleWitness::new(path, request.address_bits.as_str(), depth) {
            Ok(witness) => witness,
            Err(e) => {
                warn!(error = %e, "witness shape does not match the circuit");
                return Ok(None);
            }
        };

        let leaf = leaf_commitment(&secret);
        let authenticated = compute_root(&leaf, &witness)
            .map_err(|e| BackendError::Protocol(e.to_string()))?;
        if authenticated != root {
            warn!(%root, "statement not satisfied: path does not lead to the leaf under root");
            return Ok(None);
        }

        let nullifier = derive_nullifier(&secret, &FieldElement::from(witness.leaf_index()));
        let pub_hash = public_input_hash(&root, &nullifier, &exthash);
        let statement = Statement {
            scheme: MOCK_SCHEME.to_string(),
            circuit_id: MOCK_CIRCUIT_ID.to_string(),
            input: vec![pub_hash],
            root,
            nullifier,
            exthash,
        };
        let digest = statement_digest(&key.vk_tag, &statement)?;
        let proof = CanonicalBytes::new(&MockProof { statement, digest })
            .map_err(|e| BackendError::Protocol(e.to_string()))?;
        debug!("mock proof generated");
        Ok(Some(proof.into_string()))
    }

    fn verify(&self, verifying_key: &str, proof: &str) -> Result<bool, BackendError> {
        let key: MockKey = serde_json::from_str(verifying_key)
            .map_err(|e| BackendError::Key(format!("verifying key is not a mock key: {e}")))?;
        if !key.is_for(self.tree_depth) {
            return Ok(false);
        }
        let proof: MockProof = match serde_json::from_str::<Value>(proof)
            .ok()
            .and_then(|v| serde_json::from_value(v).ok())
        {
            Some(proof) => proof,
            None => return Ok(false),
        };
        let statement = &proof.statement;
        if statement.scheme != MOCK_SCHEME || statement.circuit_id != key.circuit_id {
            return Ok(false);
        }
        let pub_hash = public_input_hash(&statement.root, &statement.nullifier, &statement.exthash);
        if statement.input != [pub_hash] {
            return Ok(false);
        }
        Ok(statement_digest(&key.vk_tag, statement)? == proof.digest)
    }

    fn nullifier(&self, secret: &str, leaf_index: &str) -> Result<String, BackendError> {
        let secret = Self::parse_scalar("secret", secret)?;
        let leaf_index = Self::parse_scalar("leaf_index", leaf_index)?;
        Ok(derive_nullifier(&secret, &leaf_index).to_decimal())
    }

    fn generate_keys(&self, proving_key: &Path, verifying_key: &Path) -> Result<(), BackendError> {
        let key = MockKey::generate(self.tree_depth);
        let text = serde_json::to_string_pretty(&key)
            .map_err(|e| BackendError::Protocol(e.to_string()))?;
        for path in [proving_key, verifying_key] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &text)?;
        }
        debug!(
            proving_key = %proving_key.display(),
            verifying_key = %verifying_key.display(),
            "mock key pair written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixpool_crypto::MerkleTree;

    struct Fixture {
        _dir: tempfile::TempDir,
        backend: MockBackend,
        pk: std::path::PathBuf,
        vk_text: String,
    }

    fn fixture(depth: usize) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let pk = dir.path().join("keys").join("pk.json");
        let vk = dir.path().join("keys").join("vk.json");
        let backend = MockBackend::new(depth);
        backend.generate_keys(&pk, &vk).unwrap();
        let vk_text = std::fs::read_to_string(&vk).unwrap();
        Fixture {
            _dir: dir,
            backend,
            pk,
            vk_text,
        }
    }

    fn request(f: &Fixture, secret: u64) -> BackendProveRequest {
        let depth = TreeDepth::new(f.backend.tree_depth).unwrap();
        let mut tree = MerkleTree::from_leaves(depth, [FieldElement::from(5u64)]).unwrap();
        let index = tree.append(leaf_commitment(&FieldElement::from(secret))).unwrap();
        let witness = tree.witness(index).unwrap();
        BackendProveRequest {
            proving_key: f.pk.clone(),
            root: tree.root().to_decimal(),
            exthash: "99".to_string(),
            spend_preimage: secret.to_string(),
            address_bits: witness.address_bits.as_str().to_string(),
            path: witness.path.iter().map(FieldElement::to_decimal).collect(),
        }
    }

    #[test]
    fn generated_keys_match() {
        let f = fixture(3);
        let pk_text = std::fs::read_to_string(&f.pk).unwrap();
        assert_eq!(pk_text, f.vk_text);
        let key: MockKey = serde_json::from_str(&f.vk_text).unwrap();
        assert!(key.is_for(3));
        assert_eq!(key.vk_tag.len(), 64);
    }

    #[test]
    fn satisfied_statement_proves_and_verifies() {
        let f = fixture(3);
        let proof = f.backend.prove(&request(&f, 1234)).unwrap().unwrap();
        assert!(f.backend.verify(&f.vk_text, &proof).unwrap());
        let value: Value = serde_json::from_str(&proof).unwrap();
        let fields = value.as_object().unwrap();
        assert!(
            fields.values().all(|v| v != &Value::String("1234".to_string())),
            "secret must not appear in the proof"
        );
    }

    #[test]
    fn wrong_secret_yields_no_proof() {
        let f = fixture(3);
        let mut req = request(&f, 1234);
        req.spend_preimage = "1235".to_string();
        assert_eq!(f.backend.prove(&req).unwrap(), None);
    }

    #[test]
    fn wrong_address_yields_no_proof() {
        let f = fixture(3);
        let mut req = request(&f, 1234);
        req.address_bits = "000".to_string();
        assert_eq!(f.backend.prove(&req).unwrap(), None);
        req.address_bits = "00".to_string();
        assert_eq!(f.backend.prove(&req).unwrap(), None);
    }

    #[test]
    fn tampered_public_values_fail_verification() {
        let f = fixture(3);
        let proof = f.backend.prove(&request(&f, 1234)).unwrap().unwrap();
        for field in ["root", "exthash", "nullifier"] {
            let mut value: Value = serde_json::from_str(&proof).unwrap();
            value[field] = Value::String("1".to_string());
            assert!(!f.backend.verify(&f.vk_text, &value.to_string()).unwrap(), "{field}");
        }
    }

    #[test]
    fn proof_from_another_key_pair_fails() {
        let f = fixture(3);
        let other = fixture(3);
        let proof = f.backend.prove(&request(&f, 1234)).unwrap().unwrap();
        assert!(!other.backend.verify(&other.vk_text, &proof).unwrap());
    }

    #[test]
    fn garbage_proof_is_false_not_error() {
        let f = fixture(2);
        assert!(!f.backend.verify(&f.vk_text, "{}").unwrap());
        assert!(!f.backend.verify(&f.vk_text, "not json").unwrap());
    }

    #[test]
    fn missing_proving_key_is_key_error() {
        let f = fixture(2);
        let mut req = request(&f, 7);
        req.proving_key = f.pk.with_file_name("absent.json");
        assert!(matches!(f.backend.prove(&req), Err(BackendError::Key(_))));
    }

    #[test]
    fn key_for_other_depth_is_rejected() {
        let f = fixture(2);
        let deeper = MockBackend::new(3);
        let mut req = request(&f, 7);
        req.path.push("0".to_string());
        req.address_bits.push('0');
        assert!(matches!(deeper.prove(&req), Err(BackendError::Key(_))));
        assert!(!deeper.verify(&f.vk_text, "{}").unwrap());
    }

    #[test]
    fn nullifier_matches_derivation() {
        let backend = MockBackend::default();
        let n = backend.nullifier("42", "3").unwrap();
        assert_eq!(
            n,
            derive_nullifier(&FieldElement::from(42u64), &FieldElement::from(3u64)).to_decimal()
        );
        assert!(matches!(backend.nullifier("x", "3"), Err(BackendError::Protocol(_))));
    }
}
