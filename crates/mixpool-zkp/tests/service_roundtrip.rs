//! # Proof Service Round Trips
//!
//! Drives `ProofService` end to end over the mock backend: key generation,
//! proving against a real tree, verification, tampering, and the error
//! categories callers depend on.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use serde_json::{json, Value};

use mixpool_core::{FieldElement, ProtocolError, PublicInputs, TreeDepth};
use mixpool_crypto::{derive_nullifier, leaf_commitment, MerkleTree};
use mixpool_zkp::request::scalar_to_value;
use mixpool_zkp::{
    MockBackend, Proof, ProofService, ProveRequest, ProvingBackend, ServiceConfig,
};

struct Pool {
    dir: tempfile::TempDir,
    pk: PathBuf,
    vk: PathBuf,
}

impl Pool {
    fn new(depth: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pk = dir.path().join("mixpool.pk.json");
        let vk = dir.path().join("mixpool.vk.json");
        MockBackend::new(depth).generate_keys(&pk, &vk).unwrap();
        Self { dir, pk, vk }
    }

    fn service(&self, depth: usize) -> ProofService<MockBackend> {
        ProofService::new(MockBackend::new(depth), self.vk.as_path(), Some(self.pk.clone())).unwrap()
    }
}

fn fe(v: u64) -> FieldElement {
    FieldElement::from(v)
}

/// Two prior deposits, then ours at index 2.
fn depth_two_request(secret: &FieldElement, exthash: u64) -> (ProveRequest, MerkleTree) {
    let depth = TreeDepth::new(2).unwrap();
    let mut tree = MerkleTree::from_leaves(depth, [fe(1111), fe(2222)]).unwrap();
    let index = tree.append(leaf_commitment(secret)).unwrap();
    let witness = tree.witness(index).unwrap();
    let public = PublicInputs {
        root: tree.root(),
        exthash: fe(exthash),
    };
    (ProveRequest::from_witness(public, secret.clone(), witness), tree)
}

#[test]
fn prove_then_verify_depth_two() {
    let pool = Pool::new(2);
    let service = pool.service(2);
    let secret = FieldElement::from_decimal("98765432109876543210").unwrap();
    let (request, tree) = depth_two_request(&secret, 7);

    let proof = service.prove(&request).unwrap();
    assert!(service.verify(&proof).unwrap());

    let expected = derive_nullifier(&secret, &fe(2));
    assert_eq!(proof.scalar("nullifier"), Some(expected.clone()));
    assert_eq!(proof.scalar("root"), Some(tree.root()));
    assert_eq!(proof.public_inputs().map(|v| v.len()), Some(1));
    assert_eq!(service.nullifier(&secret, &fe(2)).unwrap(), expected);
}

#[test]
fn proof_survives_a_json_round_trip() {
    let pool = Pool::new(2);
    let service = pool.service(2);
    let (request, _) = depth_two_request(&fe(5), 0);
    let proof = service.prove(&request).unwrap();

    let text = serde_json::to_string_pretty(&proof).unwrap();
    let back = Proof::from_json(&text).unwrap();
    assert_eq!(back, proof);
    assert!(service.verify(&back).unwrap());
    assert!(service.verify_value(&serde_json::from_str(&text).unwrap()).unwrap());
}

#[test]
fn tampered_public_values_do_not_verify() {
    let pool = Pool::new(2);
    let service = pool.service(2);
    let (request, _) = depth_two_request(&fe(5), 9);
    let proof = service.prove(&request).unwrap();

    for field in ["exthash", "root", "nullifier"] {
        let mut value = proof.as_value().clone();
        value[field] = json!("12345");
        assert!(!service.verify_value(&value).unwrap(), "{field} tampering verified");
    }
}

#[test]
fn proof_under_another_key_pair_does_not_verify() {
    let first = Pool::new(2);
    let second = Pool::new(2);
    let (request, _) = depth_two_request(&fe(5), 9);
    let proof = first.service(2).prove(&request).unwrap();
    assert!(!second.service(2).verify(&proof).unwrap());
}

#[test]
fn unsatisfied_statement_is_proving_error() {
    let pool = Pool::new(2);
    let service = pool.service(2);
    let (mut request, _) = depth_two_request(&fe(5), 9);
    request.spend_preimage = fe(6);
    assert!(matches!(service.prove(&request), Err(ProtocolError::Proving(_))));
}

#[test]
fn per_call_key_overrides_default() {
    let pool = Pool::new(2);
    let service = ProofService::new(MockBackend::new(2), pool.vk.as_path(), None).unwrap();
    let (request, _) = depth_two_request(&fe(5), 9);
    assert!(matches!(service.prove(&request), Err(ProtocolError::MissingKey)));

    let proof = service.prove(&request.with_proving_key(&pool.pk)).unwrap();
    assert!(service.verify(&proof).unwrap());
}

#[test]
fn missing_per_call_key_is_backend_error() {
    let pool = Pool::new(2);
    let service = pool.service(2);
    let (request, _) = depth_two_request(&fe(5), 9);
    let request = request.with_proving_key(pool.dir.path().join("absent.pk.json"));
    assert!(matches!(service.prove(&request), Err(ProtocolError::Backend(_))));
}

#[test]
fn verify_value_rejects_non_proofs() {
    let pool = Pool::new(2);
    let service = pool.service(2);
    for bad in [json!("proof"), json!(1), json!([1, 2]), Value::Null] {
        assert!(matches!(
            service.verify_value(&bad),
            Err(ProtocolError::TypeMismatch { .. })
        ));
    }
    assert!(!service.verify_value(&json!({"A": ["1"]})).unwrap());
}

#[test]
fn json_request_form_proves() {
    let pool = Pool::new(2);
    let service = pool.service(2);
    let secret = fe(5);
    let (typed, _) = depth_two_request(&secret, 9);
    let path: Vec<Value> = typed.path.iter().map(|p| scalar_to_value(p).unwrap()).collect();
    let value = json!({
        "root": scalar_to_value(&typed.root).unwrap(),
        "exthash": 9,
        "secret": 5,
        "address": 2,
        "path": path,
    });
    let request = ProveRequest::from_value(&value).unwrap();
    let proof = service.prove(&request).unwrap();
    assert_eq!(proof, service.prove(&typed).unwrap());
}

#[test]
fn nullifiers_are_deterministic_and_distinct() {
    let pool = Pool::new(2);
    let service = pool.service(2);
    let a = service.nullifier_value(&json!(77), &json!(1)).unwrap();
    let b = service.nullifier(&fe(77), &fe(1)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, service.nullifier(&fe(77), &fe(2)).unwrap());
    assert_ne!(a, service.nullifier(&fe(78), &fe(1)).unwrap());
    for bad in [json!(1.5), json!("77")] {
        assert!(matches!(
            service.nullifier_value(&bad, &json!(1)),
            Err(ProtocolError::TypeMismatch { .. })
        ));
    }
}

#[test]
fn field_order_enforcement_rejects_oversized_scalars() {
    let pool = Pool::new(2);
    let service = pool.service(2).with_field_order_enforcement(true);
    let modulus = FieldElement::from_biguint(mixpool_core::scalar_field_modulus().clone());
    assert!(matches!(
        service.nullifier(&modulus, &fe(0)),
        Err(ProtocolError::FieldRange { .. })
    ));
}

#[test]
fn from_config_builds_mock_service() {
    let pool = Pool::new(3);
    let yaml = format!(
        "verifying_key: {}\nproving_key: {}\nenforce_field_order: true\nbackend:\n  kind: mock\n  tree_depth: 3\n",
        pool.vk.display(),
        pool.pk.display()
    );
    let config = ServiceConfig::from_yaml_str(&yaml).unwrap();
    let service = ProofService::from_config(&config).unwrap();
    assert_eq!(service.tree_depth().get(), 3);
    assert_eq!(service.backend().name(), "mock");

    let depth = TreeDepth::new(3).unwrap();
    let mut tree = MerkleTree::new(depth);
    let index = tree.append(leaf_commitment(&fe(31))).unwrap();
    let request = ProveRequest::from_witness(
        PublicInputs {
            root: tree.root(),
            exthash: fe(1),
        },
        fe(31),
        tree.witness(index).unwrap(),
    );
    let proof = service.prove(&request).unwrap();
    assert!(service.verify(&proof).unwrap());
}

#[test]
fn concurrent_calls_share_one_service() {
    let pool = Pool::new(2);
    let service = Arc::new(pool.service(2));
    let handles: Vec<_> = (0..4u64)
        .map(|i| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let (request, _) = depth_two_request(&fe(100 + i), i);
                let proof = service.prove(&request).unwrap();
                service.verify(&proof).unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
