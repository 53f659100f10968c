//! # Spend Statement Tests
//!
//! Builds the full spend statement from the reference collaborators and
//! checks the relations a prover must satisfy: the leaf authenticates under
//! the root, the nullifier is bound to the leaf index, and the public input
//! hash changes with every hashed-public value.

use std::collections::HashSet;

use mixpool_core::{FieldElement, TreeDepth};
use mixpool_crypto::{
    compute_root, derive_nullifier, leaf_commitment, public_input_hash, verify_membership,
    MerkleTree,
};

fn fe(v: u64) -> FieldElement {
    FieldElement::from(v)
}

#[test]
fn depth_two_tree_with_two_prior_deposits() {
    let depth = TreeDepth::new(2).unwrap();
    let mut tree = MerkleTree::from_leaves(depth, [fe(1111), fe(2222)]).unwrap();

    let secret = FieldElement::from_decimal("123456789012345678901234567890").unwrap();
    let leaf = leaf_commitment(&secret);
    let index = tree.append(leaf.clone()).unwrap();
    assert_eq!(index, 2);
    assert_eq!(tree.index_of(&leaf), Some(index));

    let witness = tree.witness(index).unwrap();
    assert_eq!(witness.path.len(), 2);
    assert_eq!(witness.address_bits.len(), 2);
    assert!(verify_membership(&leaf, &witness, &tree.root()));

    let nullifier = derive_nullifier(&secret, &FieldElement::from(witness.leaf_index()));
    let exthash = fe(42);
    let pub_hash = public_input_hash(&tree.root(), &nullifier, &exthash);
    assert!(pub_hash.is_in_field());
    assert_ne!(pub_hash, public_input_hash(&tree.root(), &nullifier, &fe(43)));
}

#[test]
fn wrong_secret_does_not_authenticate() {
    let depth = TreeDepth::new(3).unwrap();
    let secret = fe(77);
    let tree = MerkleTree::from_leaves(depth, [fe(5), leaf_commitment(&secret)]).unwrap();
    let witness = tree.witness(1).unwrap();
    assert!(verify_membership(&leaf_commitment(&secret), &witness, &tree.root()));
    assert!(!verify_membership(&leaf_commitment(&fe(78)), &witness, &tree.root()));
}

#[test]
fn witness_from_old_root_fails_after_append() {
    let depth = TreeDepth::new(2).unwrap();
    let mut tree = MerkleTree::from_leaves(depth, [fe(9)]).unwrap();
    let old_root = tree.root();
    let witness = tree.witness(0).unwrap();
    tree.append(fe(10)).unwrap();
    assert_eq!(compute_root(&fe(9), &witness).unwrap(), old_root);
    assert_ne!(tree.root(), old_root);
    assert!(!verify_membership(&fe(9), &witness, &tree.root()));
}

#[test]
fn nullifier_sample_has_no_collisions() {
    let mut seen = HashSet::new();
    for secret in 0..40u64 {
        for index in 0..5u64 {
            let n = derive_nullifier(&fe(secret), &fe(index));
            assert!(seen.insert(n), "collision at ({secret}, {index})");
        }
    }
    assert_eq!(seen.len(), 200);
}
