//! # Spend Derivations — Leaf Commitment, Nullifier, Public Input Hash
//!
//! The three values the spend statement is built from:
//!
//! ```text
//! leaf       = H(secret)
//! nullifier  = H(leaf_index, secret)
//! pub_hash   = H(root, nullifier, exthash)
//! ```
//!
//! `H` is the zero-keyed MiMC hash. `pub_hash` is the single public input of
//! the circuit; root, nullifier and exthash are bound through it.
//!
//! ## Security Invariant
//!
//! The nullifier depends on both the secret and the leaf index, so the same
//! secret deposited twice yields two independent nullifiers, and a nullifier
//! reveals neither input on its own.

use mixpool_core::FieldElement;

use crate::mimc::mimc_hash;

/// Commitment stored as the deposit leaf.
pub fn leaf_commitment(secret: &FieldElement) -> FieldElement {
    mimc_hash(std::slice::from_ref(secret))
}

/// Double-spend tag for the deposit at `leaf_index` opened by `secret`.
pub fn derive_nullifier(secret: &FieldElement, leaf_index: &FieldElement) -> FieldElement {
    mimc_hash(&[leaf_index.clone(), secret.clone()])
}

/// The circuit's single public input.
pub fn public_input_hash(
    root: &FieldElement,
    nullifier: &FieldElement,
    exthash: &FieldElement,
) -> FieldElement {
    mimc_hash(&[root.clone(), nullifier.clone(), exthash.clone()])
}
