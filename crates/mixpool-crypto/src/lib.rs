//! # mixpool-crypto — Reference Cryptographic Collaborators
//!
//! The spend protocol treats its hash function and its deposit tree as
//! external collaborators. This crate provides reference implementations of
//! both, used by the mock proving backend, the CLI and the test suites:
//!
//! - **MiMC** over the BN254 scalar field (`mimc`).
//! - **Spend derivations**: leaf commitment, nullifier and the public input
//!   hash (`commitment`).
//! - **Fixed-depth Merkle tree** with per-level IVs that yields
//!   `MerkleWitness` values (`merkle`).
//!
//! ## Crate Policy
//!
//! - Depends only on `mixpool-core` internally.
//! - Tests use the real hash; nothing is mocked.

pub mod commitment;
pub mod error;
pub mod merkle;
pub mod mimc;

pub use commitment::{derive_nullifier, leaf_commitment, public_input_hash};
pub use error::CryptoError;
pub use merkle::{compute_root, verify_membership, MerkleTree};
pub use mimc::{mimc_hash, mimc_hash_with_iv};
