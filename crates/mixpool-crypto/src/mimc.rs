//! # MiMC over the BN254 Scalar Field
//!
//! The one-way function used for leaf commitments, nullifiers, the public
//! input hash and Merkle tree nodes.
//!
//! ## Algorithm
//!
//! MiMC-p/p with exponent 7 and 91 rounds. Round constants come from a
//! Keccak-256 chain: `c = keccak(seed)`, then each round
//! `c = keccak(c as 32 big-endian bytes)`.
//!
//! ```text
//! cipher(x, k):  for c_i: x = (x + k + c_i)^7 mod p;   return x + k mod p
//! hash(xs, iv):  k = iv; for x_i: k = k + x_i + cipher(x_i, k) mod p;  return k
//! ```
//!
//! The multi-input hash is the Miyaguchi–Preneel construction. Inputs at or
//! above the modulus are reduced before use.

use num_bigint::BigUint;
use once_cell::sync::Lazy;
use sha3::{Digest, Keccak256};

use mixpool_core::{scalar_field_modulus, FieldElement};

/// Exponent of the round function. `gcd(7, p - 1) == 1` for BN254.
pub const MIMC_EXPONENT: u32 = 7;

/// Number of rounds.
pub const MIMC_ROUNDS: usize = 91;

/// Seed of the round-constant chain.
pub const MIMC_SEED: &[u8] = b"mimc";

static ROUND_CONSTANTS: Lazy<Vec<BigUint>> =
    Lazy::new(|| keccak_chain(MIMC_SEED, MIMC_ROUNDS));

static EXPONENT: Lazy<BigUint> = Lazy::new(|| BigUint::from(MIMC_EXPONENT));

fn keccak_int(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(&Keccak256::digest(bytes))
}

fn to_be_32(value: &BigUint) -> [u8; 32] {
    let bytes = value.to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// `count` field elements from the Keccak-256 chain seeded with `seed`.
///
/// The chain runs over the unreduced 256-bit values; each output is reduced
/// into the field.
pub fn keccak_chain(seed: &[u8], count: usize) -> Vec<BigUint> {
    let p = scalar_field_modulus();
    let mut state = keccak_int(seed);
    (0..count)
        .map(|_| {
            state = keccak_int(&to_be_32(&state));
            &state % p
        })
        .collect()
}

/// The MiMC block cipher: encrypt `x` under key `k`.
pub fn mimc_cipher(x: &FieldElement, k: &FieldElement) -> FieldElement {
    let p = scalar_field_modulus();
    FieldElement::from_biguint(cipher(&(x.as_biguint() % p), &(k.as_biguint() % p)))
}

fn cipher(x: &BigUint, k: &BigUint) -> BigUint {
    let p = scalar_field_modulus();
    let mut x = x.clone();
    for c in ROUND_CONSTANTS.iter() {
        let a = (&x + k + c) % p;
        x = a.modpow(&EXPONENT, p);
    }
    (x + k) % p
}

/// Multi-input MiMC hash with an explicit initial key.
pub fn mimc_hash_with_iv(inputs: &[FieldElement], iv: &FieldElement) -> FieldElement {
    let p = scalar_field_modulus();
    let mut k = iv.as_biguint() % p;
    for x in inputs {
        let x = x.as_biguint() % p;
        let r = cipher(&x, &k);
        k = (k + x + r) % p;
    }
    FieldElement::from_biguint(k)
}

/// Multi-input MiMC hash with a zero initial key.
pub fn mimc_hash(inputs: &[FieldElement]) -> FieldElement {
    mimc_hash_with_iv(inputs, &FieldElement::zero())
}
