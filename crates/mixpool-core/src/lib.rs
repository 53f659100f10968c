//! # mixpool-core — Foundational Types for the Spend Protocol
//!
//! Every other crate in the workspace depends on `mixpool-core`; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Arbitrary-precision scalars.** `FieldElement` wraps a big unsigned
//!    integer. Its wire form is canonical decimal text; no fixed-width machine
//!    integer is ever used for a circuit scalar.
//!
//! 2. **Validated constructors.** `TreeDepth`, `AddressBits` and
//!    `MerkleWitness` can only be built through constructors that check range,
//!    alphabet and length. A value of these types is already well-shaped.
//!
//! 3. **`CanonicalBytes` newtype.** Keys and proofs are compared and
//!    fingerprinted through JCS canonical text. `sha256_digest()` accepts only
//!    `&CanonicalBytes`.
//!
//! 4. **One error taxonomy.** `ProtocolError` has one variant per failure
//!    class. A proof that does not verify is a `false`, never an error.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `mixpool-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod address;
pub mod canonical;
pub mod depth;
pub mod digest;
pub mod error;
pub mod field;
pub mod witness;

// Re-export primary types for ergonomic imports.
pub use address::{AddressBits, AddressInput};
pub use canonical::CanonicalBytes;
pub use depth::TreeDepth;
pub use digest::{sha256_digest, sha256_hex, ContentDigest, Sha256Accumulator};
pub use error::{CanonicalizationError, FieldError, ProtocolError};
pub use field::{scalar_field_modulus, FieldElement, SCALAR_FIELD_MODULUS_DEC};
pub use witness::{MerkleWitness, PrivateWitness, PublicInputs};
