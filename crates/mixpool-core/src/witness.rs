//! Merkle witnesses and the public/private halves of a spend statement.
//!
//! A [`MerkleWitness`] is produced by the tree collaborator for one leaf and
//! consumed by exactly one prove call. Only its shape is checked here: `path`
//! and `address_bits` must both have length `TreeDepth`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::{AddressBits, AddressInput};
use crate::depth::TreeDepth;
use crate::error::ProtocolError;
use crate::field::FieldElement;

/// Sibling hashes and directions from a leaf up to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMerkleWitness")]
pub struct MerkleWitness {
    /// `path[i]` is the sibling at level `i`, leaf level first.
    pub path: Vec<FieldElement>,
    /// Direction at each level; see [`AddressBits`].
    pub address_bits: AddressBits,
}

impl MerkleWitness {
    /// Validate a witness against the tree depth.
    ///
    /// The path length is checked before the address bits.
    pub fn new(
        path: Vec<FieldElement>,
        address: impl Into<AddressInput>,
        depth: TreeDepth,
    ) -> Result<Self, ProtocolError> {
        if path.len() != depth.get() {
            return Err(ProtocolError::Format(format!(
                "path has {} elements, tree depth is {depth}",
                path.len()
            )));
        }
        let address_bits = AddressBits::parse(address, depth)?;
        Ok(Self { path, address_bits })
    }

    /// The leaf index encoded by the address bits.
    pub fn leaf_index(&self) -> u64 {
        self.address_bits.to_leaf_index()
    }

    /// Levels in the witness.
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

#[derive(Deserialize)]
struct RawMerkleWitness {
    path: Vec<FieldElement>,
    address_bits: AddressBits,
}

impl TryFrom<RawMerkleWitness> for MerkleWitness {
    type Error = ProtocolError;

    fn try_from(raw: RawMerkleWitness) -> Result<Self, ProtocolError> {
        let depth = TreeDepth::new(raw.address_bits.len())?;
        Self::new(raw.path, raw.address_bits, depth)
    }
}

/// The values a verifier sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicInputs {
    /// Root of the deposit tree the proof authenticates against.
    pub root: FieldElement,
    /// Hash of the external transaction data the proof is bound to.
    pub exthash: FieldElement,
}

/// The values only the prover holds.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateWitness {
    /// Preimage of the leaf commitment.
    pub spend_preimage: FieldElement,
    /// Membership witness for the committed leaf.
    pub merkle: MerkleWitness,
}

impl PrivateWitness {
    /// Pair a secret with its membership witness.
    pub fn new(spend_preimage: FieldElement, merkle: MerkleWitness) -> Self {
        Self {
            spend_preimage,
            merkle,
        }
    }

    /// Address bits of the spent leaf.
    pub fn address_bits(&self) -> &AddressBits {
        &self.merkle.address_bits
    }

    /// Sibling path of the spent leaf.
    pub fn path(&self) -> &[FieldElement] {
        &self.merkle.path
    }
}

impl fmt::Debug for PrivateWitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateWitness")
            .field("spend_preimage", &"<redacted>")
            .field("depth", &self.merkle.depth())
            .finish_non_exhaustive()
    }
}
