//! # Fixed-Depth Merkle Tree of Deposits
//!
//! A reference implementation of the tree collaborator: append leaf
//! commitments, look them up, and extract the `MerkleWitness` a prover needs.
//!
//! ## Algorithm
//!
//! - Empty leaves are zero. The empty subtree of height `h` hashes to
//!   `zero[h]`, where `zero[0] = 0` and `zero[h + 1] = node(h, zero[h], zero[h])`.
//! - An interior node at level `h` is `MiMC([left, right], iv[h])`. The per-level
//!   IV makes the same pair hash differently at different heights.
//! - IVs come from the Keccak-256 chain seeded with `"mixpool.merkle.iv"`.
//! - Address bit `h` is 1 when the running node is the right child at level
//!   `h`; the sibling `path[h]` then sits on the left.
//!
//! Appending updates only the `depth` nodes on the new leaf's path.

use once_cell::sync::Lazy;

use mixpool_core::{AddressBits, FieldElement, MerkleWitness, TreeDepth};

use crate::error::CryptoError;
use crate::mimc::{keccak_chain, mimc_hash_with_iv};

const LEVEL_IV_SEED: &[u8] = b"mixpool.merkle.iv";

static LEVEL_IVS: Lazy<Vec<FieldElement>> = Lazy::new(|| {
    keccak_chain(LEVEL_IV_SEED, TreeDepth::MAX)
        .into_iter()
        .map(FieldElement::from_biguint)
        .collect()
});

static ZERO_HASHES: Lazy<Vec<FieldElement>> = Lazy::new(|| {
    let mut zeros = Vec::with_capacity(TreeDepth::MAX + 1);
    zeros.push(FieldElement::zero());
    for level in 0..TreeDepth::MAX {
        let below = &zeros[level];
        let next = mimc_hash_with_iv(&[below.clone(), below.clone()], &LEVEL_IVS[level]);
        zeros.push(next);
    }
    zeros
});

/// Hash two children at `level` (0 = just above the leaves).
pub fn node_hash(
    level: usize,
    left: &FieldElement,
    right: &FieldElement,
) -> Result<FieldElement, CryptoError> {
    let iv = LEVEL_IVS.get(level).ok_or_else(|| {
        CryptoError::MalformedWitness(format!(
            "level {level} exceeds the maximum depth {}",
            TreeDepth::MAX
        ))
    })?;
    Ok(mimc_hash_with_iv(&[left.clone(), right.clone()], iv))
}

/// Root of an empty subtree of the given height.
pub fn zero_hash(height: usize) -> Option<&'static FieldElement> {
    ZERO_HASHES.get(height)
}

/// Recompute the root from a leaf and its witness.
///
/// # Errors
///
/// `CryptoError::MalformedWitness` if the path and address lengths differ
/// or exceed the maximum depth.
pub fn compute_root(leaf: &FieldElement, witness: &MerkleWitness) -> Result<FieldElement, CryptoError> {
    if witness.path.len() != witness.address_bits.len() {
        return Err(CryptoError::MalformedWitness(format!(
            "path has {} levels but address has {} bits",
            witness.path.len(),
            witness.address_bits.len()
        )));
    }
    let mut current = leaf.clone();
    for (level, (sibling, is_right)) in witness
        .path
        .iter()
        .zip(witness.address_bits.bits())
        .enumerate()
    {
        current = if is_right {
            node_hash(level, sibling, &current)?
        } else {
            node_hash(level, &current, sibling)?
        };
    }
    Ok(current)
}

/// Returns true if `witness` authenticates `leaf` under `root`.
pub fn verify_membership(leaf: &FieldElement, witness: &MerkleWitness, root: &FieldElement) -> bool {
    matches!(compute_root(leaf, witness), Ok(computed) if &computed == root)
}

/// An append-only Merkle tree of fixed depth.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    depth: TreeDepth,
    /// `levels[0]` holds the leaves; `levels[depth]` holds the root once any
    /// leaf exists. Nodes past the end of a level are empty subtrees.
    levels: Vec<Vec<FieldElement>>,
}

impl MerkleTree {
    /// An empty tree.
    pub fn new(depth: TreeDepth) -> Self {
        Self {
            depth,
            levels: vec![Vec::new(); depth.get() + 1],
        }
    }

    /// Build a tree from leaves in index order.
    pub fn from_leaves(
        depth: TreeDepth,
        leaves: impl IntoIterator<Item = FieldElement>,
    ) -> Result<Self, CryptoError> {
        let mut tree = Self::new(depth);
        for leaf in leaves {
            tree.append(leaf)?;
        }
        Ok(tree)
    }

    /// The tree's fixed depth.
    pub fn depth(&self) -> TreeDepth {
        self.depth
    }

    /// Number of appended leaves.
    pub fn len(&self) -> u64 {
        self.levels[0].len() as u64
    }

    /// Returns true if no leaf has been appended.
    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    fn node(&self, level: usize, index: usize) -> FieldElement {
        self.levels[level]
            .get(index)
            .cloned()
            .unwrap_or_else(|| ZERO_HASHES[level].clone())
    }

    /// Append a leaf and return its index.
    pub fn append(&mut self, leaf: FieldElement) -> Result<u64, CryptoError> {
        let index = self.len();
        if index >= self.depth.capacity() {
            return Err(CryptoError::TreeFull {
                capacity: self.depth.capacity(),
            });
        }
        self.levels[0].push(leaf);

        let mut position = self.levels[0].len() - 1;
        for level in 0..self.depth.get() {
            let parent = position / 2;
            let left = self.node(level, parent * 2);
            let right = self.node(level, parent * 2 + 1);
            let hash = node_hash(level, &left, &right)?;
            let above = &mut self.levels[level + 1];
            if parent < above.len() {
                above[parent] = hash;
            } else {
                above.push(hash);
            }
            position = parent;
        }
        Ok(index)
    }

    /// Index of the first leaf equal to `leaf`.
    pub fn index_of(&self, leaf: &FieldElement) -> Option<u64> {
        self.levels[0]
            .iter()
            .position(|l| l == leaf)
            .map(|i| i as u64)
    }

    /// Leaf at `index`, if appended.
    pub fn leaf(&self, index: u64) -> Option<&FieldElement> {
        usize::try_from(index).ok().and_then(|i| self.levels[0].get(i))
    }

    /// Current root. An empty tree has the all-zero root.
    pub fn root(&self) -> FieldElement {
        self.node(self.depth.get(), 0)
    }

    /// Membership witness for the leaf at `index`.
    pub fn witness(&self, index: u64) -> Result<MerkleWitness, CryptoError> {
        let out_of_range = || CryptoError::LeafIndexOutOfRange {
            index,
            len: self.len(),
        };
        let mut position = usize::try_from(index).map_err(|_| out_of_range())?;
        if position >= self.levels[0].len() {
            return Err(out_of_range());
        }
        let path = (0..self.depth.get())
            .map(|level| {
                let sibling = self.node(level, position ^ 1);
                position /= 2;
                sibling
            })
            .collect();
        let address_bits = AddressBits::from_leaf_index(index, self.depth)
            .map_err(|e| CryptoError::MalformedWitness(e.to_string()))?;
        Ok(MerkleWitness { path, address_bits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::leaf_commitment;

    fn depth(d: usize) -> TreeDepth {
        TreeDepth::new(d).unwrap()
    }

    fn fe(v: u64) -> FieldElement {
        FieldElement::from(v)
    }

    #[test]
    fn empty_root_is_zero_hash() {
        let tree = MerkleTree::new(depth(3));
        assert_eq!(&tree.root(), zero_hash(3).unwrap());
        assert!(tree.is_empty());
    }

    #[test]
    fn append_returns_sequential_indices() {
        let mut tree = MerkleTree::new(depth(2));
        assert_eq!(tree.append(fe(10)).unwrap(), 0);
        assert_eq!(tree.append(fe(11)).unwrap(), 1);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.index_of(&fe(11)), Some(1));
        assert_eq!(tree.index_of(&fe(12)), None);
        assert_eq!(tree.leaf(0), Some(&fe(10)));
    }

    #[test]
    fn full_tree_rejects_append() {
        let mut tree = MerkleTree::from_leaves(depth(1), [fe(1), fe(2)]).unwrap();
        assert_eq!(tree.append(fe(3)), Err(CryptoError::TreeFull { capacity: 2 }));
    }

    #[test]
    fn root_matches_manual_computation_at_depth_two() {
        let tree = MerkleTree::from_leaves(depth(2), [fe(1), fe(2), fe(3)]).unwrap();
        let left = node_hash(0, &fe(1), &fe(2)).unwrap();
        let right = node_hash(0, &fe(3), &FieldElement::zero()).unwrap();
        let expected = node_hash(1, &left, &right).unwrap();
        assert_eq!(tree.root(), expected);
    }

    #[test]
    fn third_leaf_witness_authenticates() {
        let secret = fe(0xdead_beef);
        let leaf = leaf_commitment(&secret);
        let mut tree = MerkleTree::from_leaves(depth(2), [fe(101), fe(202)]).unwrap();
        let index = tree.append(leaf.clone()).unwrap();
        assert_eq!(index, 2);
        assert_eq!(tree.index_of(&leaf), Some(2));

        let witness = tree.witness(index).unwrap();
        assert_eq!(witness.address_bits.as_str(), "01");
        assert_eq!(witness.path[0], FieldElement::zero());
        assert_eq!(witness.path[1], node_hash(0, &fe(101), &fe(202)).unwrap());
        assert!(verify_membership(&leaf, &witness, &tree.root()));
        assert!(!verify_membership(&fe(1), &witness, &tree.root()));
    }

    #[test]
    fn witness_out_of_range() {
        let tree = MerkleTree::from_leaves(depth(2), [fe(1)]).unwrap();
        assert_eq!(
            tree.witness(1).unwrap_err(),
            CryptoError::LeafIndexOutOfRange { index: 1, len: 1 }
        );
    }

    #[test]
    fn level_ivs_separate_heights() {
        assert_ne!(
            node_hash(0, &fe(1), &fe(2)).unwrap(),
            node_hash(1, &fe(1), &fe(2)).unwrap()
        );
        assert!(node_hash(TreeDepth::MAX, &fe(1), &fe(2)).is_err());
    }

    #[test]
    fn every_leaf_authenticates_after_later_appends() {
        let leaves: Vec<FieldElement> = (1..=5).map(fe).collect();
        let tree = MerkleTree::from_leaves(depth(3), leaves.clone()).unwrap();
        let root = tree.root();
        for (i, leaf) in leaves.iter().enumerate() {
            let witness = tree.witness(i as u64).unwrap();
            assert_eq!(compute_root(leaf, &witness).unwrap(), root, "leaf {i}");
        }
    }
}
