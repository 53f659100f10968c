//! # Address Bits — Leaf Position in the Deposit Tree
//!
//! A leaf's position is a string over `{0, 1}` of length exactly `TreeDepth`.
//! Character `i` is the direction at tree level `i`, counting up from the
//! leaf: `1` means the known node is the right child at that level. Read as
//! a number, the string is the leaf index in little-endian bit order.
//!
//! Callers may supply the address as text, as a sequence of bits, or as a
//! leaf index. Sequences are joined into text first and then validated like
//! any other text, so `[1, 0, 2]` is rejected for its `2` rather than coerced.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::depth::TreeDepth;
use crate::error::ProtocolError;

/// The forms in which a caller may supply a leaf address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressInput {
    /// A bit string such as `"0110"`.
    Text(String),
    /// A sequence of integers, joined by their decimal renderings.
    Bits(Vec<u8>),
    /// A sequence of booleans.
    Bools(Vec<bool>),
    /// A leaf index, expanded to little-endian bits.
    LeafIndex(u64),
}

impl From<&str> for AddressInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AddressInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<u8>> for AddressInput {
    fn from(value: Vec<u8>) -> Self {
        Self::Bits(value)
    }
}

impl From<&[u8]> for AddressInput {
    fn from(value: &[u8]) -> Self {
        Self::Bits(value.to_vec())
    }
}

impl From<Vec<bool>> for AddressInput {
    fn from(value: Vec<bool>) -> Self {
        Self::Bools(value)
    }
}

impl From<AddressBits> for AddressInput {
    fn from(value: AddressBits) -> Self {
        Self::Text(value.0)
    }
}

/// A validated address-bit string of a known depth.
///
/// Deserialization checks the alphabet and takes the depth from the length,
/// which must lie in `[1, 32]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AddressBits(String);

impl AddressBits {
    /// Validate an address against the tree depth.
    ///
    /// # Errors
    ///
    /// `ProtocolError::Format` if the joined text contains anything other
    /// than `0`/`1`, if its length differs from `depth`, or if a leaf index
    /// does not fit in `depth` bits.
    pub fn parse(input: impl Into<AddressInput>, depth: TreeDepth) -> Result<Self, ProtocolError> {
        let text = match input.into() {
            AddressInput::LeafIndex(index) => return Self::from_leaf_index(index, depth),
            AddressInput::Text(text) => text,
            AddressInput::Bits(bits) => bits.iter().map(u8::to_string).collect(),
            AddressInput::Bools(bits) => bits.iter().map(|b| if *b { '1' } else { '0' }).collect(),
        };
        Self::validate_text(text, depth)
    }

    fn validate_text(text: String, depth: TreeDepth) -> Result<Self, ProtocolError> {
        if text.is_empty() {
            return Err(ProtocolError::Format("address bits are empty".to_string()));
        }
        if let Some((offset, c)) = text.char_indices().find(|(_, c)| *c != '0' && *c != '1') {
            return Err(ProtocolError::Format(format!(
                "address bit at offset {offset} is {c:?}; only '0' and '1' are allowed"
            )));
        }
        if text.len() != depth.get() {
            return Err(ProtocolError::Format(format!(
                "address has {} bits, tree depth is {depth}",
                text.len()
            )));
        }
        Ok(Self(text))
    }

    /// Expand a leaf index into `depth` little-endian bits.
    pub fn from_leaf_index(index: u64, depth: TreeDepth) -> Result<Self, ProtocolError> {
        if index >= depth.capacity() {
            return Err(ProtocolError::Format(format!(
                "leaf index {index} does not fit in {depth} address bits"
            )));
        }
        let text = (0..depth.get())
            .map(|i| if (index >> i) & 1 == 1 { '1' } else { '0' })
            .collect();
        Ok(Self(text))
    }

    /// Pack the bits back into the leaf index.
    pub fn to_leaf_index(&self) -> u64 {
        self.bits()
            .take(u64::BITS as usize)
            .enumerate()
            .fold(0u64, |acc, (i, bit)| acc | (u64::from(bit) << i))
    }

    /// Direction at each level, leaf first. `true` means right child.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.bytes().map(|b| b == b'1')
    }

    /// The bit string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of bits, equal to the tree depth it was validated against.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a validated address.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for AddressBits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let depth = TreeDepth::new(text.len()).map_err(serde::de::Error::custom)?;
        Self::validate_text(text, depth).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for AddressBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depth(d: usize) -> TreeDepth {
        TreeDepth::new(d).unwrap()
    }

    #[test]
    fn text_of_exact_length_is_accepted() {
        let bits = AddressBits::parse("0110", depth(4)).unwrap();
        assert_eq!(bits.as_str(), "0110");
        assert_eq!(bits.len(), 4);
    }

    #[test]
    fn sequence_is_joined_then_validated() {
        let bits = AddressBits::parse(vec![0u8, 1], depth(2)).unwrap();
        assert_eq!(bits.as_str(), "01");
        assert!(matches!(
            AddressBits::parse(vec![1u8, 0, 2], depth(3)),
            Err(ProtocolError::Format(_))
        ));
        // [10] joins to "10", which is two valid bits.
        assert_eq!(AddressBits::parse(vec![10u8], depth(2)).unwrap().as_str(), "10");
    }

    #[test]
    fn bools_are_accepted() {
        let bits = AddressBits::parse(vec![true, false, true], depth(3)).unwrap();
        assert_eq!(bits.as_str(), "101");
    }

    #[test]
    fn wrong_alphabet_or_length_is_format_error() {
        for bad in ["", "012", "01 ", "0", "00000", "ab"] {
            assert!(
                matches!(AddressBits::parse(bad, depth(3)), Err(ProtocolError::Format(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn leaf_index_is_little_endian() {
        let bits = AddressBits::from_leaf_index(2, depth(2)).unwrap();
        assert_eq!(bits.as_str(), "01");
        assert_eq!(bits.to_leaf_index(), 2);
        let bits = AddressBits::parse(AddressInput::LeafIndex(6), depth(4)).unwrap();
        assert_eq!(bits.as_str(), "0110");
    }

    #[test]
    fn leaf_index_must_fit() {
        assert!(matches!(
            AddressBits::from_leaf_index(4, depth(2)),
            Err(ProtocolError::Format(_))
        ));
        assert!(AddressBits::from_leaf_index(u64::from(u32::MAX), depth(32)).is_ok());
    }

    #[test]
    fn deserialization_validates() {
        let bits: AddressBits = serde_json::from_str("\"0110\"").unwrap();
        assert_eq!(bits.to_leaf_index(), 6);
        for bad in ["\"01x2\"", "\"\"", "7"] {
            assert!(serde_json::from_str::<AddressBits>(bad).is_err(), "{bad} should be rejected");
        }
        let too_long = format!("\"{}\"", "1".repeat(70));
        assert!(serde_json::from_str::<AddressBits>(&too_long).is_err());
    }

    #[test]
    fn bits_iterate_leaf_first() {
        let bits = AddressBits::parse("100", depth(3)).unwrap();
        assert_eq!(bits.bits().collect::<Vec<_>>(), vec![true, false, false]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Index → bits → index is the identity for every depth.
        #[test]
        fn leaf_index_round_trip(d in 1usize..=32, raw in any::<u64>()) {
            let depth = TreeDepth::new(d).unwrap();
            let index = raw % depth.capacity();
            let bits = AddressBits::from_leaf_index(index, depth).unwrap();
            prop_assert_eq!(bits.len(), d);
            prop_assert_eq!(bits.to_leaf_index(), index);
        }

        /// Any string containing a non-bit character is rejected.
        #[test]
        fn non_bit_alphabet_rejected(prefix in "[01]{0,4}", bad in "[2-9a-z]", suffix in "[01]{0,4}") {
            let text = format!("{prefix}{bad}{suffix}");
            let depth = TreeDepth::new(text.len()).unwrap();
            prop_assert!(matches!(
                AddressBits::parse(text, depth),
                Err(ProtocolError::Format(_))
            ));
        }
    }
}
