//! Fixed Merkle tree depth.
//!
//! The depth is a property of the compiled circuit. It is discovered from the
//! backend once and every path and address-bit input is validated against it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Depth of the deposit tree, in `[TreeDepth::MIN, TreeDepth::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TreeDepth(usize);

impl TreeDepth {
    /// Smallest supported depth.
    pub const MIN: usize = 1;
    /// Largest supported depth. Leaf indices always fit in a `u64`.
    pub const MAX: usize = 32;

    /// Validate a backend-reported depth.
    ///
    /// A value outside the range means the backend and the circuit disagree,
    /// so the failure is an `InvariantViolation` rather than a format error.
    pub fn new(depth: usize) -> Result<Self, ProtocolError> {
        if (Self::MIN..=Self::MAX).contains(&depth) {
            Ok(Self(depth))
        } else {
            Err(ProtocolError::InvariantViolation(format!(
                "tree depth {depth} is outside [{}, {}]",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// The depth as a length.
    pub fn get(self) -> usize {
        self.0
    }

    /// Number of leaves in a full tree of this depth.
    pub fn capacity(self) -> u64 {
        1u64 << self.0
    }
}

impl fmt::Display for TreeDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for TreeDepth {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = usize::deserialize(deserializer)?;
        TreeDepth::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(TreeDepth::new(1).unwrap().get(), 1);
        assert_eq!(TreeDepth::new(32).unwrap().get(), 32);
    }

    #[test]
    fn out_of_range_is_invariant_violation() {
        for bad in [0usize, 33, 64] {
            assert!(matches!(
                TreeDepth::new(bad),
                Err(ProtocolError::InvariantViolation(_))
            ));
        }
    }

    #[test]
    fn capacity_is_power_of_two() {
        assert_eq!(TreeDepth::new(2).unwrap().capacity(), 4);
        assert_eq!(TreeDepth::new(32).unwrap().capacity(), 1u64 << 32);
    }

    #[test]
    fn serde_validates() {
        let d: TreeDepth = serde_json::from_str("29").unwrap();
        assert_eq!(d.get(), 29);
        assert!(serde_json::from_str::<TreeDepth>("0").is_err());
        assert_eq!(serde_json::to_string(&d).unwrap(), "29");
    }
}
