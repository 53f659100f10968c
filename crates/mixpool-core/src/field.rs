//! # Field Elements — Arbitrary-Precision Integers with a Decimal Codec
//!
//! Every scalar that crosses the backend boundary (`root`, `exthash`,
//! `spend_preimage`, path siblings, nullifiers) is a [`FieldElement`]: an
//! unsigned arbitrary-precision integer whose wire form is canonical base-10
//! ASCII text.
//!
//! ## Security Invariant
//!
//! Field elements routinely exceed 128 bits, so no fixed-width machine
//! integer appears anywhere on the scalar path. Parsing is strict: only ASCII
//! digits (or `0x` + hex digits through [`FieldElement::parse`]) are accepted,
//! and the encoder always emits the canonical form (no sign, no whitespace,
//! no leading zeros).
//!
//! ## Field Order
//!
//! The circuit works over the BN254 scalar field. This module exposes the
//! modulus and [`FieldElement::is_in_field`], but nothing here reduces or
//! rejects out-of-range values. Whether to enforce the range is a policy of
//! the proof service.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use once_cell::sync::Lazy;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{FieldError, ProtocolError};

/// BN254 scalar field modulus in decimal.
pub const SCALAR_FIELD_MODULUS_DEC: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

const SCALAR_FIELD_MODULUS_BE: [u8; 32] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91, 0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

static SCALAR_FIELD_MODULUS: Lazy<BigUint> =
    Lazy::new(|| BigUint::from_bytes_be(&SCALAR_FIELD_MODULUS_BE));

/// The BN254 scalar field modulus.
pub fn scalar_field_modulus() -> &'static BigUint {
    &SCALAR_FIELD_MODULUS
}

/// An unsigned arbitrary-precision integer used as a circuit scalar.
///
/// Equality and ordering are numeric. `Display` and `Serialize` produce the
/// canonical decimal text that the backend contract requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement(BigUint);

impl FieldElement {
    /// The zero element.
    pub fn zero() -> Self {
        Self(BigUint::default())
    }

    /// Wrap an existing big integer without reduction.
    pub fn from_biguint(value: BigUint) -> Self {
        Self(value)
    }

    /// Wrap a big integer after reducing it modulo the scalar field.
    pub fn reduced(value: BigUint) -> Self {
        Self(value % scalar_field_modulus())
    }

    /// Interpret big-endian bytes as an integer and reduce it into the field.
    pub fn from_be_bytes_reduced(bytes: &[u8]) -> Self {
        Self::reduced(BigUint::from_bytes_be(bytes))
    }

    /// Parse strict base-10 ASCII text.
    ///
    /// Leading zeros are tolerated on input; the canonical encoder never
    /// emits them.
    pub fn from_decimal(text: &str) -> Result<Self, FieldError> {
        parse_radix(text, text, 10)
    }

    /// Parse either decimal text or `0x`-prefixed hexadecimal text.
    pub fn parse(text: &str) -> Result<Self, FieldError> {
        match text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
        {
            Some(hex) => parse_radix(text, hex, 16),
            None => Self::from_decimal(text),
        }
    }

    /// Canonical base-10 text.
    pub fn to_decimal(&self) -> String {
        self.0.to_str_radix(10)
    }

    /// Borrow the underlying big integer.
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Consume into the underlying big integer.
    pub fn into_biguint(self) -> BigUint {
        self.0
    }

    /// Returns true if the value is strictly below the scalar field modulus.
    pub fn is_in_field(&self) -> bool {
        &self.0 < scalar_field_modulus()
    }

    /// Fail with `FieldRange` unless the value is a canonical field element.
    pub fn require_in_field(&self, input: &'static str) -> Result<(), ProtocolError> {
        if self.is_in_field() {
            Ok(())
        } else {
            Err(ProtocolError::FieldRange {
                input,
                value: self.to_decimal(),
            })
        }
    }

    /// Returns the value as `u64` if it fits.
    pub fn to_u64(&self) -> Option<u64> {
        let digits = self.0.to_u64_digits();
        match digits.as_slice() {
            [] => Some(0),
            [single] => Some(*single),
            _ => None,
        }
    }
}

fn parse_radix(original: &str, digits: &str, radix: u32) -> Result<FieldElement, FieldError> {
    if digits.is_empty() {
        return Err(FieldError::Empty);
    }
    let prefix_len = original.len() - digits.len();
    if let Some((offset, digit)) = digits.char_indices().find(|(_, c)| !c.is_digit(radix)) {
        return Err(FieldError::InvalidDigit {
            text: original.to_string(),
            digit,
            offset: prefix_len + offset,
        });
    }
    BigUint::parse_bytes(digits.as_bytes(), radix)
        .map(FieldElement)
        .ok_or(FieldError::Empty)
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u32> for FieldElement {
    fn from(value: u32) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for FieldElement {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl FromStr for FieldElement {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldElementVisitor;

        impl<'de> Visitor<'de> for FieldElementVisitor {
            type Value = FieldElement;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or its decimal/0x-hex text")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldElement, E> {
                Ok(FieldElement::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<FieldElement, E> {
                u64::try_from(v)
                    .map(FieldElement::from)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldElement, E> {
                FieldElement::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(FieldElementVisitor)
    }
}
