//! # Canonical Serialization — JCS Text for Keys and Proofs
//!
//! This module defines `CanonicalBytes`, the sole construction path for the
//! textual form of verifying keys and proofs that crosses the backend boundary.
//!
//! ## Security Invariant
//!
//! The `CanonicalBytes` newtype has a private inner field. The only way to
//! construct it is through `CanonicalBytes::new()`, which rejects floats and
//! then serializes with `serde_jcs` (RFC 8785): sorted keys, compact
//! separators, one byte sequence per logical value.
//!
//! Two proofs are equal exactly when their canonical bytes are equal, so the
//! encoder must be deterministic. Floats are rejected because field elements
//! are integers and JCS number formatting of floats is lossy.
//!
//! ## Wide Integers
//!
//! Backends emit bare JSON integers well beyond 64 bits, and `serde_json` is
//! built with `arbitrary_precision` so they parse exactly. `serde_jcs` cannot
//! emit such numbers, so every integer crosses it as a string tagged with
//! [`INTEGER_MARK`] and is spliced back as bare digits afterwards. Strings
//! and keys containing the mark are rejected.

use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::CanonicalizationError;

/// Private-use character tagging integers while `serde_jcs` runs.
pub const INTEGER_MARK: char = '\u{E000}';

/// Bytes produced exclusively by JCS canonicalization with float rejection.
///
/// # Invariants
///
/// - The only constructors are `CanonicalBytes::new()` and `from_value()`.
/// - No float appears anywhere in the value tree.
/// - Object keys are sorted; separators are compact.
/// - The bytes are valid UTF-8 JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(String);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains
    /// a float, `ReservedCharacter` if a string or key contains
    /// [`INTEGER_MARK`], and `SerializationFailed` if JCS serialization fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        Self::from_value(serde_json::to_value(obj)?)
    }

    /// Construct canonical bytes from an owned JSON value.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        let marked = mark_integers(value)?;
        Ok(Self(splice_integers(serde_jcs::to_string(&marked)?)))
    }

    /// Access the canonical bytes for digest computation.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Access the canonical JSON text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the canonical JSON text.
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

fn mark_integers(value: Value) -> Result<Value, CanonicalizationError> {
    Ok(match value {
        Value::Null | Value::Bool(_) => value,
        Value::String(s) => Value::String(check_reserved(s)?),
        Value::Number(n) => Value::String(format!("{INTEGER_MARK}{}", integer_text(&n)?)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(mark_integers)
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| Ok((check_reserved(k)?, mark_integers(v)?)))
                .collect::<Result<Map<_, _>, CanonicalizationError>>()?,
        ),
    })
}

fn check_reserved(s: String) -> Result<String, CanonicalizationError> {
    if s.contains(INTEGER_MARK) {
        Err(CanonicalizationError::ReservedCharacter(s))
    } else {
        Ok(s)
    }
}

/// The decimal text of an integer, normalized; anything else is a float.
fn integer_text(n: &Number) -> Result<String, CanonicalizationError> {
    let text = n.to_string();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CanonicalizationError::FloatRejected(text));
    }
    let digits = digits.trim_start_matches('0');
    Ok(match (negative, digits.is_empty()) {
        (_, true) => "0".to_string(),
        (true, false) => format!("-{digits}"),
        (false, false) => digits.to_string(),
    })
}

fn splice_integers(text: String) -> String {
    let opening = format!("\"{INTEGER_MARK}");
    if !text.contains(&opening) {
        return text;
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    while let Some(start) = rest.find(&opening) {
        out.push_str(&rest[..start]);
        let tail = &rest[start + opening.len()..];
        // Marked strings hold only digits, so the next quote closes them.
        let Some(end) = tail.find('"') else {
            out.push_str(&rest[start..]);
            return out;
        };
        out.push_str(&tail[..end]);
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Canonicalization is deterministic and idempotent over string maps.
        #[test]
        fn canonical_is_idempotent(
            map in prop::collection::btree_map("[a-zA-Z]{1,8}", "[0-9]{1,40}", 0..8)
        ) {
            let first = CanonicalBytes::new(&map).unwrap();
            let reparsed: Value = serde_json::from_str(first.as_str()).unwrap();
            let second = CanonicalBytes::from_value(reparsed).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Integer leaves come out as their own decimal text.
        #[test]
        fn integers_round_trip_as_digits(digits in "[1-9][0-9]{0,90}", negative in any::<bool>()) {
            let literal = if negative { format!("-{digits}") } else { digits };
            let value: Value = serde_json::from_str(&format!("[{literal}]")).unwrap();
            let cb = CanonicalBytes::from_value(value).unwrap();
            prop_assert_eq!(cb.as_str(), format!("[{literal}]"));
        }
    }
}
