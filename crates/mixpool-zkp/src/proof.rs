//! Opaque proof values.
//!
//! A `Proof` is whatever JSON object the backend produced. This layer only
//! round-trips it: parse once, keep the canonical text, compare by that text.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use mixpool_core::{CanonicalBytes, FieldElement, ProtocolError};

use crate::keys::describe;

/// A proof produced by a proving backend.
#[derive(Clone)]
pub struct Proof {
    value: Value,
    canonical: CanonicalBytes,
}

impl Proof {
    /// Wrap a JSON object.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if `value` is not an object or contains floats.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        if !value.is_object() {
            return Err(ProtocolError::type_mismatch("proof object", describe(&value)));
        }
        let canonical = CanonicalBytes::new(&value)
            .map_err(|e| ProtocolError::type_mismatch("proof object", e.to_string()))?;
        Ok(Self { value, canonical })
    }

    /// Parse proof JSON text.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ProtocolError::Format(format!("proof is not JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Canonical JSON text, as handed to the verifying backend.
    pub fn to_json(&self) -> &str {
        self.canonical.as_str()
    }

    /// The proof as a JSON value.
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// The proof's public input vector, if the backend exposes one as `input`.
    pub fn public_inputs(&self) -> Option<Vec<FieldElement>> {
        match self.value.get("input")? {
            Value::Array(items) => items.iter().map(proof_scalar).collect(),
            _ => None,
        }
    }

    /// A named scalar carried by the proof, such as `nullifier`.
    pub fn scalar(&self, name: &str) -> Option<FieldElement> {
        proof_scalar(self.value.get(name)?)
    }
}

/// Backends write scalars as decimal strings or bare integers.
fn proof_scalar(value: &Value) -> Option<FieldElement> {
    match value {
        Value::String(s) => FieldElement::from_decimal(s).ok(),
        Value::Number(n) => FieldElement::from_decimal(&n.to_string()).ok(),
        _ => None,
    }
}

impl PartialEq for Proof {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Proof {}

impl Hash for Proof {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Debug for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Proof").field(&self.to_json()).finish()
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_json())
    }
}

impl Serialize for Proof {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Proof {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Proof::from_value(value).map_err(serde::de::Error::custom)
    }
}
