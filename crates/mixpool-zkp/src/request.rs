//! # Prove Requests — Typed and Dynamic Inputs
//!
//! [`ProveRequest`] is the typed input of `ProofService::prove`. Its shape is
//! only partly validated here; the service checks path and address against
//! its tree depth.
//!
//! [`ProveRequest::from_value`] accepts the JSON request form:
//!
//! ```json
//! {
//!   "root": 1234…, "exthash": 0, "secret": 5678…,
//!   "address": 2,                      // or "address_bits": "01" / [0, 1]
//!   "path": [9876…, 5432…],
//!   "proving_key": "keys/mixpool.pk.json"   // optional
//! }
//! ```
//!
//! Scalars are bare JSON integers of any width; `serde_json` is built with
//! `arbitrary_precision`, so a 254-bit root parses exactly. Strings, floats,
//! negative numbers and every other kind are a `TypeMismatch`: `"2"` is not
//! the integer 2.

use std::path::PathBuf;

use serde_json::{Map, Number, Value};

use mixpool_core::{AddressInput, FieldElement, MerkleWitness, ProtocolError, PublicInputs};

use crate::keys::describe;

/// Inputs to one prove call.
#[derive(Clone, PartialEq, Eq)]
pub struct ProveRequest {
    /// Public tree root.
    pub root: FieldElement,
    /// Public external data hash.
    pub exthash: FieldElement,
    /// Secret leaf preimage.
    pub spend_preimage: FieldElement,
    /// Leaf address as supplied by the caller.
    pub address: AddressInput,
    /// Sibling path, leaf level first.
    pub path: Vec<FieldElement>,
    /// Per-call proving key. Falls back to the service default when absent.
    pub proving_key: Option<PathBuf>,
}

impl ProveRequest {
    /// Assemble a request from its parts.
    pub fn new(
        public: PublicInputs,
        spend_preimage: FieldElement,
        address: impl Into<AddressInput>,
        path: Vec<FieldElement>,
    ) -> Self {
        Self {
            root: public.root,
            exthash: public.exthash,
            spend_preimage,
            address: address.into(),
            path,
            proving_key: None,
        }
    }

    /// Assemble a request from a witness produced by the tree collaborator.
    pub fn from_witness(public: PublicInputs, spend_preimage: FieldElement, witness: MerkleWitness) -> Self {
        Self::new(public, spend_preimage, witness.address_bits, witness.path)
    }

    /// Use `path` as the proving key for this call.
    pub fn with_proving_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.proving_key = Some(path.into());
        self
    }

    /// The public half of the request.
    pub fn public_inputs(&self) -> PublicInputs {
        PublicInputs {
            root: self.root.clone(),
            exthash: self.exthash.clone(),
        }
    }

    /// Parse the JSON request form.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` for values of the wrong kind, `Format` for missing
    /// fields or an address given both ways.
    pub fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ProtocolError::type_mismatch("prove request object", describe(value)))?;

        let root = scalar_from_value("root", required(obj, "root")?)?;
        let exthash = scalar_from_value("exthash", required(obj, "exthash")?)?;
        let secret = match (obj.get("secret"), obj.get("spend_preimage")) {
            (Some(v), None) | (None, Some(v)) => scalar_from_value("secret", v)?,
            (Some(_), Some(_)) => {
                return Err(ProtocolError::Format(
                    "give either secret or spend_preimage, not both".to_string(),
                ))
            }
            (None, None) => return Err(missing("secret")),
        };
        let address = match (obj.get("address"), obj.get("address_bits")) {
            (Some(v), None) => leaf_index_from_value(v)?,
            (None, Some(v)) => address_bits_from_value(v)?,
            (Some(_), Some(_)) => {
                return Err(ProtocolError::Format(
                    "give either address or address_bits, not both".to_string(),
                ))
            }
            (None, None) => return Err(missing("address")),
        };
        let path = match required(obj, "path")? {
            Value::Array(items) => items
                .iter()
                .map(|v| scalar_from_value("path", v))
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(ProtocolError::type_mismatch("path array", describe(other))),
        };
        let proving_key = match obj.get("proving_key") {
            None | Some(Value::Null) => None,
            Some(Value::String(p)) => Some(PathBuf::from(p)),
            Some(other) => {
                return Err(ProtocolError::type_mismatch("proving key path", describe(other)))
            }
        };

        Ok(Self {
            root,
            exthash,
            spend_preimage: secret,
            address,
            path,
            proving_key,
        })
    }
}

impl std::fmt::Debug for ProveRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProveRequest")
            .field("root", &self.root)
            .field("exthash", &self.exthash)
            .field("path_len", &self.path.len())
            .field("proving_key", &self.proving_key)
            .finish_non_exhaustive()
    }
}

fn missing(field: &str) -> ProtocolError {
    ProtocolError::Format(format!("missing field {field}"))
}

fn required<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Value, ProtocolError> {
    obj.get(field).ok_or_else(|| missing(field))
}

/// Interpret a dynamic value as a scalar.
///
/// Only non-negative JSON integers qualify.
pub fn scalar_from_value(input: &'static str, value: &Value) -> Result<FieldElement, ProtocolError> {
    let mismatch = || {
        ProtocolError::type_mismatch("non-negative integer", format!("{input}: {}", describe(value)))
    };
    match value {
        Value::Number(n) => FieldElement::from_decimal(&n.to_string()).map_err(|_| mismatch()),
        _ => Err(mismatch()),
    }
}

/// A scalar as a bare JSON integer, the form [`scalar_from_value`] accepts.
pub fn scalar_to_value(scalar: &FieldElement) -> Result<Value, ProtocolError> {
    scalar
        .to_decimal()
        .parse::<Number>()
        .map(Value::Number)
        .map_err(|e| ProtocolError::Format(format!("scalar {scalar} is not a JSON integer: {e}")))
}

fn leaf_index_from_value(value: &Value) -> Result<AddressInput, ProtocolError> {
    let index = scalar_from_value("address", value)?;
    index.to_u64().map(AddressInput::LeafIndex).ok_or_else(|| {
        ProtocolError::Format(format!("leaf index {index} does not fit in a tree address"))
    })
}

fn address_bits_from_value(value: &Value) -> Result<AddressInput, ProtocolError> {
    match value {
        Value::String(s) => Ok(AddressInput::Text(s.clone())),
        Value::Array(items) if items.iter().all(Value::is_boolean) => Ok(AddressInput::Bools(
            items.iter().filter_map(Value::as_bool).collect(),
        )),
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_u64()
                    .and_then(|b| u8::try_from(b).ok())
                    .ok_or_else(|| ProtocolError::type_mismatch("bit", describe(v)))
            })
            .collect::<Result<Vec<u8>, _>>()
            .map(AddressInput::Bits),
        other => Err(ProtocolError::type_mismatch(
            "address bit string or sequence",
            describe(other),
        )),
    }
}
