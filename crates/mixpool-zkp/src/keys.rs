//! # Key Material — Verifying Key Store and Proving Key References
//!
//! A `VerifyingKey` is the circuit's public parameters: an opaque JSON record
//! of named field-element groups. It is parsed once, canonicalized, and then
//! shared read-only by every verification for the lifetime of the process.
//!
//! A `ProvingKeyRef` is only a path. Proving keys are large and are read by
//! the backend, never loaded into this process.
//!
//! ## Trust Boundary
//!
//! Nothing here binds a proving key to the verifying key in use. Mismatched
//! keys surface as a proving failure or as a proof that does not verify.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use mixpool_core::{sha256_digest, CanonicalBytes, ContentDigest, ProtocolError};

/// A verifying key given as a mapping of named groups.
pub type VerifyingKeyRecord = BTreeMap<String, Value>;

/// Parsed, canonicalized verifying key. Immutable once constructed.
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyingKey {
    record: Value,
    canonical: CanonicalBytes,
}

impl VerifyingKey {
    /// Build from a structured record.
    pub fn from_record(record: VerifyingKeyRecord) -> Result<Self, ProtocolError> {
        Self::from_value(Value::Object(record.into_iter().collect()))
    }

    /// Build from a JSON value, which must be a non-empty object.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        match &value {
            Value::Object(map) if !map.is_empty() => {}
            Value::Object(_) => {
                return Err(ProtocolError::type_mismatch(
                    "verifying key record",
                    "empty object",
                ))
            }
            other => {
                return Err(ProtocolError::type_mismatch(
                    "verifying key record",
                    describe(other),
                ))
            }
        }
        let canonical = CanonicalBytes::new(&value).map_err(|e| {
            ProtocolError::type_mismatch("verifying key record", e.to_string())
        })?;
        Ok(Self {
            record: value,
            canonical,
        })
    }

    /// Parse the textual (JSON) form.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            ProtocolError::type_mismatch("verifying key JSON text", format!("unparseable text ({e})"))
        })?;
        Self::from_value(value)
    }

    /// Read and parse a verifying key file.
    pub fn from_file(path: &Path) -> Result<Self, ProtocolError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ProtocolError::Configuration(format!(
                "cannot read verifying key {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&text)
    }

    /// Canonical JSON text, as handed to the verifying backend.
    pub fn to_json(&self) -> &str {
        self.canonical.as_str()
    }

    /// The parsed record.
    pub fn as_value(&self) -> &Value {
        &self.record
    }

    /// A named group of the record.
    pub fn group(&self, name: &str) -> Option<&Value> {
        self.record.get(name)
    }

    /// SHA-256 of the canonical text.
    pub fn fingerprint(&self) -> ContentDigest {
        sha256_digest(&self.canonical)
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyingKey")
            .field("fingerprint", &self.fingerprint().to_hex())
            .finish()
    }
}

/// The accepted forms of verifying-key input, resolved in this order:
/// an already-parsed key, a structured record, a path to an existing file,
/// then JSON text.
#[derive(Debug, Clone)]
pub enum VerifyingKeySource {
    /// An already-parsed key.
    Key(VerifyingKey),
    /// A mapping of named groups.
    Record(VerifyingKeyRecord),
    /// A dynamic value: an object is a record, a string is `Text`.
    Value(Value),
    /// A filesystem path if one exists, otherwise JSON text.
    Text(String),
}

impl VerifyingKeySource {
    /// Resolve into a parsed key.
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the input is none of the accepted forms.
    /// `Configuration` if an existing file cannot be read.
    pub fn resolve(self) -> Result<VerifyingKey, ProtocolError> {
        match self {
            Self::Key(key) => Ok(key),
            Self::Record(record) => VerifyingKey::from_record(record),
            Self::Value(Value::String(text)) => Self::Text(text).resolve(),
            Self::Value(value @ Value::Object(_)) => VerifyingKey::from_value(value),
            Self::Value(other) => Err(ProtocolError::type_mismatch(
                "verifying key record, path or JSON text",
                describe(&other),
            )),
            Self::Text(text) => {
                let path = Path::new(&text);
                if path.is_file() {
                    VerifyingKey::from_file(path)
                } else {
                    VerifyingKey::from_json(&text)
                }
            }
        }
    }
}

impl From<VerifyingKey> for VerifyingKeySource {
    fn from(key: VerifyingKey) -> Self {
        Self::Key(key)
    }
}

impl From<VerifyingKeyRecord> for VerifyingKeySource {
    fn from(record: VerifyingKeyRecord) -> Self {
        Self::Record(record)
    }
}

impl From<Value> for VerifyingKeySource {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<String> for VerifyingKeySource {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for VerifyingKeySource {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<&Path> for VerifyingKeySource {
    fn from(path: &Path) -> Self {
        Self::Text(path.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for VerifyingKeySource {
    fn from(path: PathBuf) -> Self {
        Self::Text(path.to_string_lossy().into_owned())
    }
}

/// Shared, read-only handle to the service's verifying key.
#[derive(Debug, Clone)]
pub struct VerifyingKeyStore {
    key: Arc<VerifyingKey>,
}

impl VerifyingKeyStore {
    /// Resolve and freeze a verifying key.
    pub fn load(source: impl Into<VerifyingKeySource>) -> Result<Self, ProtocolError> {
        let key = source.into().resolve()?;
        Ok(Self { key: Arc::new(key) })
    }

    /// The key.
    pub fn key(&self) -> &VerifyingKey {
        &self.key
    }

    /// Canonical JSON text of the key.
    pub fn to_json(&self) -> &str {
        self.key.to_json()
    }
}

/// Location of proving-key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvingKeyRef(PathBuf);

impl ProvingKeyRef {
    /// Reference a proving key that must already exist.
    pub fn existing(path: impl Into<PathBuf>) -> Result<Self, ProtocolError> {
        let path = path.into();
        if !path.exists() {
            return Err(ProtocolError::Configuration(format!(
                "proving key file does not exist: {}",
                path.display()
            )));
        }
        Ok(Self(path))
    }

    /// Reference a proving key without checking the filesystem.
    pub fn trusted(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// The key's path.
    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Short description of a JSON value's kind for type-mismatch messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => {
            let text = n.to_string();
            if text.contains(['.', 'e', 'E']) {
                format!("float {text}")
            } else if text.starts_with('-') {
                format!("negative integer {text}")
            } else {
                format!("integer {text}")
            }
        }
        Value::String(_) => "string".to_string(),
        Value::Array(a) => format!("array of {}", a.len()),
        Value::Object(_) => "object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({"alpha": ["1", "2"], "beta": [["3", "4"], ["5", "6"]], "gammaABC": [["7", "8"]]})
    }

    #[test]
    fn record_value_and_text_agree() {
        let from_value = VerifyingKey::from_value(sample()).unwrap();
        let record: VerifyingKeyRecord = serde_json::from_value(sample()).unwrap();
        let from_record = VerifyingKey::from_record(record).unwrap();
        let from_text = VerifyingKey::from_json(&sample().to_string()).unwrap();
        assert_eq!(from_value, from_record);
        assert_eq!(from_value, from_text);
        assert_eq!(from_value.fingerprint(), from_text.fingerprint());
    }

    #[test]
    fn canonical_text_sorts_keys() {
        let vk = VerifyingKey::from_json(r#"{"b":"1","a":"2"}"#).unwrap();
        assert_eq!(vk.to_json(), r#"{"a":"2","b":"1"}"#);
        assert_eq!(vk.group("a"), Some(&json!("2")));
    }

    #[test]
    fn non_object_inputs_are_type_mismatch() {
        for bad in [json!(1), json!([1, 2]), json!(true), json!(null), json!({})] {
            assert!(matches!(
                VerifyingKeySource::Value(bad).resolve(),
                Err(ProtocolError::TypeMismatch { .. })
            ));
        }
        assert!(matches!(
            VerifyingKeySource::Text("not json and not a path".to_string()).resolve(),
            Err(ProtocolError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn floats_in_key_are_rejected() {
        assert!(matches!(
            VerifyingKey::from_value(json!({"alpha": [1.5]})),
            Err(ProtocolError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn wide_integer_groups_are_kept_exactly() {
        let wide = "21888242871839275222246405745257275088548364400416034343698204186575808495616";
        let vk = VerifyingKey::from_json(&format!(r#"{{"alpha": [{wide}, 1]}}"#)).unwrap();
        assert_eq!(vk.to_json(), format!(r#"{{"alpha":[{wide},1]}}"#));
    }

    #[test]
    fn text_resolves_existing_path_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vk.json");
        std::fs::write(&path, sample().to_string()).unwrap();
        let store = VerifyingKeyStore::load(path.as_path()).unwrap();
        assert_eq!(store.key(), &VerifyingKey::from_value(sample()).unwrap());
        let via_string = VerifyingKeySource::Value(Value::String(path.display().to_string()))
            .resolve()
            .unwrap();
        assert_eq!(&via_string, store.key());
    }

    #[test]
    fn store_clones_share_the_key() {
        let store = VerifyingKeyStore::load(sample()).unwrap();
        let clone = store.clone();
        assert!(std::ptr::eq(store.key(), clone.key()));
    }

    #[test]
    fn proving_key_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.pk");
        assert!(matches!(
            ProvingKeyRef::existing(&missing),
            Err(ProtocolError::Configuration(_))
        ));
        std::fs::write(&missing, b"{}").unwrap();
        assert_eq!(ProvingKeyRef::existing(&missing).unwrap().path(), missing);
        assert_eq!(ProvingKeyRef::trusted("nowhere").path(), Path::new("nowhere"));
    }
}
