//! # mixpool-cli — Command-Line Interface for the Spend Protocol
//!
//! Provides the `mixpool` binary.
//!
//! ## Subcommands
//!
//! - `mixpool genkeys` — Generate a proving/verifying key pair.
//! - `mixpool commit` — Derive a leaf commitment, optionally for a fresh secret.
//! - `mixpool witness` — Build a deposit tree and emit a Merkle witness.
//! - `mixpool prove` — Produce a spend proof.
//! - `mixpool verify` — Check a proof against the verifying key.
//! - `mixpool nullifier` — Derive the nullifier of a deposit.
//! - `mixpool tree-depth` — Report the configured circuit's depth.
//!
//! ```bash
//! mixpool genkeys
//! mixpool commit --random > note.json
//! mixpool witness --leaves leaves.json --index 2 --depth 29 > witness.json
//! mixpool prove --request request.json --out proof.json
//! mixpool verify proof.json
//! ```
//!
//! A hidden `backend` subcommand serves the mock backend over the
//! subprocess protocol, so `mixpool` can stand in for an external prover.
//!
//! ## Configuration
//!
//! `--config FILE` selects a YAML [`ServiceConfig`]; without it the defaults
//! apply. `MIXPOOL_*` environment variables override either.
//!
//! ## Scalars
//!
//! Flags take decimal or `0x`-hex text. JSON documents, read or written,
//! carry scalars as bare integers.

pub mod backend;
pub mod keys;
pub mod nullifier;
pub mod prove;
pub mod tree;
pub mod verify;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::ser::{Error as _, Serialize, Serializer};
use serde_json::Value;

use mixpool_core::FieldElement;
use mixpool_zkp::request::scalar_to_value;
use mixpool_zkp::{ProofService, ProvingBackend, ServiceConfig};

/// Service built from configuration.
pub type ConfiguredService = ProofService<Box<dyn ProvingBackend>>;

/// Load configuration from `path` (or defaults) and apply the environment.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig> {
    let config = match path {
        Some(path) => ServiceConfig::load(path)?,
        None => ServiceConfig::default(),
    };
    Ok(config.apply_env()?)
}

/// Build a proof service from configuration.
pub fn build_service(config: &ServiceConfig) -> Result<ConfiguredService> {
    ProofService::from_config(config).context("failed to initialise the proof service")
}

/// Read a JSON document from `path`, or stdin when `path` is `-`.
pub fn read_json(path: &Path) -> Result<Value> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Parse a scalar flag into the JSON integer a request carries.
pub fn integer_flag(flag: &str, text: &str) -> Result<Value> {
    let scalar = FieldElement::parse(text).with_context(|| format!("{flag} is not an integer"))?;
    Ok(scalar_to_value(&scalar)?)
}

/// `serialize_with` helper writing a scalar as a bare JSON integer.
pub fn integer<S: Serializer>(scalar: &FieldElement, serializer: S) -> Result<S::Ok, S::Error> {
    scalar_to_value(scalar)
        .map_err(S::Error::custom)?
        .serialize(serializer)
}

/// `serialize_with` helper writing scalars as bare JSON integers.
pub fn integers<S: Serializer>(scalars: &[FieldElement], serializer: S) -> Result<S::Ok, S::Error> {
    let values = scalars
        .iter()
        .map(scalar_to_value)
        .collect::<Result<Vec<_>, _>>()
        .map_err(S::Error::custom)?;
    values.serialize(serializer)
}

/// Write `text` to `out`, or stdout when absent.
pub fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(path, format!("{text}\n"))
                .with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn loads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixpool.yaml");
        std::fs::write(&path, "backend:\n  kind: mock\n  tree_depth: 4\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.build_backend().tree_depth().unwrap(), 4);
    }

    #[test]
    fn reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, r#"{"a": 1}"#).unwrap();
        assert_eq!(read_json(&path).unwrap()["a"], 1);
        std::fs::write(&path, "{").unwrap();
        assert!(read_json(&path).is_err());
        assert!(read_json(&dir.path().join("absent.json")).is_err());
    }

    #[test]
    fn writes_output_creating_directories() {
        let dir = tempfile::tempdir().unwrap();
        let out: PathBuf = dir.path().join("nested").join("out.json");
        write_output(Some(&out), "{}").unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "{}\n");
    }

    #[test]
    fn integer_flags_become_json_integers() {
        assert_eq!(integer_flag("--root", "0x10").unwrap(), serde_json::json!(16));
        let wide = "340282366920938463463374607431768211457";
        assert_eq!(integer_flag("--root", wide).unwrap().to_string(), wide);
        assert!(integer_flag("--root", "ten").is_err());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("absent.yaml"))).is_err());
    }
}
