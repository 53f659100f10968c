//! # Deposit Tree CLI — Commitments and Witnesses
//!
//! ```bash
//! mixpool commit --random                 # fresh secret and its leaf
//! mixpool commit --secret 12345
//! mixpool witness --leaves leaves.json --index 2
//! mixpool witness --leaves - --leaf 0x1f… --depth 29
//! mixpool tree-depth
//! ```
//!
//! `leaves.json` is a JSON array of leaf integers in deposit order. The
//! witness output is the `root`, `address_bits` and `path` a prove request
//! needs, with scalars as bare JSON integers.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use rand::RngCore;
use serde::Serialize;
use serde_json::Value;

use mixpool_core::{FieldElement, TreeDepth};
use mixpool_crypto::{leaf_commitment, MerkleTree};
use mixpool_zkp::request::scalar_from_value;
use mixpool_zkp::{ProvingBackend, ServiceConfig};

use crate::{integer, integers, read_json, ConfiguredService};

/// Arguments for `mixpool commit`.
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// Secret leaf preimage, decimal or 0x-hex.
    #[arg(long, conflicts_with = "random", required_unless_present = "random")]
    pub secret: Option<String>,

    /// Draw a fresh random secret.
    #[arg(long)]
    pub random: bool,
}

/// A secret and the leaf it commits to.
#[derive(Debug, Serialize)]
pub struct Note {
    #[serde(serialize_with = "integer")]
    pub secret: FieldElement,
    #[serde(serialize_with = "integer")]
    pub leaf: FieldElement,
}

/// Arguments for `mixpool witness`.
#[derive(Args, Debug)]
pub struct WitnessArgs {
    /// JSON array of leaves in deposit order, or `-` for stdin.
    #[arg(long)]
    pub leaves: PathBuf,

    /// Index of the leaf to open.
    #[arg(long, conflicts_with = "leaf", required_unless_present = "leaf")]
    pub index: Option<u64>,

    /// Leaf value to open; its first occurrence is used.
    #[arg(long)]
    pub leaf: Option<String>,

    /// Tree depth. Defaults to the configured backend's depth.
    #[arg(long)]
    pub depth: Option<usize>,
}

/// Witness output of `mixpool witness`.
#[derive(Debug, Serialize)]
pub struct WitnessOutput {
    #[serde(serialize_with = "integer")]
    pub root: FieldElement,
    pub leaf_index: u64,
    pub address_bits: String,
    #[serde(serialize_with = "integers")]
    pub path: Vec<FieldElement>,
}

fn random_secret() -> FieldElement {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    FieldElement::from_be_bytes_reduced(&bytes)
}

/// Build the note for `mixpool commit`.
pub fn make_note(args: &CommitArgs) -> Result<Note> {
    let secret = match &args.secret {
        Some(text) => FieldElement::parse(text).context("--secret is not an integer")?,
        None => random_secret(),
    };
    let leaf = leaf_commitment(&secret);
    Ok(Note { secret, leaf })
}

/// Execute `mixpool commit`.
pub fn run_commit(args: &CommitArgs) -> Result<u8> {
    let note = make_note(args)?;
    println!("{}", serde_json::to_string_pretty(&note)?);
    Ok(0)
}

/// Parse a JSON array of leaf integers.
pub fn parse_leaves(value: &Value) -> Result<Vec<FieldElement>> {
    let Value::Array(items) = value else {
        bail!("leaves must be a JSON array");
    };
    items
        .iter()
        .enumerate()
        .map(|(i, v)| scalar_from_value("leaf", v).with_context(|| format!("leaf {i}")))
        .collect()
}

/// Build the tree and open the requested leaf.
pub fn build_witness(leaves: Vec<FieldElement>, args: &WitnessArgs, depth: TreeDepth) -> Result<WitnessOutput> {
    let tree = MerkleTree::from_leaves(depth, leaves)?;
    let index = match (&args.index, &args.leaf) {
        (Some(index), _) => *index,
        (None, Some(text)) => {
            let leaf = FieldElement::parse(text).context("--leaf is not an integer")?;
            tree.index_of(&leaf)
                .with_context(|| format!("leaf {leaf} is not in the tree"))?
        }
        (None, None) => bail!("pass --index or --leaf"),
    };
    let witness = tree.witness(index)?;
    Ok(WitnessOutput {
        root: tree.root(),
        leaf_index: index,
        address_bits: witness.address_bits.as_str().to_string(),
        path: witness.path,
    })
}

/// Execute `mixpool witness`.
pub fn run_witness(args: &WitnessArgs, config: &ServiceConfig) -> Result<u8> {
    let depth = match args.depth {
        Some(depth) => depth,
        None => config
            .build_backend()
            .tree_depth()
            .context("cannot determine the tree depth; pass --depth")?,
    };
    let depth = TreeDepth::new(depth)?;
    let leaves = parse_leaves(&read_json(&args.leaves)?)?;
    tracing::debug!(leaves = leaves.len(), %depth, "building deposit tree");
    let output = build_witness(leaves, args, depth)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(0)
}

/// Execute `mixpool tree-depth`.
pub fn run_tree_depth(service: &ConfiguredService) -> Result<u8> {
    println!("{}", service.tree_depth());
    Ok(0)
}
