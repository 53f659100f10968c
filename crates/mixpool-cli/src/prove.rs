//! # Prove CLI
//!
//! ```bash
//! # Complete JSON request:
//! mixpool prove --request request.json --out proof.json
//!
//! # Witness from `mixpool witness`, secret and exthash from flags:
//! mixpool prove --witness witness.json --secret 12345 --exthash 0
//!
//! # Everything from flags:
//! mixpool prove --root 123 --exthash 0 --secret 12345 \
//!     --address-bits 01 --path 5,6
//! ```
//!
//! Flags override values read from `--request` or `--witness`.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use serde_json::{Map, Value};

use mixpool_zkp::ProveRequest;

use crate::{integer_flag, read_json, write_output, ConfiguredService};

/// Arguments for `mixpool prove`.
#[derive(Args, Debug, Default)]
pub struct ProveArgs {
    /// JSON prove request, or `-` for stdin.
    #[arg(long, conflicts_with = "witness")]
    pub request: Option<PathBuf>,

    /// Witness JSON as printed by `mixpool witness`.
    #[arg(long)]
    pub witness: Option<PathBuf>,

    /// Tree root.
    #[arg(long)]
    pub root: Option<String>,

    /// External data hash.
    #[arg(long)]
    pub exthash: Option<String>,

    /// Secret leaf preimage.
    #[arg(long)]
    pub secret: Option<String>,

    /// Leaf index.
    #[arg(long, conflicts_with = "address_bits")]
    pub address: Option<u64>,

    /// Address bits, leaf level first.
    #[arg(long)]
    pub address_bits: Option<String>,

    /// Sibling path, leaf level first, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub path: Option<Vec<String>>,

    /// Proving key for this call.
    #[arg(long)]
    pub proving_key: Option<PathBuf>,

    /// Write the proof here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Assemble the JSON request from files and flags.
pub fn request_value(args: &ProveArgs) -> Result<Value> {
    let mut request = match (&args.request, &args.witness) {
        (Some(path), _) | (None, Some(path)) => match read_json(path)? {
            Value::Object(map) => map,
            _ => bail!("{} must hold a JSON object", path.display()),
        },
        (None, None) => Map::new(),
    };
    if args.witness.is_some() {
        request.retain(|k, _| matches!(k.as_str(), "root" | "address_bits" | "path"));
    }

    let scalar = |flag: &str, text: &Option<String>| {
        text.as_deref().map(|t| integer_flag(flag, t)).transpose()
    };
    let root = scalar("--root", &args.root)?;
    let exthash = scalar("--exthash", &args.exthash)?;
    let secret = scalar("--secret", &args.secret)?;
    let path = args
        .path
        .as_ref()
        .map(|p| {
            p.iter()
                .map(|t| integer_flag("--path", t))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        })
        .transpose()?;

    let mut set = |key: &str, value: Option<Value>| {
        if let Some(value) = value {
            request.insert(key.to_string(), value);
        }
    };
    set("root", root);
    set("exthash", exthash);
    set("secret", secret);
    set("address", args.address.map(Value::from));
    set("address_bits", args.address_bits.clone().map(Value::String));
    set("path", path);
    set(
        "proving_key",
        args.proving_key
            .as_ref()
            .map(|p| Value::String(p.display().to_string())),
    );

    if args.address.is_some() {
        request.remove("address_bits");
    }
    if args.address_bits.is_some() {
        request.remove("address");
    }
    if args.secret.is_some() {
        request.remove("spend_preimage");
    }
    Ok(Value::Object(request))
}

/// Execute `mixpool prove`.
pub fn run_prove(args: &ProveArgs, service: &ConfiguredService) -> Result<u8> {
    let request = ProveRequest::from_value(&request_value(args)?)?;
    let proof = service.prove(&request)?;
    write_output(args.out.as_deref(), &serde_json::to_string_pretty(&proof)?)?;
    Ok(0)
}
