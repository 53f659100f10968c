//! # Key Generation CLI
//!
//! ```bash
//! mixpool genkeys                                   # paths from config
//! mixpool genkeys --proving-key pk.json --verifying-key vk.json
//! ```
//!
//! Refuses to overwrite existing keys unless `--force` is given: proofs made
//! under the old pair stop verifying once it is replaced.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use mixpool_zkp::{ProvingBackend, ServiceConfig};

/// Arguments for `mixpool genkeys`.
#[derive(Args, Debug)]
pub struct GenkeysArgs {
    /// Proving key output path. Defaults to the configured proving key.
    #[arg(long)]
    pub proving_key: Option<PathBuf>,

    /// Verifying key output path. Defaults to the configured verifying key.
    #[arg(long)]
    pub verifying_key: Option<PathBuf>,

    /// Overwrite existing key files.
    #[arg(long)]
    pub force: bool,
}

/// Execute `mixpool genkeys`.
pub fn run_genkeys(args: &GenkeysArgs, config: &ServiceConfig) -> Result<u8> {
    let proving_key = args
        .proving_key
        .clone()
        .or_else(|| config.proving_key.clone())
        .context("no proving key path: pass --proving-key or configure proving_key")?;
    let verifying_key = args
        .verifying_key
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.verifying_key));

    if !args.force {
        for path in [&proving_key, &verifying_key] {
            if path.exists() {
                bail!("{} already exists; pass --force to replace it", path.display());
            }
        }
    }

    let backend = config.build_backend();
    backend
        .generate_keys(&proving_key, &verifying_key)
        .with_context(|| format!("{} backend failed to generate keys", backend.name()))?;

    tracing::info!(
        proving_key = %proving_key.display(),
        verifying_key = %verifying_key.display(),
        "key pair generated"
    );
    println!("proving key:   {}", proving_key.display());
    println!("verifying key: {}", verifying_key.display());
    Ok(0)
}
