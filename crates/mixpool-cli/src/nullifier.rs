//! # Nullifier CLI
//!
//! ```bash
//! mixpool nullifier --secret 12345 --index 2
//! ```
//!
//! Prints the nullifier as decimal text.

use anyhow::{Context, Result};
use clap::Args;

use mixpool_core::FieldElement;

use crate::ConfiguredService;

/// Arguments for `mixpool nullifier`.
#[derive(Args, Debug)]
pub struct NullifierArgs {
    /// Secret leaf preimage, decimal or 0x-hex.
    #[arg(long)]
    pub secret: String,

    /// Leaf index of the deposit.
    #[arg(long)]
    pub index: String,
}

/// Execute `mixpool nullifier`.
pub fn run_nullifier(args: &NullifierArgs, service: &ConfiguredService) -> Result<u8> {
    let secret = FieldElement::parse(&args.secret).context("--secret is not an integer")?;
    let index = FieldElement::parse(&args.index).context("--index is not an integer")?;
    println!("{}", service.nullifier(&secret, &index)?);
    Ok(0)
}
