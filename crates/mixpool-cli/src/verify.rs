//! # Verify CLI
//!
//! ```bash
//! mixpool verify proof.json
//! mixpool prove --request request.json | mixpool verify -
//! ```
//!
//! Exits 0 for a valid proof and [`EXIT_INVALID`] for one that does not
//! verify. Malformed input is an error (exit 1).

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::{read_json, ConfiguredService};

/// Exit status for a well-formed proof that does not verify.
pub const EXIT_INVALID: u8 = 2;

/// Arguments for `mixpool verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Proof JSON file, or `-` for stdin.
    pub proof: PathBuf,
}

/// Execute `mixpool verify`.
pub fn run_verify(args: &VerifyArgs, service: &ConfiguredService) -> Result<u8> {
    let proof = read_json(&args.proof)?;
    if service.verify_value(&proof)? {
        println!("VALID");
        Ok(0)
    } else {
        println!("INVALID");
        Ok(EXIT_INVALID)
    }
}
