//! # mixpool CLI Entry Point
//!
//! Parses command-line arguments, initialises logging, loads configuration
//! and dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mixpool_cli::backend::{run_backend, BackendArgs};
use mixpool_cli::keys::{run_genkeys, GenkeysArgs};
use mixpool_cli::nullifier::{run_nullifier, NullifierArgs};
use mixpool_cli::prove::{run_prove, ProveArgs};
use mixpool_cli::tree::{run_commit, run_tree_depth, run_witness, CommitArgs, WitnessArgs};
use mixpool_cli::verify::{run_verify, VerifyArgs};
use mixpool_cli::{build_service, load_config};

/// mixpool — private deposit pool toolchain.
///
/// Generates keys, builds deposit-tree witnesses, proves spends, verifies
/// proofs and derives nullifiers.
#[derive(Parser, Debug)]
#[command(name = "mixpool", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a proving/verifying key pair.
    Genkeys(GenkeysArgs),

    /// Derive the leaf commitment for a secret.
    Commit(CommitArgs),

    /// Build a deposit tree and print the witness for one leaf.
    Witness(WitnessArgs),

    /// Prove knowledge of a deposit's secret under a tree root.
    Prove(ProveArgs),

    /// Verify a proof against the configured verifying key.
    Verify(VerifyArgs),

    /// Derive the nullifier of a deposit.
    Nullifier(NullifierArgs),

    /// Print the circuit's tree depth.
    TreeDepth,

    /// Serve one subprocess-protocol call with the mock prover.
    #[command(hide = true)]
    Backend(BackendArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    // stdout carries command output; logs go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let config = || load_config(cli.config.as_deref());
    match &cli.command {
        Commands::Commit(args) => run_commit(args),
        Commands::Backend(args) => run_backend(args),
        Commands::Genkeys(args) => run_genkeys(args, &config()?),
        Commands::Witness(args) => run_witness(args, &config()?),
        Commands::Prove(args) => run_prove(args, &build_service(&config()?)?),
        Commands::Verify(args) => run_verify(args, &build_service(&config()?)?),
        Commands::Nullifier(args) => run_nullifier(args, &build_service(&config()?)?),
        Commands::TreeDepth => run_tree_depth(&build_service(&config()?)?),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);
    tracing::debug!("mixpool CLI v{} starting", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
