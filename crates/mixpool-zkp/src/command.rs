//! # Subprocess Proving Backend
//!
//! Drives an external prover binary, one process per call:
//!
//! ```text
//! <program> <args…> <operation>   # request JSON on stdin, response on stdout
//! ```
//!
//! | operation    | stdin                                   | stdout (exit 0)          |
//! |--------------|-----------------------------------------|--------------------------|
//! | `tree-depth` | `{}`                                    | `{"tree_depth": N}`      |
//! | `prove`      | [`BackendProveRequest`]                 | proof JSON object        |
//! | `verify`     | `{"verifying_key": …, "proof": …}`      | `{"valid": bool}`        |
//! | `nullifier`  | `{"secret": …, "leaf_index": …}`        | `{"nullifier": "…"}`     |
//! | `genkeys`    | `{"proving_key": …, "verifying_key": …}`| `{}`                     |
//!
//! `prove` exits with [`EXIT_UNSATISFIED`] when the witness does not satisfy
//! the circuit. Any other non-zero exit is a protocol failure and its stderr
//! is reported.
//!
//! The secret travels on stdin only. It never appears in the argument list.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::{BackendError, BackendProveRequest, ProvingBackend};

/// Exit status of `prove` for an unsatisfied witness.
pub const EXIT_UNSATISFIED: i32 = 2;

/// Operation names of the subprocess protocol.
pub mod op {
    pub const TREE_DEPTH: &str = "tree-depth";
    pub const PROVE: &str = "prove";
    pub const VERIFY: &str = "verify";
    pub const NULLIFIER: &str = "nullifier";
    pub const GENKEYS: &str = "genkeys";
}

/// `tree-depth` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDepthResponse {
    pub tree_depth: usize,
}

/// `verify` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub verifying_key: String,
    pub proof: String,
}

/// `verify` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

/// `nullifier` request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullifierRequest {
    pub secret: String,
    pub leaf_index: String,
}

impl std::fmt::Debug for NullifierRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NullifierRequest")
            .field("leaf_index", &self.leaf_index)
            .finish_non_exhaustive()
    }
}

/// `nullifier` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullifierResponse {
    pub nullifier: String,
}

/// `genkeys` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateKeysRequest {
    pub proving_key: PathBuf,
    pub verifying_key: PathBuf,
}

/// Raw outcome of one subprocess call.
struct Outcome {
    status: Option<i32>,
    stdout: String,
    stderr: String,
}

/// Backend that shells out to an external prover.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandBackend {
    /// Run `program` with no leading arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the operation name.
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, operation: &str, request: &impl Serialize) -> Result<Outcome, BackendError> {
        let input = serde_json::to_vec(request)
            .map_err(|e| BackendError::Protocol(format!("cannot encode {operation} request: {e}")))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(operation)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                BackendError::Unavailable(format!("cannot start {}: {e}", self.program.display()))
            })?;

        // The request is written while output is collected.
        let writer = child
            .stdin
            .take()
            .map(|mut stdin| std::thread::spawn(move || stdin.write_all(&input)));
        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!(operation, "prover exited before reading its request");
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    return Err(BackendError::Protocol(format!(
                        "{operation} request writer panicked"
                    )))
                }
            }
        }
        debug!(
            program = %self.program.display(),
            operation,
            status = ?output.status.code(),
            "prover subprocess finished"
        );
        Ok(Outcome {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    fn call<T: for<'de> Deserialize<'de>>(
        &self,
        operation: &str,
        request: &impl Serialize,
    ) -> Result<T, BackendError> {
        let outcome = self.run(operation, request)?;
        if outcome.status != Some(0) {
            return Err(failure(operation, &outcome));
        }
        serde_json::from_str(outcome.stdout.trim()).map_err(|e| {
            BackendError::Protocol(format!("{operation} returned malformed output: {e}"))
        })
    }
}

fn failure(operation: &str, outcome: &Outcome) -> BackendError {
    let status = outcome
        .status
        .map_or_else(|| "a signal".to_string(), |code| format!("status {code}"));
    if outcome.stderr.is_empty() {
        BackendError::Protocol(format!("{operation} exited with {status}"))
    } else {
        BackendError::Protocol(format!(
            "{operation} exited with {status}: {}",
            outcome.stderr
        ))
    }
}

impl ProvingBackend for CommandBackend {
    fn name(&self) -> &'static str {
        "command"
    }

    fn tree_depth(&self) -> Result<usize, BackendError> {
        let response: TreeDepthResponse =
            self.call(op::TREE_DEPTH, &serde_json::Value::Object(Default::default()))?;
        Ok(response.tree_depth)
    }

    fn prove(&self, request: &BackendProveRequest) -> Result<Option<String>, BackendError> {
        let outcome = self.run(op::PROVE, request)?;
        match outcome.status {
            Some(0) => {
                let proof = outcome.stdout.trim();
                if proof.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(proof.to_string()))
                }
            }
            Some(EXIT_UNSATISFIED) => Ok(None),
            _ => Err(failure(op::PROVE, &outcome)),
        }
    }

    fn verify(&self, verifying_key: &str, proof: &str) -> Result<bool, BackendError> {
        let response: VerifyResponse = self.call(
            op::VERIFY,
            &VerifyRequest {
                verifying_key: verifying_key.to_string(),
                proof: proof.to_string(),
            },
        )?;
        Ok(response.valid)
    }

    fn nullifier(&self, secret: &str, leaf_index: &str) -> Result<String, BackendError> {
        let response: NullifierResponse = self.call(
            op::NULLIFIER,
            &NullifierRequest {
                secret: secret.to_string(),
                leaf_index: leaf_index.to_string(),
            },
        )?;
        Ok(response.nullifier)
    }

    fn generate_keys(&self, proving_key: &Path, verifying_key: &Path) -> Result<(), BackendError> {
        let outcome = self.run(
            op::GENKEYS,
            &GenerateKeysRequest {
                proving_key: proving_key.to_path_buf(),
                verifying_key: verifying_key.to_path_buf(),
            },
        )?;
        if outcome.status == Some(0) {
            Ok(())
        } else {
            Err(failure(op::GENKEYS, &outcome))
        }
    }
}
