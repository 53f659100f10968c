//! # Subprocess Prover Endpoint
//!
//! `mixpool backend [--depth N] <operation>` serves one call of the
//! subprocess protocol spoken by `CommandBackend`: the request arrives on
//! stdin, the response leaves on stdout. It is backed by the mock prover,
//! which makes the binary a drop-in external prover for integration tests.

use std::io::Read;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::de::DeserializeOwned;
use serde::Serialize;

use mixpool_zkp::backend::BackendProveRequest;
use mixpool_zkp::command::{
    op, GenerateKeysRequest, NullifierRequest, NullifierResponse, TreeDepthResponse,
    VerifyRequest, VerifyResponse, EXIT_UNSATISFIED,
};
use mixpool_zkp::mock::DEFAULT_TREE_DEPTH;
use mixpool_zkp::{MockBackend, ProvingBackend};

/// Arguments for `mixpool backend`.
#[derive(Args, Debug)]
pub struct BackendArgs {
    /// Circuit depth of the served prover.
    #[arg(long, default_value_t = DEFAULT_TREE_DEPTH)]
    pub depth: usize,

    /// Protocol operation: tree-depth, prove, verify, nullifier or genkeys.
    pub operation: String,
}

fn parse<T: DeserializeOwned>(operation: &str, input: &str) -> Result<T> {
    serde_json::from_str(input).with_context(|| format!("malformed {operation} request"))
}

fn respond(value: &impl Serialize) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Answer one protocol call. Returns the exit status and stdout text.
pub fn serve(backend: &impl ProvingBackend, operation: &str, input: &str) -> Result<(u8, String)> {
    let reply = match operation {
        op::TREE_DEPTH => respond(&TreeDepthResponse {
            tree_depth: backend.tree_depth()?,
        })?,
        op::PROVE => {
            let request: BackendProveRequest = parse(operation, input)?;
            match backend.prove(&request)? {
                Some(proof) => proof,
                None => return Ok((EXIT_UNSATISFIED as u8, String::new())),
            }
        }
        op::VERIFY => {
            let request: VerifyRequest = parse(operation, input)?;
            respond(&VerifyResponse {
                valid: backend.verify(&request.verifying_key, &request.proof)?,
            })?
        }
        op::NULLIFIER => {
            let request: NullifierRequest = parse(operation, input)?;
            respond(&NullifierResponse {
                nullifier: backend.nullifier(&request.secret, &request.leaf_index)?,
            })?
        }
        op::GENKEYS => {
            let request: GenerateKeysRequest = parse(operation, input)?;
            backend.generate_keys(&request.proving_key, &request.verifying_key)?;
            "{}".to_string()
        }
        other => bail!("unknown backend operation: {other}"),
    };
    Ok((0, reply))
}

/// Execute `mixpool backend`.
pub fn run_backend(args: &BackendArgs) -> Result<u8> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read request from stdin")?;
    let backend = MockBackend::new(args.depth);
    let (status, reply) = serve(&backend, &args.operation, &input)?;
    tracing::debug!(operation = %args.operation, status, "backend call served");
    if !reply.is_empty() {
        println!("{reply}");
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_depth() {
        let (status, reply) = serve(&MockBackend::new(7), op::TREE_DEPTH, "{}").unwrap();
        assert_eq!(status, 0);
        assert_eq!(reply, r#"{"tree_depth":7}"#);
    }

    #[test]
    fn derives_nullifier() {
        let input = json!({"secret": "5", "leaf_index": "1"}).to_string();
        let (_, reply) = serve(&MockBackend::new(2), op::NULLIFIER, &input).unwrap();
        let response: NullifierResponse = serde_json::from_str(&reply).unwrap();
        assert_eq!(
            response.nullifier,
            MockBackend::new(2).nullifier("5", "1").unwrap()
        );
    }

    #[test]
    fn unknown_operation_and_bad_input_fail() {
        assert!(serve(&MockBackend::new(2), "launch", "{}").is_err());
        assert!(serve(&MockBackend::new(2), op::VERIFY, "[]").is_err());
    }

    #[test]
    fn unsatisfied_prove_exits_with_status() {
        let dir = tempfile::tempdir().unwrap();
        let pk = dir.path().join("pk.json");
        let vk = dir.path().join("vk.json");
        let genkeys = json!({"proving_key": pk, "verifying_key": vk}).to_string();
        assert_eq!(serve(&MockBackend::new(1), op::GENKEYS, &genkeys).unwrap().0, 0);

        let request = json!({
            "proving_key": pk,
            "root": "1",
            "exthash": "0",
            "spend_preimage": "2",
            "address_bits": "0",
            "path": ["3"],
        })
        .to_string();
        let (status, reply) = serve(&MockBackend::new(1), op::PROVE, &request).unwrap();
        assert_eq!(status, EXIT_UNSATISFIED as u8);
        assert!(reply.is_empty());
    }
}
