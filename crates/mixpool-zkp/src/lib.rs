//! # mixpool-zkp — Proof, Verify and Nullifier Contract Layer
//!
//! The spend protocol's zero-knowledge surface. Callers build a witness,
//! ask for a proof, check proofs against the pool's verifying key and derive
//! nullifiers, all through a single [`ProofService`].
//!
//! ## Architecture
//!
//! - **Backend** (`backend.rs`): the [`ProvingBackend`] capability trait and
//!   its decimal-text boundary encoding.
//! - **Keys** (`keys.rs`): [`VerifyingKeyStore`], loaded once and shared
//!   read-only, and [`ProvingKeyRef`] paths.
//! - **Service** (`service.rs`): [`ProofService`] validates every input shape
//!   before the backend sees it.
//! - **Mock** (`mock.rs`): [`MockBackend`], a deterministic, transparent
//!   backend that checks the real spend statement. **NOT ZERO-KNOWLEDGE.**
//! - **Command** (`command.rs`): [`CommandBackend`], an external prover
//!   driven over stdin/stdout.
//! - **Config** (`config.rs`): YAML + environment configuration.
//!
//! ## Crate Policy
//!
//! - Depends on `mixpool-core` and `mixpool-crypto` internally.
//! - Secrets (preimage, path, address bits) are never logged and are
//!   redacted from every `Debug` rendering.
//! - No `unsafe`.

pub mod backend;
pub mod command;
pub mod config;
pub mod keys;
pub mod mock;
pub mod proof;
pub mod request;
pub mod service;

pub use backend::{BackendError, BackendProveRequest, ProvingBackend};
pub use command::CommandBackend;
pub use config::{BackendConfig, ConfigError, ServiceConfig};
pub use keys::{ProvingKeyRef, VerifyingKey, VerifyingKeyRecord, VerifyingKeySource, VerifyingKeyStore};
pub use mock::MockBackend;
pub use proof::Proof;
pub use request::ProveRequest;
pub use service::ProofService;
