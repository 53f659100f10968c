//! Proof service configuration.
//!
//! Loaded from YAML, then overridden by environment variables:
//!
//! - `MIXPOOL_VERIFYING_KEY`: verifying key path or JSON text
//! - `MIXPOOL_PROVING_KEY`: default proving key path (empty clears it)
//! - `MIXPOOL_ENFORCE_FIELD_ORDER`: `true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`
//!
//! ```yaml
//! verifying_key: keys/mixpool.vk.json
//! proving_key: keys/mixpool.pk.json
//! enforce_field_order: true
//! backend:
//!   kind: command
//!   program: /usr/local/bin/mixpool-prover
//!   args: ["--threads", "4"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::backend::ProvingBackend;
use crate::command::CommandBackend;
use crate::mock::{MockBackend, DEFAULT_TREE_DEPTH};

/// Environment variable overriding [`ServiceConfig::verifying_key`].
pub const ENV_VERIFYING_KEY: &str = "MIXPOOL_VERIFYING_KEY";
/// Environment variable overriding [`ServiceConfig::proving_key`].
pub const ENV_PROVING_KEY: &str = "MIXPOOL_PROVING_KEY";
/// Environment variable overriding [`ServiceConfig::enforce_field_order`].
pub const ENV_ENFORCE_FIELD_ORDER: &str = "MIXPOOL_ENFORCE_FIELD_ORDER";

/// Errors loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config{}: {source}", .path.as_ref().map(|p| format!(" {}", p.display())).unwrap_or_default())]
    YamlParse {
        path: Option<PathBuf>,
        source: serde_yaml::Error,
    },

    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
}

/// Which backend the service drives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// The in-process mock. Not zero-knowledge.
    Mock {
        #[serde(default = "default_tree_depth")]
        tree_depth: usize,
    },
    /// An external prover speaking the subprocess protocol of [`CommandBackend`].
    Command {
        program: PathBuf,
        #[serde(default)]
        args: Vec<String>,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::Mock {
            tree_depth: DEFAULT_TREE_DEPTH,
        }
    }
}

fn default_tree_depth() -> usize {
    DEFAULT_TREE_DEPTH
}

fn default_verifying_key() -> String {
    "keys/mixpool.vk.json".to_string()
}

fn default_proving_key() -> Option<PathBuf> {
    Some(PathBuf::from("keys/mixpool.pk.json"))
}

/// Settings for one `ProofService`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Verifying key path or JSON text.
    #[serde(default = "default_verifying_key")]
    pub verifying_key: String,
    /// Default proving key. `null` means every request must carry one.
    #[serde(default = "default_proving_key")]
    pub proving_key: Option<PathBuf>,
    /// Reject scalars at or above the BN254 scalar field modulus.
    #[serde(default)]
    pub enforce_field_order: bool,
    #[serde(default)]
    pub backend: BackendConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            verifying_key: default_verifying_key(),
            proving_key: default_proving_key(),
            enforce_field_order: false,
            backend: BackendConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::YamlParse { path: None, source })
    }

    /// Read and parse a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::YamlParse {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(vk) = lookup(ENV_VERIFYING_KEY) {
            self.verifying_key = vk;
        }
        if let Some(pk) = lookup(ENV_PROVING_KEY) {
            self.proving_key = if pk.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(pk))
            };
        }
        if let Some(flag) = lookup(ENV_ENFORCE_FIELD_ORDER) {
            self.enforce_field_order = parse_flag(&flag).ok_or(ConfigError::InvalidEnv {
                var: ENV_ENFORCE_FIELD_ORDER,
                value: flag,
            })?;
        }
        Ok(self)
    }

    /// Instantiate the configured backend.
    pub fn build_backend(&self) -> Box<dyn ProvingBackend> {
        match &self.backend {
            BackendConfig::Mock { tree_depth } => Box::new(MockBackend::new(*tree_depth)),
            BackendConfig::Command { program, args } => {
                Box::new(CommandBackend::new(program.clone()).with_args(args.clone()))
            }
        }
    }
}

fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
