//! # Error Types — Protocol Error Taxonomy
//!
//! Defines the error types surfaced by the spend protocol. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Every failure class is a distinct variant. Callers match on the variant,
//!   never on the message text.
//! - None of these are retried by the protocol layer. Each one is either a
//!   caller/configuration mistake or a cryptographically meaningful rejection.
//! - A proof that fails verification is NOT an error: `verify` returns
//!   `Ok(false)`. Errors are reserved for malformed requests.

use thiserror::Error;

/// Top-level error type for the spend protocol.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Key material is missing or invalid at setup time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The caller passed a value of the wrong kind.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the contract requires at this position.
        expected: &'static str,
        /// A short description of what was supplied.
        found: String,
    },

    /// Address bits (or the Merkle path) have the wrong length or alphabet.
    #[error("format error: {0}")]
    Format(String),

    /// No proving key was supplied per call and no default is configured.
    #[error("no proving key available: pass one explicitly or configure a default")]
    MissingKey,

    /// The backend declined or failed to produce a proof.
    #[error("proving failed: {0}")]
    Proving(String),

    /// The backend reported a tree depth outside the supported range.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// An input lies outside the scalar field while field-order
    /// enforcement is enabled.
    #[error("{input} is not a canonical scalar field element: {value}")]
    FieldRange {
        /// Name of the offending input (`root`, `exthash`, ...).
        input: &'static str,
        /// The rejected value, in decimal.
        value: String,
    },

    /// The backend could not be reached or returned an unusable response.
    #[error("backend error: {0}")]
    Backend(String),
}

impl ProtocolError {
    /// Shorthand for a [`ProtocolError::TypeMismatch`].
    pub fn type_mismatch(expected: &'static str, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.into(),
        }
    }
}

/// Error in the decimal/hex text codec for field elements.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The text is empty.
    #[error("empty integer text")]
    Empty,

    /// The text contains a character outside the accepted alphabet.
    #[error("invalid digit {digit:?} at offset {offset} in {text:?}")]
    InvalidDigit {
        /// The full input text.
        text: String,
        /// The offending character.
        digit: char,
        /// Byte offset of the offending character.
        offset: usize,
    },
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Field elements are decimal strings or integers.
    #[error("float values are not permitted in canonical representations; encode field elements as decimal strings: {0}")]
    FloatRejected(String),

    /// A string or key contains the character reserved for integer splicing.
    #[error("strings may not contain U+E000: {0:?}")]
    ReservedCharacter(String),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

impl From<CanonicalizationError> for ProtocolError {
    fn from(err: CanonicalizationError) -> Self {
        ProtocolError::Format(err.to_string())
    }
}
