//! Error types for the ownership proof pipeline.
//!
//! Every fallible operation in this crate returns an [`OwnershipError`].
//! The variants separate caller mistakes (`MalformedInput`), statements that
//! are simply false (`RelationUnsatisfied`), engine faults (`ProvingFailure`,
//! `Setup`) and the first-class "proof rejected" outcome
//! (`VerificationFailed`), so callers can tell a bad proof from a
//! misconfigured verifier.

use thiserror::Error;

/// Convenience alias used throughout the crate. The error parameter is
/// overridable so derives that spell out `Result<T, SerializationError>`
/// still resolve when this alias is in scope.
pub type Result<T, E = OwnershipError> = std::result::Result<T, E>;

/// Errors that can occur while committing, proving, or verifying ownership.
#[derive(Debug, Error)]
pub enum OwnershipError {
    /// An input is not a well-formed field element, a public signal is out of
    /// canonical range, or a document has the wrong shape.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The private inputs do not open the declared commitment, so no witness
    /// exists.
    #[error("witness generation failed: relation unsatisfied ({0})")]
    RelationUnsatisfied(String),

    /// The proof engine failed internally (e.g. proving key does not match
    /// the circuit).
    #[error("proving failed: {0}")]
    ProvingFailure(String),

    /// The proof was checked and rejected.
    #[error("verification failed: {0}")]
    VerificationFailed(String),

    /// A key does not belong to this circuit (wrong public-input count,
    /// different commitment parameters, or a foreign key file).
    #[error("key mismatch: {0}")]
    KeyMismatch(String),

    /// Circuit-specific key generation failed.
    #[error("setup failed: {0}")]
    Setup(String),

    /// Canonical (de)serialization of keys or proofs failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Reading or writing an artifact file failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// The file being accessed.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A service job exceeded its deadline. The job itself may still run to
    /// completion on the blocking pool; only the caller gave up.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        /// `"prove"` or `"verify"`.
        operation: &'static str,
        /// The deadline that elapsed.
        timeout_ms: u64,
    },

    /// A blocking job was cancelled or panicked before producing a result.
    #[error("job cancelled: {0}")]
    Cancelled(String),
}

impl OwnershipError {
    /// Wrap an `std::io::Error` with the path that produced it.
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Short, stable label for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OwnershipError::MalformedInput(_) => "malformed_input",
            OwnershipError::RelationUnsatisfied(_) => "relation_unsatisfied",
            OwnershipError::ProvingFailure(_) => "proving_failure",
            OwnershipError::VerificationFailed(_) => "verification_failed",
            OwnershipError::KeyMismatch(_) => "key_mismatch",
            OwnershipError::Setup(_) => "setup",
            OwnershipError::Serialization(_) => "serialization",
            OwnershipError::Io { .. } => "io",
            OwnershipError::Timeout { .. } => "timeout",
            OwnershipError::Cancelled(_) => "cancelled",
        }
    }

    /// `true` for errors that are detected before any proving work starts.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            OwnershipError::MalformedInput(_) | OwnershipError::RelationUnsatisfied(_)
        )
    }
}

impl From<ark_serialize::SerializationError> for OwnershipError {
    fn from(e: ark_serialize::SerializationError) -> Self {
        OwnershipError::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for OwnershipError {
    fn from(e: serde_json::Error) -> Self {
        OwnershipError::MalformedInput(format!("invalid JSON document: {}", e))
    }
}
