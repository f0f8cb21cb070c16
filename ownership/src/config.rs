//! # Configuration & Constants
//!
//! Every parameter that shapes the ownership circuit lives here. Changing any
//! of the Poseidon constants changes the commitment function, which changes
//! the circuit, which invalidates every proving and verification key ever
//! generated for it. Existing on-chain commitments stop opening, too. Treat
//! this block as frozen once commitments have been minted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Curve & Proof System
// ---------------------------------------------------------------------------

/// Pairing curve. BN254 (a.k.a. alt_bn128 / snarkjs "bn128") so proofs and
/// commitments live in the field EVM precompiles understand.
pub const ZKP_CURVE: &str = "BN254";

/// Curve label written into proof documents, matching snarkjs naming.
pub const PROOF_DOCUMENT_CURVE: &str = "bn128";

/// Proof system label written into proof documents.
pub const PROOF_SYSTEM: &str = "groth16";

/// Number of public signals exposed by the ownership circuit: the commitment
/// and nothing else.
pub const NUM_PUBLIC_SIGNALS: usize = 1;

/// Upper bound on circuit size. The Poseidon gadget lands near 250
/// constraints; anything past this means the relation grew by accident.
pub const MAX_OWNERSHIP_CONSTRAINTS: usize = 1 << 12;

// ---------------------------------------------------------------------------
// Poseidon Parameters
// ---------------------------------------------------------------------------

/// Number of hashed inputs: `secret` and `tokenId`.
pub const POSEIDON_INPUTS: usize = 2;

/// State width: one domain-tag lane (zero) plus the inputs. This is the
/// circomlib `poseidon(2)` instance, so commitments minted with circomlibjs
/// open here unchanged.
pub const POSEIDON_WIDTH: usize = POSEIDON_INPUTS + 1;

/// Full rounds (split evenly before and after the partial rounds).
pub const POSEIDON_FULL_ROUNDS: usize = 8;

/// Partial rounds for width 3 over a 254-bit field at 128-bit security.
pub const POSEIDON_PARTIAL_ROUNDS: usize = 57;

/// S-box exponent. `x^5` is a permutation of `Fr` because `gcd(5, p-1) = 1`.
pub const POSEIDON_ALPHA: u64 = 5;

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// Proving key file name inside a keys directory.
pub const PROVING_KEY_FILE: &str = "ownership.pk";

/// Verification key file name inside a keys directory.
pub const VERIFICATION_KEY_FILE: &str = "ownership.vk";

/// Default input document name.
pub const INPUT_FILE: &str = "ownership_input.json";

/// Default proof document name.
pub const PROOF_FILE: &str = "ownership_proof.json";

/// Default public-signals document name.
pub const PUBLIC_FILE: &str = "ownership_public.json";

/// Default directory for keys when none is configured.
pub const DEFAULT_KEYS_DIR: &str = "keys";

/// File layout for keys and documents rooted at one directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactLayout {
    root: PathBuf,
}

impl ArtifactLayout {
    /// Lay out artifacts under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory everything is resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn proving_key(&self) -> PathBuf {
        self.root.join(PROVING_KEY_FILE)
    }

    pub fn verification_key(&self) -> PathBuf {
        self.root.join(VERIFICATION_KEY_FILE)
    }

    pub fn input(&self) -> PathBuf {
        self.root.join(INPUT_FILE)
    }

    pub fn proof(&self) -> PathBuf {
        self.root.join(PROOF_FILE)
    }

    pub fn public_signals(&self) -> PathBuf {
        self.root.join(PUBLIC_FILE)
    }
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::new(DEFAULT_KEYS_DIR)
    }
}

// ---------------------------------------------------------------------------
// Proof Service
// ---------------------------------------------------------------------------

/// Default ceiling on a single prove call. Proving this circuit takes tens
/// of milliseconds; ten seconds means the host is in trouble.
pub const DEFAULT_PROVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default ceiling on a single verify call.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for [`crate::service::ProofService`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Maximum number of prove/verify jobs running on the blocking pool at
    /// once. Extra requests wait for a permit.
    pub max_concurrent_jobs: usize,
    /// Caller-side deadline for `prove`, in milliseconds.
    pub prove_timeout_ms: u64,
    /// Caller-side deadline for `verify`, in milliseconds.
    pub verify_timeout_ms: u64,
}

impl ServiceConfig {
    pub fn prove_timeout(&self) -> Duration {
        Duration::from_millis(self.prove_timeout_ms)
    }

    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            prove_timeout_ms: DEFAULT_PROVE_TIMEOUT.as_millis() as u64,
            verify_timeout_ms: DEFAULT_VERIFY_TIMEOUT.as_millis() as u64,
        }
    }
}
