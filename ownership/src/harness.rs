//! # Verification Harness
//!
//! Runs one complete ownership cycle and checks it end to end:
//!
//! 1. commit to `(secret, tokenId)`,
//! 2. pass the inputs through an input document, as a holder would,
//! 3. build the witness and prove,
//! 4. pass the proof through a proof document, as a verifier would receive it,
//! 5. verify, and
//! 6. corrupt the proof several ways and require every copy to be rejected.
//!
//! Any failure in steps 1-5 is returned as an error. Tamper outcomes are
//! collected in the [`CycleReport`]; a tampered proof that verifies means
//! the verifier is broken.

use std::fmt;
use std::time::{Duration, Instant};

use ark_bn254::G1Affine;
use ark_ec::AffineRepr;
use tracing::{error, info};

use crate::config::NUM_PUBLIC_SIGNALS;
use crate::documents::{self, InputDocument, ProofDocument};
use crate::error::{OwnershipError, Result};
use crate::zkp::{
    Commitment, OwnershipProof, OwnershipProver, OwnershipVerifier, PrivateInputs, PublicInputs,
    PublicSignals,
};

// ---------------------------------------------------------------------------
// Tampering
// ---------------------------------------------------------------------------

/// Ways of corrupting a valid proof.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tamper {
    /// Replace `A` with the point at infinity.
    ZeroA,
    /// Replace `C` with the point at infinity.
    ZeroC,
    /// Replace `A` with `-A`.
    NegateA,
    /// Flip the low bit of the byte at this offset of the compressed proof
    /// (taken modulo the proof length).
    FlipByte(usize),
    /// Overwrite `pi_a[0]`, the first element of the proof document, with `"0"`.
    ZeroPiAxInDocument,
}

impl Tamper {
    /// Every strategy, with a byte flip in each of the three points.
    pub const ALL: [Tamper; 7] = [
        Tamper::ZeroA,
        Tamper::ZeroC,
        Tamper::NegateA,
        Tamper::FlipByte(0),
        Tamper::FlipByte(40),
        Tamper::FlipByte(100),
        Tamper::ZeroPiAxInDocument,
    ];
}

impl fmt::Display for Tamper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tamper::ZeroA => write!(f, "zero A"),
            Tamper::ZeroC => write!(f, "zero C"),
            Tamper::NegateA => write!(f, "negate A"),
            Tamper::FlipByte(i) => write!(f, "flip byte {}", i),
            Tamper::ZeroPiAxInDocument => write!(f, "pi_a[0] = \"0\" in document"),
        }
    }
}

/// Apply `tamper` to `proof` and ask `verifier` about the result.
///
/// Returns `true` if the corrupted proof was **accepted**. A corruption that
/// cannot even be decoded counts as rejected.
pub fn tampered_proof_accepted(
    verifier: &OwnershipVerifier,
    proof: &OwnershipProof,
    public_signals: &PublicSignals,
    tamper: Tamper,
) -> bool {
    let outcome = match tamper {
        Tamper::ZeroA => verifier.verify(
            &OwnershipProof::from_points(G1Affine::zero(), proof.b(), proof.c()),
            public_signals,
        ),
        Tamper::ZeroC => verifier.verify(
            &OwnershipProof::from_points(proof.a(), proof.b(), G1Affine::zero()),
            public_signals,
        ),
        Tamper::NegateA => verifier.verify(
            &OwnershipProof::from_points(-proof.a(), proof.b(), proof.c()),
            public_signals,
        ),
        Tamper::FlipByte(offset) => {
            let mut bytes = proof.to_bytes();
            let i = offset % bytes.len();
            bytes[i] ^= 0x01;
            OwnershipProof::from_bytes(&bytes).and_then(|p| verifier.verify(&p, public_signals))
        }
        Tamper::ZeroPiAxInDocument => {
            let mut doc = ProofDocument::from_proof(proof);
            doc.pi_a[0] = "0".into();
            documents::verify_document(verifier, &doc, public_signals)
        }
    };

    matches!(outcome, Ok(true))
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// Outcome of one tamper attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TamperOutcome {
    pub tamper: Tamper,
    pub rejected: bool,
}

/// What a cycle observed.
#[derive(Clone, Debug)]
pub struct CycleReport {
    pub commitment: Commitment,
    pub public_signals: PublicSignals,
    pub proof_bytes: usize,
    pub proof_accepted: bool,
    pub tamper_outcomes: Vec<TamperOutcome>,
    pub prove_time: Duration,
    pub verify_time: Duration,
}

impl CycleReport {
    /// The valid proof verified, exactly one signal was disclosed, and every
    /// corrupted copy was rejected.
    pub fn passed(&self) -> bool {
        self.proof_accepted
            && self.public_signals.len() == NUM_PUBLIC_SIGNALS
            && self.tamper_outcomes.iter().all(|o| o.rejected)
    }
}

/// Run the full cycle for `private` with every [`Tamper`] strategy.
pub fn run_cycle(
    prover: &OwnershipProver,
    verifier: &OwnershipVerifier,
    private: &PrivateInputs,
) -> Result<CycleReport> {
    run_cycle_with(prover, verifier, private, &Tamper::ALL)
}

/// Run the full cycle with an explicit list of tamper strategies.
pub fn run_cycle_with(
    prover: &OwnershipProver,
    verifier: &OwnershipVerifier,
    private: &PrivateInputs,
    tampers: &[Tamper],
) -> Result<CycleReport> {
    // =====================================================================
    // Step 1: Commit
    // =====================================================================
    let commitment = private.commitment(prover.commitment_params());
    let public = PublicInputs::new(commitment);

    // =====================================================================
    // Step 2: Input document
    // =====================================================================
    let input_json = serde_json::to_string(&InputDocument::new(private, &public))
        .map_err(|e| OwnershipError::Serialization(e.to_string()))?;
    let (private, public) = serde_json::from_str::<InputDocument>(&input_json)?.to_inputs();

    // =====================================================================
    // Step 3: Witness + proof
    // =====================================================================
    let started = Instant::now();
    let witness = prover.build_witness(&private, &public)?;
    let (proof, public_signals) = prover.prove(witness)?;
    let prove_time = started.elapsed();

    if public_signals.len() != NUM_PUBLIC_SIGNALS {
        return Err(OwnershipError::ProvingFailure(format!(
            "prover disclosed {} public signals",
            public_signals.len()
        )));
    }

    // =====================================================================
    // Step 4: Proof document
    // =====================================================================
    let proof_json = serde_json::to_string(&ProofDocument::from_proof(&proof))
        .map_err(|e| OwnershipError::Serialization(e.to_string()))?;
    let proof_doc: ProofDocument = serde_json::from_str(&proof_json)?;
    let signals_json = serde_json::to_string(&public_signals)
        .map_err(|e| OwnershipError::Serialization(e.to_string()))?;
    let received_signals: PublicSignals = serde_json::from_str(&signals_json)?;

    // =====================================================================
    // Step 5: Verify
    // =====================================================================
    let started = Instant::now();
    let proof_accepted = documents::verify_document(verifier, &proof_doc, &received_signals)?;
    let verify_time = started.elapsed();

    // =====================================================================
    // Step 6: Tamper
    // =====================================================================
    let tamper_outcomes: Vec<TamperOutcome> = tampers
        .iter()
        .map(|&tamper| {
            let rejected = !tampered_proof_accepted(verifier, &proof, &received_signals, tamper);
            if !rejected {
                error!(%tamper, "tampered proof was accepted");
            }
            TamperOutcome { tamper, rejected }
        })
        .collect();

    let report = CycleReport {
        commitment,
        public_signals: received_signals,
        proof_bytes: proof.size(),
        proof_accepted,
        tamper_outcomes,
        prove_time,
        verify_time,
    };

    info!(
        commitment = %report.commitment,
        proof_accepted = report.proof_accepted,
        tampers = report.tamper_outcomes.len(),
        passed = report.passed(),
        prove_ms = report.prove_time.as_millis() as u64,
        "ownership cycle complete"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn keys() -> (OwnershipProver, OwnershipVerifier) {
        OwnershipProver::setup(&mut StdRng::seed_from_u64(42)).unwrap()
    }

    #[test]
    fn concrete_cycle_passes() {
        let (prover, verifier) = keys();
        let private = PrivateInputs::parse("1234567890", "9876543210").unwrap();

        let report = run_cycle(&prover, &verifier, &private).unwrap();
        assert!(report.proof_accepted);
        assert_eq!(report.public_signals.len(), 1);
        assert_eq!(report.public_signals.commitment().unwrap(), report.commitment);
        assert_eq!(report.tamper_outcomes.len(), Tamper::ALL.len());
        assert!(report.passed(), "{:?}", report.tamper_outcomes);
    }

    #[test]
    fn every_tamper_is_rejected() {
        let (prover, verifier) = keys();
        let private = PrivateInputs::new(5u64, 6u64);
        let public = PublicInputs::new(private.commitment(prover.commitment_params()));
        let (proof, signals) = prover.prove_inputs(&private, &public).unwrap();

        for tamper in Tamper::ALL {
            assert!(
                !tampered_proof_accepted(&verifier, &proof, &signals, tamper),
                "{} must be rejected",
                tamper
            );
        }
    }

    #[test]
    fn foreign_verifier_fails_the_cycle() {
        let (prover, _) = keys();
        let (_, other) = OwnershipProver::setup(&mut StdRng::seed_from_u64(7)).unwrap();
        let private = PrivateInputs::new(5u64, 6u64);

        let report = run_cycle_with(&prover, &other, &private, &[]).unwrap();
        assert!(!report.proof_accepted);
        assert!(!report.passed());
    }

    #[test]
    fn byte_flip_offset_wraps() {
        let (prover, verifier) = keys();
        let private = PrivateInputs::new(5u64, 6u64);
        let public = PublicInputs::new(private.commitment(prover.commitment_params()));
        let (proof, signals) = prover.prove_inputs(&private, &public).unwrap();

        assert!(!tampered_proof_accepted(
            &verifier,
            &proof,
            &signals,
            Tamper::FlipByte(usize::MAX)
        ));
    }
}
