//! # Groth16 Proof Verification
//!
//! The verifier side of the ownership proof. Anyone holding the
//! [`OwnershipVerifier`] (i.e., the Groth16 verification key) can check that
//! a proof attests to knowledge of an opening of a given commitment.
//!
//! Groth16 verification is three pairings plus a one-term multi-scalar
//! multiplication, so it runs in constant time regardless of circuit size.
//!
//! Outcomes are three-way:
//!
//! - `Ok(true)`: the proof is valid for these public signals.
//! - `Ok(false)`: the proof was checked and rejected. This is the normal
//!   answer for a forged or corrupted proof, not an error.
//! - `Err(_)`: the question could not be asked (wrong number of public
//!   signals, key for a different circuit).

use std::time::Instant;

use ark_bn254::Bn254;
use ark_groth16::{Groth16, PreparedVerifyingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use tracing::{debug, warn};

use super::commitment::Commitment;
use super::prover::OwnershipProof;
use super::witness::PublicSignals;
use crate::config::NUM_PUBLIC_SIGNALS;
use crate::error::{OwnershipError, Result};

// ---------------------------------------------------------------------------
// OwnershipVerifier
// ---------------------------------------------------------------------------

/// Holds the Groth16 verification key for the ownership circuit.
///
/// Small (well under 1 KB) and freely distributable. The pairing-friendly
/// form of the key is prepared once at construction.
#[derive(Clone)]
pub struct OwnershipVerifier {
    vk: VerifyingKey<Bn254>,
    pvk: PreparedVerifyingKey<Bn254>,
}

impl OwnershipVerifier {
    /// Construct from an arkworks verification key.
    ///
    /// Fails with [`OwnershipError::KeyMismatch`] if the key was not made
    /// for a circuit with exactly one public input.
    pub fn from_vk(vk: VerifyingKey<Bn254>) -> Result<Self> {
        let public_inputs = vk.gamma_abc_g1.len().saturating_sub(1);
        if public_inputs != NUM_PUBLIC_SIGNALS {
            return Err(OwnershipError::KeyMismatch(format!(
                "verification key has {} public inputs, ownership circuit has {}",
                public_inputs, NUM_PUBLIC_SIGNALS
            )));
        }

        let pvk = Groth16::<Bn254>::process_vk(&vk)
            .map_err(|e| OwnershipError::Setup(e.to_string()))?;
        Ok(Self { vk, pvk })
    }

    /// Verify an ownership proof against its public signals.
    ///
    /// # Errors
    ///
    /// [`OwnershipError::MalformedInput`] unless there is exactly one public
    /// signal. A rejected proof is `Ok(false)`, never an error.
    pub fn verify(&self, proof: &OwnershipProof, public_signals: &PublicSignals) -> Result<bool> {
        if public_signals.len() != NUM_PUBLIC_SIGNALS {
            return Err(OwnershipError::MalformedInput(format!(
                "expected {} public signal, got {}",
                NUM_PUBLIC_SIGNALS,
                public_signals.len()
            )));
        }

        let inputs = public_signals.to_field_elements();

        let started = Instant::now();
        let valid = Groth16::<Bn254>::verify_with_processed_vk(&self.pvk, &inputs, proof.as_ark())
            .map_err(|e| OwnershipError::KeyMismatch(e.to_string()))?;
        let elapsed_us = started.elapsed().as_micros() as u64;

        if valid {
            debug!(elapsed_us, "ownership proof verified");
        } else {
            warn!(elapsed_us, "ownership proof rejected");
        }

        Ok(valid)
    }

    /// Verify a proof about `commitment` directly.
    pub fn verify_commitment(&self, proof: &OwnershipProof, commitment: &Commitment) -> Result<bool> {
        self.verify(proof, &PublicSignals::for_commitment(commitment))
    }

    /// Like [`verify`](Self::verify), but a rejected proof becomes
    /// [`OwnershipError::VerificationFailed`].
    pub fn verify_strict(&self, proof: &OwnershipProof, public_signals: &PublicSignals) -> Result<()> {
        if self.verify(proof, public_signals)? {
            Ok(())
        } else {
            Err(OwnershipError::VerificationFailed(
                "proof does not verify against the public signals".into(),
            ))
        }
    }

    /// BLAKE3 fingerprint of the compressed verification key, hex encoded.
    ///
    /// Two parties holding the same fingerprint accept exactly the same
    /// proofs.
    pub fn fingerprint(&self) -> String {
        hex::encode(blake3::hash(&self.vk_to_bytes()).as_bytes())
    }

    /// Serialize the verification key to bytes (for persistent storage or
    /// distribution).
    pub fn vk_to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.vk
            .serialize_compressed(&mut buf)
            .expect("VK serialization must not fail");
        buf
    }

    /// Deserialize a verification key from bytes.
    pub fn vk_from_bytes(data: &[u8]) -> Result<Self> {
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(data)?;
        Self::from_vk(vk)
    }
}

impl std::fmt::Debug for OwnershipVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnershipVerifier")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldElement;
    use crate::zkp::prover::OwnershipProver;
    use crate::zkp::witness::{PrivateInputs, PublicInputs};
    use ark_bn254::{Fr, G1Affine};
    use ark_ec::AffineRepr;
    use ark_ff::UniformRand;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn proved() -> (OwnershipVerifier, OwnershipProof, PublicSignals) {
        let mut rng = StdRng::seed_from_u64(42);
        let (prover, verifier) = OwnershipProver::setup(&mut rng).unwrap();

        let private = PrivateInputs::new(Fr::rand(&mut rng), Fr::rand(&mut rng));
        let public = PublicInputs::new(private.commitment(prover.commitment_params()));
        let (proof, signals) = prover.prove_inputs(&private, &public).unwrap();
        (verifier, proof, signals)
    }

    #[test]
    fn verify_valid_proof() {
        let (verifier, proof, signals) = proved();
        assert!(verifier.verify(&proof, &signals).unwrap(), "valid proof must verify");
        verifier.verify_strict(&proof, &signals).unwrap();
    }

    #[test]
    fn reject_wrong_commitment() {
        let (verifier, proof, signals) = proved();
        let shifted = signals.as_slice()[0].inner() + Fr::from(1u64);
        let other = PublicSignals::from_elements(vec![FieldElement::new(shifted)]);

        assert!(!verifier.verify(&proof, &other).unwrap());
        let err = verifier.verify_strict(&proof, &other).unwrap_err();
        assert!(matches!(err, OwnershipError::VerificationFailed(_)));
    }

    #[test]
    fn wrong_signal_count_is_malformed() {
        let (verifier, proof, signals) = proved();

        let empty = PublicSignals::from_elements(vec![]);
        assert!(matches!(
            verifier.verify(&proof, &empty).unwrap_err(),
            OwnershipError::MalformedInput(_)
        ));

        let mut two = signals.as_slice().to_vec();
        two.push(FieldElement::from(0u64));
        let two = PublicSignals::from_elements(two);
        assert!(matches!(
            verifier.verify(&proof, &two).unwrap_err(),
            OwnershipError::MalformedInput(_)
        ));
    }

    #[test]
    fn reject_zeroed_point() {
        let (verifier, proof, signals) = proved();
        let forged = OwnershipProof::from_points(G1Affine::zero(), proof.b(), proof.c());
        assert!(!verifier.verify(&forged, &signals).unwrap());
    }

    #[test]
    fn reject_proof_from_another_setup() {
        let (_, proof, signals) = proved();
        let (_, other_verifier) = OwnershipProver::setup(&mut StdRng::seed_from_u64(1)).unwrap();
        assert!(!other_verifier.verify(&proof, &signals).unwrap());
    }

    #[test]
    fn vk_serialization_round_trip() {
        let (verifier, proof, signals) = proved();

        let bytes = verifier.vk_to_bytes();
        let restored = OwnershipVerifier::vk_from_bytes(&bytes).unwrap();

        assert_eq!(restored.fingerprint(), verifier.fingerprint());
        assert!(restored.verify(&proof, &signals).unwrap(), "restored VK must verify valid proofs");
    }

    #[test]
    fn fingerprint_differs_between_setups() {
        let (_, a) = OwnershipProver::setup(&mut StdRng::seed_from_u64(1)).unwrap();
        let (_, b) = OwnershipProver::setup(&mut StdRng::seed_from_u64(2)).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }
}
