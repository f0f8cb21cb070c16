//! # Groth16 Proof Generation
//!
//! This module wraps `ark-groth16` to provide a high-level API for generating
//! ownership proofs. The workflow is:
//!
//! 1. **Setup**: Run `OwnershipProver::setup(rng)` once per circuit shape.
//!    This produces a proving key and a verification key (returned as
//!    [`OwnershipVerifier`]). In production, replace this with an MPC
//!    ceremony.
//!
//! 2. **Witness**: Build a [`Witness`] from the private and public inputs
//!    (see [`super::witness::build_witness`]). This is where a wrong secret
//!    is caught.
//!
//! 3. **Prove**: Call `OwnershipProver::prove(witness)`. The witness is
//!    consumed; the result is an [`OwnershipProof`] plus the public signals
//!    `[nftCommitment]`.
//!
//! The resulting proof is a compact (~128 bytes compressed) value that can
//! be handed to any holder of the matching verification key.

use std::time::Instant;

use ark_bn254::{Bn254, G1Affine, G2Affine};
use ark_groth16::{Groth16, Proof, ProvingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, Rng};
use tracing::{debug, info};

use super::circuit::OwnershipCircuit;
use super::commitment::CommitmentParams;
use super::verifier::OwnershipVerifier;
use super::witness::{self, PrivateInputs, PublicInputs, PublicSignals, Witness};
use crate::error::{OwnershipError, Result};

// ---------------------------------------------------------------------------
// OwnershipProver
// ---------------------------------------------------------------------------

/// Holds the Groth16 proving key for the ownership circuit.
///
/// Instances are created via [`OwnershipProver::setup`] or loaded from disk
/// (see [`super::keys`]) and are immutable afterwards, so one prover can be
/// shared across threads behind an `Arc`.
pub struct OwnershipProver {
    pk: ProvingKey<Bn254>,
    /// The Poseidon parameters used during setup. Round constants are baked
    /// into the circuit, so the proving key is only valid for this set.
    params: CommitmentParams,
}

impl OwnershipProver {
    /// Run the Groth16 trusted setup for the ownership circuit with the
    /// standard commitment parameters.
    ///
    /// Returns both halves. The verifier is distributed to whoever checks
    /// proofs; the prover stays with the holder.
    pub fn setup<R: Rng + CryptoRng>(rng: &mut R) -> Result<(Self, OwnershipVerifier)> {
        Self::setup_with_params(CommitmentParams::standard(), rng)
    }

    /// Run the trusted setup for an explicit parameter set.
    pub fn setup_with_params<R: Rng + CryptoRng>(
        params: CommitmentParams,
        rng: &mut R,
    ) -> Result<(Self, OwnershipVerifier)> {
        let blank_circuit = OwnershipCircuit::blank(&params);

        let started = Instant::now();
        let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(blank_circuit, rng)
            .map_err(|e| OwnershipError::Setup(e.to_string()))?;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            num_public_inputs = vk.gamma_abc_g1.len() - 1,
            "ownership circuit setup complete"
        );

        let verifier = OwnershipVerifier::from_vk(vk)?;
        Ok((Self { pk, params }, verifier))
    }

    /// Reassemble a prover from a stored proving key.
    pub(crate) fn from_parts(pk: ProvingKey<Bn254>, params: CommitmentParams) -> Self {
        Self { pk, params }
    }

    /// Return a reference to the commitment parameters embedded in this prover.
    pub fn commitment_params(&self) -> &CommitmentParams {
        &self.params
    }

    pub(crate) fn proving_key(&self) -> &ProvingKey<Bn254> {
        &self.pk
    }

    /// The verifier half of this prover's key pair.
    pub fn verifier(&self) -> Result<OwnershipVerifier> {
        OwnershipVerifier::from_vk(self.pk.vk.clone())
    }

    /// Build a witness under this prover's parameters.
    pub fn build_witness(&self, private: &PrivateInputs, public: &PublicInputs) -> Result<Witness> {
        witness::build_witness(&self.params, private, public)
    }

    /// Generate a Groth16 proof from a checked witness.
    ///
    /// # Errors
    ///
    /// Returns [`OwnershipError::ProvingFailure`] if the witness does not
    /// match the proving key (different circuit shape or commitment
    /// parameters). An unsatisfied relation never gets this far; it is
    /// rejected while building the witness.
    pub fn prove(&self, witness: Witness) -> Result<(OwnershipProof, PublicSignals)> {
        let mut rng = rand::thread_rng();
        self.prove_with_rng(witness, &mut rng)
    }

    /// [`prove`](Self::prove) with caller-supplied randomness.
    pub fn prove_with_rng<R: Rng + CryptoRng>(
        &self,
        witness: Witness,
        rng: &mut R,
    ) -> Result<(OwnershipProof, PublicSignals)> {
        self.check_key_shape(&witness)?;

        let public_signals = witness.public_signals().clone();
        let num_constraints = witness.num_constraints();
        let circuit = witness.into_circuit();

        let started = Instant::now();
        let proof = Groth16::<Bn254>::prove(&self.pk, circuit, rng)
            .map_err(|e| OwnershipError::ProvingFailure(e.to_string()))?;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            num_constraints,
            "ownership proof generated"
        );

        Ok((OwnershipProof { inner: proof }, public_signals))
    }

    /// Witness generation and proving in one call.
    pub fn prove_inputs(
        &self,
        private: &PrivateInputs,
        public: &PublicInputs,
    ) -> Result<(OwnershipProof, PublicSignals)> {
        let witness = self.build_witness(private, public)?;
        self.prove(witness)
    }

    /// Refuse witnesses whose wire layout the proving key was not made for.
    /// ark-groth16 indexes the key by variable, so a mismatch would otherwise
    /// panic or produce garbage.
    fn check_key_shape(&self, witness: &Witness) -> Result<()> {
        if witness.params().fingerprint() != self.params.fingerprint() {
            return Err(OwnershipError::ProvingFailure(
                "witness was built under different commitment parameters".into(),
            ));
        }

        let expected_instance = self.pk.vk.gamma_abc_g1.len();
        if expected_instance != witness.num_instance_variables() {
            return Err(OwnershipError::ProvingFailure(format!(
                "proving key expects {} instance variables, witness has {}",
                expected_instance,
                witness.num_instance_variables()
            )));
        }

        let expected_vars = self.pk.a_query.len();
        if expected_vars != witness.num_variables() {
            return Err(OwnershipError::ProvingFailure(format!(
                "proving key expects {} variables, witness has {}",
                expected_vars,
                witness.num_variables()
            )));
        }

        debug!(num_variables = expected_vars, "witness matches proving key");
        Ok(())
    }
}

impl std::fmt::Debug for OwnershipProver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The proving key is large and useless in logs; identify it instead.
        f.debug_struct("OwnershipProver")
            .field("params", &hex::encode(self.params.fingerprint()))
            .field("num_variables", &self.pk.a_query.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// OwnershipProof
// ---------------------------------------------------------------------------

/// A Groth16 proof of NFT ownership: three curve points `(A, B, C)`.
///
/// The proof alone reveals nothing about the secret or the token. It is only
/// meaningful together with its public signals and the verification key.
#[derive(Clone, Debug, PartialEq, CanonicalSerialize, CanonicalDeserialize)]
pub struct OwnershipProof {
    inner: Proof<Bn254>,
}

impl OwnershipProof {
    /// Assemble a proof from its points. Nothing is checked here; a bogus
    /// triple simply fails verification.
    pub fn from_points(a: G1Affine, b: G2Affine, c: G1Affine) -> Self {
        Self {
            inner: Proof { a, b, c },
        }
    }

    pub fn a(&self) -> G1Affine {
        self.inner.a
    }

    pub fn b(&self) -> G2Affine {
        self.inner.b
    }

    pub fn c(&self) -> G1Affine {
        self.inner.c
    }

    /// Raw compressed proof bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_compressed(&mut buf)
            .expect("proof serialization must not fail");
        buf
    }

    /// Reconstruct a proof from compressed bytes.
    ///
    /// Bytes that do not decode to valid group elements are
    /// [`OwnershipError::MalformedInput`].
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::deserialize_compressed(data)
            .map_err(|e| OwnershipError::MalformedInput(format!("invalid proof bytes: {}", e)))
    }

    /// Size of the compressed proof in bytes.
    pub fn size(&self) -> usize {
        self.compressed_size()
    }

    pub(crate) fn as_ark(&self) -> &Proof<Bn254> {
        &self.inner
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zkp::commitment;
    use ark_bn254::Fr;
    use ark_ec::AffineRepr;
    use ark_ff::UniformRand;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use light_poseidon::parameters::bn254_x5;

    fn setup() -> (OwnershipProver, OwnershipVerifier) {
        let mut rng = StdRng::seed_from_u64(42);
        OwnershipProver::setup(&mut rng).unwrap()
    }

    fn inputs(rng: &mut StdRng, prover: &OwnershipProver) -> (PrivateInputs, PublicInputs) {
        let private = PrivateInputs::new(Fr::rand(rng), Fr::rand(rng));
        let public = PublicInputs::new(private.commitment(prover.commitment_params()));
        (private, public)
    }

    #[test]
    fn prove_valid_ownership() {
        let (prover, _verifier) = setup();
        let mut rng = StdRng::seed_from_u64(7);
        let (private, public) = inputs(&mut rng, &prover);

        let witness = prover.build_witness(&private, &public).unwrap();
        let (proof, signals) = prover.prove(witness).unwrap();

        // Groth16 proofs on BN254 are 128 bytes compressed.
        assert_eq!(proof.size(), 128);
        assert_eq!(signals, PublicSignals::for_commitment(&public.nft_commitment));
        assert!(!proof.a().is_zero());
    }

    #[test]
    fn debug_identifies_key_without_dumping_it() {
        let (prover, _verifier) = setup();
        let rendered = format!("{:?}", prover);

        assert!(rendered.starts_with("OwnershipProver"));
        assert!(rendered.contains(&hex::encode(prover.commitment_params().fingerprint())));
        assert!(rendered.len() < 512, "proving key leaked into Debug output");
    }

    #[test]
    fn wrong_secret_is_caught_before_proving() {
        let (prover, _verifier) = setup();
        let mut rng = StdRng::seed_from_u64(7);
        let (private, public) = inputs(&mut rng, &prover);

        let forged = PrivateInputs::new(private.secret.inner() + Fr::from(1u64), private.token_id);
        let err = prover.prove_inputs(&forged, &public).unwrap_err();
        assert!(matches!(err, OwnershipError::RelationUnsatisfied(_)));
    }

    #[test]
    fn proofs_are_randomized() {
        let (prover, _verifier) = setup();
        let mut rng = StdRng::seed_from_u64(7);
        let (private, public) = inputs(&mut rng, &prover);

        let (p1, _) = prover.prove_inputs(&private, &public).unwrap();
        let (p2, _) = prover.prove_inputs(&private, &public).unwrap();
        assert_ne!(p1, p2, "fresh randomness must give a fresh proof");
    }

    #[test]
    fn seeded_proving_is_reproducible() {
        let (prover, _verifier) = setup();
        let mut rng = StdRng::seed_from_u64(7);
        let (private, public) = inputs(&mut rng, &prover);

        let w1 = prover.build_witness(&private, &public).unwrap();
        let w2 = prover.build_witness(&private, &public).unwrap();
        let (p1, _) = prover
            .prove_with_rng(w1, &mut StdRng::seed_from_u64(1))
            .unwrap();
        let (p2, _) = prover
            .prove_with_rng(w2, &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(p1, p2);
    }

    #[test]
    fn witness_from_other_params_is_a_proving_failure() {
        let (prover, _verifier) = setup();
        // Different round constants, same circuit shape.
        let mut raw = bn254_x5::get_poseidon_parameters::<Fr>(3).unwrap();
        raw.ark[0] += Fr::from(1u64);
        let params = CommitmentParams::from_parameters(raw).unwrap();

        let private = PrivateInputs::new(3u64, 5u64);
        let public = PublicInputs::new(private.commitment(&params));
        let witness = witness::build_witness(&params, &private, &public).unwrap();

        let err = prover.prove(witness).unwrap_err();
        assert!(matches!(err, OwnershipError::ProvingFailure(_)));
    }

    #[test]
    fn proof_bytes_round_trip() {
        let (prover, _verifier) = setup();
        let params = prover.commitment_params();
        let c = commitment::commit(params, Fr::from(500u64), Fr::from(100u64));
        let private = PrivateInputs::new(500u64, 100u64);

        let (proof, _) = prover
            .prove_inputs(&private, &PublicInputs::new(c))
            .unwrap();
        let bytes = proof.to_bytes();
        let restored = OwnershipProof::from_bytes(&bytes).unwrap();

        assert_eq!(proof, restored);
    }

    #[test]
    fn truncated_proof_bytes_are_malformed() {
        let err = OwnershipProof::from_bytes(&[0u8; 17]).unwrap_err();
        assert!(matches!(err, OwnershipError::MalformedInput(_)));
    }
}
