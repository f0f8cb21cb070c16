//! # Zero-Knowledge Ownership Proofs
//!
//! Implements the proof-of-ownership subsystem using Groth16 over the BN254
//! curve. The core primitive is an opening proof: given a Poseidon commitment
//! `C = Poseidon(secret, tokenId)`, the holder demonstrates knowledge of
//! `(secret, tokenId)` that hashes to `C`, without revealing either value.
//! The verifier sees only `C`.
//!
//! ## Architecture
//!
//! ```text
//! commitment.rs  Poseidon commitment (params, commit, verify)
//! circuit.rs  R1CS circuit (OwnershipCircuit, commitment gadget)
//! witness.rs  inputs, public signals, witness generation
//! prover.rs  Groth16 proof generation (OwnershipProver, OwnershipProof)
//! verifier.rs  Groth16 proof verification (OwnershipVerifier)
//! keys.rs  key files on disk (KeyArtifacts)
//! ```
//!
//! ## Security Model
//!
//! - **Hiding**: the commitment reveals nothing useful about the secret as
//!   long as the secret has enough entropy; the proof is zero-knowledge.
//! - **Binding**: opening a commitment two ways means a Poseidon collision.
//! - **Soundness**: Groth16 knowledge-soundness in the generic group model.
//! - **Public surface**: exactly one public signal, the commitment. The
//!   token identifier never leaves the prover.
//!
//! Proofs are not bound to a verifier, session or nonce; a proof can be
//! replayed by anyone who obtains it.
//!
//! The trusted setup is per-circuit. In production, replace the local
//! ceremony with an MPC-generated SRS (see `prover::OwnershipProver::setup`).

pub mod circuit;
pub mod commitment;
pub mod keys;
pub mod prover;
pub mod verifier;
pub mod witness;

// Re-export the public API so callers can do `use nft_ownership::zkp::*`.
pub use circuit::OwnershipCircuit;
pub use commitment::{Commitment, CommitmentParams};
pub use keys::KeyArtifacts;
pub use prover::{OwnershipProof, OwnershipProver};
pub use verifier::OwnershipVerifier;
pub use witness::{build_witness, PrivateInputs, PublicInputs, PublicSignals, Witness};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OwnershipError;
    use crate::field::FieldElement;
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    /// End-to-end: setup -> commit -> witness -> prove -> verify.
    #[test]
    fn end_to_end_ownership_proof() {
        let mut rng = StdRng::seed_from_u64(42);

        // 1. Trusted setup
        let (prover, verifier) = OwnershipProver::setup(&mut rng).unwrap();
        let params = prover.commitment_params();

        // 2. Mint: the holder's secret and the token are committed
        let private = PrivateInputs::parse("1234567890", "9876543210").unwrap();
        let comm = private.commitment(params);

        // 3. Witness for "I can open comm"
        let public = PublicInputs::new(comm);
        let witness = build_witness(params, &private, &public).expect("witness");

        // 4. Generate proof
        let (proof, signals) = prover.prove(witness).expect("proof generation must succeed");
        assert_eq!(signals.len(), 1);
        assert_eq!(signals.commitment().unwrap(), comm);

        // 5. Verify
        let ok = verifier.verify(&proof, &signals).expect("verification must not error");
        assert!(ok, "valid proof must verify");
    }

    /// The public signals never include the token identifier.
    #[test]
    fn token_id_is_not_disclosed() {
        let mut rng = StdRng::seed_from_u64(42);
        let (prover, _verifier) = OwnershipProver::setup(&mut rng).unwrap();

        let private = PrivateInputs::new(77u64, 9_876_543_210u64);
        let public = PublicInputs::new(private.commitment(prover.commitment_params()));
        let (_, signals) = prover.prove_inputs(&private, &public).unwrap();

        assert_eq!(signals.as_slice(), &[public.nft_commitment.as_field()]);
        assert!(!signals.as_slice().contains(&FieldElement::from(9_876_543_210u64)));
    }

    /// A wrong secret fails at witness generation and yields no proof.
    #[test]
    fn wrong_secret_yields_no_proof() {
        let mut rng = StdRng::seed_from_u64(42);
        let (prover, _verifier) = OwnershipProver::setup(&mut rng).unwrap();
        let params = prover.commitment_params();

        let comm = PrivateInputs::new(1u64, 2u64).commitment(params);
        let forged = PrivateInputs::new(999u64, 2u64);

        let err = prover
            .prove_inputs(&forged, &PublicInputs::new(comm))
            .unwrap_err();
        assert!(matches!(err, OwnershipError::RelationUnsatisfied(_)));
    }

    /// Proof serialization round-trip.
    #[test]
    fn proof_serialization_round_trip() {
        let mut rng = StdRng::seed_from_u64(42);
        let (prover, verifier) = OwnershipProver::setup(&mut rng).unwrap();

        let private = PrivateInputs::new(500u64, 100u64);
        let public = PublicInputs::new(private.commitment(prover.commitment_params()));
        let (proof, signals) = prover.prove_inputs(&private, &public).expect("proof generation");

        let bytes = proof.to_bytes();
        let restored = OwnershipProof::from_bytes(&bytes).expect("deserialization");

        let ok = verifier.verify(&restored, &signals).expect("verification");
        assert!(ok, "deserialized proof must still verify");
    }
}
