//! # Ownership R1CS Circuit
//!
//! This module defines the arithmetic circuit used inside the Groth16 SNARK.
//! The statement being proved is:
//!
//! ```text
//! "I know (secret, tokenId) such that
//!     Poseidon(secret, tokenId) = nftCommitment"
//! ```
//!
//! ## Constraint breakdown
//!
//! The Poseidon permutation is expanded gate by gate with `FpVar`
//! arithmetic, round for round the same schedule as the native
//! [`super::commitment::commit`]. Each `x^5` S-box costs three
//! multiplication constraints; ARK and MDS layers are linear and free.
//!
//! - full rounds: 8 rounds x 3 lanes x 3 constraints (the zero domain-tag
//!   lane of the first round is still a constant, so slightly fewer)
//! - partial rounds: 57 rounds x 1 lane x 3 constraints
//! - binding: 1 equality constraint between the computed digest and the
//!   public input
//!
//! Roughly 240 constraints in total. There is exactly one constraint chain
//! tying private data to public data, and it ends in the equality check.
//!
//! ## Public inputs (in order)
//!
//! | index | value |
//! |-------|-------|
//! | 0     | `nftCommitment` (Fr element) |
//!
//! `secret` and `tokenId` are private witnesses. The token identifier is
//! never exposed; a verifier learns only that *some* opening of the
//! commitment is known.

use ark_bn254::Fr;
use ark_r1cs_std::{
    alloc::AllocVar,
    eq::EqGadget,
    fields::{fp::FpVar, FieldVar},
};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};

use super::commitment::{Commitment, CommitmentParams};

// ---------------------------------------------------------------------------
// Circuit definition
// ---------------------------------------------------------------------------

/// Groth16 R1CS circuit proving knowledge of an opening of an NFT commitment.
///
/// Witness fields are `Option<_>` so the struct can be constructed with
/// `None` values during key generation, where only the constraint topology
/// matters.
#[derive(Clone)]
pub struct OwnershipCircuit {
    // -- Commitment parameters (constants baked into the circuit) ------------
    params: CommitmentParams,

    // -- Private witness ----------------------------------------------------
    /// Holder secret.
    pub secret: Option<Fr>,
    /// Token identifier.
    pub token_id: Option<Fr>,

    // -- Public input -------------------------------------------------------
    /// The commitment recorded for the NFT.
    pub commitment: Option<Fr>,
}

impl OwnershipCircuit {
    /// Construct a fully-populated circuit for witness generation.
    pub fn new(
        params: &CommitmentParams,
        secret: Fr,
        token_id: Fr,
        commitment: &Commitment,
    ) -> Self {
        Self {
            params: params.clone(),
            secret: Some(secret),
            token_id: Some(token_id),
            commitment: Some(commitment.value()),
        }
    }

    /// Construct a blank circuit for key generation. The constraint topology
    /// is identical; only the assignments are missing.
    pub fn blank(params: &CommitmentParams) -> Self {
        Self {
            params: params.clone(),
            secret: None,
            token_id: None,
            commitment: None,
        }
    }

    /// The commitment parameters this circuit was built with.
    pub fn params(&self) -> &CommitmentParams {
        &self.params
    }
}

impl std::fmt::Debug for OwnershipCircuit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Private fields are redacted; the circuit routinely ends up in logs
        // via error contexts.
        f.debug_struct("OwnershipCircuit")
            .field("secret", &self.secret.map(|_| "<redacted>"))
            .field("token_id", &self.token_id.map(|_| "<redacted>"))
            .field("commitment", &self.commitment)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Constraint synthesizer
// ---------------------------------------------------------------------------

impl ConstraintSynthesizer<Fr> for OwnershipCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // ===================================================================
        // 1. Allocate the public input
        // ===================================================================

        // Public so the verifier binds the proof to one specific on-chain
        // commitment.
        let commitment_var =
            FpVar::<Fr>::new_input(ark_relations::ns!(cs, "nft_commitment"), || {
                self.commitment.ok_or(SynthesisError::AssignmentMissing)
            })?;

        // ===================================================================
        // 2. Allocate private witnesses
        // ===================================================================

        let secret_var = FpVar::<Fr>::new_witness(ark_relations::ns!(cs, "secret"), || {
            self.secret.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let token_id_var = FpVar::<Fr>::new_witness(ark_relations::ns!(cs, "token_id"), || {
            self.token_id.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // ===================================================================
        // 3. Recompute the commitment in-circuit
        // ===================================================================

        let computed = commitment_gadget(&self.params, &secret_var, &token_id_var)?;

        // ===================================================================
        // 4. Binding: Poseidon(secret, tokenId) == nftCommitment
        // ===================================================================

        computed.enforce_equal(&commitment_var)?;

        tracing::trace!(
            constraints = cs.num_constraints(),
            witnesses = cs.num_witness_variables(),
            "ownership circuit synthesized"
        );

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// In-circuit mirror of [`super::commitment::commit`]: state
/// `[0, secret, tokenId]`, the same rounds, lane 0 out.
pub fn commitment_gadget(
    params: &CommitmentParams,
    secret: &FpVar<Fr>,
    token_id: &FpVar<Fr>,
) -> Result<FpVar<Fr>, SynthesisError> {
    let mut state = vec![FpVar::<Fr>::zero(), secret.clone(), token_id.clone()];

    for round in 0..params.num_rounds() {
        for (lane, c) in state.iter_mut().zip(params.round_constants(round)) {
            *lane += *c;
        }
        if params.is_full_round(round) {
            for lane in state.iter_mut() {
                *lane = sbox(lane)?;
            }
        } else {
            state[0] = sbox(&state[0])?;
        }
        state = params
            .mds()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&state)
                    .fold(FpVar::zero(), |acc, (m, x)| acc + x * *m)
            })
            .collect();
    }

    Ok(state.swap_remove(0))
}

/// `x^5` as two squarings and a multiplication.
fn sbox(x: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let x4 = x.square()?.square()?;
    Ok(x4 * x)
}

/// Build the vector of public inputs that the Groth16 verifier expects.
///
/// The ordering MUST match `generate_constraints`; the commitment is the
/// only `new_input` allocation.
pub fn public_inputs(commitment: &Commitment) -> Vec<Fr> {
    vec![commitment.value()]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAX_OWNERSHIP_CONSTRAINTS, NUM_PUBLIC_SIGNALS};
    use crate::zkp::commitment;
    use ark_ff::UniformRand;
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::{ConstraintSystem, SynthesisMode};
    use ark_std::rand::{rngs::StdRng, SeedableRng};

    fn synthesize(circuit: OwnershipCircuit) -> ConstraintSystemRef<Fr> {
        let cs = ConstraintSystem::<Fr>::new_ref();
        circuit.generate_constraints(cs.clone()).unwrap();
        cs
    }

    #[test]
    fn circuit_satisfiable_valid_witness() {
        let params = CommitmentParams::standard();
        let secret = Fr::from(1_234_567_890u64);
        let token_id = Fr::from(9_876_543_210u64);
        let c = commitment::commit(&params, secret, token_id);

        let cs = synthesize(OwnershipCircuit::new(&params, secret, token_id, &c));

        assert!(cs.is_satisfied().unwrap(), "valid opening must satisfy");
    }

    #[test]
    fn circuit_satisfiable_random_witness() {
        let mut rng = StdRng::seed_from_u64(42);
        let params = CommitmentParams::standard();

        for _ in 0..3 {
            let secret = Fr::rand(&mut rng);
            let token_id = Fr::rand(&mut rng);
            let c = commitment::commit(&params, secret, token_id);
            let cs = synthesize(OwnershipCircuit::new(&params, secret, token_id, &c));
            assert!(cs.is_satisfied().unwrap());
        }
    }

    #[test]
    fn circuit_unsatisfied_wrong_secret() {
        let params = CommitmentParams::standard();
        let token_id = Fr::from(7u64);
        let c = commitment::commit(&params, Fr::from(1u64), token_id);

        let cs = synthesize(OwnershipCircuit::new(&params, Fr::from(2u64), token_id, &c));

        assert!(!cs.is_satisfied().unwrap(), "wrong secret must not pass");
    }

    #[test]
    fn circuit_unsatisfied_wrong_token() {
        let params = CommitmentParams::standard();
        let secret = Fr::from(7u64);
        let c = commitment::commit(&params, secret, Fr::from(1u64));

        let cs = synthesize(OwnershipCircuit::new(&params, secret, Fr::from(2u64), &c));

        assert!(!cs.is_satisfied().unwrap(), "wrong token must not pass");
    }

    #[test]
    fn circuit_unsatisfied_wrong_commitment() {
        let params = CommitmentParams::standard();
        let secret = Fr::from(5u64);
        let token_id = Fr::from(6u64);
        let forged = Commitment::from_field(Fr::from(12345u64));

        let cs = synthesize(OwnershipCircuit::new(&params, secret, token_id, &forged));

        assert!(!cs.is_satisfied().unwrap());
        // The only constraint that can fail is the final binding.
        let failing = cs.which_is_unsatisfied().unwrap();
        assert!(failing.is_some());
    }

    #[test]
    fn gadget_matches_native_commitment() {
        let mut rng = StdRng::seed_from_u64(7);
        let params = CommitmentParams::standard();
        let secret = Fr::rand(&mut rng);
        let token_id = Fr::rand(&mut rng);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let s = FpVar::new_witness(cs.clone(), || Ok(secret)).unwrap();
        let t = FpVar::new_witness(cs.clone(), || Ok(token_id)).unwrap();
        let out = commitment_gadget(&params, &s, &t).unwrap();

        assert_eq!(
            out.value().unwrap(),
            commitment::commit(&params, secret, token_id).value()
        );
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn exactly_one_public_input() {
        let params = CommitmentParams::standard();
        let c = commitment::commit(&params, Fr::from(1u64), Fr::from(2u64));
        let cs = synthesize(OwnershipCircuit::new(&params, Fr::from(1u64), Fr::from(2u64), &c));

        // Instance variables include the constant `1` wire.
        assert_eq!(cs.num_instance_variables(), NUM_PUBLIC_SIGNALS + 1);
        assert_eq!(public_inputs(&c), vec![c.value()]);
    }

    #[test]
    fn circuit_constraint_count() {
        let params = CommitmentParams::standard();
        let c = commitment::commit(&params, Fr::from(1u64), Fr::from(2u64));
        let cs = synthesize(OwnershipCircuit::new(&params, Fr::from(1u64), Fr::from(2u64), &c));

        let n = cs.num_constraints();
        // Expected: ~240 (Poseidon width 3, 8 + 57 rounds, plus the binding).
        assert!(n > 150, "too few constraints ({}), hash not expanded?", n);
        assert!(n < MAX_OWNERSHIP_CONSTRAINTS, "too many constraints ({})", n);
    }

    #[test]
    fn blank_circuit_has_identical_topology() {
        let params = CommitmentParams::standard();
        let c = commitment::commit(&params, Fr::from(1u64), Fr::from(2u64));
        let filled = synthesize(OwnershipCircuit::new(&params, Fr::from(1u64), Fr::from(2u64), &c));

        let blank_cs = ConstraintSystem::<Fr>::new_ref();
        blank_cs.set_mode(SynthesisMode::Setup);
        OwnershipCircuit::blank(&params)
            .generate_constraints(blank_cs.clone())
            .unwrap();

        assert_eq!(blank_cs.num_constraints(), filled.num_constraints());
        assert_eq!(blank_cs.num_witness_variables(), filled.num_witness_variables());
        assert_eq!(blank_cs.num_instance_variables(), filled.num_instance_variables());
    }

    #[test]
    fn debug_output_redacts_private_inputs() {
        let params = CommitmentParams::standard();
        let secret = Fr::from(1_234_567_890u64);
        let c = commitment::commit(&params, secret, Fr::from(3u64));
        let circuit = OwnershipCircuit::new(&params, secret, Fr::from(3u64), &c);

        let rendered = format!("{:?}", circuit);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("1234567890"));
    }
}
