//! # Witness Generation
//!
//! Turns concrete inputs into a full assignment of every wire in the
//! ownership circuit, or explains why no such assignment exists.
//!
//! Work is ordered cheapest-first:
//!
//! 1. Inputs arrive as typed values ([`PrivateInputs`], [`PublicInputs`]);
//!    malformed text has already been rejected at parse time.
//! 2. The commitment is recomputed natively. A mismatch is reported as
//!    [`OwnershipError::RelationUnsatisfied`] before any circuit work.
//! 3. The circuit is synthesized into a fresh constraint system and every
//!    constraint is checked. The full assignment is captured from it.
//!
//! A [`Witness`] contains the secret. It is deliberately not serializable,
//! its `Debug` output is redacted, and [`super::prover::OwnershipProver::prove`]
//! takes it by value so it is consumed by the proving step.

use ark_bn254::Fr;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem, OptimizationGoal};
use serde::{Deserialize, Serialize};

use super::circuit::{self, OwnershipCircuit};
use super::commitment::{self, Commitment, CommitmentParams};
use crate::config::NUM_PUBLIC_SIGNALS;
use crate::error::{OwnershipError, Result};
use crate::field::{self, FieldElement};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The prover's private inputs.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateInputs {
    /// Holder secret.
    pub secret: FieldElement,
    /// Token identifier.
    pub token_id: FieldElement,
}

impl PrivateInputs {
    pub fn new(secret: impl Into<FieldElement>, token_id: impl Into<FieldElement>) -> Self {
        Self {
            secret: secret.into(),
            token_id: token_id.into(),
        }
    }

    /// Parse both values leniently (out-of-range values wrap modulo `p`).
    pub fn parse(secret: &str, token_id: &str) -> Result<Self> {
        Ok(Self {
            secret: FieldElement::parse(secret)?,
            token_id: FieldElement::parse(token_id)?,
        })
    }

    /// Commitment these inputs open.
    pub fn commitment(&self, params: &CommitmentParams) -> Commitment {
        commitment::commit(params, self.secret.inner(), self.token_id.inner())
    }
}

impl std::fmt::Debug for PrivateInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateInputs")
            .field("secret", &"<redacted>")
            .field("token_id", &"<redacted>")
            .finish()
    }
}

/// The statement's public inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicInputs {
    /// The commitment recorded for the NFT.
    pub nft_commitment: Commitment,
}

impl PublicInputs {
    pub fn new(nft_commitment: Commitment) -> Self {
        Self { nft_commitment }
    }

    /// Recover the public inputs from a public-signals vector. Fails with
    /// `MalformedInput` unless there is exactly one signal.
    pub fn from_signals(signals: &PublicSignals) -> Result<Self> {
        Ok(Self {
            nft_commitment: signals.commitment()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Public signals
// ---------------------------------------------------------------------------

/// The values disclosed to the verifier, in circuit input order.
///
/// For the ownership circuit this is exactly `[nftCommitment]`. JSON form is
/// an array of canonical decimal strings, as snarkjs writes `public.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicSignals(
    #[serde(deserialize_with = "field::deserialize_canonical_vec")] Vec<FieldElement>,
);

impl PublicSignals {
    /// Public signals for a proof about `commitment`.
    pub fn for_commitment(commitment: &Commitment) -> Self {
        Self(
            circuit::public_inputs(commitment)
                .into_iter()
                .map(FieldElement::new)
                .collect(),
        )
    }

    /// Wrap raw signals. No count check happens here; verification reports a
    /// wrong count as `MalformedInput`.
    pub fn from_elements(elements: Vec<FieldElement>) -> Self {
        Self(elements)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[FieldElement] {
        &self.0
    }

    /// The signals as raw field elements, ready for the Groth16 verifier.
    pub fn to_field_elements(&self) -> Vec<Fr> {
        self.0.iter().map(FieldElement::inner).collect()
    }

    /// The single commitment signal.
    pub fn commitment(&self) -> Result<Commitment> {
        match self.0.as_slice() {
            [c] => Ok(Commitment::from_field(*c)),
            other => Err(OwnershipError::MalformedInput(format!(
                "expected {} public signal, got {}",
                NUM_PUBLIC_SIGNALS,
                other.len()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Witness
// ---------------------------------------------------------------------------

/// A complete, checked assignment of the ownership circuit.
pub struct Witness {
    circuit: OwnershipCircuit,
    public_signals: PublicSignals,
    /// Instance assignment, starting with the constant `1` wire.
    instance_assignment: Vec<Fr>,
    /// Private assignment: `secret`, `token_id`, then Poseidon internals.
    witness_assignment: Vec<Fr>,
    num_constraints: usize,
}

impl Witness {
    /// Signals this witness discloses.
    pub fn public_signals(&self) -> &PublicSignals {
        &self.public_signals
    }

    /// Number of constraints the assignment satisfies.
    pub fn num_constraints(&self) -> usize {
        self.num_constraints
    }

    /// Number of instance wires, including the constant `1`.
    pub fn num_instance_variables(&self) -> usize {
        self.instance_assignment.len()
    }

    /// Total number of wires (instance + private).
    pub fn num_variables(&self) -> usize {
        self.instance_assignment.len() + self.witness_assignment.len()
    }

    /// Instance assignment: `[1, nftCommitment]`.
    pub fn instance_assignment(&self) -> &[Fr] {
        &self.instance_assignment
    }

    /// Private assignment. Contains the secret; keep it in-process.
    #[cfg(test)]
    pub(crate) fn witness_assignment(&self) -> &[Fr] {
        &self.witness_assignment
    }

    /// Commitment parameters the witness was built under.
    pub(crate) fn params(&self) -> &CommitmentParams {
        self.circuit.params()
    }

    /// Release the populated circuit for proving.
    pub(crate) fn into_circuit(self) -> OwnershipCircuit {
        self.circuit
    }
}

impl std::fmt::Debug for Witness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Witness")
            .field("public_signals", &self.public_signals)
            .field("num_constraints", &self.num_constraints)
            .field("num_variables", &self.num_variables())
            .field("witness_assignment", &"<redacted>")
            .finish()
    }
}

/// Build the witness for `(private, public)` under `params`.
///
/// # Errors
///
/// - [`OwnershipError::RelationUnsatisfied`] if the private inputs do not
///   open `public.nft_commitment`. No partial witness is returned.
/// - [`OwnershipError::ProvingFailure`] if synthesis itself breaks, or the
///   circuit disagrees with the native commitment (a bug, not bad input).
pub fn build_witness(
    params: &CommitmentParams,
    private: &PrivateInputs,
    public: &PublicInputs,
) -> Result<Witness> {
    let secret = private.secret.inner();
    let token_id = private.token_id.inner();

    // Fail fast on the native side before paying for synthesis.
    let expected = commitment::commit(params, secret, token_id);
    if expected != public.nft_commitment {
        tracing::debug!(
            commitment = %public.nft_commitment,
            "inputs do not open the declared commitment"
        );
        return Err(OwnershipError::RelationUnsatisfied(
            "Poseidon(secret, tokenId) does not match nftCommitment".to_string(),
        ));
    }

    let circuit = OwnershipCircuit::new(params, secret, token_id, &public.nft_commitment);

    let cs = ConstraintSystem::<Fr>::new_ref();
    cs.set_optimization_goal(OptimizationGoal::Constraints);
    circuit
        .clone()
        .generate_constraints(cs.clone())
        .map_err(|e| OwnershipError::ProvingFailure(format!("circuit synthesis failed: {}", e)))?;

    let unsatisfied = cs
        .which_is_unsatisfied()
        .map_err(|e| OwnershipError::ProvingFailure(format!("constraint check failed: {}", e)))?;
    if let Some(name) = unsatisfied {
        return Err(OwnershipError::ProvingFailure(format!(
            "circuit rejects a natively valid opening at constraint '{}'",
            name
        )));
    }

    let num_constraints = cs.num_constraints();
    let (instance_assignment, witness_assignment) = {
        let inner = cs.borrow().ok_or_else(|| {
            OwnershipError::ProvingFailure("constraint system was released early".to_string())
        })?;
        (
            inner.instance_assignment.clone(),
            inner.witness_assignment.clone(),
        )
    };

    tracing::debug!(
        num_constraints,
        num_variables = instance_assignment.len() + witness_assignment.len(),
        "witness built"
    );

    Ok(Witness {
        circuit,
        public_signals: PublicSignals::for_commitment(&public.nft_commitment),
        instance_assignment,
        witness_assignment,
        num_constraints,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
