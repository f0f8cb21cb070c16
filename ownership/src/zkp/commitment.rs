//! # Poseidon NFT Commitment over BN254
//!
//! An NFT commitment binds a holder's secret to a token identifier:
//!
//! ```text
//! C = Poseidon(secret, tokenId)        (in Fr, width 3)
//! ```
//!
//! The commitment is recorded at mint time. Later, the holder proves
//! knowledge of an opening `(secret, tokenId)` without revealing either
//! value. Because the same function is evaluated off-circuit (here) and
//! in-circuit (see [`super::circuit`]), both sides must agree bit for bit;
//! they share [`CommitmentParams`] and walk the same round schedule.
//!
//! ## Why Poseidon?
//!
//! The circuit is an R1CS over `Fr`. Poseidon is an algebraic permutation
//! over that very field, so each S-box costs three multiplication gates and
//! the whole commitment fits in roughly 240 constraints. A bit-oriented hash
//! (SHA-256, BLAKE3) would cost tens of thousands.
//!
//! ## Parameters
//!
//! This is the circomlib `poseidon(2)` instance: width 3, 8 full and 57
//! partial rounds, `x^5`, with the circomlib round constants and MDS matrix
//! (taken from `light-poseidon`). The state starts as `[0, secret, tokenId]`
//! and the digest is lane 0 after the last round, so a commitment minted with
//! circomlibjs `poseidon([secret, tokenId])` opens here unchanged.

use ark_bn254::Fr;
use ark_ff::{BigInteger, Field, PrimeField, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use light_poseidon::parameters::bn254_x5;
use light_poseidon::PoseidonParameters;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::{
    POSEIDON_ALPHA, POSEIDON_FULL_ROUNDS, POSEIDON_PARTIAL_ROUNDS, POSEIDON_WIDTH,
};
use crate::error::{OwnershipError, Result};
use crate::field::{self, FieldElement};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Public parameters of the commitment function.
///
/// Fixed constants with no trapdoor and nothing to keep secret. The circuit
/// bakes them in, so proving keys are only valid for one parameter set.
#[derive(Clone, Debug)]
pub struct CommitmentParams {
    /// Round constants, `POSEIDON_WIDTH` per round, rounds in order.
    ark: Vec<Fr>,
    /// `POSEIDON_WIDTH x POSEIDON_WIDTH` MDS matrix, row-major.
    mds: Vec<Vec<Fr>>,
    full_rounds: usize,
    partial_rounds: usize,
}

/// A commitment to `(secret, tokenId)`: a single canonical `Fr` element.
///
/// Serializes to JSON as a decimal string; deserialization insists on a
/// canonical value below the field modulus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, CanonicalSerialize, CanonicalDeserialize)]
pub struct Commitment(Fr);

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

impl CommitmentParams {
    /// The circomlib `poseidon(2)` parameters.
    pub fn standard() -> Self {
        let raw = bn254_x5::get_poseidon_parameters::<Fr>(POSEIDON_WIDTH as u8)
            .expect("light-poseidon ships the circomlib width-3 instance");
        let params = Self::from_parameters(raw)
            .expect("circomlib width-3 parameters have the expected shape");
        debug_assert_eq!(params.full_rounds, POSEIDON_FULL_ROUNDS);
        debug_assert_eq!(params.partial_rounds, POSEIDON_PARTIAL_ROUNDS);

        tracing::debug!(
            full_rounds = params.full_rounds,
            partial_rounds = params.partial_rounds,
            width = POSEIDON_WIDTH,
            "loaded circomlib poseidon parameters"
        );
        params
    }

    /// Wrap an explicit width-3, `x^5` parameter set. Keys generated for one
    /// set reject witnesses built under another.
    ///
    /// # Errors
    ///
    /// [`OwnershipError::Setup`] if the width, S-box or table sizes do not
    /// describe a width-3 permutation.
    pub fn from_parameters(raw: PoseidonParameters<Fr>) -> Result<Self> {
        let rounds = raw.full_rounds + raw.partial_rounds;
        if raw.width != POSEIDON_WIDTH || raw.alpha != POSEIDON_ALPHA {
            return Err(OwnershipError::Setup(format!(
                "poseidon width {} / alpha {} unsupported, need width {} / alpha {}",
                raw.width, raw.alpha, POSEIDON_WIDTH, POSEIDON_ALPHA
            )));
        }
        if raw.full_rounds % 2 != 0 {
            return Err(OwnershipError::Setup(format!(
                "{} full rounds cannot be split evenly",
                raw.full_rounds
            )));
        }
        if raw.ark.len() != rounds * POSEIDON_WIDTH
            || raw.mds.len() != POSEIDON_WIDTH
            || raw.mds.iter().any(|row| row.len() != POSEIDON_WIDTH)
        {
            return Err(OwnershipError::Setup(format!(
                "poseidon tables do not fit {} rounds of width {}",
                rounds, POSEIDON_WIDTH
            )));
        }

        Ok(Self {
            ark: raw.ark,
            mds: raw.mds,
            full_rounds: raw.full_rounds,
            partial_rounds: raw.partial_rounds,
        })
    }

    /// Total number of rounds.
    pub fn num_rounds(&self) -> usize {
        self.full_rounds + self.partial_rounds
    }

    /// Whether `round` applies the S-box to every lane. Full rounds sit half
    /// before and half after the partial rounds.
    pub fn is_full_round(&self, round: usize) -> bool {
        let half = self.full_rounds / 2;
        round < half || round >= half + self.partial_rounds
    }

    /// Constants added to the state at the start of `round`.
    pub fn round_constants(&self, round: usize) -> &[Fr] {
        &self.ark[round * POSEIDON_WIDTH..(round + 1) * POSEIDON_WIDTH]
    }

    /// The MDS matrix, row-major.
    pub fn mds(&self) -> &[Vec<Fr>] {
        &self.mds
    }

    /// BLAKE3 digest over every parameter that affects the output.
    ///
    /// Two parameter sets with the same fingerprint compute the same
    /// commitment function; keys record it so a mismatched parameter set is
    /// caught before proving.
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"nft-ownership/poseidon-circom/v1");
        hasher.update(&(POSEIDON_WIDTH as u64).to_le_bytes());
        hasher.update(&(self.full_rounds as u64).to_le_bytes());
        hasher.update(&(self.partial_rounds as u64).to_le_bytes());
        hasher.update(&POSEIDON_ALPHA.to_le_bytes());
        for element in self.ark.iter().chain(self.mds.iter().flatten()) {
            hasher.update(&element.into_bigint().to_bytes_le());
        }
        *hasher.finalize().as_bytes()
    }
}

impl Default for CommitmentParams {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Commit / Verify
// ---------------------------------------------------------------------------

/// Compute `C = Poseidon(secret, tokenId)`.
///
/// Pure and infallible. Inputs are already field elements, so any reduction
/// modulo `p` has happened at parse time (see [`FieldElement::parse`]).
pub fn commit(params: &CommitmentParams, secret: Fr, token_id: Fr) -> Commitment {
    let mut state = [Fr::zero(), secret, token_id];

    for round in 0..params.num_rounds() {
        for (lane, c) in state.iter_mut().zip(params.round_constants(round)) {
            *lane += c;
        }
        if params.is_full_round(round) {
            for lane in state.iter_mut() {
                *lane = lane.pow([POSEIDON_ALPHA]);
            }
        } else {
            state[0] = state[0].pow([POSEIDON_ALPHA]);
        }
        state = mix(params.mds(), &state);
    }

    Commitment(state[0])
}

fn mix(mds: &[Vec<Fr>], state: &[Fr; POSEIDON_WIDTH]) -> [Fr; POSEIDON_WIDTH] {
    let mut out = [Fr::zero(); POSEIDON_WIDTH];
    for (lane, row) in out.iter_mut().zip(mds) {
        *lane = row.iter().zip(state).map(|(m, x)| *m * x).sum();
    }
    out
}

/// Check that `commitment` opens to `(secret, tokenId)`.
///
/// This reveals the opening. Use it for mint-time bookkeeping or dispute
/// resolution, never as a substitute for a proof.
pub fn verify_commitment(
    params: &CommitmentParams,
    commitment: &Commitment,
    secret: Fr,
    token_id: Fr,
) -> bool {
    commit(params, secret, token_id) == *commitment
}

impl Commitment {
    /// Wrap a field element that is claimed to be a commitment.
    pub fn from_field(value: impl Into<Fr>) -> Self {
        Self(value.into())
    }

    /// The commitment as a raw field element.
    pub fn value(&self) -> Fr {
        self.0
    }

    /// The commitment as a [`FieldElement`] (decimal `Display`).
    pub fn as_field(&self) -> FieldElement {
        FieldElement::new(self.0)
    }

    /// Serialize to 32 compressed bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_compressed(&mut buf)
            .expect("Commitment serialization must not fail");
        buf
    }

    /// Deserialize from compressed bytes. Rejects non-canonical encodings.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self::deserialize_compressed(data)?)
    }
}

impl Serialize for Commitment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.as_field().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Commitment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        field::deserialize_canonical(deserializer).map(|fe| Self(fe.inner()))
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_field())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
