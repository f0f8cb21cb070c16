//! # JSON Documents
//!
//! The file formats exchanged between the holder, the prover and the
//! verifier. Field values are decimal strings throughout.
//!
//! - **Input document**: `{"secret", "tokenId", "nftCommitment"}`. Holds the
//!   secret, so it never leaves the holder's machine.
//! - **Proof document**: the three Groth16 points in the layout snarkjs
//!   writes for `groth16 prove`: projective triples with `z = 1`, tagged
//!   with the proof system and curve.
//! - **Public signals**: `["<nftCommitment>"]`, see
//!   [`crate::zkp::PublicSignals`].
//!
//! ```json
//! {
//!   "pi_a": ["<x>", "<y>", "1"],
//!   "pi_b": [["<x.c0>", "<x.c1>"], ["<y.c0>", "<y.c1>"], ["1", "0"]],
//!   "pi_c": ["<x>", "<y>", "1"],
//!   "protocol": "groth16",
//!   "curve": "bn128"
//! }
//! ```
//!
//! The point at infinity is written with `z = 0`, as `["0", "1", "0"]`.

use std::fs;
use std::path::Path;

use ark_bn254::{Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::{One, Zero};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::{PROOF_DOCUMENT_CURVE, PROOF_SYSTEM};
use crate::error::{OwnershipError, Result};
use crate::field::{self, FieldElement};
use crate::zkp::{
    Commitment, OwnershipProof, OwnershipVerifier, PrivateInputs, PublicInputs, PublicSignals,
};

// ---------------------------------------------------------------------------
// Input document
// ---------------------------------------------------------------------------

/// Everything the prover needs: the opening and the commitment it opens.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDocument {
    pub secret: FieldElement,
    pub token_id: FieldElement,
    #[serde(deserialize_with = "field::deserialize_canonical")]
    pub nft_commitment: FieldElement,
}

impl InputDocument {
    pub fn new(private: &PrivateInputs, public: &PublicInputs) -> Self {
        Self {
            secret: private.secret,
            token_id: private.token_id,
            nft_commitment: public.nft_commitment.as_field(),
        }
    }

    /// Split into the typed inputs for witness generation.
    pub fn to_inputs(&self) -> (PrivateInputs, PublicInputs) {
        (
            PrivateInputs::new(self.secret, self.token_id),
            PublicInputs::new(Commitment::from_field(self.nft_commitment)),
        )
    }
}

impl std::fmt::Debug for InputDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputDocument")
            .field("secret", &"<redacted>")
            .field("token_id", &"<redacted>")
            .field("nft_commitment", &self.nft_commitment)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Proof document
// ---------------------------------------------------------------------------

/// A Groth16 proof in snarkjs `proof.json` form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofDocument {
    pub pi_a: [String; 3],
    pub pi_b: [[String; 2]; 3],
    pub pi_c: [String; 3],
    pub protocol: String,
    pub curve: String,
}

/// Result of decoding a [`ProofDocument`].
#[derive(Clone, Debug, PartialEq)]
pub enum DecodedProof {
    /// Every point is on the curve and in the prime-order subgroup.
    Proof(OwnershipProof),
    /// The coordinates are well-formed numbers but `component` is not a
    /// group element. Such a proof can never verify.
    InvalidPoint { component: &'static str },
}

impl ProofDocument {
    pub fn from_proof(proof: &OwnershipProof) -> Self {
        Self {
            pi_a: encode_g1(&proof.a()),
            pi_b: encode_g2(&proof.b()),
            pi_c: encode_g1(&proof.c()),
            protocol: PROOF_SYSTEM.to_string(),
            curve: PROOF_DOCUMENT_CURVE.to_string(),
        }
    }

    /// Decode the points.
    ///
    /// # Errors
    ///
    /// [`OwnershipError::MalformedInput`] for a foreign protocol or curve tag,
    /// a coordinate that is not a canonical base-field element, or a `z`
    /// coordinate other than `1` (or `0` for the point at infinity). Points
    /// off the curve are not an error; see [`DecodedProof::InvalidPoint`].
    pub fn decode(&self) -> Result<DecodedProof> {
        if self.protocol != PROOF_SYSTEM || self.curve != PROOF_DOCUMENT_CURVE {
            return Err(OwnershipError::MalformedInput(format!(
                "unsupported proof document: protocol '{}', curve '{}' (expected '{}' on '{}')",
                self.protocol, self.curve, PROOF_SYSTEM, PROOF_DOCUMENT_CURVE
            )));
        }

        let a = decode_g1("pi_a", &self.pi_a)?;
        let b = decode_g2("pi_b", &self.pi_b)?;
        let c = decode_g1("pi_c", &self.pi_c)?;

        Ok(match (a, b, c) {
            (Some(a), Some(b), Some(c)) => DecodedProof::Proof(OwnershipProof::from_points(a, b, c)),
            (None, _, _) => DecodedProof::InvalidPoint { component: "pi_a" },
            (_, None, _) => DecodedProof::InvalidPoint { component: "pi_b" },
            (_, _, None) => DecodedProof::InvalidPoint { component: "pi_c" },
        })
    }
}

// snarkjs writes affine points with z = 1 and infinity as (0, 1, 0).

fn encode_g1(p: &G1Affine) -> [String; 3] {
    if p.infinity {
        return ["0".into(), "1".into(), "0".into()];
    }
    [field::to_decimal(&p.x), field::to_decimal(&p.y), "1".into()]
}

fn encode_g2(p: &G2Affine) -> [[String; 2]; 3] {
    if p.infinity {
        return [
            ["0".into(), "0".into()],
            ["1".into(), "0".into()],
            ["0".into(), "0".into()],
        ];
    }
    [
        [field::to_decimal(&p.x.c0), field::to_decimal(&p.x.c1)],
        [field::to_decimal(&p.y.c0), field::to_decimal(&p.y.c1)],
        ["1".into(), "0".into()],
    ]
}

fn decode_fq2(pair: &[String; 2]) -> Result<Fq2> {
    Ok(Fq2::new(
        field::parse_canonical_decimal(&pair[0])?,
        field::parse_canonical_decimal(&pair[1])?,
    ))
}

fn bad_z(component: &str) -> OwnershipError {
    OwnershipError::MalformedInput(format!(
        "{}: z coordinate must be 1, or 0 for the point at infinity",
        component
    ))
}

fn decode_g1(component: &str, coords: &[String; 3]) -> Result<Option<G1Affine>> {
    let x: Fq = field::parse_canonical_decimal(&coords[0])?;
    let y: Fq = field::parse_canonical_decimal(&coords[1])?;
    let z: Fq = field::parse_canonical_decimal(&coords[2])?;
    if z.is_zero() {
        return Ok(Some(G1Affine::zero()));
    }
    if !z.is_one() {
        return Err(bad_z(component));
    }
    let p = G1Affine::new_unchecked(x, y);
    Ok((p.is_on_curve() && p.is_in_correct_subgroup_assuming_on_curve()).then_some(p))
}

fn decode_g2(component: &str, coords: &[[String; 2]; 3]) -> Result<Option<G2Affine>> {
    let x = decode_fq2(&coords[0])?;
    let y = decode_fq2(&coords[1])?;
    let z = decode_fq2(&coords[2])?;
    if z.is_zero() {
        return Ok(Some(G2Affine::zero()));
    }
    if !z.is_one() {
        return Err(bad_z(component));
    }
    let p = G2Affine::new_unchecked(x, y);
    Ok((p.is_on_curve() && p.is_in_correct_subgroup_assuming_on_curve()).then_some(p))
}

/// Verify a proof document against public signals.
///
/// A document whose points are not group elements is rejected (`Ok(false)`),
/// exactly like a well-formed but wrong proof.
pub fn verify_document(
    verifier: &OwnershipVerifier,
    document: &ProofDocument,
    public_signals: &PublicSignals,
) -> Result<bool> {
    match document.decode()? {
        DecodedProof::Proof(proof) => verifier.verify(&proof, public_signals),
        DecodedProof::InvalidPoint { component } => {
            warn!(component, "proof point is not on the curve; rejecting");
            Ok(false)
        }
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Read a JSON document. A parse failure is [`OwnershipError::MalformedInput`].
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|e| OwnershipError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| {
        OwnershipError::MalformedInput(format!("{}: {}", path.display(), e))
    })
}

/// Write a JSON document (pretty-printed, trailing newline).
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| OwnershipError::io(dir, e))?;
    }
    let mut text = serde_json::to_string_pretty(value)
        .map_err(|e| OwnershipError::Serialization(e.to_string()))?;
    text.push('\n');
    fs::write(path, text).map_err(|e| OwnershipError::io(path, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
