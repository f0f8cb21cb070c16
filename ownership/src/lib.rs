// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # NFT Ownership Proofs: Core Library
//!
//! Prove you own an NFT without saying which one, and without giving away
//! the secret that makes it yours.
//!
//! At mint time the holder picks a secret and records
//! `nftCommitment = Poseidon(secret, tokenId)`. Later the holder produces a
//! Groth16 proof over BN254 that they know an opening of that commitment.
//! The verifier learns one field element, the commitment, and nothing else.
//!
//! ## Architecture
//!
//! - **field**: BN254 scalar field elements and their text encodings.
//! - **zkp**: Commitment, circuit, witness generation, prover, verifier
//!   and key files. The cryptographic core.
//! - **documents**: JSON input, proof and public-signal documents.
//! - **harness**: One full commit/prove/verify cycle plus tamper checks.
//! - **service**: Async, bounded prove/verify jobs with timeouts.
//! - **metrics**: Prometheus counters and histograms for the service.
//! - **config**: Circuit constants, artifact layout, service settings.
//! - **error**: The crate-wide error type.
//!
//! ## Quick start
//!
//! ```no_run
//! use nft_ownership::zkp::{OwnershipProver, PrivateInputs, PublicInputs};
//!
//! # fn main() -> nft_ownership::error::Result<()> {
//! let (prover, verifier) = OwnershipProver::setup(&mut rand::thread_rng())?;
//!
//! let private = PrivateInputs::parse("1234567890", "9876543210")?;
//! let public = PublicInputs::new(private.commitment(prover.commitment_params()));
//!
//! let (proof, signals) = prover.prove_inputs(&private, &public)?;
//! assert!(verifier.verify(&proof, &signals)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod documents;
pub mod error;
pub mod field;
pub mod harness;
pub mod metrics;
pub mod service;
pub mod zkp;
