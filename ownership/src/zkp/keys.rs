//! # Key Artifacts
//!
//! Proving and verification keys are generated once by the trusted setup and
//! reused for every proof. On disk each key file is:
//!
//! ```text
//! magic (8) || version (1) || commitment-params fingerprint (32) || key
//! ```
//!
//! where `key` is the arkworks compressed encoding. The fingerprint ties the
//! key to the Poseidon parameters it was generated for; loading a key under
//! different parameters fails with [`OwnershipError::KeyMismatch`] instead of
//! producing proofs nobody can verify.

use std::fs;
use std::path::Path;

use ark_bn254::Bn254;
use ark_groth16::ProvingKey;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::{CryptoRng, Rng};
use tracing::info;

use super::commitment::CommitmentParams;
use super::prover::OwnershipProver;
use super::verifier::OwnershipVerifier;
use crate::config::{ArtifactLayout, NUM_PUBLIC_SIGNALS};
use crate::error::{OwnershipError, Result};

const PROVING_KEY_MAGIC: &[u8; 8] = b"NFTOWNPK";
const VERIFICATION_KEY_MAGIC: &[u8; 8] = b"NFTOWNVK";
const KEY_FILE_VERSION: u8 = 1;
const HEADER_LEN: usize = 8 + 1 + 32;

/// Reads and writes the key pair under an [`ArtifactLayout`].
#[derive(Clone, Debug)]
pub struct KeyArtifacts {
    layout: ArtifactLayout,
}

impl KeyArtifacts {
    pub fn new(layout: ArtifactLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// `true` if both key files are present.
    pub fn exists(&self) -> bool {
        self.layout.proving_key().is_file() && self.layout.verification_key().is_file()
    }

    /// Run the trusted setup and persist both keys.
    pub fn generate<R: Rng + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<(OwnershipProver, OwnershipVerifier)> {
        let (prover, verifier) = OwnershipProver::setup(rng)?;
        self.save(&prover, &verifier)?;
        Ok((prover, verifier))
    }

    /// Persist a key pair. The two halves must come from the same setup.
    pub fn save(&self, prover: &OwnershipProver, verifier: &OwnershipVerifier) -> Result<()> {
        if prover.verifier()?.fingerprint() != verifier.fingerprint() {
            return Err(OwnershipError::KeyMismatch(
                "proving and verification keys come from different setups".into(),
            ));
        }

        let params_fp = prover.commitment_params().fingerprint();

        let mut pk_bytes = Vec::new();
        prover.proving_key().serialize_compressed(&mut pk_bytes)?;
        write_key_file(&self.layout.proving_key(), PROVING_KEY_MAGIC, &params_fp, &pk_bytes)?;

        let vk_bytes = verifier.vk_to_bytes();
        write_key_file(
            &self.layout.verification_key(),
            VERIFICATION_KEY_MAGIC,
            &params_fp,
            &vk_bytes,
        )?;

        info!(
            dir = %self.layout.root().display(),
            pk_bytes = pk_bytes.len(),
            vk_fingerprint = %verifier.fingerprint(),
            "saved ownership keys"
        );
        Ok(())
    }

    /// Load the proving key for use with `params`.
    pub fn load_prover(&self, params: &CommitmentParams) -> Result<OwnershipProver> {
        let path = self.layout.proving_key();
        let body = read_key_file(&path, PROVING_KEY_MAGIC, params)?;
        let pk = ProvingKey::<Bn254>::deserialize_compressed(body.as_slice())?;

        if pk.vk.gamma_abc_g1.len() != NUM_PUBLIC_SIGNALS + 1 {
            return Err(OwnershipError::KeyMismatch(format!(
                "{}: proving key is for a circuit with {} public inputs",
                path.display(),
                pk.vk.gamma_abc_g1.len().saturating_sub(1)
            )));
        }

        info!(path = %path.display(), "loaded ownership proving key");
        Ok(OwnershipProver::from_parts(pk, params.clone()))
    }

    /// Load the verification key. `params` must be the set the keys were
    /// generated for.
    pub fn load_verifier(&self, params: &CommitmentParams) -> Result<OwnershipVerifier> {
        let path = self.layout.verification_key();
        let body = read_key_file(&path, VERIFICATION_KEY_MAGIC, params)?;
        let verifier = OwnershipVerifier::vk_from_bytes(&body)?;

        info!(
            path = %path.display(),
            fingerprint = %verifier.fingerprint(),
            "loaded ownership verification key"
        );
        Ok(verifier)
    }
}

fn write_key_file(path: &Path, magic: &[u8; 8], params_fp: &[u8; 32], body: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| OwnershipError::io(dir, e))?;
    }

    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
    bytes.extend_from_slice(magic);
    bytes.push(KEY_FILE_VERSION);
    bytes.extend_from_slice(params_fp);
    bytes.extend_from_slice(body);

    // Write-then-rename so a crash never leaves a truncated key behind.
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes).map_err(|e| OwnershipError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| OwnershipError::io(path, e))
}

fn read_key_file(path: &Path, magic: &[u8; 8], params: &CommitmentParams) -> Result<Vec<u8>> {
    let mut bytes = fs::read(path).map_err(|e| OwnershipError::io(path, e))?;

    if bytes.len() < HEADER_LEN || &bytes[..8] != magic {
        return Err(OwnershipError::KeyMismatch(format!(
            "{}: not an ownership key file",
            path.display()
        )));
    }
    if bytes[8] != KEY_FILE_VERSION {
        return Err(OwnershipError::KeyMismatch(format!(
            "{}: unsupported key file version {}",
            path.display(),
            bytes[8]
        )));
    }
    if bytes[9..HEADER_LEN] != params.fingerprint() {
        return Err(OwnershipError::KeyMismatch(format!(
            "{}: key was generated for different commitment parameters",
            path.display()
        )));
    }

    Ok(bytes.split_off(HEADER_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zkp::witness::{PrivateInputs, PublicInputs};
    use ark_bn254::Fr;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use light_poseidon::parameters::bn254_x5;

    fn artifacts(dir: &tempfile::TempDir) -> KeyArtifacts {
        KeyArtifacts::new(ArtifactLayout::new(dir.path().join("keys")))
    }

    #[test]
    fn generate_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let keys = artifacts(&dir);
        assert!(!keys.exists());

        let (_prover, verifier) = keys.generate(&mut StdRng::seed_from_u64(42)).unwrap();
        assert!(keys.exists());

        let params = CommitmentParams::standard();
        let prover = keys.load_prover(&params).unwrap();
        let loaded_verifier = keys.load_verifier(&params).unwrap();
        assert_eq!(loaded_verifier.fingerprint(), verifier.fingerprint());

        let private = PrivateInputs::new(11u64, 22u64);
        let public = PublicInputs::new(private.commitment(&params));
        let (proof, signals) = prover.prove_inputs(&private, &public).unwrap();
        assert!(loaded_verifier.verify(&proof, &signals).unwrap());
    }

    #[test]
    fn other_params_are_a_key_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let keys = artifacts(&dir);
        keys.generate(&mut StdRng::seed_from_u64(42)).unwrap();

        let mut raw = bn254_x5::get_poseidon_parameters::<Fr>(3).unwrap();
        raw.ark[4] += Fr::from(1u64);
        let other = CommitmentParams::from_parameters(raw).unwrap();

        assert!(matches!(
            keys.load_prover(&other).unwrap_err(),
            OwnershipError::KeyMismatch(_)
        ));
        assert!(matches!(
            keys.load_verifier(&other).unwrap_err(),
            OwnershipError::KeyMismatch(_)
        ));
    }

    #[test]
    fn mixed_setups_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let keys = artifacts(&dir);
        let (prover, _) = OwnershipProver::setup(&mut StdRng::seed_from_u64(1)).unwrap();
        let (_, verifier) = OwnershipProver::setup(&mut StdRng::seed_from_u64(2)).unwrap();

        let err = keys.save(&prover, &verifier).unwrap_err();
        assert!(matches!(err, OwnershipError::KeyMismatch(_)));
        assert!(!keys.exists());
    }

    #[test]
    fn missing_and_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let keys = artifacts(&dir);
        let params = CommitmentParams::standard();

        assert!(matches!(
            keys.load_verifier(&params).unwrap_err(),
            OwnershipError::Io { .. }
        ));

        fs::create_dir_all(keys.layout().root()).unwrap();
        fs::write(keys.layout().verification_key(), b"definitely not a key").unwrap();
        assert!(matches!(
            keys.load_verifier(&params).unwrap_err(),
            OwnershipError::KeyMismatch(_)
        ));
    }
}
