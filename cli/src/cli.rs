//! # CLI Interface
//!
//! Defines the command-line argument structure for `nft-ownership` using
//! `clap` derive. Subcommands follow the life of a proof: `setup`, `commit`,
//! `prove`, `verify`, plus `harness` for a self-check and `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use nft_ownership::config::{DEFAULT_KEYS_DIR, INPUT_FILE, PROOF_FILE, PUBLIC_FILE};

use crate::logging::LogFormat;

/// Zero-knowledge proofs of NFT ownership.
///
/// Proves knowledge of `(secret, tokenId)` behind a Poseidon commitment
/// with Groth16 over BN254, disclosing only the commitment.
#[derive(Parser, Debug)]
#[command(
    name = "nft-ownership",
    about = "Zero-knowledge proofs of NFT ownership",
    version,
    propagate_version = true
)]
pub struct OwnershipCli {
    /// Log output format.
    #[arg(
        long,
        global = true,
        value_enum,
        env = "NFT_OWNERSHIP_LOG_FORMAT",
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,

    /// Log filter, e.g. `nft_ownership=debug`. Overrides `RUST_LOG`.
    #[arg(long, global = true, env = "NFT_OWNERSHIP_LOG")]
    pub log_level: Option<String>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the trusted setup and write the proving and verification keys.
    Setup(SetupArgs),
    /// Compute the commitment for a secret and token, optionally writing an
    /// input document for `prove`.
    Commit(CommitArgs),
    /// Prove ownership from an input document.
    Prove(ProveArgs),
    /// Verify a proof document against public signals. Prints `OK` or
    /// `INVALID`; exits non-zero unless the proof is valid.
    Verify(VerifyArgs),
    /// Run a full commit/prove/verify cycle with tamper checks.
    Harness(HarnessArgs),
    /// Print version information and exit.
    Version,
}

/// Location of the key pair.
#[derive(Args, Debug, Clone)]
pub struct KeysArgs {
    /// Directory holding `ownership.pk` and `ownership.vk`.
    #[arg(long, short = 'k', env = "NFT_OWNERSHIP_KEYS_DIR", default_value = DEFAULT_KEYS_DIR)]
    pub keys_dir: PathBuf,
}

/// Arguments for the `setup` subcommand.
#[derive(Parser, Debug)]
pub struct SetupArgs {
    #[command(flatten)]
    pub keys: KeysArgs,

    /// Overwrite existing keys. Every proof made with the old keys stops
    /// verifying.
    #[arg(long)]
    pub force: bool,

    /// Derive the setup randomness from this seed. Test keys only: anyone
    /// who knows the seed can forge proofs.
    #[arg(long, env = "NFT_OWNERSHIP_INSECURE_SEED")]
    pub insecure_seed: Option<u64>,
}

/// Arguments for the `commit` subcommand.
#[derive(Parser, Debug)]
pub struct CommitArgs {
    /// Holder secret (decimal or 0x-hex).
    #[arg(long, env = "NFT_OWNERSHIP_SECRET")]
    pub secret: String,

    /// Token identifier (decimal or 0x-hex).
    #[arg(long)]
    pub token_id: String,

    /// Write an input document here.
    #[arg(long, short = 'o')]
    pub out: Option<PathBuf>,
}

/// Arguments for the `prove` subcommand.
#[derive(Parser, Debug)]
pub struct ProveArgs {
    #[command(flatten)]
    pub keys: KeysArgs,

    /// Input document with `secret`, `tokenId` and `nftCommitment`.
    #[arg(long, short = 'i', default_value = INPUT_FILE)]
    pub input: PathBuf,

    /// Where to write the proof document.
    #[arg(long, default_value = PROOF_FILE)]
    pub proof: PathBuf,

    /// Where to write the public signals.
    #[arg(long, default_value = PUBLIC_FILE)]
    pub public: PathBuf,
}

/// Arguments for the `verify` subcommand.
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub keys: KeysArgs,

    /// Proof document to check.
    #[arg(long, default_value = PROOF_FILE)]
    pub proof: PathBuf,

    /// Public signals the proof claims.
    #[arg(long, default_value = PUBLIC_FILE)]
    pub public: PathBuf,
}

/// Arguments for the `harness` subcommand.
#[derive(Parser, Debug)]
pub struct HarnessArgs {
    /// Use keys from this directory instead of a throwaway in-memory setup.
    #[arg(long, short = 'k', env = "NFT_OWNERSHIP_KEYS_DIR")]
    pub keys_dir: Option<PathBuf>,

    /// Holder secret for the cycle.
    #[arg(long, default_value = "1234567890")]
    pub secret: String,

    /// Token identifier for the cycle.
    #[arg(long, default_value = "9876543210")]
    pub token_id: String,

    /// Additionally run this many concurrent prove/verify jobs through the
    /// proof service.
    #[arg(long, default_value_t = 0)]
    pub jobs: usize,

    /// Maximum concurrently running service jobs.
    #[arg(long, env = "NFT_OWNERSHIP_MAX_JOBS")]
    pub max_concurrent_jobs: Option<usize>,

    /// Print Prometheus metrics after the run.
    #[arg(long)]
    pub metrics: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        OwnershipCli::command().debug_assert();
    }

    #[test]
    fn defaults_point_at_standard_files() {
        let cli = OwnershipCli::try_parse_from(["nft-ownership", "verify"]).unwrap();
        match cli.command {
            Commands::Verify(args) => {
                assert_eq!(args.proof, PathBuf::from(PROOF_FILE));
                assert_eq!(args.public, PathBuf::from(PUBLIC_FILE));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn commit_requires_both_values() {
        assert!(OwnershipCli::try_parse_from(["nft-ownership", "commit", "--secret", "1"]).is_err());
        let cli = OwnershipCli::try_parse_from([
            "nft-ownership",
            "commit",
            "--secret",
            "1",
            "--token-id",
            "2",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Commit(_)));
    }

    #[test]
    fn global_log_flags_parse_after_subcommand() {
        let cli = OwnershipCli::try_parse_from([
            "nft-ownership",
            "version",
            "--log-format",
            "json",
            "--log-level",
            "nft_ownership=debug",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.log_level.as_deref(), Some("nft_ownership=debug"));
    }
}
