// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # NFT Ownership CLI
//!
//! Entry point for the `nft-ownership` binary. Parses CLI arguments,
//! initializes logging, and runs one subcommand:
//!
//! - `setup`: trusted setup, writes the key pair
//! - `commit`: compute a commitment, optionally write an input document
//! - `prove`: input document in, proof and public signals out
//! - `verify`: prints `OK` or `INVALID`
//! - `harness`: full cycle with tamper checks, optional load test
//! - `version`: print build version information
//!
//! Results go to stdout, logs to stderr.

mod cli;
mod logging;

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rand::rngs::{OsRng, StdRng};
use rand::SeedableRng;

use nft_ownership::config::{ArtifactLayout, ServiceConfig, PROOF_DOCUMENT_CURVE, PROOF_SYSTEM};
use nft_ownership::documents::{self, InputDocument, ProofDocument};
use nft_ownership::harness::{self, CycleReport};
use nft_ownership::service::ProofService;
use nft_ownership::zkp::{
    CommitmentParams, KeyArtifacts, OwnershipProver, PrivateInputs, PublicInputs, PublicSignals,
};

use cli::{Commands, OwnershipCli};

/// Exit code for a proof that was checked and rejected.
const EXIT_INVALID: u8 = 1;

/// Exit code for a proof or signals document that could not be read.
const EXIT_MALFORMED: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = OwnershipCli::parse();
    logging::init_logging(cli.log_level.as_deref(), cli.log_format);

    match cli.command {
        Commands::Setup(args) => setup(args),
        Commands::Commit(args) => commit(args),
        Commands::Prove(args) => prove(args),
        Commands::Verify(args) => verify(args),
        Commands::Harness(args) => run_harness(args).await,
        Commands::Version => {
            print_version();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn key_artifacts(keys: &cli::KeysArgs) -> KeyArtifacts {
    KeyArtifacts::new(ArtifactLayout::new(&keys.keys_dir))
}

/// Runs the trusted setup and writes both keys.
fn setup(args: cli::SetupArgs) -> Result<ExitCode> {
    let keys = key_artifacts(&args.keys);
    if keys.exists() && !args.force {
        bail!(
            "keys already exist in {} (pass --force to replace them)",
            args.keys.keys_dir.display()
        );
    }

    let (_, verifier) = match args.insecure_seed {
        Some(seed) => {
            tracing::warn!(seed, "deterministic setup; these keys are for testing only");
            keys.generate(&mut StdRng::seed_from_u64(seed))
        }
        None => keys.generate(&mut OsRng),
    }
    .context("trusted setup failed")?;

    println!("Keys written to {}", args.keys.keys_dir.display());
    println!("  Verification key fingerprint : {}", verifier.fingerprint());
    Ok(ExitCode::SUCCESS)
}

/// Prints the commitment for a secret and token.
fn commit(args: cli::CommitArgs) -> Result<ExitCode> {
    let params = CommitmentParams::standard();
    let private = PrivateInputs::parse(&args.secret, &args.token_id)?;
    let commitment = private.commitment(&params);

    if let Some(out) = &args.out {
        let doc = InputDocument::new(&private, &PublicInputs::new(commitment));
        documents::write_json(out, &doc)
            .with_context(|| format!("failed to write input document {}", out.display()))?;
        tracing::info!(path = %out.display(), "input document written");
    }

    println!("{}", commitment);
    Ok(ExitCode::SUCCESS)
}

/// Proves ownership from an input document.
fn prove(args: cli::ProveArgs) -> Result<ExitCode> {
    let params = CommitmentParams::standard();
    let prover = key_artifacts(&args.keys)
        .load_prover(&params)
        .context("failed to load proving key")?;

    let input: InputDocument = documents::read_json(&args.input)?;
    let (private, public) = input.to_inputs();

    let (proof, signals) = prover.prove_inputs(&private, &public)?;

    documents::write_json(&args.proof, &ProofDocument::from_proof(&proof))?;
    documents::write_json(&args.public, &signals)?;

    tracing::info!(
        proof = %args.proof.display(),
        public = %args.public.display(),
        "ownership proof written"
    );
    println!("{}", public.nft_commitment);
    Ok(ExitCode::SUCCESS)
}

/// Verifies a proof document. Prints `OK` or `INVALID`.
fn verify(args: cli::VerifyArgs) -> Result<ExitCode> {
    let params = CommitmentParams::standard();
    let verifier = key_artifacts(&args.keys)
        .load_verifier(&params)
        .context("failed to load verification key")?;

    let outcome = documents::read_json::<ProofDocument>(&args.proof).and_then(|doc| {
        let signals: PublicSignals = documents::read_json(&args.public)?;
        documents::verify_document(&verifier, &doc, &signals)
    });

    match outcome {
        Ok(true) => {
            println!("OK");
            Ok(ExitCode::SUCCESS)
        }
        Ok(false) => {
            println!("INVALID");
            Ok(ExitCode::from(EXIT_INVALID))
        }
        Err(e) if e.is_input_error() => {
            eprintln!("{}", e);
            println!("INVALID");
            Ok(ExitCode::from(EXIT_MALFORMED))
        }
        Err(e) => Err(e).context("verification could not run"),
    }
}

/// Runs the verification harness, optionally followed by a concurrent load
/// test through the proof service.
async fn run_harness(args: cli::HarnessArgs) -> Result<ExitCode> {
    let (prover, verifier) = match &args.keys_dir {
        Some(dir) => {
            let keys = KeyArtifacts::new(ArtifactLayout::new(dir));
            let params = CommitmentParams::standard();
            (keys.load_prover(&params)?, keys.load_verifier(&params)?)
        }
        None => OwnershipProver::setup(&mut OsRng)?,
    };

    let private = PrivateInputs::parse(&args.secret, &args.token_id)?;
    let report = harness::run_cycle(&prover, &verifier, &private)?;
    print_report(&report);

    let mut passed = report.passed();

    if args.jobs > 0 {
        let mut config = ServiceConfig::default();
        if let Some(n) = args.max_concurrent_jobs {
            config.max_concurrent_jobs = n;
        }
        let service = ProofService::new(prover, verifier, config);
        let ok = run_jobs(&service, &private, args.jobs).await;

        println!("  Service jobs                 : {}/{} verified", ok, args.jobs);
        passed &= ok == args.jobs;

        if args.metrics {
            print!("{}", service.metrics().encode()?);
        }
    }

    println!("  Result                       : {}", if passed { "PASS" } else { "FAIL" });
    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Proves and verifies `jobs` times concurrently; returns how many verified.
async fn run_jobs(service: &ProofService, private: &PrivateInputs, jobs: usize) -> usize {
    let public = PublicInputs::new(private.commitment(&CommitmentParams::standard()));

    let handles: Vec<_> = (0..jobs)
        .map(|_| {
            let service = service.clone();
            let private = private.clone();
            tokio::spawn(async move {
                let (proof, signals) = service.prove(private, public).await?;
                service.verify(proof, signals).await
            })
        })
        .collect();

    let mut ok = 0;
    for handle in handles {
        match handle.await {
            Ok(Ok(true)) => ok += 1,
            Ok(Ok(false)) => tracing::error!("service proof rejected"),
            Ok(Err(e)) => tracing::error!(error = %e, "service job failed"),
            Err(e) => tracing::error!(error = %e, "service task panicked"),
        }
    }
    ok
}

fn print_report(report: &CycleReport) {
    println!("Ownership proof cycle");
    println!("  Commitment                   : {}", report.commitment);
    println!("  Public signals               : {}", report.public_signals.len());
    println!("  Proof size                   : {} bytes", report.proof_bytes);
    println!("  Prove time                   : {} ms", report.prove_time.as_millis());
    println!(
        "  Valid proof                  : {}",
        if report.proof_accepted { "accepted" } else { "REJECTED" }
    );
    for outcome in &report.tamper_outcomes {
        println!(
            "  Tampered ({:<20}) : {}",
            outcome.tamper.to_string(),
            if outcome.rejected { "rejected" } else { "ACCEPTED" }
        );
    }
}

/// Prints version information to stdout.
fn print_version() {
    println!("nft-ownership {}", env!("CARGO_PKG_VERSION"));
    println!("proof system  {} on {}", PROOF_SYSTEM, PROOF_DOCUMENT_CURVE);
    println!("rustc         {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

