//! # Structured Logging
//!
//! Logs go to stderr. Stdout is reserved for command results (`OK`/`INVALID`,
//! commitments, harness reports) so scripts can parse it.
//!
//! Filter precedence: `--log-level` / `NFT_OWNERSHIP_LOG`, then `RUST_LOG`,
//! then [`DEFAULT_FILTER`].

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither the flag nor `RUST_LOG` is set. Proving logs its
/// timings at `info`.
pub const DEFAULT_FILTER: &str = "nft_ownership=info,nft_ownership_cli=info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Resolve the filter directive string.
fn directives(explicit: Option<&str>, rust_log: Option<String>) -> String {
    explicit
        .map(str::to_string)
        .or(rust_log)
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global subscriber. Call once, first thing in `main`.
///
/// An unparsable filter falls back to [`DEFAULT_FILTER`] rather than
/// aborting the command.
pub fn init_logging(explicit: Option<&str>, format: LogFormat) {
    let wanted = directives(explicit, std::env::var("RUST_LOG").ok());
    let filter = EnvFilter::try_new(&wanted).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .init(),
    }

    tracing::debug!(filter = %wanted, ?format, "logging initialized");
}
