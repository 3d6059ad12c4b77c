//! Diagnostic output on stderr, kept off stdout so command output stays parseable.

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

const CRATE_TARGET: &str = env!("CARGO_PKG_NAME");

fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    }
}

/// Events from this crate only; dependencies (tokio, dashmap) stay silent.
fn crate_targets(verbose: bool) -> Targets {
    Targets::new().with_target(CRATE_TARGET, level_for(verbose))
}

/// `RUST_LOG` wins when set and valid, otherwise the verbosity flag decides.
fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(level_for(verbose).into())
    })
}

/// Installs the global subscriber; `verbose` turns on debug output for this crate.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(verbose: bool) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(crate_targets(verbose))
        .with(env_filter(verbose))
        .try_init()
        .context("Failed to install the log subscriber")
}
