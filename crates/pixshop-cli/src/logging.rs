//! Tracing subscriber setup for the CLI.
//!
//! The filter is read from `PIXSHOP_LOG`, then `RUST_LOG`, then the
//! configured `log_level`. Logs go to stderr so that command output on
//! stdout stays clean.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_ENV: &str = "PIXSHOP_LOG";

fn build_env_filter(default_level: &str) -> Result<EnvFilter> {
    if let Ok(filter) = std::env::var(LOG_ENV) {
        return EnvFilter::try_new(&filter).with_context(|| format!("invalid {LOG_ENV}: {filter}"));
    }
    if let Ok(filter) = std::env::var("RUST_LOG") {
        return EnvFilter::try_new(&filter).with_context(|| format!("invalid RUST_LOG: {filter}"));
    }
    EnvFilter::try_new(default_level)
        .with_context(|| format!("invalid log_level in config: {default_level}"))
}

/// Installs the global subscriber. `verbose` forces debug output for the
/// pixshop crates.
pub fn init(default_level: &str, verbose: bool) -> Result<()> {
    let mut filter = build_env_filter(default_level)?;
    if verbose {
        for target in [
            "pixshop_core",
            "pixshop_infrastructure",
            "pixshop_application",
            "pixshop_interaction",
        ] {
            filter = filter.add_directive(format!("{target}=debug").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .try_init()
        .context("logging already initialized")?;
    Ok(())
}
