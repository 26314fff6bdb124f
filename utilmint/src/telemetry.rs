// Copyright (c) 2024 Botho Foundation

//! Log output for the CLI.
//!
//! Logs go to stderr so that command output on stdout stays machine-readable.
//! `RUST_LOG` overrides the level chosen by `--verbose`:
//!
//! ```bash
//! RUST_LOG=utilmint=debug utilmint report --processing 172800000 --bandwidth 113246208
//! ```

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the tracing subscriber.
///
/// * `verbose` - Whether to enable debug-level logging
pub fn init_tracing(verbose: bool) -> Result<()> {
    let filter = default_filter(verbose)?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize tracing: {e}"))
}

fn default_filter(verbose: bool) -> Result<EnvFilter> {
    let level = if verbose { "debug" } else { "info" };
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).context("Invalid log filter"),
    }
}
