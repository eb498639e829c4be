//! Logging setup.
//!
//! Log level is controlled via the `PHOTOINBOX_LOG` environment variable
//! (`trace`, `debug`, `info`, `warn`, `error`); default is `info`.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

pub fn init() -> Result<()> {
    let env_filter =
        EnvFilter::try_from_env("PHOTOINBOX_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    Ok(())
}
