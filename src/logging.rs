//! File logging. The terminal belongs to the UI, so nothing is installed without `--log-file`.

use anyhow::{Context, Result, anyhow};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Install a plain-text subscriber writing to `path`. `RUST_LOG` wins over `default_filter`.
pub fn init(path: Option<&Path>, default_filter: &str) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let filter = build_filter(default_filter)?;
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("installing log subscriber: {e}"))
}

fn build_filter(default_filter: &str) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .with_context(|| format!("invalid log filter {default_filter:?}"))
}
