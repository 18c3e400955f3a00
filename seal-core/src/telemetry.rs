#![forbid(unsafe_code)]

//! Tracing subscriber setup shared by binaries and tests.

use tracing::Level;

use crate::{SealConfig, SealError, SealResult};

/// Parse a verbosity string (`error` .. `trace`, case-insensitive).
pub fn parse_level(level: &str) -> SealResult<Level> {
    level
        .parse::<Level>()
        .map_err(|_| SealError::InvalidConfig(format!("unknown log level `{level}`")))
}

/// Install a global fmt subscriber at the given verbosity.
///
/// Calling this more than once is harmless: the first subscriber stays in
/// place and later calls return `Ok(())`.
pub fn init_tracing(level: &str) -> SealResult<()> {
    let level = parse_level(level)?;
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
    Ok(())
}

/// Install the subscriber described by `cfg.log_level` (`info` when unset).
pub fn init_from_config(cfg: &SealConfig) -> SealResult<()> {
    init_tracing(cfg.log_level.as_deref().unwrap_or("info"))
}
