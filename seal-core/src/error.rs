#![forbid(unsafe_code)]

//! Common error type for Seal crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SealError {
    /// I/O related failures.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsing failures.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// CBOR encode errors (crypto configuration descriptor).
    #[error("CBOR encode error: {0}")]
    Cbor(#[from] serde_cbor::Error),

    /// A configuration value violates its documented bounds.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Algorithm name not known to this implementation.
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),
}

/// Convenient alias for results throughout Seal crates.
pub type SealResult<T> = Result<T, SealError>;
