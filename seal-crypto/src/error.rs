#![forbid(unsafe_code)]

use thiserror::Error;

/// Failures raised by primitive backends and the helpers around them.
///
/// Variants carry no positional detail: a failed verification says only that
/// it failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    #[error("algorithm not supported by this backend: {0}")]
    UnsupportedAlgorithm(&'static str),

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("counter overflow")]
    CounterOverflow,

    #[error("invalid padding")]
    InvalidPadding,

    #[error("authentication failed")]
    InvalidSignature,
}

pub type PrimitiveResult<T> = Result<T, PrimitiveError>;
