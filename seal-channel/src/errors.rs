#![forbid(unsafe_code)]

use seal_core::SealError;
use seal_crypto::PrimitiveError;
use thiserror::Error;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Channel error kinds.
///
/// None of the variants say *why* a message failed verification; a forged,
/// truncated or misframed message all surface as [`ChannelError::InvalidSignature`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("not enough data in input")]
    NotEnoughDataInInput,

    #[error("message counter exhausted, session key must be renegotiated")]
    NeedToRenegotiateKey,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("session state already reset")]
    AlreadyReset,

    #[error("received message out of sequence")]
    RecvMessageOutOfSequence,

    #[error("counter overflow")]
    CounterOverflow,

    #[error("message too large: {size} bytes exceeds {max}")]
    MessageTooLarge { size: u64, max: u64 },

    #[error("primitive error: {0}")]
    Primitive(PrimitiveError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl ChannelError {
    /// Fatal errors mean the channel must be abandoned or reset; the rest
    /// only fail the current call.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ChannelError::AlreadyReset
                | ChannelError::RecvMessageOutOfSequence
                | ChannelError::CounterOverflow
        )
    }
}

impl From<PrimitiveError> for ChannelError {
    fn from(err: PrimitiveError) -> Self {
        match err {
            PrimitiveError::CounterOverflow => ChannelError::CounterOverflow,
            PrimitiveError::InvalidSignature | PrimitiveError::InvalidPadding => {
                ChannelError::InvalidSignature
            }
            other => ChannelError::Primitive(other),
        }
    }
}

impl From<SealError> for ChannelError {
    fn from(err: SealError) -> Self {
        ChannelError::Config(err.to_string())
    }
}

impl From<std::io::Error> for ChannelError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            ChannelError::NotEnoughDataInInput
        } else {
            ChannelError::Io(err.to_string())
        }
    }
}
