#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod telemetry;

pub use config::{
    BlockCipher, ChannelConfiguration, ChannelCryptoConfiguration, HashAlgorithm, SealConfig,
};
pub use error::{SealError, SealResult};
