#![forbid(unsafe_code)]

//! Seal configuration handling.
//!
//! Two configuration groups exist and they are deliberately kept apart:
//!
//! * [`ChannelConfiguration`] holds caller-tunable limits. Changing them never
//!   affects the security of the channel, only how long a session lasts and how
//!   much memory one message may take.
//! * [`ChannelCryptoConfiguration`] pins the protocol itself. Its serialised
//!   form ([`ChannelCryptoConfiguration::descriptor`]) is folded into every
//!   message tag, so two peers disagreeing on any field fail verification
//!   instead of misreading each other. Any change here must bump
//!   `protocol_version`.
//!
//! [`SealConfig`] ties both groups together with the logging verbosity and is
//! parsed from TOML.

use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, str::FromStr};

use crate::{SealError, SealResult};

/// Block cipher used in counter mode for payload and tag encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockCipher {
    #[serde(rename = "AES")]
    Aes,
}

impl BlockCipher {
    pub fn name(self) -> &'static str {
        match self {
            BlockCipher::Aes => "AES",
        }
    }

    /// Cipher block size in bytes.
    pub fn block_size(self) -> usize {
        match self {
            BlockCipher::Aes => 16,
        }
    }
}

impl fmt::Display for BlockCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockCipher {
    type Err = SealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AES" => Ok(BlockCipher::Aes),
            other => Err(SealError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Hash function used for key extension and HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA-256")]
    Sha256,
}

impl HashAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "SHA-256",
        }
    }

    /// Digest length in bytes.
    pub fn digest_size(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = SealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHA-256" => Ok(HashAlgorithm::Sha256),
            other => Err(SealError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Caller-tunable channel limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfiguration {
    /// Largest plaintext accepted by send/receive. Plaintext is held in memory
    /// until it has been verified, so this bounds per-message memory.
    pub max_message_size_bytes: u64,

    /// Number of message ids available in one session. Ids run from 1 to
    /// `max_messages_in_session - 1`; exhausting them requires a new session key.
    pub max_messages_in_session: u64,
}

impl Default for ChannelConfiguration {
    fn default() -> Self {
        Self {
            max_message_size_bytes: 268_435_456,
            max_messages_in_session: u32::MAX as u64,
        }
    }
}

impl ChannelConfiguration {
    pub fn validate(&self) -> SealResult<()> {
        if self.max_message_size_bytes == 0 {
            return Err(SealError::InvalidConfig(
                "max_message_size_bytes must be positive".to_string(),
            ));
        }
        if self.max_messages_in_session < 2 {
            return Err(SealError::InvalidConfig(
                "max_messages_in_session must allow at least one message".to_string(),
            ));
        }
        Ok(())
    }
}

/// Protocol-defining crypto parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelCryptoConfiguration {
    pub protocol_version: u32,
    /// Length of the raw shared session key.
    pub session_key_length_bytes: usize,
    pub block_cipher: BlockCipher,
    pub hash_algorithm: HashAlgorithm,
}

impl Default for ChannelCryptoConfiguration {
    fn default() -> Self {
        Self {
            protocol_version: 1,
            session_key_length_bytes: 32,
            block_cipher: BlockCipher::Aes,
            hash_algorithm: HashAlgorithm::Sha256,
        }
    }
}

impl ChannelCryptoConfiguration {
    /// Canonical serialised form bound into every authentication tag.
    ///
    /// CBOR map keyed by field name, in declaration order.
    pub fn descriptor(&self) -> SealResult<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }

    pub fn validate(&self) -> SealResult<()> {
        if self.session_key_length_bytes == 0 {
            return Err(SealError::InvalidConfig(
                "session_key_length_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SealConfig {
    /// Logging verbosity (`error`, `warn`, `info`, `debug`, `trace`).
    pub log_level: Option<String>,

    pub channel: ChannelConfiguration,

    pub crypto: ChannelCryptoConfiguration,
}

impl Default for SealConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            channel: ChannelConfiguration::default(),
            crypto: ChannelCryptoConfiguration::default(),
        }
    }
}

impl SealConfig {
    /// Parse and validate a TOML document.
    pub fn parse(data: &str) -> SealResult<Self> {
        let cfg = toml::from_str::<SealConfig>(data)?;
        cfg.channel.validate()?;
        cfg.crypto.validate()?;
        Ok(cfg)
    }

    /// Load a configuration file from the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> SealResult<Self> {
        let data = fs::read_to_string(&path)?;
        Self::parse(&data)
    }
}
