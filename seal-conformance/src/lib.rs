#![forbid(unsafe_code)]
//! Shared fixtures for the conformance suite.

use seal_channel::{ChannelResult, MemoryDataSource, PreSharedKeyNegotiator, SecureChannel};
use seal_core::{ChannelConfiguration, ChannelCryptoConfiguration};
use seal_crypto::{RustCryptoBackend, Side};

pub type MemoryChannel = SecureChannel<MemoryDataSource, RustCryptoBackend>;

/// Session key used by most scenarios.
pub const TEST_KEY: [u8; 32] = [0x42; 32];

pub fn memory_channel(
    key: &[u8],
    side: Side,
    config: ChannelConfiguration,
    crypto: ChannelCryptoConfiguration,
) -> ChannelResult<MemoryChannel> {
    let negotiator = PreSharedKeyNegotiator::new(key, side, &crypto)?;
    SecureChannel::with_configuration(MemoryDataSource::new(), RustCryptoBackend::new(), &negotiator, config, crypto)
}

/// Alice and Bob sharing `key` with the given limits.
pub fn memory_pair_with(key: &[u8], config: ChannelConfiguration) -> ChannelResult<(MemoryChannel, MemoryChannel)> {
    let crypto = ChannelCryptoConfiguration::default();
    Ok((
        memory_channel(key, Side::Alice, config, crypto.clone())?,
        memory_channel(key, Side::Bob, config, crypto)?,
    ))
}

pub fn memory_pair() -> ChannelResult<(MemoryChannel, MemoryChannel)> {
    memory_pair_with(&TEST_KEY, ChannelConfiguration::default())
}

/// Move every message written by `from` into the inbound queue of `to`.
/// Returns the number of messages moved.
pub fn deliver(from: &mut MemoryChannel, to: &mut MemoryChannel) -> usize {
    let messages = from.data_source_mut().take_outbound();
    let count = messages.len();
    for message in messages {
        to.data_source_mut().push_inbound(message);
    }
    count
}
