#![forbid(unsafe_code)]

//! Session-key negotiation boundary.
//!
//! A negotiator turns "a transport plus a configuration" into a ready
//! [`SessionState`]. Real deployments would run a handshake over the data
//! source; the bundled [`PreSharedKeyNegotiator`] ignores the transport and
//! expands a key both peers already hold.

use seal_core::{ChannelConfiguration, ChannelCryptoConfiguration};
use seal_crypto::{HashKeyExtension, KeyExtension, RustCryptoBackend, SessionKey, Side};
use tracing::debug;

use crate::{ChannelError, ChannelResult, DataSource, SessionState};

pub trait SessionKeyNegotiator {
    fn create_session_state(
        &self,
        source: &mut dyn DataSource,
        config: &ChannelConfiguration,
    ) -> ChannelResult<SessionState>;
}

impl<N: SessionKeyNegotiator + ?Sized> SessionKeyNegotiator for &N {
    fn create_session_state(
        &self,
        source: &mut dyn DataSource,
        config: &ChannelConfiguration,
    ) -> ChannelResult<SessionState> {
        (**self).create_session_state(source, config)
    }
}

/// Negotiator for a key agreed out of band.
pub struct PreSharedKeyNegotiator<K = HashKeyExtension<RustCryptoBackend>> {
    key: SessionKey,
    side: Side,
    extension: K,
}

impl PreSharedKeyNegotiator {
    /// Hash-based extension over the RustCrypto backend, using the hash named
    /// in `crypto`.
    pub fn new(key: &[u8], side: Side, crypto: &ChannelCryptoConfiguration) -> ChannelResult<Self> {
        let extension = HashKeyExtension::new(RustCryptoBackend::new(), crypto.hash_algorithm);
        Self::with_key_extension(key, side, crypto, extension)
    }
}

impl<K: KeyExtension> PreSharedKeyNegotiator<K> {
    pub fn with_key_extension(
        key: &[u8],
        side: Side,
        crypto: &ChannelCryptoConfiguration,
        extension: K,
    ) -> ChannelResult<Self> {
        if key.len() != crypto.session_key_length_bytes {
            return Err(ChannelError::Config(format!(
                "session key must be {} bytes, got {}",
                crypto.session_key_length_bytes,
                key.len()
            )));
        }
        Ok(Self { key: SessionKey::from_slice(key), side, extension })
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Fresh copy of the pre-shared key. Dropping it erases only that copy.
    pub fn create_session_key(&self) -> SessionKey {
        self.key.clone()
    }
}

impl<K: KeyExtension> SessionKeyNegotiator for PreSharedKeyNegotiator<K> {
    fn create_session_state(
        &self,
        _source: &mut dyn DataSource,
        config: &ChannelConfiguration,
    ) -> ChannelResult<SessionState> {
        let session_key = self.create_session_key();
        let keys = self.extension.extend_keys(self.side, session_key.as_bytes())?;
        drop(session_key);
        debug!(side = ?self.side, peer = ?self.side.peer(), "session keys extended from pre-shared key");
        Ok(SessionState::new(*config, keys))
    }
}

impl<K> std::fmt::Debug for PreSharedKeyNegotiator<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreSharedKeyNegotiator").field("side", &self.side).finish_non_exhaustive()
    }
}
