#![forbid(unsafe_code)]

//! Secure channel engine.
//!
//! Send path for plaintext `p` with message id `n`:
//!
//! ```text
//! tag   = HMAC(send_sign, BE64(n) | BE64(len d) | d | BE64(len p) | p)
//! ks    = CTR(send_encrypt, counter block BE64(n) | BE64(0))
//! data  = p ^ ks[..len p]
//! hmac  = pad(tag) ^ ks[len p..]
//! ```
//!
//! where `d` is the crypto configuration descriptor. Receive runs the same
//! keystream under `recv_encrypt`, recomputes the tag under `recv_sign` and
//! only then accepts the message id.

use std::sync::{Mutex, PoisonError};

use seal_core::{ChannelConfiguration, ChannelCryptoConfiguration};
use seal_crypto::{constant_time_eq, format_counter, Backend, Direction, ExtendedKeys};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::{ChannelError, ChannelResult, DataSource, Message, SessionKeyNegotiator, SessionState};

/// Lifecycle of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelPhase {
    /// Normal operation.
    Active,
    /// The message-id budget ran out. Only [`SecureChannel::replace_session`]
    /// or [`SecureChannel::reset`] are useful from here.
    Exhausted,
    /// Terminal.
    Reset,
}

pub struct SecureChannel<D, B> {
    data_source: D,
    backend: B,
    config: ChannelConfiguration,
    crypto: ChannelCryptoConfiguration,
    descriptor: Vec<u8>,
    session: SessionState,
    phase: Mutex<ChannelPhase>,
}

impl<D: DataSource, B: Backend> SecureChannel<D, B> {
    /// Channel with default limits and protocol version 1 crypto settings.
    pub fn new<N>(data_source: D, backend: B, negotiator: &N) -> ChannelResult<Self>
    where
        N: SessionKeyNegotiator + ?Sized,
    {
        Self::with_configuration(
            data_source,
            backend,
            negotiator,
            ChannelConfiguration::default(),
            ChannelCryptoConfiguration::default(),
        )
    }

    pub fn with_configuration<N>(
        mut data_source: D,
        backend: B,
        negotiator: &N,
        config: ChannelConfiguration,
        crypto: ChannelCryptoConfiguration,
    ) -> ChannelResult<Self>
    where
        N: SessionKeyNegotiator + ?Sized,
    {
        config.validate()?;
        crypto.validate()?;
        let descriptor = crypto.descriptor()?;
        let session = negotiator.create_session_state(&mut data_source, &config)?;
        debug!(protocol_version = crypto.protocol_version, "secure channel created");
        Ok(Self {
            data_source,
            backend,
            config,
            crypto,
            descriptor,
            session,
            phase: Mutex::new(ChannelPhase::Active),
        })
    }

    /// Seal `plaintext` and write it to the data source. Returns the message id.
    pub fn send_message(&mut self, plaintext: &[u8]) -> ChannelResult<u64> {
        let message = self.seal(plaintext)?;
        let id = message.message_id;
        self.data_source.write(message)?;
        Ok(id)
    }

    /// Read one message from the data source and open it.
    pub fn receive_message(&mut self) -> ChannelResult<Zeroizing<Vec<u8>>> {
        self.ensure_active()?;
        let message = self.data_source.read()?;
        self.open(message)
    }

    /// Swap in a freshly negotiated session. The old session's keys are
    /// destroyed. Allowed from `Active` and `Exhausted`.
    pub fn replace_session<N>(&mut self, negotiator: &N) -> ChannelResult<()>
    where
        N: SessionKeyNegotiator + ?Sized,
    {
        if self.phase() == ChannelPhase::Reset {
            return Err(ChannelError::AlreadyReset);
        }
        let fresh = negotiator.create_session_state(&mut self.data_source, &self.config)?;
        let old = std::mem::replace(&mut self.session, fresh);
        old.reset();
        self.set_phase(ChannelPhase::Active);
        info!("session replaced");
        Ok(())
    }
}

impl<D, B: Backend> SecureChannel<D, B> {
    /// Run the send pipeline without touching the data source.
    ///
    /// The message id is spent as soon as it is issued, even if a later step
    /// fails.
    pub fn seal(&self, plaintext: &[u8]) -> ChannelResult<Message> {
        self.ensure_active()?;
        self.check_size(plaintext.len())?;
        let message = self.track(
            self.session.with_next_send_message(|message_id, keys| self.encrypt(keys, message_id, plaintext)),
        )?;
        debug!(message_id = message.message_id, len = plaintext.len(), "message sealed");
        Ok(message)
    }

    /// Run the receive pipeline on a message obtained elsewhere.
    ///
    /// The receive counter moves only when the tag verifies.
    pub fn open(&self, message: Message) -> ChannelResult<Zeroizing<Vec<u8>>> {
        self.ensure_active()?;
        self.check_size(message.data.len())?;
        let message_id = message.message_id;

        let block = self.crypto.block_cipher.block_size();
        if message.hmac.is_empty() || message.hmac.len() % block != 0 {
            warn!(message_id, "rejected message: malformed tag field");
            return Err(ChannelError::InvalidSignature);
        }

        let plaintext = self
            .session
            .with_extended_keys(|keys| self.decrypt(keys, message))
            .map_err(|err| {
                warn!(message_id, error = %err, "rejected message");
                err
            })?;

        self.track(self.session.verify_recv_message_number(message_id)).map_err(|err| {
            warn!(message_id, error = %err, "rejected message id");
            err
        })?;
        debug!(message_id, len = plaintext.len(), "message opened");
        Ok(plaintext)
    }

    /// Destroy the session keys and move to the terminal phase. Idempotent.
    pub fn reset(&self) {
        self.session.reset();
        if self.phase() != ChannelPhase::Reset {
            self.set_phase(ChannelPhase::Reset);
            info!("secure channel reset");
        }
    }

    pub fn phase(&self) -> ChannelPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &ChannelConfiguration {
        &self.config
    }

    pub fn crypto_config(&self) -> &ChannelCryptoConfiguration {
        &self.crypto
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn data_source(&self) -> &D {
        &self.data_source
    }

    pub fn data_source_mut(&mut self) -> &mut D {
        &mut self.data_source
    }

    fn set_phase(&self, phase: ChannelPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
    }

    fn ensure_active(&self) -> ChannelResult<()> {
        match self.phase() {
            ChannelPhase::Active => Ok(()),
            ChannelPhase::Exhausted => Err(ChannelError::NeedToRenegotiateKey),
            ChannelPhase::Reset => Err(ChannelError::AlreadyReset),
        }
    }

    fn check_size(&self, len: usize) -> ChannelResult<()> {
        let max = self.config.max_message_size_bytes;
        let size = len as u64;
        if size > max {
            return Err(ChannelError::MessageTooLarge { size, max });
        }
        Ok(())
    }

    /// Move to `Exhausted` when the session reports its id budget is gone.
    fn track<T>(&self, result: ChannelResult<T>) -> ChannelResult<T> {
        if let Err(ChannelError::NeedToRenegotiateKey) = &result {
            let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
            if *phase == ChannelPhase::Active {
                *phase = ChannelPhase::Exhausted;
                info!("session exhausted, key renegotiation required");
            }
        }
        result
    }

    fn compute_tag(&self, sign_key: &[u8], message_id: u64, plaintext: &[u8]) -> ChannelResult<Zeroizing<Vec<u8>>> {
        let mut mac = self.backend.create_hmac(sign_key, self.crypto.hash_algorithm)?;
        mac.update(&format_counter(message_id)?);
        mac.update(&format_counter(self.descriptor.len())?);
        mac.update(&self.descriptor);
        mac.update(&format_counter(plaintext.len())?);
        mac.update(plaintext);
        Ok(mac.finalize())
    }

    fn encrypt(&self, keys: &ExtendedKeys, message_id: u64, plaintext: &[u8]) -> ChannelResult<Message> {
        let tag = self.compute_tag(&keys.send_sign, message_id, plaintext)?;
        let mut stream = self.backend.create_cipher(
            &keys.send_encrypt,
            message_id,
            self.crypto.block_cipher,
            Direction::Encrypt,
        )?;

        let mut data = plaintext.to_vec();
        stream.update(&mut data);
        let mut hmac = stream.pad(&tag).to_vec();
        stream.update(&mut hmac);
        Ok(Message { message_id, data, hmac })
    }

    fn decrypt(&self, keys: &ExtendedKeys, message: Message) -> ChannelResult<Zeroizing<Vec<u8>>> {
        let Message { message_id, data, hmac } = message;
        let mut stream = self.backend.create_cipher(
            &keys.recv_encrypt,
            message_id,
            self.crypto.block_cipher,
            Direction::Decrypt,
        )?;

        let mut plaintext = Zeroizing::new(data);
        let mut received = Zeroizing::new(hmac);
        stream.update(&mut plaintext);
        stream.update(&mut received);

        let expected = self.compute_tag(&keys.recv_sign, message_id, &plaintext)?;
        if !constant_time_eq(&stream.pad(&expected), &received) {
            return Err(ChannelError::InvalidSignature);
        }
        Ok(plaintext)
    }
}

impl<D, B> std::fmt::Debug for SecureChannel<D, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureChannel")
            .field("config", &self.config)
            .field("crypto", &self.crypto)
            .field("session", &self.session)
            .field("phase", &*self.phase.lock().unwrap_or_else(PoisonError::into_inner))
            .finish_non_exhaustive()
    }
}
