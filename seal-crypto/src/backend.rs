#![forbid(unsafe_code)]

//! Primitive backend capability.
//!
//! The channel never touches raw AES or SHA code. It asks a [`Backend`] for a
//! hash, an HMAC or a counter-mode cipher stream and works through these
//! traits. Backends are passed into the channel explicitly; there is no
//! process-wide default.

use std::sync::Arc;

use seal_core::{BlockCipher, HashAlgorithm};
use zeroize::Zeroizing;

use crate::{util, PrimitiveResult};

/// Which way a cipher stream is used. Counter mode is symmetric, the value is
/// informational for backends that care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// Incremental hash.
pub trait Hash: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self: Box<Self>) -> Zeroizing<Vec<u8>>;
    fn digest_size(&self) -> usize;
}

/// Incremental keyed MAC.
pub trait Hmac: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self: Box<Self>) -> Zeroizing<Vec<u8>>;

    /// Constant-time check of the accumulated MAC against `expected`.
    /// Fails with [`crate::PrimitiveError::InvalidSignature`].
    fn verify(self: Box<Self>, expected: &[u8]) -> PrimitiveResult<()>;
}

/// Stateful keystream. Successive `update` calls continue the same keystream,
/// so two buffers processed back to back behave like one concatenated buffer.
pub trait CipherStream: Send {
    /// Encrypt or decrypt `buf` in place.
    fn update(&mut self, buf: &mut [u8]);

    fn block_size(&self) -> usize;

    fn direction(&self) -> Direction;

    fn pad(&self, data: &[u8]) -> Zeroizing<Vec<u8>> {
        util::pad(data, self.block_size())
    }

    fn unpad(&self, data: &[u8]) -> PrimitiveResult<Zeroizing<Vec<u8>>> {
        util::unpad(data, self.block_size())
    }
}

pub trait Backend: Send + Sync {
    fn create_hash(&self, algorithm: HashAlgorithm) -> PrimitiveResult<Box<dyn Hash>>;

    fn create_hmac(&self, key: &[u8], algorithm: HashAlgorithm) -> PrimitiveResult<Box<dyn Hmac>>;

    /// Counter-mode stream whose initial counter block is
    /// [`crate::counter_block`]`(counter, 0)`.
    fn create_cipher(
        &self,
        key: &[u8],
        counter: u64,
        cipher: BlockCipher,
        direction: Direction,
    ) -> PrimitiveResult<Box<dyn CipherStream>>;

    /// Counter-mode stream starting from an arbitrary 128-bit counter block.
    fn create_cipher_with_nonce(
        &self,
        key: &[u8],
        nonce: [u8; 16],
        cipher: BlockCipher,
        direction: Direction,
    ) -> PrimitiveResult<Box<dyn CipherStream>>;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn create_hash(&self, algorithm: HashAlgorithm) -> PrimitiveResult<Box<dyn Hash>> {
        (**self).create_hash(algorithm)
    }

    fn create_hmac(&self, key: &[u8], algorithm: HashAlgorithm) -> PrimitiveResult<Box<dyn Hmac>> {
        (**self).create_hmac(key, algorithm)
    }

    fn create_cipher(
        &self,
        key: &[u8],
        counter: u64,
        cipher: BlockCipher,
        direction: Direction,
    ) -> PrimitiveResult<Box<dyn CipherStream>> {
        (**self).create_cipher(key, counter, cipher, direction)
    }

    fn create_cipher_with_nonce(
        &self,
        key: &[u8],
        nonce: [u8; 16],
        cipher: BlockCipher,
        direction: Direction,
    ) -> PrimitiveResult<Box<dyn CipherStream>> {
        (**self).create_cipher_with_nonce(key, nonce, cipher, direction)
    }
}

impl<B: Backend + ?Sized> Backend for &B {
    fn create_hash(&self, algorithm: HashAlgorithm) -> PrimitiveResult<Box<dyn Hash>> {
        (**self).create_hash(algorithm)
    }

    fn create_hmac(&self, key: &[u8], algorithm: HashAlgorithm) -> PrimitiveResult<Box<dyn Hmac>> {
        (**self).create_hmac(key, algorithm)
    }

    fn create_cipher(
        &self,
        key: &[u8],
        counter: u64,
        cipher: BlockCipher,
        direction: Direction,
    ) -> PrimitiveResult<Box<dyn CipherStream>> {
        (**self).create_cipher(key, counter, cipher, direction)
    }

    fn create_cipher_with_nonce(
        &self,
        key: &[u8],
        nonce: [u8; 16],
        cipher: BlockCipher,
        direction: Direction,
    ) -> PrimitiveResult<Box<dyn CipherStream>> {
        (**self).create_cipher_with_nonce(key, nonce, cipher, direction)
    }
}
