#![forbid(unsafe_code)]

//! Backend built on the RustCrypto crates: SHA-256, HMAC-SHA256 and AES-256
//! in big-endian counter mode.

use aes::Aes256;
use cipher::{KeyIvInit, StreamCipher};
use hmac::Mac;
use seal_core::{BlockCipher, HashAlgorithm};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::backend::{Backend, CipherStream, Direction, Hash, Hmac};
use crate::{counter_block, PrimitiveError, PrimitiveResult};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;
type HmacSha256 = hmac::Hmac<Sha256>;

const AES256_KEY_LEN: usize = 32;
const AES_BLOCK_LEN: usize = 16;

/// Stateless handle; cheap to copy into every channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoBackend;

impl RustCryptoBackend {
    pub fn new() -> Self {
        Self
    }
}

struct Sha256Hash(Sha256);

impl Hash for Sha256Hash {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(Digest::finalize(self.0).to_vec())
    }

    fn digest_size(&self) -> usize {
        <Sha256 as Digest>::output_size()
    }
}

struct HmacSha256Mac(HmacSha256);

impl Hmac for HmacSha256Mac {
    fn update(&mut self, data: &[u8]) {
        Mac::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(Mac::finalize(self.0).into_bytes().to_vec())
    }

    fn verify(self: Box<Self>, expected: &[u8]) -> PrimitiveResult<()> {
        Mac::verify_slice(self.0, expected).map_err(|_| PrimitiveError::InvalidSignature)
    }
}

struct AesCtrStream {
    inner: Aes256Ctr,
    direction: Direction,
}

impl CipherStream for AesCtrStream {
    fn update(&mut self, buf: &mut [u8]) {
        self.inner.apply_keystream(buf);
    }

    fn block_size(&self) -> usize {
        AES_BLOCK_LEN
    }

    fn direction(&self) -> Direction {
        self.direction
    }
}

fn aes_ctr(key: &[u8], nonce: [u8; 16], direction: Direction) -> PrimitiveResult<Box<dyn CipherStream>> {
    let inner = Aes256Ctr::new_from_slices(key, &nonce).map_err(|_| PrimitiveError::InvalidKeyLength {
        expected: AES256_KEY_LEN,
        actual: key.len(),
    })?;
    Ok(Box::new(AesCtrStream { inner, direction }))
}

impl Backend for RustCryptoBackend {
    fn create_hash(&self, algorithm: HashAlgorithm) -> PrimitiveResult<Box<dyn Hash>> {
        match algorithm {
            HashAlgorithm::Sha256 => Ok(Box::new(Sha256Hash(Sha256::new()))),
        }
    }

    fn create_hmac(&self, key: &[u8], algorithm: HashAlgorithm) -> PrimitiveResult<Box<dyn Hmac>> {
        match algorithm {
            HashAlgorithm::Sha256 => {
                let mac = <HmacSha256 as Mac>::new_from_slice(key).map_err(|_| {
                    PrimitiveError::InvalidKeyLength { expected: algorithm.digest_size(), actual: key.len() }
                })?;
                Ok(Box::new(HmacSha256Mac(mac)))
            }
        }
    }

    fn create_cipher(
        &self,
        key: &[u8],
        counter: u64,
        cipher: BlockCipher,
        direction: Direction,
    ) -> PrimitiveResult<Box<dyn CipherStream>> {
        self.create_cipher_with_nonce(key, counter_block(counter, 0), cipher, direction)
    }

    fn create_cipher_with_nonce(
        &self,
        key: &[u8],
        nonce: [u8; 16],
        cipher: BlockCipher,
        direction: Direction,
    ) -> PrimitiveResult<Box<dyn CipherStream>> {
        match cipher {
            BlockCipher::Aes => aes_ctr(key, nonce, direction),
        }
    }
}
