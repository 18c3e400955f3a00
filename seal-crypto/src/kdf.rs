#![forbid(unsafe_code)]

//! Key extension: one session key in, four directional keys out.
//!
//! Each key is `Hash(label || session_key)` with a fixed per-direction label.
//! The byte order and the exact label bytes below are part of protocol
//! version 1; altering either changes every derived key. Note the lower-case
//! `s` in [`SIGN_BOB_TO_ALICE`], which is kept as-is for that reason.

use seal_core::HashAlgorithm;

use crate::backend::Backend;
use crate::keys::{swap_keys_for_bob, ExtendedKeys, Side};
use crate::rustcrypto::RustCryptoBackend;
use crate::PrimitiveResult;

pub const ENCRYPT_ALICE_TO_BOB: &[u8] = b"Encrypt Alice to Bob";
pub const ENCRYPT_BOB_TO_ALICE: &[u8] = b"Encrypt Bob to Alice";
pub const SIGN_ALICE_TO_BOB: &[u8] = b"Sign Alice to Bob";
pub const SIGN_BOB_TO_ALICE: &[u8] = b"sign Bob to Alice";

/// Derives directional keys from a shared session key.
///
/// Implementations must be pure: equal `(side, session_key)` inputs give
/// byte-identical output. The caller owns `session_key` and erases it.
pub trait KeyExtension: Send + Sync {
    fn extend_keys(&self, side: Side, session_key: &[u8]) -> PrimitiveResult<ExtendedKeys>;

    /// Length of each derived key in bytes.
    fn key_size(&self) -> usize;
}

/// Hash-based key extension over any [`Backend`].
#[derive(Debug, Clone)]
pub struct HashKeyExtension<B> {
    backend: B,
    hash: HashAlgorithm,
}

impl<B: Backend> HashKeyExtension<B> {
    pub fn new(backend: B, hash: HashAlgorithm) -> Self {
        Self { backend, hash }
    }

    fn derive(&self, label: &[u8], session_key: &[u8]) -> PrimitiveResult<Vec<u8>> {
        let mut h = self.backend.create_hash(self.hash)?;
        h.update(label);
        h.update(session_key);
        let mut digest = h.finalize();
        Ok(std::mem::take(&mut *digest))
    }
}

impl Default for HashKeyExtension<RustCryptoBackend> {
    fn default() -> Self {
        Self::new(RustCryptoBackend::new(), HashAlgorithm::Sha256)
    }
}

impl<B: Backend> KeyExtension for HashKeyExtension<B> {
    fn extend_keys(&self, side: Side, session_key: &[u8]) -> PrimitiveResult<ExtendedKeys> {
        let keys = ExtendedKeys {
            send_encrypt: self.derive(ENCRYPT_ALICE_TO_BOB, session_key)?,
            recv_encrypt: self.derive(ENCRYPT_BOB_TO_ALICE, session_key)?,
            send_sign: self.derive(SIGN_ALICE_TO_BOB, session_key)?,
            recv_sign: self.derive(SIGN_BOB_TO_ALICE, session_key)?,
        };
        Ok(swap_keys_for_bob(side, keys))
    }

    fn key_size(&self) -> usize {
        self.hash.digest_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use sha2::{Digest, Sha256};

    fn session_key() -> Vec<u8> {
        let mut sha = Sha256::new();
        sha.update(b"I love python and cryptography");
        sha.update(b"However I'm proficient in only one of the above");
        sha.finalize().to_vec()
    }

    #[test]
    fn key_size_matches_digest() {
        let kef = HashKeyExtension::default();
        let keys = kef.extend_keys(Side::Alice, &session_key()).unwrap();
        assert_eq!(kef.key_size(), 32);
        assert!(keys.iter().all(|k| k.len() == 32));
    }

    #[test]
    fn published_alice_vectors() {
        let keys = HashKeyExtension::default().extend_keys(Side::Alice, &session_key()).unwrap();
        assert_eq!(STANDARD.encode(&keys.send_sign), "glqgVpNp2pj0/gkvjVnGdUG1A/QipO25ex1HAsG3s3w=");
        assert_eq!(STANDARD.encode(&keys.send_encrypt), "e8/yw2pIRJm6s60Cg96vMo/ph03NM3WsXRmIQO5E5cA=");
        assert_eq!(STANDARD.encode(&keys.recv_encrypt), "XoVzhPAJDnhSl4922Z14vDLEAa/230tsWsMJ2iKjkG4=");
        assert_eq!(STANDARD.encode(&keys.recv_sign), "Dcg7jyAozdjA+vjeKMGqSR9rGF3wCn4j+iP/4YW4f1M=");
    }

    #[test]
    fn roles_are_mirrored() {
        let kef = HashKeyExtension::default();
        let alice = kef.extend_keys(Side::Alice, &session_key()).unwrap();
        let bob = kef.extend_keys(Side::Bob, &session_key()).unwrap();
        assert_eq!(alice.send_sign, bob.recv_sign);
        assert_eq!(alice.recv_sign, bob.send_sign);
        assert_eq!(alice.send_encrypt, bob.recv_encrypt);
        assert_eq!(alice.recv_encrypt, bob.send_encrypt);
    }

    #[test]
    fn label_is_hashed_before_key() {
        let key = session_key();
        let keys = HashKeyExtension::default().extend_keys(Side::Alice, &key).unwrap();
        let mut sha = Sha256::new();
        sha.update(SIGN_ALICE_TO_BOB);
        sha.update(&key);
        assert_eq!(keys.send_sign, sha.finalize().to_vec());
    }
}
