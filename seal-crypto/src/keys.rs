#![forbid(unsafe_code)]

//! Key material types. Everything here erases itself when dropped.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::util::constant_time_eq;

/// Fixed role of a peer. One end of a channel must be `Alice`, the other `Bob`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Alice,
    Bob,
}

impl Side {
    pub fn peer(self) -> Side {
        match self {
            Side::Alice => Side::Bob,
            Side::Bob => Side::Alice,
        }
    }
}

/// Raw shared secret agreed out of band.
#[derive(Clone)]
pub struct SessionKey(Zeroizing<Vec<u8>>);

impl SessionKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq(&self.0, &other.0)
    }
}

impl Eq for SessionKey {}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionKey({} bytes)", self.0.len())
    }
}

/// The four directional keys derived from one session key.
///
/// For a pair of peers sharing a session key, Alice's `send_*` keys equal
/// Bob's `recv_*` keys and vice versa.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ExtendedKeys {
    pub send_encrypt: Vec<u8>,
    pub recv_encrypt: Vec<u8>,
    pub send_sign: Vec<u8>,
    pub recv_sign: Vec<u8>,
}

impl ExtendedKeys {
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        [
            self.send_encrypt.as_slice(),
            self.recv_encrypt.as_slice(),
            self.send_sign.as_slice(),
            self.recv_sign.as_slice(),
        ]
        .into_iter()
    }

    /// True when every byte of every key is zero.
    pub fn is_erased(&self) -> bool {
        self.iter().all(|k| k.iter().all(|&b| b == 0))
    }
}

impl PartialEq for ExtendedKeys {
    fn eq(&self, other: &Self) -> bool {
        self.iter().zip(other.iter()).fold(true, |acc, (a, b)| acc & constant_time_eq(a, b))
    }
}

impl Eq for ExtendedKeys {}

impl fmt::Debug for ExtendedKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtendedKeys").finish_non_exhaustive()
    }
}

/// Overwrite every key byte with zero, keeping buffer lengths.
pub fn destroy_keys(keys: &mut ExtendedKeys) {
    keys.send_encrypt.as_mut_slice().zeroize();
    keys.recv_encrypt.as_mut_slice().zeroize();
    keys.send_sign.as_mut_slice().zeroize();
    keys.recv_sign.as_mut_slice().zeroize();
}

/// Keys are always derived from Alice's point of view; Bob swaps send and
/// receive so that each side's `send_*` matches the other side's `recv_*`.
pub fn swap_keys_for_bob(side: Side, mut keys: ExtendedKeys) -> ExtendedKeys {
    if side == Side::Bob {
        std::mem::swap(&mut keys.send_encrypt, &mut keys.recv_encrypt);
        std::mem::swap(&mut keys.send_sign, &mut keys.recv_sign);
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtendedKeys {
        ExtendedKeys {
            send_encrypt: vec![1; 32],
            recv_encrypt: vec![2; 32],
            send_sign: vec![3; 32],
            recv_sign: vec![4; 32],
        }
    }

    #[test]
    fn alice_keeps_order() {
        let keys = swap_keys_for_bob(Side::Alice, sample());
        assert_eq!(keys, sample());
    }

    #[test]
    fn bob_swaps_directions() {
        let keys = swap_keys_for_bob(Side::Bob, sample());
        assert_eq!(keys.send_encrypt, vec![2; 32]);
        assert_eq!(keys.recv_encrypt, vec![1; 32]);
        assert_eq!(keys.send_sign, vec![4; 32]);
        assert_eq!(keys.recv_sign, vec![3; 32]);
    }

    #[test]
    fn destroy_zeroes_in_place() {
        for len in [0usize, 1, 17, 32, 99] {
            let mut keys = ExtendedKeys {
                send_encrypt: vec![0xAA; len],
                recv_encrypt: vec![0xBB; len],
                send_sign: vec![0xCC; len],
                recv_sign: vec![0xDD; len],
            };
            destroy_keys(&mut keys);
            assert!(keys.is_erased());
            assert!(keys.iter().all(|k| k.len() == len));
        }
    }

    #[test]
    fn debug_output_hides_material() {
        let rendered = format!("{:?} {:?}", sample(), SessionKey::new(vec![0x41; 32]));
        assert!(!rendered.contains("65"));
        assert!(rendered.contains("32 bytes"));
    }

    #[test]
    fn peer_is_involution() {
        assert_eq!(Side::Alice.peer(), Side::Bob);
        assert_eq!(Side::Bob.peer().peer(), Side::Bob);
    }
}
