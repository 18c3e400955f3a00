#![forbid(unsafe_code)]

//! Seal cryptography layer.
//!
//! This crate provides:
//! 1. The primitive backend capability (see [`backend`]) and a RustCrypto
//!    implementation of it ([`rustcrypto`]).
//! 2. Counter formatting for the per-message keystream ([`counter`]).
//! 3. Directional key extension from a shared session key ([`kdf`]).
//! 4. Self-erasing key material types ([`keys`]).

pub mod backend;
pub mod counter;
mod error;
pub mod kdf;
pub mod keys;
pub mod rustcrypto;
pub mod util;

pub use backend::{Backend, CipherStream, Direction, Hash, Hmac};
pub use counter::{counter_block, format_counter};
pub use error::{PrimitiveError, PrimitiveResult};
pub use kdf::{HashKeyExtension, KeyExtension};
pub use keys::{destroy_keys, swap_keys_for_bob, ExtendedKeys, SessionKey, Side};
pub use rustcrypto::RustCryptoBackend;
pub use util::constant_time_eq;
