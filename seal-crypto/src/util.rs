#![forbid(unsafe_code)]

//! Constant-time comparison and PKCS#7 block padding.

use zeroize::Zeroizing;

use crate::{PrimitiveError, PrimitiveResult};

/// Compare two buffers without an early exit. Unequal lengths compare false.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    constant_time_eq::constant_time_eq(a, b)
}

/// PKCS#7 pad `data` to a multiple of `block_size`. Always adds 1..=block_size bytes.
pub fn pad(data: &[u8], block_size: usize) -> Zeroizing<Vec<u8>> {
    debug_assert!((1..=255).contains(&block_size));
    let fill = block_size - data.len() % block_size;
    let mut out = Zeroizing::new(Vec::with_capacity(data.len() + fill));
    out.extend_from_slice(data);
    out.resize(data.len() + fill, fill as u8);
    out
}

/// Strip PKCS#7 padding.
pub fn unpad(data: &[u8], block_size: usize) -> PrimitiveResult<Zeroizing<Vec<u8>>> {
    if data.is_empty() || data.len() % block_size != 0 {
        return Err(PrimitiveError::InvalidPadding);
    }
    let fill = data[data.len() - 1] as usize;
    if fill == 0 || fill > block_size {
        return Err(PrimitiveError::InvalidPadding);
    }
    let (body, tail) = data.split_at(data.len() - fill);
    let mismatch = tail.iter().fold(0u8, |acc, b| acc | (b ^ fill as u8));
    if mismatch != 0 {
        return Err(PrimitiveError::InvalidPadding);
    }
    Ok(Zeroizing::new(body.to_vec()))
}
