#![forbid(unsafe_code)]

//! Counter encoding for the message keystream.
//!
//! Each message id seeds its own 128-bit counter block: the high 64 bits are
//! the big-endian message id, the low 64 bits the big-endian block index
//! starting at zero. Ids never repeat under one key, so no two messages share
//! keystream.

use crate::{PrimitiveError, PrimitiveResult};

/// Encode `value` as 8 big-endian bytes, failing if it does not fit in `u64`.
pub fn format_counter<T: TryInto<u64>>(value: T) -> PrimitiveResult<[u8; 8]> {
    let value: u64 = value.try_into().map_err(|_| PrimitiveError::CounterOverflow)?;
    Ok(value.to_be_bytes())
}

/// Counter block for block `block_index` of message `message_id`.
pub fn counter_block(message_id: u64, block_index: u64) -> [u8; 16] {
    let mut block = [0u8; 16];
    block[..8].copy_from_slice(&message_id.to_be_bytes());
    block[8..].copy_from_slice(&block_index.to_be_bytes());
    block
}
