#![forbid(unsafe_code)]

/// Wire record exchanged between peers.
///
/// `data` is the ciphertext of the plaintext (same length, no padding);
/// `hmac` is the ciphertext of the block-padded authentication tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message_id: u64,
    pub data: Vec<u8>,
    pub hmac: Vec<u8>,
}

impl Message {
    pub fn new(message_id: u64, data: Vec<u8>, hmac: Vec<u8>) -> Self {
        Self { message_id, data, hmac }
    }
}
