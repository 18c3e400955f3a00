#![forbid(unsafe_code)]

use std::io::{Read, Write};

use seal_core::ChannelConfiguration;

use crate::{ChannelError, ChannelResult, DataSource, Message};

/// Length-prefixed framing of [`Message`] over a blocking byte stream.
///
/// Frame format:
///   [u64 BE message id][u64 BE data length][data][u16 BE tag length][tag]
pub struct StreamDataSource<S> {
    stream: S,
    max_data_len: u64,
}

const ID_LEN: usize = 8;
const DATA_LEN_LEN: usize = 8;
const TAG_LEN_LEN: usize = 2;

impl<S> StreamDataSource<S> {
    pub fn new(stream: S, config: &ChannelConfiguration) -> Self {
        Self { stream, max_data_len: config.max_message_size_bytes }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

fn be_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(buf)
}

fn check_data_len(len: u64, max: u64) -> ChannelResult<usize> {
    if len > max {
        return Err(ChannelError::MessageTooLarge { size: len, max });
    }
    usize::try_from(len).map_err(|_| ChannelError::MessageTooLarge { size: len, max })
}

/// Serialise one frame.
pub fn encode_message(message: &Message) -> ChannelResult<Vec<u8>> {
    let tag_len = u16::try_from(message.hmac.len()).map_err(|_| ChannelError::MessageTooLarge {
        size: message.hmac.len() as u64,
        max: u16::MAX as u64,
    })?;
    let mut out =
        Vec::with_capacity(ID_LEN + DATA_LEN_LEN + message.data.len() + TAG_LEN_LEN + message.hmac.len());
    out.extend_from_slice(&message.message_id.to_be_bytes());
    out.extend_from_slice(&(message.data.len() as u64).to_be_bytes());
    out.extend_from_slice(&message.data);
    out.extend_from_slice(&tag_len.to_be_bytes());
    out.extend_from_slice(&message.hmac);
    Ok(out)
}

/// Parse one frame from the front of `buf`, returning it with the number of
/// bytes consumed. A truncated frame fails with `NotEnoughDataInInput`.
pub fn decode_message(buf: &[u8], max_data_len: u64) -> ChannelResult<(Message, usize)> {
    let mut pos = 0usize;
    let header = buf.get(..ID_LEN + DATA_LEN_LEN).ok_or(ChannelError::NotEnoughDataInInput)?;
    let message_id = be_u64(&header[..ID_LEN]);
    let data_len = check_data_len(be_u64(&header[ID_LEN..]), max_data_len)?;
    pos += header.len();

    let data_end = pos.checked_add(data_len).ok_or(ChannelError::NotEnoughDataInInput)?;
    let data = buf.get(pos..data_end).ok_or(ChannelError::NotEnoughDataInInput)?.to_vec();
    pos = data_end;

    let tag_len_bytes = buf.get(pos..pos + TAG_LEN_LEN).ok_or(ChannelError::NotEnoughDataInInput)?;
    let tag_len = u16::from_be_bytes([tag_len_bytes[0], tag_len_bytes[1]]) as usize;
    pos += TAG_LEN_LEN;

    let hmac = buf.get(pos..pos + tag_len).ok_or(ChannelError::NotEnoughDataInInput)?.to_vec();
    pos += tag_len;

    Ok((Message { message_id, data, hmac }, pos))
}

impl<S> DataSource for StreamDataSource<S>
where
    S: Read + Write + Send,
{
    fn write(&mut self, message: Message) -> ChannelResult<()> {
        let frame = encode_message(&message)?;
        self.stream.write_all(&frame)?;
        self.stream.flush()?;
        Ok(())
    }

    fn read(&mut self) -> ChannelResult<Message> {
        let mut header = [0u8; ID_LEN + DATA_LEN_LEN];
        self.stream.read_exact(&mut header)?;
        let message_id = be_u64(&header[..ID_LEN]);
        let data_len = check_data_len(be_u64(&header[ID_LEN..]), self.max_data_len)?;

        let mut data = vec![0u8; data_len];
        self.stream.read_exact(&mut data)?;

        let mut tag_len = [0u8; TAG_LEN_LEN];
        self.stream.read_exact(&mut tag_len)?;
        let mut hmac = vec![0u8; u16::from_be_bytes(tag_len) as usize];
        self.stream.read_exact(&mut hmac)?;

        Ok(Message { message_id, data, hmac })
    }
}
