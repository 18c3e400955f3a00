#![forbid(unsafe_code)]

//! Transport boundary.
//!
//! A [`DataSource`] moves whole [`Message`] records. How those records are laid
//! out on a byte stream is up to the implementation; see
//! [`crate::framing::StreamDataSource`] for the bundled length-prefixed layout.

use std::collections::VecDeque;

use crate::{ChannelError, ChannelResult, Message};

pub trait DataSource: Send {
    /// Write one message. Either the whole message is written or an error is returned.
    fn write(&mut self, message: Message) -> ChannelResult<()>;

    /// Read the next message.
    fn read(&mut self) -> ChannelResult<Message>;
}

impl<D: DataSource + ?Sized> DataSource for &mut D {
    fn write(&mut self, message: Message) -> ChannelResult<()> {
        (**self).write(message)
    }

    fn read(&mut self) -> ChannelResult<Message> {
        (**self).read()
    }
}

impl<D: DataSource + ?Sized> DataSource for Box<D> {
    fn write(&mut self, message: Message) -> ChannelResult<()> {
        (**self).write(message)
    }

    fn read(&mut self) -> ChannelResult<Message> {
        (**self).read()
    }
}

/// In-memory transport: reads pop from an inbound queue, writes append to an
/// outbound log. Used to wire two channels together in tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryDataSource {
    inbound: VecDeque<Message>,
    outbound: Vec<Message>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inbound<I: IntoIterator<Item = Message>>(messages: I) -> Self {
        Self { inbound: messages.into_iter().collect(), outbound: Vec::new() }
    }

    /// Queue a message for a later `read`.
    pub fn push_inbound(&mut self, message: Message) {
        self.inbound.push_back(message);
    }

    /// Replace the pending inbound queue.
    pub fn set_inbound<I: IntoIterator<Item = Message>>(&mut self, messages: I) {
        self.inbound = messages.into_iter().collect();
    }

    /// Messages not yet read, in read order.
    pub fn inbound(&self) -> impl Iterator<Item = &Message> {
        self.inbound.iter()
    }

    pub fn outbound(&self) -> &[Message] {
        &self.outbound
    }

    pub fn take_outbound(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.outbound)
    }
}

impl DataSource for MemoryDataSource {
    fn write(&mut self, message: Message) -> ChannelResult<()> {
        self.outbound.push(message);
        Ok(())
    }

    fn read(&mut self) -> ChannelResult<Message> {
        self.inbound.pop_front().ok_or(ChannelError::NotEnoughDataInInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: u64) -> Message {
        Message::new(id, vec![id as u8], vec![0; 16])
    }

    #[test]
    fn reads_in_queue_order() {
        let mut src = MemoryDataSource::with_inbound((1..=4).map(msg));
        let ids: Vec<u64> = (0..4).map(|_| src.read().unwrap().message_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn remaining_inbound_is_visible() {
        let mut src = MemoryDataSource::with_inbound((1..=4).map(msg));
        assert_eq!(src.read().unwrap().message_id, 1);
        let rest: Vec<u64> = src.inbound().map(|m| m.message_id).collect();
        assert_eq!(rest, vec![2, 3, 4]);
    }

    #[test]
    fn writes_are_logged() {
        let mut src = MemoryDataSource::new();
        for id in 1..=4 {
            src.write(msg(id)).unwrap();
        }
        assert_eq!(src.outbound().len(), 4);
        assert_eq!(src.take_outbound()[3].message_id, 4);
        assert!(src.outbound().is_empty());
    }

    #[test]
    fn replacing_inbound_discards_old_queue() {
        let mut src = MemoryDataSource::with_inbound((1..=4).map(msg));
        src.set_inbound([5, 6, 8, 7].into_iter().map(msg));
        let ids: Vec<u64> = (0..4).map(|_| src.read().unwrap().message_id).collect();
        assert_eq!(ids, vec![5, 6, 8, 7]);
    }

    #[test]
    fn empty_queue_reports_under_read() {
        let mut src = MemoryDataSource::new();
        assert_eq!(src.read().unwrap_err(), ChannelError::NotEnoughDataInInput);
    }
}
