#![forbid(unsafe_code)]
//! Seal secure channel layer.
//!
//! Two peers holding the same session key exchange authenticated,
//! encrypted, replay-resistant [`Message`] records through a [`DataSource`].
//! [`SecureChannel`] runs the pipeline, [`SessionState`] owns the counters
//! and keys, and a [`SessionKeyNegotiator`] produces the session.

mod channel;
mod data_source;
mod errors;
pub mod framing;
mod message;
mod negotiator;
mod session;

pub use channel::{ChannelPhase, SecureChannel};
pub use data_source::{DataSource, MemoryDataSource};
pub use errors::{ChannelError, ChannelResult};
pub use framing::{decode_message, encode_message, StreamDataSource};
pub use message::Message;
pub use negotiator::{PreSharedKeyNegotiator, SessionKeyNegotiator};
pub use session::{SessionSnapshot, SessionState};
