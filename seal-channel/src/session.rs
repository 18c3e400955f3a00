#![forbid(unsafe_code)]

//! Session state: message counters plus the extended keys of one session.
//!
//! All access goes through one mutex, so a send path and a receive path on
//! different threads never race on key material, and two concurrent senders
//! never obtain the same message id.
//!
//! Counters:
//! * `send_counter` is the last issued id. Ids start at 1 and strictly
//!   increase; an id is spent even if the message using it is never sent.
//! * `recv_counter` is the last accepted id. A received id must be strictly
//!   greater. Gaps are fine, peers are not required to persist every value.
//!
//! Both stay below `max_messages_in_session`; reaching it means the session
//! key has to be renegotiated.

use std::sync::{Mutex, MutexGuard, PoisonError};

use seal_core::ChannelConfiguration;
use seal_crypto::{destroy_keys, ExtendedKeys};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ChannelError, ChannelResult};

/// Counter values an external loader persists across restarts.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub send_counter: u64,
    pub recv_counter: u64,
}

struct Inner {
    send_counter: u64,
    recv_counter: u64,
    keys: Option<ExtendedKeys>,
}

pub struct SessionState {
    config: ChannelConfiguration,
    inner: Mutex<Inner>,
}

impl SessionState {
    /// Fresh session with both counters at zero.
    pub fn new(config: ChannelConfiguration, keys: ExtendedKeys) -> Self {
        Self::restore(config, keys, SessionSnapshot::default())
    }

    /// Session continuing from persisted counters.
    pub fn restore(config: ChannelConfiguration, keys: ExtendedKeys, snapshot: SessionSnapshot) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                send_counter: snapshot.send_counter,
                recv_counter: snapshot.recv_counter,
                keys: Some(keys),
            }),
        }
    }

    pub fn configuration(&self) -> &ChannelConfiguration {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave counters half-updated,
        // every mutation is a single store.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ready(inner: &Inner) -> ChannelResult<()> {
        if inner.keys.is_none() {
            return Err(ChannelError::AlreadyReset);
        }
        Ok(())
    }

    /// Issue the next send id.
    pub fn get_send_message_number(&self) -> ChannelResult<u64> {
        let mut inner = self.lock();
        Self::issue(&mut inner, self.config.max_messages_in_session)
    }

    fn issue(inner: &mut Inner, max: u64) -> ChannelResult<u64> {
        Self::ready(inner)?;
        let next = inner
            .send_counter
            .checked_add(1)
            .filter(|&n| n < max)
            .ok_or(ChannelError::NeedToRenegotiateKey)?;
        inner.send_counter = next;
        Ok(next)
    }

    /// Issue the next send id and run `f` with it and the keys under the same
    /// guard, so concurrent senders finish in id order.
    ///
    /// The id stays spent if `f` fails.
    pub fn with_next_send_message<R>(
        &self,
        f: impl FnOnce(u64, &ExtendedKeys) -> ChannelResult<R>,
    ) -> ChannelResult<R> {
        let mut inner = self.lock();
        let next = Self::issue(&mut inner, self.config.max_messages_in_session)?;
        let keys = inner.keys.as_ref().ok_or(ChannelError::AlreadyReset)?;
        f(next, keys)
    }

    /// Accept `message_number` as the latest received id.
    ///
    /// Only call this for a message whose tag has already been verified,
    /// otherwise a forged id could push the window forward and lock out
    /// legitimate traffic.
    pub fn verify_recv_message_number(&self, message_number: u64) -> ChannelResult<()> {
        let mut inner = self.lock();
        Self::ready(&inner)?;
        if message_number <= inner.recv_counter {
            return Err(ChannelError::RecvMessageOutOfSequence);
        }
        if message_number >= self.config.max_messages_in_session {
            return Err(ChannelError::NeedToRenegotiateKey);
        }
        inner.recv_counter = message_number;
        Ok(())
    }

    /// Copy of the current keys. The copy erases itself on drop.
    pub fn get_extended_keys(&self) -> ChannelResult<ExtendedKeys> {
        let inner = self.lock();
        inner.keys.clone().ok_or(ChannelError::AlreadyReset)
    }

    /// Run `f` against the stored keys while holding the session lock.
    pub fn with_extended_keys<R>(
        &self,
        f: impl FnOnce(&ExtendedKeys) -> ChannelResult<R>,
    ) -> ChannelResult<R> {
        let inner = self.lock();
        let keys = inner.keys.as_ref().ok_or(ChannelError::AlreadyReset)?;
        f(keys)
    }

    pub fn snapshot(&self) -> ChannelResult<SessionSnapshot> {
        let inner = self.lock();
        Self::ready(&inner)?;
        Ok(SessionSnapshot { send_counter: inner.send_counter, recv_counter: inner.recv_counter })
    }

    /// Erase the keys and park both counters at the session limit.
    /// Idempotent.
    pub fn reset(&self) {
        let mut inner = self.lock();
        if Self::take_erased_keys(&mut inner).is_some() {
            debug!("session keys destroyed");
        }
        inner.send_counter = self.config.max_messages_in_session;
        inner.recv_counter = self.config.max_messages_in_session;
    }

    /// Zero the stored keys in place and detach them.
    fn take_erased_keys(inner: &mut Inner) -> Option<ExtendedKeys> {
        let mut keys = inner.keys.take()?;
        destroy_keys(&mut keys);
        Some(keys)
    }

    pub fn is_reset(&self) -> bool {
        self.lock().keys.is_none()
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SessionState")
            .field("send_counter", &inner.send_counter)
            .field("recv_counter", &inner.recv_counter)
            .field("reset", &inner.keys.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> ExtendedKeys {
        ExtendedKeys {
            send_encrypt: vec![1; 32],
            recv_encrypt: vec![2; 32],
            send_sign: vec![3; 32],
            recv_sign: vec![4; 32],
        }
    }

    fn state() -> SessionState {
        SessionState::new(ChannelConfiguration::default(), keys())
    }

    fn small(max: u64) -> SessionState {
        let config = ChannelConfiguration { max_messages_in_session: max, ..Default::default() };
        SessionState::new(config, keys())
    }

    #[test]
    fn extended_keys_are_returned() {
        assert_eq!(state().get_extended_keys().unwrap(), keys());
    }

    #[test]
    fn reset_blocks_every_operation() {
        let s = state();
        s.reset();
        assert_eq!(s.get_extended_keys().unwrap_err(), ChannelError::AlreadyReset);
        assert_eq!(s.get_send_message_number().unwrap_err(), ChannelError::AlreadyReset);
        assert_eq!(s.verify_recv_message_number(0).unwrap_err(), ChannelError::AlreadyReset);
        assert_eq!(s.snapshot().unwrap_err(), ChannelError::AlreadyReset);
        assert!(s.with_extended_keys(|_| Ok(())).is_err());
    }

    #[test]
    fn reset_twice_is_fine() {
        let s = state();
        s.reset();
        s.reset();
        assert!(s.is_reset());
    }

    #[test]
    fn reset_parks_counters_at_limit() {
        let s = state();
        s.reset();
        let inner = s.lock();
        assert_eq!(inner.send_counter, s.config.max_messages_in_session);
        assert_eq!(inner.recv_counter, s.config.max_messages_in_session);
        assert!(inner.keys.is_none());
    }

    #[test]
    fn reset_zeroes_stored_keys() {
        let s = state();
        let erased = SessionState::take_erased_keys(&mut s.lock()).unwrap();
        assert!(erased.is_erased());
        assert!(erased.iter().all(|k| k.len() == 32));
        assert!(s.is_reset());
        assert!(SessionState::take_erased_keys(&mut s.lock()).is_none());
    }

    #[test]
    fn next_send_message_sees_id_and_keys() {
        let s = state();
        let seen = s.with_next_send_message(|id, keys| Ok((id, keys.send_sign.clone()))).unwrap();
        assert_eq!(seen, (1, vec![3; 32]));
        assert_eq!(s.get_send_message_number().unwrap(), 2);
    }

    #[test]
    fn next_send_message_spends_id_on_failure() {
        let s = state();
        let err = s
            .with_next_send_message(|_, _| -> ChannelResult<()> { Err(ChannelError::InvalidSignature) })
            .unwrap_err();
        assert_eq!(err, ChannelError::InvalidSignature);
        assert_eq!(s.get_send_message_number().unwrap(), 2);
    }

    #[test]
    fn next_send_message_respects_limit_and_reset() {
        let s = small(2);
        s.with_next_send_message(|id, _| Ok(id)).unwrap();
        assert_eq!(s.with_next_send_message(|id, _| Ok(id)).unwrap_err(), ChannelError::NeedToRenegotiateKey);
        s.reset();
        assert_eq!(s.with_next_send_message(|id, _| Ok(id)).unwrap_err(), ChannelError::AlreadyReset);
    }

    #[test]
    fn send_numbers_start_at_one() {
        let s = state();
        assert_eq!(s.get_send_message_number().unwrap(), 1);
        assert_eq!(s.get_send_message_number().unwrap(), 2);
        assert_eq!(s.get_send_message_number().unwrap(), 3);
    }

    #[test]
    fn send_numbers_exhaust_exactly_at_limit() {
        let s = small(5);
        for expected in 1..5 {
            assert_eq!(s.get_send_message_number().unwrap(), expected);
        }
        assert_eq!(s.get_send_message_number().unwrap_err(), ChannelError::NeedToRenegotiateKey);
        assert_eq!(s.get_send_message_number().unwrap_err(), ChannelError::NeedToRenegotiateKey);
        assert_eq!(s.snapshot().unwrap().send_counter, 4);
    }

    #[test]
    fn restored_counter_past_limit_needs_renegotiation() {
        let config = ChannelConfiguration::default();
        let snap = SessionSnapshot { send_counter: config.max_messages_in_session + 1, recv_counter: 0 };
        let s = SessionState::restore(config, keys(), snap);
        assert_eq!(s.get_send_message_number().unwrap_err(), ChannelError::NeedToRenegotiateKey);

        let snap = SessionSnapshot { send_counter: u64::MAX, recv_counter: 0 };
        let s = SessionState::restore(config, keys(), snap);
        assert_eq!(s.get_send_message_number().unwrap_err(), ChannelError::NeedToRenegotiateKey);
    }

    #[test]
    fn recv_accepts_increasing_ids() {
        let s = state();
        s.verify_recv_message_number(1).unwrap();
        s.verify_recv_message_number(2).unwrap();
        s.verify_recv_message_number(3).unwrap();
    }

    #[test]
    fn recv_tolerates_gaps() {
        let s = state();
        s.verify_recv_message_number(1).unwrap();
        s.verify_recv_message_number(20).unwrap();
        s.verify_recv_message_number(30).unwrap();
    }

    #[test]
    fn recv_rejects_zero_first() {
        assert_eq!(
            state().verify_recv_message_number(0).unwrap_err(),
            ChannelError::RecvMessageOutOfSequence
        );
    }

    #[test]
    fn recv_rejects_repeat() {
        let s = state();
        s.verify_recv_message_number(1).unwrap();
        assert_eq!(s.verify_recv_message_number(1).unwrap_err(), ChannelError::RecvMessageOutOfSequence);
    }

    #[test]
    fn recv_rejects_older() {
        let s = state();
        s.verify_recv_message_number(10).unwrap();
        assert_eq!(s.verify_recv_message_number(1).unwrap_err(), ChannelError::RecvMessageOutOfSequence);
        s.verify_recv_message_number(11).unwrap();
    }

    #[test]
    fn recv_limit_needs_renegotiation() {
        let s = state();
        let max = s.config.max_messages_in_session;
        s.verify_recv_message_number(max - 1).unwrap();
        assert_eq!(s.verify_recv_message_number(max).unwrap_err(), ChannelError::NeedToRenegotiateKey);
    }

    #[test]
    fn snapshot_tracks_both_counters() {
        let s = state();
        s.get_send_message_number().unwrap();
        s.get_send_message_number().unwrap();
        s.verify_recv_message_number(7).unwrap();
        let snap = s.snapshot().unwrap();
        assert_eq!(snap, SessionSnapshot { send_counter: 2, recv_counter: 7 });

        let resumed = SessionState::restore(ChannelConfiguration::default(), keys(), snap);
        assert_eq!(resumed.get_send_message_number().unwrap(), 3);
        assert_eq!(
            resumed.verify_recv_message_number(7).unwrap_err(),
            ChannelError::RecvMessageOutOfSequence
        );
    }

    #[test]
    fn concurrent_senders_get_distinct_ids() {
        let s = state();
        let mut ids: Vec<u64> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| (0..250).map(|_| s.get_send_message_number().unwrap()).collect::<Vec<_>>()))
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });
        ids.sort_unstable();
        assert_eq!(ids, (1..=1000).collect::<Vec<u64>>());
    }
}
