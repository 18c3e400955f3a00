#![no_main]

use libfuzzer_sys::fuzz_target;
use seal_channel::{decode_message, ChannelPhase, MemoryDataSource, PreSharedKeyNegotiator, SecureChannel};
use seal_core::ChannelCryptoConfiguration;
use seal_crypto::{RustCryptoBackend, Side};

// Arbitrary frames must never open and never move the receive counter.
fuzz_target!(|data: &[u8]| {
    let Ok((message, _)) = decode_message(data, 1 << 20) else {
        return;
    };

    let crypto = ChannelCryptoConfiguration::default();
    let negotiator = PreSharedKeyNegotiator::new(&[0x42; 32], Side::Bob, &crypto).expect("key length");
    let bob = SecureChannel::new(MemoryDataSource::new(), RustCryptoBackend::new(), &negotiator)
        .expect("default channel");

    assert!(bob.open(message).is_err());
    assert_eq!(bob.session().snapshot().expect("not reset").recv_counter, 0);
    assert_eq!(bob.phase(), ChannelPhase::Active);
});
