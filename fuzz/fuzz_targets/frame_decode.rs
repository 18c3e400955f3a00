#![no_main]

use libfuzzer_sys::fuzz_target;
use seal_channel::{decode_message, encode_message};

// Arbitrary bytes through the stream framing. A frame that decodes must
// re-encode to exactly the bytes it was decoded from.
fuzz_target!(|data: &[u8]| {
    if let Ok((message, consumed)) = decode_message(data, 1 << 20) {
        let encoded = encode_message(&message).expect("decoded tag fits u16");
        assert_eq!(&encoded[..], &data[..consumed]);
    }
});
