#![no_main]

use attackline::transport::PeerMessage;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any datagram may arrive from the network; parsing and decoding must
    // reject bad input without panicking.
    if let Ok(message) = PeerMessage::from_json(data) {
        let _ = message.decode();
        let _ = message.to_json();
    }
});
