#![no_main]

use aromix_core::{validate, Command, Limits, FRAME_LEN};
use libfuzzer_sys::fuzz_target;

// Decode + validate must never panic, and the codec must round-trip
// every frame byte-for-byte.
fuzz_target!(|data: &[u8]| {
    if data.len() < FRAME_LEN {
        return;
    }
    let mut frame = [0u8; FRAME_LEN];
    frame.copy_from_slice(&data[..FRAME_LEN]);

    let cmd = Command::decode(&frame);
    assert_eq!(cmd.encode(), frame);

    let limits = Limits::default();
    if let Ok(valid) = validate(&cmd, &limits) {
        // Anything that validates carries a self-consistent checksum.
        assert_eq!(valid.command().compute_checksum(), valid.command().checksum);
    }
});
