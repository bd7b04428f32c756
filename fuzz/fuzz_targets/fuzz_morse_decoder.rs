#![no_main]
use libfuzzer_sys::fuzz_target;
use morse_core::{Alphabet, TimedSegment, decode_message, to_morse};

fuzz_target!(|data: &[u8]| {
    // Arbitrary strings through the text decoder
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = decode_message(s, Alphabet::international());
    }

    // Arbitrary alternating signal/gap durations through the classifier
    let segments: Vec<TimedSegment> = data
        .chunks(2)
        .enumerate()
        .map(|(i, c)| {
            let d = f64::from(u16::from_le_bytes([c[0], *c.get(1).unwrap_or(&0)])) / 1000.0;
            if i % 2 == 0 {
                TimedSegment::signal(d)
            } else {
                TimedSegment::gap(d)
            }
        })
        .collect();
    if let Ok(transcript) = to_morse(&segments) {
        assert!(transcript.morse.chars().all(|c| matches!(c, '.' | '-' | ' ')));
        let _ = decode_message(&transcript.morse, Alphabet::international());
    }
});
