//! Segment sequences that cannot be decoded surface a typed error.

use morse_core::error::MorseError;
use morse_core::{Alphabet, TimedSegment, decode_segments};

#[test]
fn empty_capture_is_insufficient_sample() {
    let err = decode_segments(Vec::new(), Alphabet::international()).unwrap_err();
    match err.downcast_ref::<MorseError>() {
        Some(MorseError::InsufficientSample { signals: 0, gaps: 0 }) => {}
        other => panic!("expected InsufficientSample, got: {other:?}"),
    }
}

#[test]
fn only_boundary_artifacts_is_insufficient_sample() {
    let raw = vec![TimedSegment::boundary(1.0), TimedSegment::boundary(0.5)];
    let err = decode_segments(raw, Alphabet::international()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MorseError>(),
        Some(MorseError::InsufficientSample { .. })
    ));
}

#[test]
fn single_mark_without_gap_is_insufficient_sample() {
    let raw = vec![TimedSegment::signal(0.2)];
    let err = decode_segments(raw, Alphabet::international()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<MorseError>(),
        Some(&MorseError::InsufficientSample { signals: 1, gaps: 0 })
    );
    assert!(err.to_string().contains("insufficient sample"));
}
