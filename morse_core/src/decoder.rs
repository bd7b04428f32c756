//! Threshold-based morse classification.
//!
//! Thresholds come from the captured sample alone: the dash threshold is the
//! midpoint of the shortest and longest signal, the gap threshold the midpoint
//! of the shortest and longest gap left after outlier filtering. A gap removed
//! as an outlier is read as a word break.

use crate::alphabet::Alphabet;
use crate::error::{MorseError, Result};
use crate::postprocess::remove_outliers;
use crate::types::{Category, TimedSegment};

/// Separator between letters in a morse string.
pub const LETTER_SEP: &str = " ";
/// Separator between words in a morse string.
pub const WORD_SEP: &str = "   ";

/// Per-run classification cutoffs, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Signals shorter than this are dots, the rest dashes.
    pub dash_s: f64,
    /// Gaps shorter than this stay inside a letter, the rest end it.
    pub gap_s: f64,
}

/// Morse string produced from a segment sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub morse: String,
    pub thresholds: Thresholds,
}

fn midpoint(values: &[f64]) -> Option<f64> {
    let min = values.iter().copied().reduce(f64::min)?;
    let max = values.iter().copied().reduce(f64::max)?;
    Some((min + max) / 2.0)
}

fn durations(segments: &[TimedSegment], category: Category) -> Vec<f64> {
    segments
        .iter()
        .filter(|s| s.category == category)
        .map(|s| s.duration_s)
        .collect()
}

/// Compute thresholds and return them with the outlier-filtered gap durations.
pub fn compute_thresholds(segments: &[TimedSegment]) -> Result<(Thresholds, Vec<f64>)> {
    let signals = durations(segments, Category::Signal);
    let gaps = remove_outliers(&durations(segments, Category::Gap));
    match (midpoint(&signals), midpoint(&gaps)) {
        (Some(dash_s), Some(gap_s)) => Ok((Thresholds { dash_s, gap_s }, gaps)),
        _ => Err(eyre::Report::new(MorseError::InsufficientSample {
            signals: signals.len(),
            gaps: gaps.len(),
        })),
    }
}

/// Classify a cleaned segment sequence into a morse string.
///
/// Boundary artifacts left in the input are skipped.
pub fn to_morse(segments: &[TimedSegment]) -> Result<Transcript> {
    let (thresholds, kept_gaps) = compute_thresholds(segments)?;
    // Exact membership: a duration equal to any kept gap counts as kept.
    let kept = |d: f64| kept_gaps.iter().any(|g| g.to_bits() == d.to_bits());

    let mut morse = String::new();
    for seg in segments {
        match seg.category {
            Category::Signal if seg.duration_s < thresholds.dash_s => morse.push('.'),
            Category::Signal => morse.push('-'),
            Category::Gap if !kept(seg.duration_s) => morse.push_str(WORD_SEP),
            Category::Gap if seg.duration_s >= thresholds.gap_s => morse.push_str(LETTER_SEP),
            Category::Gap | Category::BoundaryArtifact => {}
        }
    }
    tracing::debug!(
        dash_s = thresholds.dash_s,
        gap_s = thresholds.gap_s,
        morse = %morse,
        "classified segments"
    );
    Ok(Transcript { morse, thresholds })
}

/// Translate a morse string into text.
///
/// Words are separated by three spaces, letters by one. Unknown codes drop
/// out; every word keeps its slot, so words are joined by a single space even
/// when one decodes to nothing.
pub fn decode_message(morse: &str, alphabet: &Alphabet) -> String {
    morse
        .split(WORD_SEP)
        .map(|word| {
            word.split(LETTER_SEP)
                .map(|code| alphabet.lookup(code))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn alternating(signals: &[f64], gaps: &[f64]) -> Vec<TimedSegment> {
        let mut out = Vec::new();
        for (i, s) in signals.iter().enumerate() {
            out.push(TimedSegment::signal(*s));
            if let Some(g) = gaps.get(i) {
                out.push(TimedSegment::gap(*g));
            }
        }
        out
    }

    #[test]
    fn dash_threshold_is_signal_midpoint() {
        let segs = alternating(&[0.2, 0.2, 0.6, 0.6], &[0.1, 0.3, 0.1]);
        let (t, kept) = compute_thresholds(&segs).unwrap();
        assert!((t.dash_s - 0.4).abs() < 1e-12);
        assert_eq!(kept, vec![0.1, 0.3, 0.1]);
        let tr = to_morse(&segs).unwrap();
        assert_eq!(tr.morse, ".. --");
    }

    #[test]
    fn outlier_gap_becomes_word_break() {
        let segs = alternating(
            &[0.2, 0.2, 0.6, 0.2, 0.6, 0.2, 0.2, 0.6],
            &[0.1, 0.1, 0.3, 0.1, 0.9, 0.1, 0.1],
        );
        let tr = to_morse(&segs).unwrap();
        assert!((tr.thresholds.dash_s - 0.4).abs() < 1e-12);
        assert!((tr.thresholds.gap_s - 0.2).abs() < 1e-12);
        assert_eq!(tr.morse, "..- .-   ..-");
        assert_eq!(decode_message(&tr.morse, Alphabet::international()), "UA U");
    }

    #[rstest]
    #[case(vec![], 0, 0)]
    #[case(vec![TimedSegment::signal(0.2)], 1, 0)]
    #[case(vec![TimedSegment::gap(0.2), TimedSegment::boundary(0.1)], 0, 1)]
    fn missing_signals_or_gaps_is_insufficient(
        #[case] segs: Vec<TimedSegment>,
        #[case] signals: usize,
        #[case] gaps: usize,
    ) {
        let err = to_morse(&segs).unwrap_err();
        assert_eq!(
            err.downcast_ref::<MorseError>(),
            Some(&MorseError::InsufficientSample { signals, gaps })
        );
    }

    #[test]
    fn boundary_artifacts_do_not_count() {
        let segs = vec![
            TimedSegment::signal(0.2),
            TimedSegment::boundary(5.0),
            TimedSegment::gap(0.1),
            TimedSegment::signal(0.6),
            TimedSegment::gap(0.3),
            TimedSegment::signal(0.2),
        ];
        let tr = to_morse(&segs).unwrap();
        assert_eq!(tr.morse, ".- .");
    }

    #[rstest]
    #[case("-.. . ..-.   --. ....", "DEF GH")]
    #[case("... --- ...", "SOS")]
    #[case(".- ........ -...", "AB")]
    #[case("", "")]
    #[case("   .-", " A")]
    #[case("........   .-", " A")]
    #[case(".-   ........   -...", "A  B")]
    fn decodes_messages(#[case] morse: &str, #[case] expected: &str) {
        assert_eq!(decode_message(morse, Alphabet::international()), expected);
    }
}
