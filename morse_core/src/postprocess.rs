//! Segment post-processing: boundary-artifact removal and IQR outlier filtering.
//!
//! Both passes are pure functions over the captured data.

use crate::types::{Category, TimedSegment};

/// Remove boundary artifacts, stitching the neighbours back together when the
/// excursion interrupted a single mark.
///
/// For an artifact with a predecessor and a successor of the same color class,
/// the successor's duration is added to the predecessor and both the artifact
/// and the successor are dropped. Otherwise only the artifact is dropped.
/// Scanning resumes at the same index after every removal.
pub fn remove_boundary_artifacts(mut segments: Vec<TimedSegment>) -> Vec<TimedSegment> {
    let mut i = 0;
    while i < segments.len() {
        if segments[i].category != Category::BoundaryArtifact {
            i += 1;
            continue;
        }
        let mergeable = i > 0
            && i + 1 < segments.len()
            && segments[i - 1].color_class() == segments[i + 1].color_class();
        if mergeable {
            let tail = segments[i + 1].duration_s;
            segments[i - 1].duration_s += tail;
            segments.drain(i..i + 2);
        } else {
            segments.remove(i);
        }
    }
    segments
}

/// Index-based quartiles `(q1, q3)` of an ascending slice: `q1 = v[n/4]`,
/// `q3 = v[3n/4]`. `None` for an empty slice.
pub fn quartiles(sorted: &[f64]) -> Option<(f64, f64)> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    Some((sorted[n / 4], sorted[3 * n / 4]))
}

/// Keep values inside `[q1 - 1.5 IQR, q3 + 1.5 IQR]`, preserving input order.
///
/// An empty input yields an empty output.
pub fn remove_outliers(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let Some((q1, q3)) = quartiles(&sorted) else {
        return Vec::new();
    };
    let iqr = q3 - q1;
    let low = q1 - 1.5 * iqr;
    let high = q3 + 1.5 * iqr;
    tracing::trace!(q1, q3, low, high, "outlier bounds");
    values
        .iter()
        .copied()
        .filter(|v| *v >= low && *v <= high)
        .collect()
}
