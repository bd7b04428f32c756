//! Bridging `morse_config` types to `morse_core` types.
//!
//! Keeps the CLI free of field-by-field mapping.

use morse_config::{AlphabetRow, ColorName, SegmentKindName, SegmentRow};
use morse_traits::Color;

use crate::alphabet::Alphabet;
use crate::config::{CaptureCfg, MonitorCfg};
use crate::types::{Category, Palette, TimedSegment};

/// Config color names map one to one onto sensor colors.
pub fn color_from_config(c: ColorName) -> Color {
    match c {
        ColorName::Black => Color::Black,
        ColorName::Blue => Color::Blue,
        ColorName::Green => Color::Green,
        ColorName::Yellow => Color::Yellow,
        ColorName::Red => Color::Red,
        ColorName::White => Color::White,
        ColorName::Brown => Color::Brown,
    }
}

/// Inverse of [`color_from_config`], for writing tapes back out.
pub fn color_to_config(c: Color) -> ColorName {
    match c {
        Color::Black => ColorName::Black,
        Color::Blue => ColorName::Blue,
        Color::Green => ColorName::Green,
        Color::Yellow => ColorName::Yellow,
        Color::Red => ColorName::Red,
        Color::White => ColorName::White,
        Color::Brown => ColorName::Brown,
    }
}

// ── Palette ──────────────────────────────────────────────────────────────────

impl From<&morse_config::Track> for Palette {
    fn from(t: &morse_config::Track) -> Self {
        Self {
            primary: color_from_config(t.primary),
            secondary: color_from_config(t.secondary),
            background: t.background.iter().copied().map(color_from_config).collect(),
        }
    }
}

// ── CaptureCfg ───────────────────────────────────────────────────────────────

impl From<&morse_config::Config> for CaptureCfg {
    fn from(c: &morse_config::Config) -> Self {
        Self {
            speed_dps: c.drive.speed_dps,
            poll_ms: c.capture.poll_ms,
            obstruction_idle_ms: c.capture.obstruction_idle_ms,
            max_run_ms: c.capture.max_run_ms,
            recovery_timeout_ms: c.recovery.timeout_ms,
        }
    }
}

// ── MonitorCfg ───────────────────────────────────────────────────────────────

impl From<&morse_config::Monitors> for MonitorCfg {
    fn from(c: &morse_config::Monitors) -> Self {
        Self {
            obstruction_threshold: c.obstruction_threshold,
            obstruction_poll_ms: c.obstruction_poll_ms,
            boundary_poll_ms: c.boundary_poll_ms,
            button_poll_ms: c.button_poll_ms,
        }
    }
}

// ── Recorded segments ────────────────────────────────────────────────────────

impl From<&SegmentRow> for TimedSegment {
    fn from(r: &SegmentRow) -> Self {
        let category = match r.kind {
            SegmentKindName::Signal => Category::Signal,
            SegmentKindName::Gap => Category::Gap,
            SegmentKindName::Boundary => Category::BoundaryArtifact,
        };
        TimedSegment::new(category, r.duration_s)
    }
}

// ── Alphabet ─────────────────────────────────────────────────────────────────

impl From<&[AlphabetRow]> for Alphabet {
    fn from(rows: &[AlphabetRow]) -> Self {
        Alphabet::from_pairs(rows.iter().map(|r| (r.code.clone(), r.symbol.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_maps_to_default_runtime() {
        let cfg = morse_config::Config::default();
        assert_eq!(Palette::from(&cfg.track), Palette::default());
        let capture = CaptureCfg::from(&cfg);
        let defaults = CaptureCfg::default();
        assert_eq!(capture.speed_dps, defaults.speed_dps);
        assert_eq!(capture.max_run_ms, defaults.max_run_ms);
        assert_eq!(capture.recovery_timeout_ms, defaults.recovery_timeout_ms);
        let monitors = MonitorCfg::from(&cfg.monitors);
        assert_eq!(monitors.button_poll_ms, MonitorCfg::default().button_poll_ms);
    }

    #[test]
    fn segment_rows_map_categories() {
        let row = SegmentRow {
            kind: SegmentKindName::Boundary,
            duration_s: 0.25,
        };
        assert_eq!(TimedSegment::from(&row), TimedSegment::boundary(0.25));
    }

    #[test]
    fn color_names_map_both_ways() {
        for c in Color::ALL {
            assert_eq!(color_from_config(color_to_config(c)), c);
        }
    }
}
