//! Flags shared between the event monitors and the capture engine.
//!
//! Every flag has exactly one writer: the toggle monitor owns `running` and
//! the start snapshot, the obstruction monitor owns `obstructed`, the boundary
//! monitor owns `at_boundary`. The capture engine only reads.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use morse_traits::Color;

#[derive(Debug, Default)]
pub struct RunState {
    running: AtomicBool,
    obstructed: AtomicBool,
    at_boundary: AtomicBool,
    /// 0 = none, otherwise index into `Color::ALL` plus one.
    start_color: AtomicU8,
    starts: AtomicU32,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_obstructed(&self) -> bool {
        self.obstructed.load(Ordering::Relaxed)
    }

    pub fn at_boundary(&self) -> bool {
        self.at_boundary.load(Ordering::Relaxed)
    }

    /// Flip `running` and return the new value.
    pub fn toggle_running(&self) -> bool {
        !self.running.fetch_xor(true, Ordering::AcqRel)
    }

    pub fn set_obstructed(&self, v: bool) {
        self.obstructed.store(v, Ordering::Relaxed);
    }

    pub fn set_at_boundary(&self, v: bool) {
        self.at_boundary.store(v, Ordering::Relaxed);
    }

    /// Snapshot the color under the sensor when a run starts.
    pub fn record_start(&self, color: Option<Color>) {
        let code = color
            .and_then(|c| Color::ALL.iter().position(|&x| x == c))
            .and_then(|i| u8::try_from(i).ok())
            .map_or(0, |i| i + 1);
        self.start_color.store(code, Ordering::Relaxed);
        self.starts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_color(&self) -> Option<Color> {
        match self.start_color.load(Ordering::Relaxed) {
            0 => None,
            n => Color::ALL.get(usize::from(n) - 1).copied(),
        }
    }

    /// Number of times a run has been started.
    pub fn starts(&self) -> u32 {
        self.starts.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_and_reports_new_state() {
        let state = RunState::new();
        assert!(!state.is_running());
        assert!(state.toggle_running());
        assert!(state.is_running());
        assert!(!state.toggle_running());
        assert!(!state.is_running());
    }

    #[test]
    fn start_snapshot_round_trips() {
        let state = RunState::new();
        assert_eq!(state.start_color(), None);
        state.record_start(Some(Color::Brown));
        assert_eq!(state.start_color(), Some(Color::Brown));
        state.record_start(None);
        assert_eq!(state.start_color(), None);
        assert_eq!(state.starts(), 2);
    }

    #[test]
    fn every_color_survives_the_start_snapshot() {
        let state = RunState::new();
        for c in Color::ALL {
            state.record_start(Some(c));
            assert_eq!(state.start_color(), Some(c));
        }
        assert_eq!(state.starts(), u32::try_from(Color::ALL.len()).unwrap());
    }
}
