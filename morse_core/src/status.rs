//! Capture status returned from each engine iteration.

use crate::error::MorseError;

/// Public status of a single step of the capture loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStatus {
    /// Keep going.
    Running,
    /// Capture finished; drive already stopped, segments ready.
    Complete,
    /// Aborted by a guard (monitor fault, interrupt, max run time); drive has
    /// been asked to stop.
    Aborted(MorseError),
}
