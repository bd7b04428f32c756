//! Collaborator contracts shared by the capture pipeline.
//!
//! The core never talks to motors or sensors directly; it goes through these
//! traits so the same engine runs against the simulated world and against
//! scripted doubles in tests.
pub mod clock;

use std::time::Duration;

pub use clock::{Clock, MonotonicClock, Stopwatch, TestClock};

/// Error type used at trait boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Colors reported by the track sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    Blue,
    Green,
    Yellow,
    Red,
    White,
    Brown,
}

impl Color {
    pub const ALL: [Color; 7] = [
        Color::Black,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Red,
        Color::White,
        Color::Brown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
            Color::Red => "red",
            Color::White => "white",
            Color::Brown => "brown",
        }
    }

    /// Parse a lowercase color name as used in config and CSV files.
    pub fn from_name(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Instantaneous sensor readings. Shared between the monitor threads and the
/// capture engine, so every read takes `&self`.
pub trait Sensors: Send + Sync {
    /// Color under the sensor, `None` when nothing is recognized.
    fn color(&self) -> Result<Option<Color>, BoxError>;
    /// Distance to the nearest object ahead, in sensor units.
    fn distance(&self) -> Result<f32, BoxError>;
    fn button_pressed(&self) -> Result<bool, BoxError>;
}

/// Differential drive with two wheels.
pub trait Drive {
    /// Run both wheels at the given speeds in degrees per second.
    fn run(&mut self, left_dps: i32, right_dps: i32) -> Result<(), BoxError>;
    fn stop(&mut self) -> Result<(), BoxError>;

    fn forward(&mut self, speed_dps: i32) -> Result<(), BoxError> {
        self.run(speed_dps, speed_dps)
    }
}

/// Maneuver that brings the robot back onto the track after it strayed.
///
/// Blocks until a track color is under the sensor again or `timeout` expires.
/// The drive is handed over stopped and must be left stopped.
pub trait BoundaryRecovery {
    fn recover(
        &mut self,
        sensors: &dyn Sensors,
        drive: &mut dyn Drive,
        timeout: Duration,
    ) -> Result<(), BoxError>;
}

impl<T: Sensors + ?Sized> Sensors for std::sync::Arc<T> {
    fn color(&self) -> Result<Option<Color>, BoxError> {
        (**self).color()
    }
    fn distance(&self) -> Result<f32, BoxError> {
        (**self).distance()
    }
    fn button_pressed(&self) -> Result<bool, BoxError> {
        (**self).button_pressed()
    }
}

impl<T: Drive + ?Sized> Drive for Box<T> {
    fn run(&mut self, left_dps: i32, right_dps: i32) -> Result<(), BoxError> {
        (**self).run(left_dps, right_dps)
    }
    fn stop(&mut self) -> Result<(), BoxError> {
        (**self).stop()
    }
}
