#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Tape capture and morse decoding (hardware-agnostic).
//!
//! All hardware interactions go through the `morse_traits::Sensors`,
//! `morse_traits::Drive` and `morse_traits::BoundaryRecovery` traits.
//!
//! ## Pipeline
//!
//! - **Monitors** (`monitors`): background threads publishing obstruction,
//!   boundary and run-toggle flags into a shared `RunState`
//! - **Capture** (`capture`, `builder`): state machine that drives along the
//!   tape and records timed segments, excluding obstruction pauses and
//!   recovery time
//! - **Post-processing** (`postprocess`): boundary-artifact merge, IQR outlier
//!   filter
//! - **Decoding** (`decoder`, `alphabet`): per-run dash/gap thresholds, morse
//!   string, text
//!
//! `runner` ties the stages together for one session.

pub mod alphabet;
pub mod builder;
pub mod capture;
pub mod config;
pub mod conversions;
pub mod decoder;
pub mod error;
pub mod hw_error;
pub mod monitors;
pub mod postprocess;
pub mod run_state;
pub mod runner;
pub mod status;
pub mod types;

pub use alphabet::Alphabet;
pub use builder::{CaptureBuilder, Missing, Set};
pub use capture::{CaptureEngine, Phase};
pub use config::{CaptureCfg, MonitorCfg};
pub use decoder::{Thresholds, Transcript, compute_thresholds, decode_message, to_morse};
pub use error::{BuildError, MorseError, Result};
pub use monitors::{MonitorFault, Monitors};
pub use postprocess::{remove_boundary_artifacts, remove_outliers};
pub use run_state::RunState;
pub use runner::{SessionParams, SessionReport, decode_segments, run_session};
pub use status::CaptureStatus;
pub use types::{Category, ColorClass, Palette, TimedSegment};
