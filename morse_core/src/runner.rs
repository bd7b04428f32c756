//! Session orchestration: monitors + capture engine, then post-processing and
//! decoding.

use std::sync::Arc;

use morse_traits::{BoundaryRecovery, Clock, Drive, Sensors};

use crate::alphabet::Alphabet;
use crate::capture::CaptureEngine;
use crate::config::{CaptureCfg, MonitorCfg};
use crate::decoder::{Transcript, decode_message, to_morse};
use crate::error::Result;
use crate::monitors::Monitors;
use crate::postprocess::remove_boundary_artifacts;
use crate::run_state::RunState;
use crate::types::{Palette, TimedSegment};

/// Everything a capture session needs besides its collaborators.
#[derive(Debug, Clone, Default)]
pub struct SessionParams {
    pub palette: Palette,
    pub capture: CaptureCfg,
    pub monitors: MonitorCfg,
}

/// Result of decoding one capture.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Segments as captured, boundary artifacts included.
    pub raw: Vec<TimedSegment>,
    /// Segments after boundary-artifact removal.
    pub segments: Vec<TimedSegment>,
    pub transcript: Transcript,
    pub text: String,
}

/// Start the monitors, run one capture and return the raw segments.
///
/// The monitors are shut down and joined before this returns, on every path.
pub fn run_session(
    sensors: Arc<dyn Sensors>,
    drive: impl Drive + 'static,
    recovery: impl BoundaryRecovery + 'static,
    clock: Arc<dyn Clock + Send + Sync>,
    params: &SessionParams,
    abort_check: Option<Box<dyn Fn() -> bool + Send + Sync>>,
) -> Result<Vec<TimedSegment>> {
    let state = Arc::new(RunState::new());
    let monitors = Monitors::spawn(
        sensors.clone(),
        state.clone(),
        &params.monitors,
        params.palette.clone(),
        clock.clone(),
    );

    let mut builder = CaptureEngine::builder()
        .with_sensors(sensors)
        .with_drive(drive)
        .with_recovery(recovery)
        .with_run_state(state)
        .with_palette(params.palette.clone())
        .with_config(params.capture.clone())
        .with_clock(clock)
        .with_faults(monitors.faults());
    if let Some(check) = abort_check {
        builder = builder.with_abort_check(check);
    }
    let mut engine = builder.build()?;
    engine.begin();

    tracing::info!(
        speed_dps = params.capture.speed_dps,
        max_run_ms = params.capture.max_run_ms,
        "capture session start"
    );
    let res = engine.run();
    drop(monitors);
    res
}

/// Post-process captured segments and decode them to text.
pub fn decode_segments(raw: Vec<TimedSegment>, alphabet: &Alphabet) -> Result<SessionReport> {
    tracing::debug!(?raw, "raw segments");
    let segments = remove_boundary_artifacts(raw.clone());
    let transcript = to_morse(&segments)?;
    let text = decode_message(&transcript.morse, alphabet);
    tracing::info!(morse = %transcript.morse, text = %text, "message decoded");
    Ok(SessionReport {
        raw,
        segments,
        transcript,
        text,
    })
}
