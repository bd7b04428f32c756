//! The capture engine.
//!
//! A state machine over [`Phase`] that drives forward while `running` is set,
//! times how long each signal color stays under the sensor and reacts to the
//! obstruction and boundary flags published by the monitors. Time that is not
//! message time is excluded from segment durations:
//!
//! - obstruction pauses are accumulated and subtracted from the segment they
//!   interrupted;
//! - boundary recovery time is accumulated and subtracted from the next
//!   emitted segment, and also recorded as a `BoundaryArtifact`;
//! - while the sensor sees a non-signal color the segment timer is held at
//!   zero, so lead-in and off-track travel never count towards a mark.
//!
//! Every exit path stops the drive.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel as xch;
use eyre::WrapErr;
use morse_traits::{BoundaryRecovery, Clock, Color, Drive, Sensors, Stopwatch};

use crate::config::CaptureCfg;
use crate::error::{MorseError, Result};
use crate::hw_error::{Source, map_hw_error};
use crate::monitors::MonitorFault;
use crate::run_state::RunState;
use crate::status::CaptureStatus;
use crate::types::{Palette, TimedSegment};

/// Engine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Driving,
    /// Timing `color` until the sensor reports something else.
    AwaitingColorChange { color: Color },
    /// Drive stopped until the obstruction clears, then back to awaiting `color`.
    HandlingObstruction { color: Color },
    HandlingBoundary,
    Stopped,
}

pub struct CaptureEngine {
    pub(crate) sensors: Arc<dyn Sensors>,
    pub(crate) drive: Box<dyn Drive>,
    pub(crate) recovery: Box<dyn BoundaryRecovery>,
    pub(crate) state: Arc<RunState>,
    pub(crate) palette: Palette,
    pub(crate) cfg: CaptureCfg,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) faults: Option<xch::Receiver<MonitorFault>>,
    pub(crate) abort_check: Option<Box<dyn Fn() -> bool>>,

    pub(crate) phase: Phase,
    pub(crate) segments: Vec<TimedSegment>,
    /// Segment timer.
    pub(crate) timer: Stopwatch,
    /// Session timer for the max-run guard.
    pub(crate) session: Stopwatch,
    pub(crate) obstruction_timer: Stopwatch,
    pub(crate) obstruction_ms: u64,
    pub(crate) boundary_ms: u64,
    pub(crate) moving: bool,
}

impl core::fmt::Debug for CaptureEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CaptureEngine")
            .field("phase", &self.phase)
            .field("segments", &self.segments.len())
            .field("moving", &self.moving)
            .finish()
    }
}

impl CaptureEngine {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Segments recorded so far, in traversal order.
    pub fn segments(&self) -> &[TimedSegment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<TimedSegment> {
        self.segments
    }

    /// Reset per-run state. Call before a new capture.
    pub fn begin(&mut self) {
        self.phase = Phase::Idle;
        self.segments.clear();
        self.timer.reset(&*self.clock);
        self.session.reset(&*self.clock);
        self.obstruction_ms = 0;
        self.boundary_ms = 0;
    }

    /// One iteration of the capture loop.
    ///
    /// On error or abort the drive is stopped before returning.
    pub fn step(&mut self) -> Result<CaptureStatus> {
        if self.phase != Phase::Stopped
            && let Some(reason) = self.check_guards()
        {
            self.stop_best_effort("abort");
            self.phase = Phase::Stopped;
            return Ok(CaptureStatus::Aborted(reason));
        }
        let res = self.step_inner();
        if res.is_err() {
            self.stop_best_effort("error");
        }
        res
    }

    /// Run until the capture completes, returning the recorded segments.
    pub fn run(&mut self) -> Result<Vec<TimedSegment>> {
        loop {
            match self.step()? {
                CaptureStatus::Running => continue,
                CaptureStatus::Complete => {
                    tracing::info!(segments = self.segments.len(), "capture complete");
                    return Ok(self.segments.clone());
                }
                CaptureStatus::Aborted(e) => {
                    tracing::error!(error = %e, "capture aborted");
                    return Err(eyre::Report::new(e));
                }
            }
        }
    }

    fn check_guards(&self) -> Option<MorseError> {
        if let Some(rx) = &self.faults
            && let Ok(fault) = rx.try_recv()
        {
            return Some(MorseError::SensorUnavailable(fault.to_string()));
        }
        if let Some(check) = &self.abort_check
            && check()
        {
            return Some(MorseError::Interrupted);
        }
        if self.cfg.max_run_ms > 0 && self.session.elapsed_ms(&*self.clock) >= self.cfg.max_run_ms {
            return Some(MorseError::MaxRuntime);
        }
        None
    }

    fn step_inner(&mut self) -> Result<CaptureStatus> {
        match self.phase {
            Phase::Idle => {
                if self.state.is_running() {
                    self.timer.reset(&*self.clock);
                    self.phase = Phase::Driving;
                    tracing::info!(
                        start_color = ?self.state.start_color(),
                        starts = self.state.starts(),
                        "capture started"
                    );
                } else {
                    self.idle();
                }
                Ok(CaptureStatus::Running)
            }
            Phase::Driving => self.drive_cycle(),
            Phase::AwaitingColorChange { color } => self.await_cycle(color),
            Phase::HandlingObstruction { color } => self.obstruction_cycle(color),
            Phase::HandlingBoundary => self.handle_boundary(),
            Phase::Stopped => Ok(CaptureStatus::Complete),
        }
    }

    fn drive_cycle(&mut self) -> Result<CaptureStatus> {
        if !self.state.is_running() {
            self.stop_drive()?;
            if self.segments.is_empty() {
                self.phase = Phase::Idle;
                return Ok(CaptureStatus::Running);
            }
            self.phase = Phase::Stopped;
            return Ok(CaptureStatus::Complete);
        }
        self.start_drive()?;

        if self.state.at_boundary() {
            self.phase = Phase::HandlingBoundary;
            return Ok(CaptureStatus::Running);
        }
        match self.read_color()? {
            Some(color) if self.palette.is_signal(color) => {
                tracing::trace!(%color, "timing color");
                self.phase = Phase::AwaitingColorChange { color };
            }
            _ => {
                // Off the signal colors: nothing is being timed yet.
                self.timer.reset(&*self.clock);
                self.obstruction_ms = 0;
                self.boundary_ms = 0;
                self.idle();
            }
        }
        Ok(CaptureStatus::Running)
    }

    fn await_cycle(&mut self, color: Color) -> Result<CaptureStatus> {
        if self.read_color()? != Some(color) {
            self.emit(color);
            self.phase = Phase::Driving;
            return Ok(CaptureStatus::Running);
        }
        if self.state.is_obstructed() {
            self.stop_drive()?;
            self.obstruction_timer.reset(&*self.clock);
            tracing::info!("obstructed; drive paused");
            self.phase = Phase::HandlingObstruction { color };
            return Ok(CaptureStatus::Running);
        }
        if !self.state.is_running() {
            self.stop_drive()?;
            tracing::info!(
                segments = self.segments.len(),
                "stopped while timing; partial segment discarded"
            );
            self.phase = Phase::Stopped;
            return Ok(CaptureStatus::Complete);
        }
        self.idle();
        Ok(CaptureStatus::Running)
    }

    fn obstruction_cycle(&mut self, color: Color) -> Result<CaptureStatus> {
        if self.state.is_obstructed() {
            self.clock
                .sleep(Duration::from_millis(self.cfg.obstruction_idle_ms));
            return Ok(CaptureStatus::Running);
        }
        let paused_ms = self.obstruction_timer.elapsed_ms(&*self.clock);
        self.obstruction_ms = self.obstruction_ms.saturating_add(paused_ms);
        tracing::info!(paused_ms, "obstruction cleared; resuming");
        self.start_drive()?;
        self.phase = Phase::AwaitingColorChange { color };
        Ok(CaptureStatus::Running)
    }

    fn handle_boundary(&mut self) -> Result<CaptureStatus> {
        self.stop_drive()?;
        let watch = Stopwatch::start(&*self.clock);
        tracing::warn!("track boundary hit; recovering");
        let timeout = Duration::from_millis(self.cfg.recovery_timeout_ms);
        if let Err(e) = self
            .recovery
            .recover(&*self.sensors, &mut *self.drive, timeout)
        {
            let mapped = map_hw_error(&*e, Source::Recovery);
            return Err(eyre::Report::new(mapped)).wrap_err("boundary recovery");
        }
        let recovery_ms = watch.elapsed_ms(&*self.clock);
        self.start_drive()?;
        self.segments.push(TimedSegment::boundary(ms_to_s(recovery_ms)));
        self.boundary_ms = self.boundary_ms.saturating_add(recovery_ms);
        tracing::info!(recovery_ms, "back on track");
        self.phase = Phase::Driving;
        Ok(CaptureStatus::Running)
    }

    fn emit(&mut self, color: Color) {
        let raw_ms = self.timer.elapsed_ms(&*self.clock);
        let elapsed_ms = raw_ms
            .saturating_sub(self.obstruction_ms)
            .saturating_sub(self.boundary_ms);
        if let Some(category) = self.palette.category_of(color) {
            let seg = TimedSegment::new(category, ms_to_s(elapsed_ms));
            tracing::debug!(
                ?category,
                %color,
                duration_s = seg.duration_s,
                excluded_ms = raw_ms - elapsed_ms,
                "segment"
            );
            self.segments.push(seg);
        }
        self.timer.reset(&*self.clock);
        self.obstruction_ms = 0;
        self.boundary_ms = 0;
    }

    fn read_color(&self) -> Result<Option<Color>> {
        self.sensors
            .color()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e, Source::Sensor)))
            .wrap_err("color sensor read")
    }

    fn start_drive(&mut self) -> Result<()> {
        if self.moving {
            return Ok(());
        }
        self.drive
            .forward(self.cfg.speed_dps)
            .map_err(|e| eyre::Report::new(map_hw_error(&*e, Source::Drive)))
            .wrap_err("drive forward")?;
        self.moving = true;
        Ok(())
    }

    fn stop_drive(&mut self) -> Result<()> {
        self.moving = false;
        self.drive
            .stop()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e, Source::Drive)))
            .wrap_err("drive stop")
    }

    fn stop_best_effort(&mut self, why: &'static str) {
        if let Err(e) = self.stop_drive() {
            tracing::warn!(error = %e, why, "drive stop failed");
        }
    }

    fn idle(&self) {
        self.clock.sleep(Duration::from_millis(self.cfg.poll_ms));
    }
}

fn ms_to_s(ms: u64) -> f64 {
    ms as f64 / 1000.0
}
