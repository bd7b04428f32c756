//! Type-state builder for [`CaptureEngine`].
//!
//! `build()` is only available once sensors, drive and recovery are provided;
//! `try_build()` is always available and reports what is missing.

use std::marker::PhantomData;
use std::sync::Arc;

use crossbeam_channel as xch;
use morse_traits::{BoundaryRecovery, Clock, Drive, MonotonicClock, Sensors, Stopwatch};

use crate::capture::{CaptureEngine, Phase};
use crate::config::CaptureCfg;
use crate::error::{BuildError, Result};
use crate::monitors::MonitorFault;
use crate::run_state::RunState;
use crate::types::Palette;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `CaptureEngine`. All fields are validated on `build()`.
pub struct CaptureBuilder<S, D, R> {
    sensors: Option<Arc<dyn Sensors>>,
    drive: Option<Box<dyn Drive>>,
    recovery: Option<Box<dyn BoundaryRecovery>>,
    state: Option<Arc<RunState>>,
    palette: Option<Palette>,
    config: Option<CaptureCfg>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    faults: Option<xch::Receiver<MonitorFault>>,
    abort_check: Option<Box<dyn Fn() -> bool>>,
    _s: PhantomData<S>,
    _d: PhantomData<D>,
    _r: PhantomData<R>,
}

impl Default for CaptureBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            sensors: None,
            drive: None,
            recovery: None,
            state: None,
            palette: None,
            config: None,
            clock: None,
            faults: None,
            abort_check: None,
            _s: PhantomData,
            _d: PhantomData,
            _r: PhantomData,
        }
    }
}

impl CaptureEngine {
    /// Start building a capture engine.
    pub fn builder() -> CaptureBuilder<Missing, Missing, Missing> {
        CaptureBuilder::default()
    }
}

fn validate(palette: &Palette, cfg: &CaptureCfg) -> Result<()> {
    if palette.primary == palette.secondary {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "primary and secondary colors must differ",
        )));
    }
    if palette.background.contains(&palette.primary)
        || palette.background.contains(&palette.secondary)
    {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "background colors must not include signal colors",
        )));
    }
    if cfg.speed_dps <= 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "drive speed must be > 0",
        )));
    }
    if cfg.recovery_timeout_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "recovery timeout must be >= 1 ms",
        )));
    }
    Ok(())
}

impl<S, D, R> CaptureBuilder<S, D, R> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<CaptureEngine> {
        let sensors = self
            .sensors
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSensors))?;
        let drive = self
            .drive
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDrive))?;
        let recovery = self
            .recovery
            .ok_or_else(|| eyre::Report::new(BuildError::MissingRecovery))?;
        let palette = self.palette.unwrap_or_default();
        let cfg = self.config.unwrap_or_default();
        validate(&palette, &cfg)?;

        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(c) => c,
            None => Arc::new(MonotonicClock::new()),
        };
        let now = Stopwatch::start(&*clock);

        Ok(CaptureEngine {
            sensors,
            drive,
            recovery,
            state: self.state.unwrap_or_default(),
            palette,
            cfg,
            clock,
            faults: self.faults,
            abort_check: self.abort_check,
            phase: Phase::Idle,
            segments: Vec::new(),
            timer: now,
            session: now,
            obstruction_timer: now,
            obstruction_ms: 0,
            boundary_ms: 0,
            moving: false,
        })
    }
}

/// Chainable setters that do not affect type-state.
impl<S, D, R> CaptureBuilder<S, D, R> {
    /// Share run flags with the monitors; a fresh state is used otherwise.
    pub fn with_run_state(mut self, state: Arc<RunState>) -> Self {
        self.state = Some(state);
        self
    }
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = Some(palette);
        self
    }
    pub fn with_config(mut self, config: CaptureCfg) -> Self {
        self.config = Some(config);
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
    /// Fail the run with `SensorUnavailable` when a monitor reports a fault.
    pub fn with_faults(mut self, faults: xch::Receiver<MonitorFault>) -> Self {
        self.faults = Some(faults);
        self
    }
    /// Polled once per cycle; `true` aborts the run with `Interrupted`.
    pub fn with_abort_check<F>(mut self, f: F) -> Self
    where
        F: Fn() -> bool + 'static,
    {
        self.abort_check = Some(Box::new(f));
        self
    }
}

// Setters that advance type-state
impl<D, R> CaptureBuilder<Missing, D, R> {
    pub fn with_sensors(self, sensors: Arc<dyn Sensors>) -> CaptureBuilder<Set, D, R> {
        CaptureBuilder {
            sensors: Some(sensors),
            drive: self.drive,
            recovery: self.recovery,
            state: self.state,
            palette: self.palette,
            config: self.config,
            clock: self.clock,
            faults: self.faults,
            abort_check: self.abort_check,
            _s: PhantomData,
            _d: PhantomData,
            _r: PhantomData,
        }
    }
}

impl<S, R> CaptureBuilder<S, Missing, R> {
    pub fn with_drive(self, drive: impl Drive + 'static) -> CaptureBuilder<S, Set, R> {
        CaptureBuilder {
            sensors: self.sensors,
            drive: Some(Box::new(drive)),
            recovery: self.recovery,
            state: self.state,
            palette: self.palette,
            config: self.config,
            clock: self.clock,
            faults: self.faults,
            abort_check: self.abort_check,
            _s: PhantomData,
            _d: PhantomData,
            _r: PhantomData,
        }
    }
}

impl<S, D> CaptureBuilder<S, D, Missing> {
    pub fn with_recovery(
        self,
        recovery: impl BoundaryRecovery + 'static,
    ) -> CaptureBuilder<S, D, Set> {
        CaptureBuilder {
            sensors: self.sensors,
            drive: self.drive,
            recovery: Some(Box::new(recovery)),
            state: self.state,
            palette: self.palette,
            config: self.config,
            clock: self.clock,
            faults: self.faults,
            abort_check: self.abort_check,
            _s: PhantomData,
            _d: PhantomData,
            _r: PhantomData,
        }
    }
}

impl CaptureBuilder<Set, Set, Set> {
    /// Validate and build the engine. Only available when sensors, drive and recovery are set.
    pub fn build(self) -> Result<CaptureEngine> {
        self.try_build()
    }
}
