//! Background event monitors.
//!
//! Three threads poll the shared sensors on their own schedule and publish
//! into [`RunState`]: obstruction (distance below threshold), track boundary
//! (a recognized color outside the palette) and the run toggle (rising edge of
//! the button). A monitor whose sensor read fails reports a [`MonitorFault`]
//! on a channel and exits; the capture engine turns that into a failed run.
//!
//! Dropping [`Monitors`] signals shutdown and joins every thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel as xch;
use morse_traits::{BoxError, Clock, Sensors};

use crate::config::MonitorCfg;
use crate::run_state::RunState;
use crate::types::Palette;

/// A monitor stopped because its sensor failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorFault {
    pub monitor: &'static str,
    pub error: String,
}

impl std::fmt::Display for MonitorFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} monitor: {}", self.monitor, self.error)
    }
}

/// One polling step of a monitor.
pub trait Monitor: Send + 'static {
    const NAME: &'static str;
    fn poll(&mut self, sensors: &dyn Sensors, state: &RunState) -> Result<(), BoxError>;
}

/// Level-triggered: obstructed while the distance is below the threshold.
pub struct ObstructionMonitor {
    pub threshold: f32,
}

impl Monitor for ObstructionMonitor {
    const NAME: &'static str = "obstruction";

    fn poll(&mut self, sensors: &dyn Sensors, state: &RunState) -> Result<(), BoxError> {
        let distance = sensors.distance()?;
        state.set_obstructed(distance < self.threshold);
        Ok(())
    }
}

/// Level-triggered: at a boundary while a recognized color is outside the palette.
pub struct BoundaryMonitor {
    pub palette: Palette,
}

impl Monitor for BoundaryMonitor {
    const NAME: &'static str = "boundary";

    fn poll(&mut self, sensors: &dyn Sensors, state: &RunState) -> Result<(), BoxError> {
        let color = sensors.color()?;
        state.set_at_boundary(color.is_some_and(|c| !self.palette.contains(c)));
        Ok(())
    }
}

/// Edge-triggered: each press flips `running` once, however long it is held.
#[derive(Default)]
pub struct ToggleMonitor {
    was_pressed: bool,
}

impl Monitor for ToggleMonitor {
    const NAME: &'static str = "button";

    fn poll(&mut self, sensors: &dyn Sensors, state: &RunState) -> Result<(), BoxError> {
        let pressed = sensors.button_pressed()?;
        if pressed && !self.was_pressed {
            let running = state.toggle_running();
            if running {
                state.record_start(sensors.color()?);
            }
            tracing::info!(running, "button pressed");
        }
        self.was_pressed = pressed;
        Ok(())
    }
}

/// Owns the monitor threads.
pub struct Monitors {
    shutdown: Arc<AtomicBool>,
    handles: Vec<(&'static str, JoinHandle<()>)>,
    faults: xch::Receiver<MonitorFault>,
}

impl Monitors {
    pub fn spawn(
        sensors: Arc<dyn Sensors>,
        state: Arc<RunState>,
        cfg: &MonitorCfg,
        palette: Palette,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Self {
        let (tx, faults) = xch::unbounded();
        let shutdown = Arc::new(AtomicBool::new(false));
        let ctx = SpawnCtx {
            sensors,
            state,
            clock,
            shutdown: shutdown.clone(),
            faults: tx,
        };
        let handles = vec![
            ctx.spawn(
                ObstructionMonitor {
                    threshold: cfg.obstruction_threshold,
                },
                cfg.obstruction_poll_ms,
            ),
            ctx.spawn(BoundaryMonitor { palette }, cfg.boundary_poll_ms),
            ctx.spawn(ToggleMonitor::default(), cfg.button_poll_ms),
        ];
        tracing::debug!(monitors = handles.len(), "monitors started");
        Self {
            shutdown,
            handles,
            faults,
        }
    }

    /// Receiver for monitor faults; hand it to the capture engine.
    pub fn faults(&self) -> xch::Receiver<MonitorFault> {
        self.faults.clone()
    }
}

struct SpawnCtx {
    sensors: Arc<dyn Sensors>,
    state: Arc<RunState>,
    clock: Arc<dyn Clock + Send + Sync>,
    shutdown: Arc<AtomicBool>,
    faults: xch::Sender<MonitorFault>,
}

impl SpawnCtx {
    fn spawn<M: Monitor>(&self, mut monitor: M, poll_ms: u64) -> (&'static str, JoinHandle<()>) {
        let sensors = self.sensors.clone();
        let state = self.state.clone();
        let clock = self.clock.clone();
        let shutdown = self.shutdown.clone();
        let faults = self.faults.clone();
        let period = Duration::from_millis(poll_ms.max(1));

        let handle = std::thread::spawn(move || {
            loop {
                if shutdown.load(Ordering::Relaxed) {
                    tracing::debug!(monitor = M::NAME, "monitor received shutdown signal");
                    break;
                }
                if let Err(e) = monitor.poll(&*sensors, &state) {
                    tracing::error!(monitor = M::NAME, error = %e, "monitor sensor read failed");
                    // Engine may already be gone; nothing else to report to.
                    let _ = faults.send(MonitorFault {
                        monitor: M::NAME,
                        error: e.to_string(),
                    });
                    break;
                }
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                clock.sleep(period);
            }
            tracing::trace!(monitor = M::NAME, "monitor thread exiting cleanly");
        });
        (M::NAME, handle)
    }
}

impl Drop for Monitors {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        for (name, handle) in self.handles.drain(..) {
            match handle.join() {
                Ok(()) => tracing::trace!(monitor = name, "monitor thread joined"),
                Err(e) => tracing::warn!(monitor = name, ?e, "monitor thread panicked"),
            }
        }
    }
}
