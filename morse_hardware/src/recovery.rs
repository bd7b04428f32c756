//! Sweep-based track recovery.
//!
//! Pivots toward the tape in widening sweeps until a track color is under the
//! sensor. A yellow reading means the robot drifted off the left edge, black
//! the right one.

use std::sync::Arc;
use std::time::Duration;

use morse_traits::{BoundaryRecovery, BoxError, Clock, Color, Drive, Sensors};

use crate::error::HwError;
use crate::util::poll_until;

#[derive(Debug, Clone)]
pub struct SweepCfg {
    pub speed_dps: i32,
    pub initial_sweep_ms: u64,
    pub sweep_step_ms: u64,
    pub poll_ms: u64,
}

impl Default for SweepCfg {
    fn default() -> Self {
        Self {
            speed_dps: 50,
            initial_sweep_ms: 1000,
            sweep_step_ms: 1000,
            poll_ms: 5,
        }
    }
}

pub struct SweepRecovery {
    /// Colors that count as being back on the tape.
    track: Vec<Color>,
    cfg: SweepCfg,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl SweepRecovery {
    pub fn new(track: Vec<Color>, cfg: SweepCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { track, cfg, clock }
    }

    fn on_track(&self, color: Option<Color>) -> bool {
        color.is_some_and(|c| self.track.contains(&c))
    }
}

impl BoundaryRecovery for SweepRecovery {
    fn recover(
        &mut self,
        sensors: &dyn Sensors,
        drive: &mut dyn Drive,
        timeout: Duration,
    ) -> Result<(), BoxError> {
        let started = self.clock.now();
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let poll = Duration::from_millis(self.cfg.poll_ms);
        let s = self.cfg.speed_dps;
        let mut sweep_ms = self.cfg.initial_sweep_ms.max(1);
        let mut sweeps = 0u32;

        loop {
            let color = sensors.color()?;
            if self.on_track(color) {
                drive.stop()?;
                tracing::debug!(sweeps, "track reacquired");
                return Ok(());
            }
            let elapsed = self.clock.ms_since(started);
            if elapsed >= timeout_ms {
                drive.stop()?;
                return Err(Box::new(HwError::RecoveryTimeout(elapsed)));
            }

            let (left, right) = match color {
                Some(Color::Black) => (s, -s),
                _ => (-s, s),
            };
            tracing::trace!(?color, sweep_ms, left, right, "recovery sweep");
            drive.run(left, right)?;
            let window = Duration::from_millis(sweep_ms.min(timeout_ms - elapsed));
            let found = poll_until(
                &*self.clock,
                || Ok(self.on_track(sensors.color()?)),
                window,
                poll,
            )?;
            drive.stop()?;
            if found {
                tracing::debug!(sweeps, "track reacquired");
                return Ok(());
            }
            sweeps += 1;
            sweep_ms = sweep_ms.saturating_add(self.cfg.sweep_step_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimConfig, SimWorld, TapeSpan};
    use morse_traits::TestClock;

    fn setup(realign_ms: u64) -> (SimWorld, TestClock, SweepRecovery) {
        let clock = TestClock::new();
        let tape = vec![
            TapeSpan::off_track(Color::Yellow, 10_000, realign_ms),
            TapeSpan::new(Color::Red, 500),
        ];
        let world = SimWorld::new(tape, SimConfig::default(), Arc::new(clock.clone()));
        let recovery = SweepRecovery::new(
            vec![Color::Red, Color::White],
            SweepCfg::default(),
            Arc::new(clock.clone()),
        );
        (world, clock, recovery)
    }

    #[test]
    fn sweeps_until_track_is_found() {
        let (world, clock, mut recovery) = setup(1500);
        let sensors = world.sensors();
        let mut drive = world.drive();
        recovery
            .recover(&sensors, &mut drive, Duration::from_secs(30))
            .unwrap();
        assert_eq!(sensors.color().unwrap(), Some(Color::Red));
        assert_eq!(world.wheel_speeds(), (0, 0));
        assert!(clock.offset() >= Duration::from_millis(1500));
    }

    #[test]
    fn gives_up_after_timeout_with_drive_stopped() {
        let (world, _clock, mut recovery) = setup(u64::MAX);
        let sensors = world.sensors();
        let mut drive = world.drive();
        let err = recovery
            .recover(&sensors, &mut drive, Duration::from_millis(2500))
            .unwrap_err();
        assert!(err.to_string().contains("recovery timeout"));
        assert_eq!(world.wheel_speeds(), (0, 0));
    }
}
