//! Simulated track world.
//!
//! The robot travels along a tape of colored spans. Travel only progresses
//! while both wheels run forward, at a rate proportional to wheel speed, so
//! obstruction stops and recovery maneuvers pause the tape exactly the way
//! they pause a physical robot. Spans marked off-track are left once the robot
//! has pivoted for their `realign_ms`.
//!
//! All time comes from the injected [`Clock`], which lets tests run the world
//! on a `TestClock`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use morse_traits::{BoxError, Clock, Color, Drive, Sensors};

use crate::error::HwError;

/// One stretch of tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapeSpan {
    pub color: Option<Color>,
    /// Travel time across the span at nominal speed.
    pub travel_ms: u64,
    /// Pivot time needed to get back on track; 0 for on-track spans.
    pub realign_ms: u64,
}

impl TapeSpan {
    pub fn new(color: Color, travel_ms: u64) -> Self {
        Self {
            color: Some(color),
            travel_ms,
            realign_ms: 0,
        }
    }

    /// A span the robot strays onto; it must pivot for `realign_ms` to leave it.
    pub fn off_track(color: Color, travel_ms: u64, realign_ms: u64) -> Self {
        Self {
            color: Some(color),
            travel_ms,
            realign_ms,
        }
    }

    /// Lay out a morse string (`.`/`-`, one space between letters, three
    /// between words) as a tape with standard element timing: dot 1 unit,
    /// dash 3, gap inside a letter 1, between letters 3, between words 7.
    /// `lead_ms` of `background` is placed before and after the message.
    /// Span lengths saturate at `u64::MAX`.
    pub fn tape_for_morse(
        morse: &str,
        unit_ms: u64,
        mark: Color,
        space: Color,
        background: Color,
        lead_ms: u64,
    ) -> Vec<TapeSpan> {
        let mut tape = vec![TapeSpan::new(background, lead_ms)];
        let words: Vec<&str> = morse
            .split("   ")
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .collect();
        for (wi, word) in words.iter().enumerate() {
            if wi > 0 {
                tape.push(TapeSpan::new(space, unit_ms.saturating_mul(7)));
            }
            let letters: Vec<&str> = word.split(' ').filter(|l| !l.is_empty()).collect();
            for (li, letter) in letters.iter().enumerate() {
                if li > 0 {
                    tape.push(TapeSpan::new(space, unit_ms.saturating_mul(3)));
                }
                for (si, sym) in letter.chars().enumerate() {
                    if si > 0 {
                        tape.push(TapeSpan::new(space, unit_ms));
                    }
                    let units = if sym == '-' { 3 } else { 1 };
                    tape.push(TapeSpan::new(mark, unit_ms.saturating_mul(units)));
                }
            }
        }
        tape.push(TapeSpan::new(background, lead_ms));
        tape
    }
}

/// Scripted environment around the tape.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Wheel speed that covers a span in exactly its `travel_ms`.
    pub nominal_dps: i32,
    /// Press the button this many ms after the world is created.
    pub start_press_ms: Option<u64>,
    /// Press the button again once the end of the tape is reached.
    pub stop_at_end: bool,
    pub press_len_ms: u64,
    /// Obstacle windows as `(start_ms, len_ms)` after world creation.
    pub obstacles: Vec<(u64, u64)>,
    pub clear_distance: f32,
    pub blocked_distance: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            nominal_dps: 200,
            start_press_ms: Some(0),
            stop_at_end: true,
            press_len_ms: 100,
            obstacles: Vec::new(),
            clear_distance: 100.0,
            blocked_distance: 5.0,
        }
    }
}

struct World {
    tape: Vec<TapeSpan>,
    cfg: SimConfig,
    created: Instant,
    last_tick: Instant,
    travel_ms: f64,
    pivot_ms: f64,
    left: i32,
    right: i32,
    end_reached_at: Option<Instant>,
    manual_press_at: Option<Instant>,
    offline: bool,
}

impl World {
    fn total_ms(&self) -> f64 {
        self.tape.iter().map(|s| s.travel_ms as f64).sum()
    }

    /// Current span and the travel position at which it ends.
    fn current_span(&self) -> Option<(TapeSpan, f64)> {
        let mut end = 0.0;
        for span in &self.tape {
            end += span.travel_ms as f64;
            if self.travel_ms < end {
                return Some((*span, end));
            }
        }
        self.tape.last().map(|s| (*s, end))
    }

    fn advance(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.last_tick).as_micros() as f64 / 1000.0;
        self.last_tick = now;
        if dt > 0.0 {
            if self.left == self.right && self.left > 0 {
                let rate = f64::from(self.left) / f64::from(self.cfg.nominal_dps.max(1));
                self.travel_ms += dt * rate;
                self.pivot_ms = 0.0;
            } else if self.left == -self.right && self.left != 0 {
                self.pivot_ms += dt;
                if let Some((span, end)) = self.current_span()
                    && span.realign_ms > 0
                    && self.pivot_ms >= span.realign_ms as f64
                {
                    tracing::debug!(travel_ms = end, "sim: robot back on track");
                    self.travel_ms = end;
                    self.pivot_ms = 0.0;
                }
            }
        }
        if self.end_reached_at.is_none() && self.travel_ms >= self.total_ms() {
            tracing::debug!("sim: end of tape reached");
            self.end_reached_at = Some(now);
        }
    }

    fn in_window(&self, now: Instant, from: Instant) -> bool {
        now >= from && now.saturating_duration_since(from).as_millis() < u128::from(self.cfg.press_len_ms)
    }
}

/// Shared handle to a simulated world; hands out sensor and drive views.
#[derive(Clone)]
pub struct SimWorld {
    inner: Arc<Mutex<World>>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl SimWorld {
    pub fn new(tape: Vec<TapeSpan>, cfg: SimConfig, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let now = clock.now();
        let world = World {
            tape,
            cfg,
            created: now,
            last_tick: now,
            travel_ms: 0.0,
            pivot_ms: 0.0,
            left: 0,
            right: 0,
            end_reached_at: None,
            manual_press_at: None,
            offline: false,
        };
        Self {
            inner: Arc::new(Mutex::new(world)),
            clock,
        }
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn sensors(&self) -> SimSensors {
        SimSensors { world: self.clone() }
    }

    pub fn drive(&self) -> SimDrive {
        SimDrive { world: self.clone() }
    }

    /// Hold the button down for the configured press length, starting now.
    pub fn press_button(&self) {
        let now = self.clock.now();
        self.world().manual_press_at = Some(now);
    }

    /// Make every sensor read fail from now on.
    pub fn set_offline(&self, offline: bool) {
        self.world().offline = offline;
    }

    /// Travel position along the tape in nominal ms.
    pub fn travel_ms(&self) -> f64 {
        let now = self.clock.now();
        let mut w = self.world();
        w.advance(now);
        w.travel_ms
    }

    pub fn wheel_speeds(&self) -> (i32, i32) {
        let w = self.world();
        (w.left, w.right)
    }
}

/// Sensor view of a [`SimWorld`].
#[derive(Clone)]
pub struct SimSensors {
    world: SimWorld,
}

impl Sensors for SimSensors {
    fn color(&self) -> Result<Option<Color>, BoxError> {
        let now = self.world.clock.now();
        let mut w = self.world.world();
        if w.offline {
            return Err(Box::new(HwError::SensorOffline("color")));
        }
        w.advance(now);
        Ok(w.current_span().and_then(|(span, _)| span.color))
    }

    fn distance(&self) -> Result<f32, BoxError> {
        let now = self.world.clock.now();
        let w = self.world.world();
        if w.offline {
            return Err(Box::new(HwError::SensorOffline("distance")));
        }
        let t = u64::try_from(now.saturating_duration_since(w.created).as_millis()).unwrap_or(u64::MAX);
        let blocked = w
            .cfg
            .obstacles
            .iter()
            .any(|&(start, len)| t >= start && t < start.saturating_add(len));
        Ok(if blocked {
            w.cfg.blocked_distance
        } else {
            w.cfg.clear_distance
        })
    }

    fn button_pressed(&self) -> Result<bool, BoxError> {
        let now = self.world.clock.now();
        let mut w = self.world.world();
        if w.offline {
            return Err(Box::new(HwError::SensorOffline("touch")));
        }
        w.advance(now);
        let scripted = w.cfg.start_press_ms.is_some_and(|ms| {
            let at = w.created + std::time::Duration::from_millis(ms);
            w.in_window(now, at)
        });
        let at_end = w.cfg.stop_at_end && w.end_reached_at.is_some_and(|at| w.in_window(now, at));
        let manual = w.manual_press_at.is_some_and(|at| w.in_window(now, at));
        Ok(scripted || at_end || manual)
    }
}

/// Fastest wheel speed the simulated motors accept, in degrees per second.
pub const MAX_WHEEL_DPS: i32 = 1_050;

/// Drive view of a [`SimWorld`].
pub struct SimDrive {
    world: SimWorld,
}

impl Drive for SimDrive {
    fn run(&mut self, left_dps: i32, right_dps: i32) -> Result<(), BoxError> {
        let limit = -MAX_WHEEL_DPS..=MAX_WHEEL_DPS;
        if !limit.contains(&left_dps) || !limit.contains(&right_dps) {
            return Err(Box::new(HwError::Drive(format!(
                "speed {left_dps}/{right_dps} dps exceeds {MAX_WHEEL_DPS} dps"
            ))));
        }
        let now = self.world.clock.now();
        let mut w = self.world.world();
        // Settle travel under the previous speeds before switching.
        w.advance(now);
        w.left = left_dps;
        w.right = right_dps;
        tracing::trace!(left_dps, right_dps, "sim drive run");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BoxError> {
        self.run(0, 0)
    }
}
