//! Runtime configuration for the capture engine and the event monitors.
//!
//! These are separate from the TOML-deserialized config in `morse_config`;
//! see `conversions` for the mapping.

/// Capture engine settings.
#[derive(Debug, Clone)]
pub struct CaptureCfg {
    /// Forward wheel speed while capturing (degrees per second).
    pub speed_dps: i32,
    /// Idle delay between engine poll cycles; 0 polls back to back.
    pub poll_ms: u64,
    /// Idle delay while waiting for an obstruction to clear.
    pub obstruction_idle_ms: u64,
    /// Hard cap for one capture session; 0 disables it.
    pub max_run_ms: u64,
    /// Budget handed to the boundary recovery maneuver.
    pub recovery_timeout_ms: u64,
}

impl Default for CaptureCfg {
    fn default() -> Self {
        Self {
            speed_dps: 200,
            poll_ms: 5,
            obstruction_idle_ms: 5,
            max_run_ms: 600_000,
            recovery_timeout_ms: 30_000,
        }
    }
}

/// Event monitor settings.
#[derive(Debug, Clone)]
pub struct MonitorCfg {
    /// Obstructed while the measured distance is below this value.
    pub obstruction_threshold: f32,
    pub obstruction_poll_ms: u64,
    pub boundary_poll_ms: u64,
    pub button_poll_ms: u64,
}

impl Default for MonitorCfg {
    fn default() -> Self {
        Self {
            obstruction_threshold: 10.0,
            obstruction_poll_ms: 5,
            boundary_poll_ms: 5,
            button_poll_ms: 10,
        }
    }
}
