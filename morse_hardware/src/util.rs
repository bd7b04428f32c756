use std::time::Duration;

use morse_traits::{BoxError, Clock};

/// Poll `cond` every `poll_interval` until it returns true or `window` has
/// elapsed on `clock`. Returns whether the condition was met.
///
/// Sleeps between polls to avoid CPU spinning; a zero interval still yields
/// through the clock so simulated clocks keep moving.
pub fn poll_until(
    clock: &dyn Clock,
    mut cond: impl FnMut() -> Result<bool, BoxError>,
    window: Duration,
    poll_interval: Duration,
) -> Result<bool, BoxError> {
    let start = clock.now();
    loop {
        if cond()? {
            return Ok(true);
        }
        if clock.now().saturating_duration_since(start) >= window {
            return Ok(false);
        }
        clock.sleep(poll_interval.max(Duration::from_millis(1)));
    }
}
