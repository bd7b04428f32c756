//! Maps `Box<dyn Error>` from trait boundaries to typed `MorseError`.
//!
//! The traits in `morse_traits` use `Box<dyn Error + Send + Sync>` so any
//! collaborator can plug in; this module converts those to our typed enum, with
//! an optional feature-gated path for `morse_hardware::HwError` downcasting.

use crate::error::MorseError;

/// Which collaborator produced the error; picks the fallback variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Sensor,
    Drive,
    Recovery,
}

/// Map a trait-boundary error to a typed `MorseError`.
///
/// Known hardware error types are downcast first, then string heuristics
/// decide based on the collaborator the error came from.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static), source: Source) -> MorseError {
    #[cfg(feature = "hardware-errors")]
    {
        use morse_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::RecoveryTimeout(_) => MorseError::RecoveryTimeout,
                HwError::SensorOffline(_) => MorseError::SensorUnavailable(hw.to_string()),
                HwError::Drive(msg) => MorseError::Actuator(msg.clone()),
            };
        }
    }

    let s = e.to_string();
    match source {
        Source::Recovery if s.to_lowercase().contains("timeout") => MorseError::RecoveryTimeout,
        Source::Sensor | Source::Recovery => MorseError::SensorUnavailable(s),
        Source::Drive => MorseError::Actuator(s),
    }
}
