//! Human-readable error descriptions and structured JSON error formatting.

use crate::capture::error_reason_name;
use crate::cli::LAST_LIMITS;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use morse_core::error::{BuildError, MorseError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingSensors => {
                "What happened: No sensors were provided to the capture engine.\nLikely causes: Sensor setup failed or was not wired into the builder.\nHow to fix: Pass the sensors via with_sensors(...).".to_string()
            }
            BuildError::MissingDrive => {
                "What happened: No drive was provided to the capture engine.\nLikely causes: Motor setup failed or was not wired into the builder.\nHow to fix: Pass the drive via with_drive(...).".to_string()
            }
            BuildError::MissingRecovery => {
                "What happened: No boundary recovery was provided to the capture engine.\nLikely causes: The builder was not given a recovery strategy.\nHow to fix: Pass one via with_recovery(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Conflicting track colors or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun."
            ),
        };
    }

    if let Some(me) = err.downcast_ref::<MorseError>() {
        return match me {
            MorseError::SensorUnavailable(detail) => format!(
                "What happened: A sensor stopped answering ({detail}).\nLikely causes: Color, distance or touch sensor unplugged or unpowered.\nHow to fix: Check the sensor cables, then run `morse self-check`."
            ),
            MorseError::RecoveryTimeout => "What happened: The robot could not find the tape again after leaving it.\nLikely causes: Tape ends abruptly, sharp curve, or sweep too narrow.\nHow to fix: Put the robot back on the tape; raise recovery.timeout_ms or recovery.sweep_step_ms.".to_string(),
            MorseError::MaxRuntime => "What happened: max run time was exceeded.\nLikely causes: No stop press at the end of the tape, or a long obstruction.\nHow to fix: Press the button at the end of the message, or increase capture.max_run_ms.".to_string(),
            MorseError::Interrupted => "What happened: The capture was interrupted.\nLikely causes: Ctrl-C was pressed.\nHow to fix: Start a new capture.".to_string(),
            MorseError::Config(_) => format!(
                "What happened: Configuration is invalid ({err:#}).\nLikely causes: Unknown color name, wrong value type, or out-of-range values.\nHow to fix: Edit the TOML config and try again."
            ),
            MorseError::Actuator(detail) => format!(
                "What happened: The drive rejected a command ({detail}).\nLikely causes: Motor cable loose or motor port misconfigured.\nHow to fix: Check the motors, then rerun."
            ),
            // Fallback to generic for other domain errors
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from input files
    let msg = format!("{err:#}");
    if msg.to_ascii_lowercase().contains("csv must have headers") {
        return format!("Invalid CSV headers. {msg}");
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map typed capture failures to stable exit codes; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use morse_core::error::MorseError;
    match err.downcast_ref::<MorseError>() {
        Some(MorseError::SensorUnavailable(_)) => 2,
        Some(MorseError::RecoveryTimeout) => 3,
        Some(MorseError::MaxRuntime) => 4,
        Some(MorseError::Interrupted) => 5,
        Some(MorseError::Actuator(_)) => 6,
        _ => 1,
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use morse_core::error::MorseError;
    use serde_json::json;

    if let Some(me) = err.downcast_ref::<MorseError>() {
        let msg = humanize(err);
        let limits = LAST_LIMITS.get();
        let detail_obj = match me {
            MorseError::MaxRuntime => limits.map(|l| json!({ "max_run_ms": l.max_run_ms })),
            MorseError::RecoveryTimeout => {
                limits.map(|l| json!({ "recovery_timeout_ms": l.recovery_timeout_ms }))
            }
            _ => None,
        };
        let reason = error_reason_name(me);
        let obj = if let Some(d) = detail_obj {
            json!({ "reason": reason, "details": d, "message": msg })
        } else {
            json!({ "reason": reason, "message": msg })
        };
        return obj.to_string();
    }

    // Generic error JSON
    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;
    use morse_core::error::{BuildError, MorseError};
    use rstest::rstest;

    #[rstest]
    #[case(MorseError::SensorUnavailable("color sensor offline".into()), 2)]
    #[case(MorseError::RecoveryTimeout, 3)]
    #[case(MorseError::MaxRuntime, 4)]
    #[case(MorseError::Interrupted, 5)]
    #[case(MorseError::Actuator("stalled".into()), 6)]
    #[case(MorseError::Config("track.primary and track.secondary must differ".into()), 1)]
    fn exit_codes_are_stable(#[case] e: MorseError, #[case] code: i32) {
        assert_eq!(exit_code_for_error(&eyre::Report::new(e)), code);
    }

    #[test]
    fn wrapped_errors_keep_their_exit_code() {
        let r: eyre::Result<()> = Err(eyre::Report::new(MorseError::RecoveryTimeout));
        let err = r.wrap_err("boundary recovery").unwrap_err();
        assert_eq!(exit_code_for_error(&err), 3);
        assert!(humanize(&err).contains("find the tape again"));
    }

    #[test]
    fn build_errors_are_explained() {
        let err = eyre::Report::new(BuildError::InvalidConfig("drive speed must be > 0"));
        let text = humanize(&err);
        assert!(text.starts_with("What happened: Invalid configuration"));
        assert_eq!(exit_code_for_error(&err), 1);
    }

    #[test]
    fn config_errors_keep_their_context() {
        let r: eyre::Result<()> = Err(eyre::Report::new(MorseError::Config(
            "simulation.unit_ms must be between 1 and 60000".into(),
        )));
        let err = r.wrap_err("invalid configuration in cfg.toml").unwrap_err();
        let text = humanize(&err);
        assert!(text.starts_with("What happened: Configuration is invalid"));
        assert!(text.contains("cfg.toml"));
        assert!(text.contains("simulation.unit_ms must be between 1 and 60000"));
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Config");
    }

    #[test]
    fn json_error_names_the_reason() {
        let err = eyre::Report::new(MorseError::Interrupted);
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Interrupted");
        assert!(v["message"].as_str().unwrap().contains("interrupted"));
    }

    #[test]
    fn untyped_errors_fall_back_to_generic_text() {
        let err = eyre::eyre!("disk on fire");
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&err)).unwrap();
        assert_eq!(v["reason"], "Error");
        assert!(v["message"].as_str().unwrap().contains("disk on fire"));
    }
}
