use std::sync::Arc;
use std::time::Duration;

use morse_core::error::BuildError;
use morse_core::{CaptureCfg, CaptureEngine, Palette};
use morse_traits::{BoundaryRecovery, BoxError, Color, Drive, Sensors};
use rstest::rstest;

struct NullSensors;
impl Sensors for NullSensors {
    fn color(&self) -> Result<Option<Color>, BoxError> {
        Ok(None)
    }
    fn distance(&self) -> Result<f32, BoxError> {
        Ok(100.0)
    }
    fn button_pressed(&self) -> Result<bool, BoxError> {
        Ok(false)
    }
}

struct NullDrive;
impl Drive for NullDrive {
    fn run(&mut self, _l: i32, _r: i32) -> Result<(), BoxError> {
        Ok(())
    }
    fn stop(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
}

struct NullRecovery;
impl BoundaryRecovery for NullRecovery {
    fn recover(
        &mut self,
        _s: &dyn Sensors,
        _d: &mut dyn Drive,
        _t: Duration,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}

#[rstest]
fn builder_missing_sensors_yields_typed_build_error() {
    let err = CaptureEngine::builder()
        // missing with_sensors()
        .with_drive(NullDrive)
        .with_recovery(NullRecovery)
        .try_build()
        .expect_err("should fail with MissingSensors");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingSensors) => {}
        other => panic!("expected MissingSensors, got: {other:?}"),
    }
}

#[rstest]
fn builder_missing_recovery_yields_typed_build_error() {
    let err = CaptureEngine::builder()
        .with_sensors(Arc::new(NullSensors))
        .with_drive(NullDrive)
        .try_build()
        .expect_err("should fail with MissingRecovery");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingRecovery)
    ));
}

#[rstest]
#[case(
    Palette { primary: Color::Red, secondary: Color::Red, background: vec![] },
    CaptureCfg::default(),
    "primary and secondary"
)]
#[case(
    Palette { primary: Color::Red, secondary: Color::White, background: vec![Color::White] },
    CaptureCfg::default(),
    "background"
)]
#[case(
    Palette::default(),
    CaptureCfg { speed_dps: 0, ..CaptureCfg::default() },
    "drive speed"
)]
#[case(
    Palette::default(),
    CaptureCfg { recovery_timeout_ms: 0, ..CaptureCfg::default() },
    "recovery timeout"
)]
fn builder_rejects_invalid_config(
    #[case] palette: Palette,
    #[case] cfg: CaptureCfg,
    #[case] needle: &str,
) {
    let err = CaptureEngine::builder()
        .with_sensors(Arc::new(NullSensors))
        .with_drive(NullDrive)
        .with_recovery(NullRecovery)
        .with_palette(palette)
        .with_config(cfg)
        .build()
        .expect_err("invalid config must be rejected");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => assert!(msg.contains(needle), "got: {msg}"),
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[rstest]
fn builder_defaults_build() {
    let engine = CaptureEngine::builder()
        .with_sensors(Arc::new(NullSensors))
        .with_drive(NullDrive)
        .with_recovery(NullRecovery)
        .build()
        .expect("defaults are valid");
    assert!(engine.segments().is_empty());
}
