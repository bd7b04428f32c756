//! Capture command: simulated track assembly, session execution and reporting.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use morse_config::TapeRow;
use morse_core::conversions::color_from_config;
use morse_core::error::MorseError;
use morse_core::{Alphabet, CaptureCfg, Category, Palette, SessionParams, SessionReport};
use morse_hardware::{SimConfig, SimWorld, SweepCfg, SweepRecovery, TapeSpan};
use morse_traits::{Clock, Color, MonotonicClock, Sensors};
use serde_json::json;

use crate::cli::{CaptureLimits, LAST_LIMITS, SIM_OFFLINE_ENV};

pub fn error_reason_name(e: &MorseError) -> &'static str {
    match e {
        MorseError::InsufficientSample { .. } => "InsufficientSample",
        MorseError::SensorUnavailable(_) => "SensorUnavailable",
        MorseError::Actuator(_) => "Actuator",
        MorseError::RecoveryTimeout => "RecoveryTimeout",
        MorseError::MaxRuntime => "MaxRuntime",
        MorseError::Interrupted => "Interrupted",
        MorseError::Config(_) => "Config",
    }
}

/// Where the simulated tape comes from.
#[derive(Debug)]
pub enum TapeSource<'a> {
    Message { text: &'a str, unit_ms: u64 },
    File(&'a Path),
}

#[derive(Debug)]
pub struct CaptureRequest<'a> {
    pub source: TapeSource<'a>,
    pub max_run_ms: Option<u64>,
}

/// Color laid under lead-in and lead-out; the gap color if no background is configured.
pub fn lead_color(palette: &Palette) -> Color {
    palette
        .background
        .first()
        .copied()
        .unwrap_or(palette.secondary)
}

pub fn span_from_row(row: &TapeRow) -> TapeSpan {
    let color = color_from_config(row.color);
    match row.realign_ms {
        Some(realign_ms) => TapeSpan::off_track(color, row.travel_ms, realign_ms),
        None => TapeSpan::new(color, row.travel_ms),
    }
}

/// Lay out `text` as a tape: marks in the primary color, spaces in the secondary one.
pub fn tape_for_text(
    text: &str,
    alphabet: &Alphabet,
    palette: &Palette,
    unit_ms: u64,
    lead_ms: u64,
) -> eyre::Result<(String, Vec<TapeSpan>)> {
    if !(1..=morse_config::MAX_UNIT_MS).contains(&unit_ms) {
        eyre::bail!(
            "unit_ms must be between 1 and {}, got {unit_ms}",
            morse_config::MAX_UNIT_MS
        );
    }
    let morse = alphabet.encode_text(text);
    if morse.is_empty() {
        eyre::bail!("nothing to encode: {text:?} has no characters in the alphabet");
    }
    let tape = TapeSpan::tape_for_morse(
        &morse,
        unit_ms,
        palette.primary,
        palette.secondary,
        lead_color(palette),
        lead_ms,
    );
    Ok((morse, tape))
}

fn build_tape(
    cfg: &morse_config::Config,
    alphabet: &Alphabet,
    palette: &Palette,
    source: &TapeSource<'_>,
) -> eyre::Result<Vec<TapeSpan>> {
    match source {
        TapeSource::File(path) => {
            let rows = morse_config::load_tape_csv(path)
                .wrap_err_with(|| format!("load tape {}", path.display()))?;
            Ok(rows.iter().map(span_from_row).collect())
        }
        TapeSource::Message { text, unit_ms } => {
            let (morse, tape) =
                tape_for_text(text, alphabet, palette, *unit_ms, cfg.simulation.lead_ms)?;
            tracing::debug!(%morse, spans = tape.len(), "tape laid out");
            Ok(tape)
        }
    }
}

/// Run one capture on the simulated track and decode it.
///
/// Returns `Ok(None)` when the capture holds too few segments to decode.
pub fn run_capture(
    cfg: &morse_config::Config,
    alphabet: &Alphabet,
    req: &CaptureRequest<'_>,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<Option<SessionReport>> {
    let palette = Palette::from(&cfg.track);
    let tape = build_tape(cfg, alphabet, &palette, &req.source)?;

    let mut capture = CaptureCfg::from(cfg);
    if let Some(ms) = req.max_run_ms {
        capture.max_run_ms = ms;
    }
    let _ = LAST_LIMITS.set(CaptureLimits {
        max_run_ms: capture.max_run_ms,
        recovery_timeout_ms: capture.recovery_timeout_ms,
    });

    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let world = SimWorld::new(
        tape,
        SimConfig {
            nominal_dps: cfg.drive.speed_dps,
            obstacles: cfg
                .simulation
                .obstacles
                .iter()
                .map(|o| (o.start_ms, o.len_ms))
                .collect(),
            ..SimConfig::default()
        },
        clock.clone(),
    );
    if std::env::var_os(SIM_OFFLINE_ENV).is_some() {
        tracing::warn!("simulated sensors forced offline");
        world.set_offline(true);
    }

    let recovery = SweepRecovery::new(
        palette.signal_colors(),
        SweepCfg {
            speed_dps: cfg.recovery.sweep_speed_dps,
            initial_sweep_ms: cfg.recovery.initial_sweep_ms,
            sweep_step_ms: cfg.recovery.sweep_step_ms,
            poll_ms: cfg.capture.poll_ms.max(1),
        },
        clock.clone(),
    );
    let params = SessionParams {
        palette,
        capture,
        monitors: (&cfg.monitors).into(),
    };
    let abort_check: Box<dyn Fn() -> bool + Send + Sync> =
        Box::new(move || shutdown.load(Ordering::Relaxed));

    let sensors: Arc<dyn Sensors> = Arc::new(world.sensors());
    let raw = morse_core::run_session(
        sensors,
        world.drive(),
        recovery,
        clock,
        &params,
        Some(abort_check),
    )?;
    tracing::info!(segments = raw.len(), "capture complete");
    decode_or_empty(raw, alphabet)
}

/// Decode captured segments; an undecodable capture is not an error here.
pub fn decode_or_empty(
    raw: Vec<morse_core::TimedSegment>,
    alphabet: &Alphabet,
) -> eyre::Result<Option<SessionReport>> {
    match morse_core::decode_segments(raw, alphabet) {
        Ok(report) => Ok(Some(report)),
        Err(e)
            if matches!(
                e.downcast_ref::<MorseError>(),
                Some(MorseError::InsufficientSample { .. })
            ) =>
        {
            tracing::warn!(error = %e, "nothing to decode");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn kind_name(c: Category) -> &'static str {
    match c {
        Category::Signal => "signal",
        Category::Gap => "gap",
        Category::BoundaryArtifact => "boundary",
    }
}

pub const NO_MESSAGE: &str = "no message captured";

/// Print a decoded session (or the lack of one) as text or a single JSON line.
pub fn print_report(report: Option<&SessionReport>, json_mode: bool) {
    match (report, json_mode) {
        (Some(r), true) => {
            let segments: Vec<_> = r
                .segments
                .iter()
                .map(|s| json!({ "kind": kind_name(s.category), "duration_s": s.duration_s }))
                .collect();
            let line = json!({
                "text": r.text,
                "morse": r.transcript.morse,
                "segments": segments,
                "dash_threshold_s": r.transcript.thresholds.dash_s,
                "gap_threshold_s": r.transcript.thresholds.gap_s,
            });
            println!("{line}");
        }
        (Some(r), false) => {
            println!("Morse: {}", r.transcript.morse);
            println!("Text: {}", r.text);
        }
        (None, true) => {
            let line = json!({
                "text": serde_json::Value::Null,
                "morse": serde_json::Value::Null,
                "segments": [],
                "dash_threshold_s": serde_json::Value::Null,
                "gap_threshold_s": serde_json::Value::Null,
                "message": NO_MESSAGE,
            });
            println!("{line}");
        }
        (None, false) => println!("{NO_MESSAGE}"),
    }
}

/// Keep the result on screen for `hold_ms`, cut short by Ctrl-C.
pub fn hold(hold_ms: u64, shutdown: &AtomicBool) {
    if hold_ms == 0 {
        return;
    }
    tracing::debug!(hold_ms, "holding result");
    let step = Duration::from_millis(hold_ms.min(50));
    let deadline = std::time::Instant::now() + Duration::from_millis(hold_ms);
    while std::time::Instant::now() < deadline && !shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morse_config::ColorName;

    #[test]
    fn tape_rows_keep_realign_only_when_given() {
        let on = TapeRow {
            color: ColorName::Red,
            travel_ms: 120,
            realign_ms: None,
        };
        let off = TapeRow {
            color: ColorName::Yellow,
            travel_ms: 40,
            realign_ms: Some(200),
        };
        assert_eq!(span_from_row(&on), TapeSpan::new(Color::Red, 120));
        assert_eq!(span_from_row(&off), TapeSpan::off_track(Color::Yellow, 40, 200));
    }

    #[test]
    fn text_tape_starts_and_ends_on_background() {
        let palette = Palette::default();
        let (morse, tape) =
            tape_for_text("e t", Alphabet::international(), &palette, 100, 300).unwrap();
        assert_eq!(morse, ".   -");
        assert_eq!(tape.first(), Some(&TapeSpan::new(Color::Brown, 300)));
        assert_eq!(tape.last(), Some(&TapeSpan::new(Color::Brown, 300)));
        // dot, word space, dash
        assert_eq!(tape[1], TapeSpan::new(Color::Red, 100));
        assert_eq!(tape[2], TapeSpan::new(Color::White, 700));
        assert_eq!(tape[3], TapeSpan::new(Color::Red, 300));
    }

    #[test]
    fn unencodable_text_is_rejected() {
        let err = tape_for_text("~~", Alphabet::international(), &Palette::default(), 100, 0)
            .unwrap_err();
        assert!(err.to_string().contains("nothing to encode"));
    }

    #[rstest::rstest]
    #[case(0)]
    #[case(60_001)]
    #[case(u64::MAX)]
    fn out_of_range_units_are_rejected(#[case] unit_ms: u64) {
        let err = tape_for_text("sos", Alphabet::international(), &Palette::default(), unit_ms, 0)
            .unwrap_err();
        assert!(err.to_string().contains("unit_ms must be between 1 and 60000"));
    }

    #[test]
    fn lead_falls_back_to_gap_color() {
        let palette = Palette {
            background: Vec::new(),
            ..Palette::default()
        };
        assert_eq!(lead_color(&palette), Color::White);
    }
}
