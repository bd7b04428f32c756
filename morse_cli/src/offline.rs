//! Commands that never move the robot: decode, encode, self-check.

use std::path::Path;
use std::sync::Arc;

use eyre::WrapErr;
use morse_config::TapeRow;
use morse_core::conversions::color_to_config;
use morse_core::hw_error::{Source, map_hw_error};
use morse_core::{Alphabet, Palette, TimedSegment, decode_message};
use morse_hardware::{SimConfig, SimWorld, TapeSpan};
use morse_traits::{Clock, MonotonicClock, Sensors};
use serde_json::json;

use crate::capture::{decode_or_empty, lead_color, print_report, tape_for_text};
use crate::cli::SIM_OFFLINE_ENV;

pub fn decode_segments_file(path: &Path, alphabet: &Alphabet, json_mode: bool) -> eyre::Result<()> {
    let rows = morse_config::load_segments_csv(path)
        .wrap_err_with(|| format!("load segments {}", path.display()))?;
    let raw: Vec<TimedSegment> = rows.iter().map(TimedSegment::from).collect();
    tracing::info!(segments = raw.len(), "decoding recorded capture");
    let report = decode_or_empty(raw, alphabet)?;
    print_report(report.as_ref(), json_mode);
    Ok(())
}

pub fn decode_morse(morse: &str, alphabet: &Alphabet, json_mode: bool) -> eyre::Result<()> {
    if let Some(bad) = morse.chars().find(|c| !matches!(c, '.' | '-' | ' ')) {
        eyre::bail!("morse string may only contain '.', '-' and spaces, found {bad:?}");
    }
    let text = decode_message(morse, alphabet);
    if json_mode {
        println!("{}", json!({ "text": text, "morse": morse }));
    } else {
        println!("Text: {text}");
    }
    Ok(())
}

pub fn encode(
    cfg: &morse_config::Config,
    alphabet: &Alphabet,
    text: &str,
    unit_ms: u64,
    tape_out: Option<&Path>,
    json_mode: bool,
) -> eyre::Result<()> {
    let palette = Palette::from(&cfg.track);
    let (morse, tape) = tape_for_text(text, alphabet, &palette, unit_ms, cfg.simulation.lead_ms)?;
    if let Some(path) = tape_out {
        let rows: Vec<TapeRow> = tape.iter().filter_map(row_from_span).collect();
        morse_config::write_tape_csv(path, &rows)
            .wrap_err_with(|| format!("write tape {}", path.display()))?;
        tracing::info!(path = %path.display(), spans = rows.len(), "tape written");
    }
    if json_mode {
        let tape_path = tape_out.map(|p| p.display().to_string());
        println!("{}", json!({ "text": text, "morse": morse, "tape": tape_path }));
    } else {
        println!("Morse: {morse}");
        if let Some(path) = tape_out {
            println!("Tape: {} ({} spans)", path.display(), tape.len());
        }
    }
    Ok(())
}

/// Spans without a color reading cannot be expressed in the tape CSV.
fn row_from_span(span: &TapeSpan) -> Option<TapeRow> {
    span.color.map(|c| TapeRow {
        color: color_to_config(c),
        travel_ms: span.travel_ms,
        realign_ms: (span.realign_ms > 0).then_some(span.realign_ms),
    })
}

/// Read every sensor once on a one-span simulated track.
pub fn self_check(cfg: &morse_config::Config, alphabet: &Alphabet, json_mode: bool) -> eyre::Result<()> {
    let palette = Palette::from(&cfg.track);
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let world = SimWorld::new(
        vec![TapeSpan::new(lead_color(&palette), 1_000)],
        SimConfig {
            start_press_ms: None,
            ..SimConfig::default()
        },
        clock,
    );
    if std::env::var_os(SIM_OFFLINE_ENV).is_some() {
        world.set_offline(true);
    }
    let sensors = world.sensors();
    let sensor_err = |e: morse_traits::BoxError| eyre::Report::new(map_hw_error(&*e, Source::Sensor));
    let color = sensors.color().map_err(sensor_err)?;
    let distance = sensors.distance().map_err(sensor_err)?;
    let pressed = sensors.button_pressed().map_err(sensor_err)?;
    tracing::info!(?color, distance, pressed, symbols = alphabet.len(), "self-check readings");

    if json_mode {
        println!(
            "{}",
            json!({
                "status": "ok",
                "alphabet_symbols": alphabet.len(),
                "primary": palette.primary.name(),
                "secondary": palette.secondary.name(),
            })
        );
    } else {
        println!(
            "OK: {} symbols, track {}/{}",
            alphabet.len(),
            palette.primary,
            palette.secondary
        );
    }
    Ok(())
}
