#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and CSV loaders for the tape reader.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//!   Every section is optional; missing keys take the defaults below.
//! - CSV loaders enforce exact headers: custom alphabets (`code,symbol`),
//!   recorded captures (`kind,duration_s`) and simulated tapes
//!   (`color,travel_ms,realign_ms`).
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColorName {
    Black,
    Blue,
    Green,
    Yellow,
    Red,
    White,
    Brown,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Track {
    /// Dot/dash carrier color.
    pub primary: ColorName,
    /// Gap color between marks.
    pub secondary: ColorName,
    /// Colors that belong to the track but carry no message (lead-in, lead-out).
    pub background: Vec<ColorName>,
}

impl Default for Track {
    fn default() -> Self {
        Self {
            primary: ColorName::Red,
            secondary: ColorName::White,
            background: vec![ColorName::Brown],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DriveCfg {
    /// Forward wheel speed while capturing (degrees per second)
    pub speed_dps: i32,
}

impl Default for DriveCfg {
    fn default() -> Self {
        Self { speed_dps: 200 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Monitors {
    /// Anything closer than this (sensor units) counts as an obstruction
    pub obstruction_threshold: f32,
    pub obstruction_poll_ms: u64,
    pub boundary_poll_ms: u64,
    pub button_poll_ms: u64,
}

impl Default for Monitors {
    fn default() -> Self {
        Self {
            obstruction_threshold: 10.0,
            obstruction_poll_ms: 5,
            boundary_poll_ms: 5,
            button_poll_ms: 10,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Capture {
    /// Delay between color polls while waiting for a change
    pub poll_ms: u64,
    /// Delay between checks while waiting for an obstruction to clear
    pub obstruction_idle_ms: u64,
    /// Hard cap on one capture session (0 disables)
    pub max_run_ms: u64,
}

impl Default for Capture {
    fn default() -> Self {
        Self {
            poll_ms: 5,
            obstruction_idle_ms: 5,
            max_run_ms: 600_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Recovery {
    /// Give up on finding the track after this long
    pub timeout_ms: u64,
    pub sweep_speed_dps: i32,
    pub initial_sweep_ms: u64,
    /// Each unsuccessful sweep is this much longer than the previous one
    pub sweep_step_ms: u64,
}

impl Default for Recovery {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            sweep_speed_dps: 50,
            initial_sweep_ms: 1000,
            sweep_step_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Output {
    /// Keep the decoded message up this long before exiting
    pub hold_ms: u64,
}

impl Default for Output {
    fn default() -> Self {
        Self { hold_ms: 10_000 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AlphabetCfg {
    /// Optional CSV (`code,symbol`) replacing the international table
    pub file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ObstacleWindow {
    pub start_ms: u64,
    pub len_ms: u64,
}

/// Longest accepted morse unit, from config or a command-line override.
pub const MAX_UNIT_MS: u64 = 60_000;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Simulation {
    /// Length of one morse unit when laying out a message as tape
    pub unit_ms: u64,
    /// Background before and after the message
    pub lead_ms: u64,
    /// Obstacles placed in front of the simulated robot
    pub obstacles: Vec<ObstacleWindow>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            unit_ms: 150,
            lead_ms: 300,
            obstacles: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub track: Track,
    pub drive: DriveCfg,
    pub monitors: Monitors,
    pub capture: Capture,
    pub recovery: Recovery,
    pub output: Output,
    pub alphabet: AlphabetCfg,
    pub simulation: Simulation,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Track
        if self.track.primary == self.track.secondary {
            eyre::bail!("track.primary and track.secondary must differ");
        }
        if self.track.background.contains(&self.track.primary)
            || self.track.background.contains(&self.track.secondary)
        {
            eyre::bail!("track.background must not contain the signal colors");
        }

        // Drive
        if self.drive.speed_dps <= 0 {
            eyre::bail!("drive.speed_dps must be > 0");
        }

        // Monitors
        if !self.monitors.obstruction_threshold.is_finite()
            || self.monitors.obstruction_threshold <= 0.0
        {
            eyre::bail!("monitors.obstruction_threshold must be > 0");
        }
        if self.monitors.obstruction_poll_ms == 0 {
            eyre::bail!("monitors.obstruction_poll_ms must be >= 1");
        }
        if self.monitors.boundary_poll_ms == 0 {
            eyre::bail!("monitors.boundary_poll_ms must be >= 1");
        }
        if self.monitors.button_poll_ms == 0 {
            eyre::bail!("monitors.button_poll_ms must be >= 1");
        }

        // Capture
        if self.capture.poll_ms > 1000 {
            eyre::bail!("capture.poll_ms is unreasonably large (>1s)");
        }
        if self.capture.obstruction_idle_ms > 1000 {
            eyre::bail!("capture.obstruction_idle_ms is unreasonably large (>1s)");
        }

        // Recovery
        if self.recovery.timeout_ms == 0 {
            eyre::bail!("recovery.timeout_ms must be >= 1");
        }
        if self.recovery.sweep_speed_dps <= 0 {
            eyre::bail!("recovery.sweep_speed_dps must be > 0");
        }
        if self.recovery.initial_sweep_ms == 0 {
            eyre::bail!("recovery.initial_sweep_ms must be >= 1");
        }

        // Output
        if self.output.hold_ms > 10 * 60 * 1000 {
            eyre::bail!("output.hold_ms is unreasonably large (>10min)");
        }

        // Simulation
        if !(1..=MAX_UNIT_MS).contains(&self.simulation.unit_ms) {
            eyre::bail!("simulation.unit_ms must be between 1 and {MAX_UNIT_MS}");
        }

        // Logging
        if let Some(rotation) = self.logging.rotation.as_deref()
            && !matches!(rotation, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

/// Custom alphabet CSV schema.
///
/// Expected headers:
/// code,symbol
///
/// Example:
/// code,symbol
/// .-,A
/// -...,B
#[derive(Debug, Deserialize, Clone)]
pub struct AlphabetRow {
    pub code: String,
    pub symbol: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKindName {
    Signal,
    Gap,
    Boundary,
}

/// Recorded capture CSV schema: one timed segment per row, in traversal order.
///
/// Expected headers:
/// kind,duration_s
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct SegmentRow {
    pub kind: SegmentKindName,
    pub duration_s: f64,
}

/// Simulated tape CSV schema.
///
/// Expected headers:
/// color,travel_ms,realign_ms
///
/// `realign_ms` may be left empty for on-track spans.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct TapeRow {
    pub color: ColorName,
    pub travel_ms: u64,
    pub realign_ms: Option<u64>,
}

/// Read a CSV file whose header row must match `expected` exactly.
fn read_strict_csv<T: DeserializeOwned>(
    path: &Path,
    expected: &[&str],
    what: &str,
) -> eyre::Result<Vec<T>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open {} CSV {:?}: {}", what, path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "{} CSV must have headers '{}', got: {}",
            what,
            expected.join(","),
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<T>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}

pub fn load_alphabet_csv(path: &Path) -> eyre::Result<Vec<AlphabetRow>> {
    let rows: Vec<AlphabetRow> = read_strict_csv(path, &["code", "symbol"], "alphabet")?;
    if rows.is_empty() {
        eyre::bail!("alphabet CSV {:?} has no entries", path);
    }
    let mut seen = HashSet::new();
    for (idx, row) in rows.iter().enumerate() {
        if row.code.is_empty() || !row.code.chars().all(|c| c == '.' || c == '-') {
            eyre::bail!(
                "alphabet row {}: code {:?} must be made of '.' and '-'",
                idx + 2,
                row.code
            );
        }
        if row.symbol.is_empty() {
            eyre::bail!("alphabet row {}: symbol must not be empty", idx + 2);
        }
        if !seen.insert(row.code.as_str()) {
            eyre::bail!("alphabet row {}: duplicate code {:?}", idx + 2, row.code);
        }
    }
    Ok(rows)
}

pub fn load_segments_csv(path: &Path) -> eyre::Result<Vec<SegmentRow>> {
    let rows: Vec<SegmentRow> = read_strict_csv(path, &["kind", "duration_s"], "segments")?;
    for (idx, row) in rows.iter().enumerate() {
        if !row.duration_s.is_finite() || row.duration_s < 0.0 {
            eyre::bail!(
                "segments row {}: duration_s must be a finite value >= 0",
                idx + 2
            );
        }
    }
    Ok(rows)
}

pub fn load_tape_csv(path: &Path) -> eyre::Result<Vec<TapeRow>> {
    let rows: Vec<TapeRow> =
        read_strict_csv(path, &["color", "travel_ms", "realign_ms"], "tape")?;
    if rows.is_empty() {
        eyre::bail!("tape CSV {:?} has no spans", path);
    }
    Ok(rows)
}

/// Write a tape in the format `load_tape_csv` reads back.
pub fn write_tape_csv(path: &Path, rows: &[TapeRow]) -> eyre::Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|e| eyre::eyre!("create tape CSV {:?}: {}", path, e))?;
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| eyre::eyre!("write tape CSV {:?}: {}", path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = load_toml("").expect("empty TOML parses");
        assert_eq!(cfg.track.primary, ColorName::Red);
        assert_eq!(cfg.track.secondary, ColorName::White);
        assert_eq!(cfg.track.background, vec![ColorName::Brown]);
        assert_eq!(cfg.drive.speed_dps, 200);
        assert_eq!(cfg.recovery.timeout_ms, 30_000);
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = load_toml("[capture]\npoll_ms = 2\n").unwrap();
        assert_eq!(cfg.capture.poll_ms, 2);
        assert_eq!(cfg.capture.obstruction_idle_ms, 5);
        assert_eq!(cfg.capture.max_run_ms, 600_000);
    }

    #[test]
    fn unknown_color_is_a_parse_error() {
        let err = load_toml("[track]\nprimary = \"purple\"\n").unwrap_err();
        assert!(err.to_string().contains("purple"));
    }
}
