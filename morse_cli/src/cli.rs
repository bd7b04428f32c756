//! CLI argument definitions and shared statics.

use clap::{ArgAction, ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();
/// Effective capture limits used for the current run (for JSON details).
pub static LAST_LIMITS: OnceLock<CaptureLimits> = OnceLock::new();

/// Config file read when `--config` is not given; built-in defaults apply if it is absent.
pub const DEFAULT_CONFIG: &str = "etc/morse_config.toml";

/// Test hook: when set, every simulated sensor read fails.
pub const SIM_OFFLINE_ENV: &str = "MORSE_TEST_SIM_OFFLINE";

#[derive(Copy, Clone, Debug)]
pub struct CaptureLimits {
    pub max_run_ms: u64,
    pub recovery_timeout_ms: u64,
}

#[derive(Parser, Debug)]
#[command(name = "morse", version, about = "Morse tape reader CLI")]
pub struct Cli {
    /// Path to config TOML (typed) [default: etc/morse_config.toml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Custom alphabet CSV (strict header `code,symbol`); overrides `[alphabet] file`
    #[arg(long, value_name = "FILE")]
    pub alphabet: Option<PathBuf>,

    /// Print results and errors as JSON, log as JSON lines
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides `[logging] level`
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive along a (simulated) tape and decode the message on it
    #[command(group(ArgGroup::new("source").required(true).args(["message", "tape"])))]
    Capture {
        /// Lay out this text on the simulated tape
        #[arg(long)]
        message: Option<String>,
        /// Simulated tape CSV (headers `color,travel_ms,realign_ms`)
        #[arg(long, value_name = "FILE")]
        tape: Option<PathBuf>,
        /// Morse unit for --message tapes in ms (overrides `[simulation] unit_ms`)
        #[arg(long, value_name = "MS")]
        unit_ms: Option<u64>,
        /// Override: max run time in ms, 0 disables (takes precedence over config)
        #[arg(long, value_name = "MS")]
        max_run_ms: Option<u64>,
        /// Override: how long to keep the result on screen before exiting
        #[arg(long, value_name = "MS")]
        hold_ms: Option<u64>,
    },
    /// Decode a recorded capture or a morse string without driving
    #[command(group(ArgGroup::new("input").required(true).args(["segments", "morse"])))]
    Decode {
        /// Recorded capture CSV (headers `kind,duration_s`)
        #[arg(long, value_name = "FILE")]
        segments: Option<PathBuf>,
        /// Morse string: '.'/'-', one space between letters, three between words
        #[arg(long, value_name = "CODE", allow_hyphen_values = true)]
        morse: Option<String>,
    },
    /// Encode text as morse, optionally writing a simulated tape for it
    Encode {
        /// Text to encode
        text: String,
        /// Write the tape CSV here
        #[arg(long, value_name = "FILE")]
        tape_out: Option<PathBuf>,
        /// Morse unit in ms (overrides `[simulation] unit_ms`)
        #[arg(long, value_name = "MS")]
        unit_ms: Option<u64>,
    },
    /// Quick health check (config, alphabet, sensors)
    SelfCheck,
}
