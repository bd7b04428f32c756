mod capture;
mod cli;
mod error_fmt;
mod offline;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::{Result, WrapErr};
use morse_core::Alphabet;
use morse_core::error::MorseError;

use crate::capture::{CaptureRequest, TapeSource};
use crate::cli::{Cli, Commands, DEFAULT_CONFIG, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error reporter: {e}");
    }

    let code = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            if JSON_MODE.get().copied().unwrap_or(false) {
                println!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            exit_code_for_error(&e)
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<()> {
    let cfg = load_config(cli.config.as_deref())?;
    init_logging(cli.json, cli.log_level.as_deref(), &cfg.logging)?;

    let alphabet_path = cli.alphabet.as_deref().or(cfg.alphabet.file.as_deref());
    let custom = load_alphabet(alphabet_path)?;
    let alphabet: &Alphabet = custom.as_ref().unwrap_or_else(|| Alphabet::international());

    match cli.cmd {
        Commands::Capture {
            message,
            tape,
            unit_ms,
            max_run_ms,
            hold_ms,
        } => {
            let source = match (&message, &tape) {
                (_, Some(path)) => TapeSource::File(path),
                (Some(text), None) => TapeSource::Message {
                    text,
                    unit_ms: unit_ms.unwrap_or(cfg.simulation.unit_ms),
                },
                (None, None) => eyre::bail!("either --message or --tape is required"),
            };
            let shutdown = Arc::new(AtomicBool::new(false));
            let flag = shutdown.clone();
            ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed))
                .wrap_err("install Ctrl-C handler")?;

            let req = CaptureRequest { source, max_run_ms };
            let report = capture::run_capture(&cfg, alphabet, &req, shutdown.clone())?;
            capture::print_report(report.as_ref(), cli.json);
            capture::hold(hold_ms.unwrap_or(cfg.output.hold_ms), &shutdown);
            Ok(())
        }
        Commands::Decode { segments, morse } => match (segments, morse) {
            (Some(path), _) => offline::decode_segments_file(&path, alphabet, cli.json),
            (None, Some(code)) => offline::decode_morse(&code, alphabet, cli.json),
            (None, None) => eyre::bail!("either --segments or --morse is required"),
        },
        Commands::Encode {
            text,
            tape_out,
            unit_ms,
        } => offline::encode(
            &cfg,
            alphabet,
            &text,
            unit_ms.unwrap_or(cfg.simulation.unit_ms),
            tape_out.as_deref(),
            cli.json,
        ),
        Commands::SelfCheck => offline::self_check(&cfg, alphabet, cli.json),
    }
}

/// Read and validate the config; without `--config`, a missing default file means built-in defaults.
///
/// Parse and validation failures surface as `MorseError::Config`.
fn load_config(path: Option<&Path>) -> Result<morse_config::Config> {
    let (path, explicit) = match path {
        Some(p) => (p, true),
        None => (Path::new(DEFAULT_CONFIG), false),
    };
    if !explicit && !path.exists() {
        let cfg = morse_config::Config::default();
        cfg.validate().map_err(config_error)?;
        return Ok(cfg);
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg: morse_config::Config = toml::from_str(&text)
        .map_err(config_error)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate()
        .map_err(config_error)
        .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
    Ok(cfg)
}

fn config_error(e: impl std::fmt::Display) -> eyre::Report {
    eyre::Report::new(MorseError::Config(e.to_string().trim_end().to_string()))
}

fn load_alphabet(path: Option<&Path>) -> Result<Option<Alphabet>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let rows = morse_config::load_alphabet_csv(path)?;
    let alphabet = Alphabet::from(rows.as_slice());
    tracing::info!(path = %path.display(), symbols = alphabet.len(), "custom alphabet loaded");
    Ok(Some(alphabet))
}

/// Console layer on stderr (pretty or JSON), optional JSON file layer.
///
/// Level precedence: `RUST_LOG`, then `--log-level`, then `[logging] level`, then `info`.
fn init_logging(json: bool, cli_level: Option<&str>, logging: &morse_config::Logging) -> Result<()> {
    use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = cli_level
        .or(logging.level.as_deref())
        .unwrap_or("info");
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => EnvFilter::try_new(level).wrap_err_with(|| format!("invalid log level {level:?}"))?,
    };

    let console = if json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let file = match logging.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file {file:?} has no file name"))?;
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("init logging")?;
    Ok(())
}
