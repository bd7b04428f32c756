use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MorseError {
    #[error("insufficient sample: {signals} signal and {gaps} gap segments")]
    InsufficientSample { signals: usize, gaps: usize },
    #[error("sensor unavailable: {0}")]
    SensorUnavailable(String),
    #[error("drive fault: {0}")]
    Actuator(String),
    #[error("track recovery timed out")]
    RecoveryTimeout,
    #[error("max run time exceeded")]
    MaxRuntime,
    #[error("interrupted")]
    Interrupted,
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing sensors")]
    MissingSensors,
    #[error("missing drive")]
    MissingDrive,
    #[error("missing boundary recovery")]
    MissingRecovery,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
