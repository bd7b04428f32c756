use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("{0} sensor offline")]
    SensorOffline(&'static str),
    #[error("track recovery timeout after {0} ms")]
    RecoveryTimeout(u64),
    #[error("drive fault: {0}")]
    Drive(String),
}
