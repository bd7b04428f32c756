//! Concrete collaborators for the capture pipeline: the simulated track
//! world and a sweep-based boundary recovery.
pub mod error;
pub mod recovery;
pub mod sim;
pub mod util;

pub use recovery::{SweepCfg, SweepRecovery};
pub use sim::{SimConfig, SimDrive, SimSensors, SimWorld, TapeSpan};
