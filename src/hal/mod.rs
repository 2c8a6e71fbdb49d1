// src/hal/mod.rs
//! Sensor transport seam and the simulated headset

pub mod traits;
#[cfg(feature = "simulation")]
pub mod simulator;

pub use traits::*;
#[cfg(feature = "simulation")]
pub use simulator::{SimulatedHeadset, SimulatorConfig, SimulatorHandle};
