// src/detection/mod.rs
//! Gesture decision: cooldown gate, classifier and the periodic driver

pub mod classifier;
pub mod cooldown;
pub mod scheduler;

pub use classifier::{decide, Classifier, ClassifierMetrics, TickOutcome};
pub use cooldown::{CooldownGate, CooldownState};
pub use scheduler::Scheduler;
