//! Common utility functions for the gesture core
//!
//! Clock abstractions live here so the cooldown gate and the scheduler can be
//! driven by a mock clock in tests.

pub mod time;

pub use time::{
    duration_to_nanos,
    monotonic_timestamp_nanos,
    MockTimeProvider,
    MonotonicTimeProvider,
    TimeProvider,
};
