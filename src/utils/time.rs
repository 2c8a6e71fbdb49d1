// src/utils/time.rs
//! Clock sources shared by the cooldown gate, the classifier and the scheduler

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Time provider trait for dependency injection and testing
///
/// Readings must be monotonic: the cooldown gate compares them directly.
pub trait TimeProvider: Send + Sync {
    /// Nanoseconds since an arbitrary fixed origin
    fn now_nanos(&self) -> u64;
}

/// Monotonic clock measured from the first time any provider was read in this process
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicTimeProvider;

impl MonotonicTimeProvider {
    /// Create a provider on the process epoch
    pub fn new() -> Self {
        Self
    }
}

impl TimeProvider for MonotonicTimeProvider {
    fn now_nanos(&self) -> u64 {
        monotonic_timestamp_nanos()
    }
}

/// Mock time provider for deterministic testing
#[derive(Debug, Default)]
pub struct MockTimeProvider {
    current_time: AtomicU64,
}

impl MockTimeProvider {
    /// Start the clock at `initial_time_nanos`
    pub fn new(initial_time_nanos: u64) -> Self {
        Self {
            current_time: AtomicU64::new(initial_time_nanos),
        }
    }

    /// Move the clock forward by `nanos`
    pub fn advance_by(&self, nanos: u64) {
        self.current_time.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Move the clock forward by `duration`
    pub fn advance(&self, duration: Duration) {
        self.advance_by(duration_to_nanos(duration));
    }

    /// Jump the clock to `nanos`
    pub fn set_time(&self, nanos: u64) {
        self.current_time.store(nanos, Ordering::Relaxed);
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_nanos(&self) -> u64 {
        self.current_time.load(Ordering::Relaxed)
    }
}

fn process_epoch() -> Instant {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    *EPOCH.get_or_init(Instant::now)
}

/// Nanoseconds elapsed on the monotonic clock since the process epoch
pub fn monotonic_timestamp_nanos() -> u64 {
    duration_to_nanos(process_epoch().elapsed())
}

/// Saturating conversion; durations past ~584 years clamp to `u64::MAX`
pub fn duration_to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
