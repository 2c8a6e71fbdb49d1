// src/config/constants.rs
//! System-wide configuration constants

/// Sample buffering constants
pub mod signal {
    /// ~1.2 s of history at the headset's 220 Hz notification rate
    pub const DEFAULT_BUFFER_CAPACITY: usize = 256;
    /// Smallest accepted window
    pub const MIN_BUFFER_CAPACITY: usize = 1;
    /// Largest accepted window
    pub const MAX_BUFFER_CAPACITY: usize = 65_536;
}

/// Gesture decision thresholds, in raw headset amplitude units
pub mod thresholds {
    /// Frontal peak that must be exceeded for a blink
    pub const DEFAULT_EYE_THRESHOLD: f32 = 300.0;
    /// Temporal peak that must be exceeded for a jaw clench
    pub const DEFAULT_JAW_THRESHOLD: f32 = 500.0;
}

/// Analysis cadence and debounce timing
pub mod timing {
    /// Classifier period
    pub const DEFAULT_ANALYSIS_INTERVAL_MS: u64 = 300;
    /// Suppression after each fired gesture
    pub const DEFAULT_COOLDOWN_MS: u64 = 1_000;
    /// Shortest accepted classifier period
    pub const MIN_ANALYSIS_INTERVAL_MS: u64 = 1;
    /// Name of the analysis thread
    pub const SCHEDULER_THREAD_NAME: &str = "gesture-scheduler";
}

/// Configuration file locations, lowest precedence first
pub mod paths {
    /// System-wide file
    pub const SYSTEM_CONFIG_PATH: &str = "/etc/gesture-core/config.toml";
    /// Per-user directory, relative to the home directory
    pub const USER_CONFIG_DIR: &str = ".config/gesture-core";
    /// Project defaults, relative to the working directory
    pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
    /// Local overrides, relative to the working directory
    pub const LOCAL_CONFIG_FILE: &str = "gesture-core.toml";
    /// Prefix of environment overrides
    pub const ENV_PREFIX: &str = "GESTURE_";
}

/// Simulated headset defaults
pub mod simulation {
    /// The headset delivers 12 samples per channel per notification
    pub const DEFAULT_BATCH_SIZE: usize = 12;
    /// Resting noise, below both thresholds
    pub const DEFAULT_BASELINE_AMPLITUDE: f32 = 80.0;
    /// Frontal spike height during a blink
    pub const DEFAULT_BLINK_AMPLITUDE: f32 = 450.0;
    /// Temporal spike height during a clench
    pub const DEFAULT_CLENCH_AMPLITUDE: f32 = 750.0;
    /// RNG seed
    pub const DEFAULT_SEED: u64 = 0x5EED_EE61;
}
