// src/config/mod.rs
//! Gesture pipeline configuration
//!
//! All values are fixed once a [`GestureConfig`] is handed to the service;
//! there is no runtime reconfiguration path.

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::{ConfigError, ConfigLoader, ValidationError};

use crate::acquisition::ChannelGroup;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete pipeline configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct GestureConfig {
    /// Window settings
    #[serde(default)]
    pub buffer: BufferSettings,
    /// Decision thresholds
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    /// Analysis period and cooldown
    #[serde(default)]
    pub timing: TimingSettings,
}

/// Per-group sample buffer settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BufferSettings {
    /// Number of batch peaks kept per group
    #[serde(default = "defaults::buffer_capacity")]
    pub capacity: usize,
}

/// Per-group amplitude thresholds; a peak must strictly exceed its threshold
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct ThresholdConfig {
    /// Blink threshold
    #[serde(default = "defaults::eye_threshold")]
    pub eye: f32,
    /// Jaw-clench threshold
    #[serde(default = "defaults::jaw_threshold")]
    pub jaw: f32,
}

/// Analysis cadence and cooldown
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TimingSettings {
    /// Classifier period in milliseconds
    #[serde(default = "defaults::analysis_interval_ms")]
    pub analysis_interval_ms: u64,
    /// Suppression after a fired gesture, in milliseconds
    #[serde(default = "defaults::cooldown_ms")]
    pub cooldown_ms: u64,
}

mod defaults {
    use crate::config::constants::*;

    pub fn buffer_capacity() -> usize { signal::DEFAULT_BUFFER_CAPACITY }
    pub fn eye_threshold() -> f32 { thresholds::DEFAULT_EYE_THRESHOLD }
    pub fn jaw_threshold() -> f32 { thresholds::DEFAULT_JAW_THRESHOLD }
    pub fn analysis_interval_ms() -> u64 { timing::DEFAULT_ANALYSIS_INTERVAL_MS }
    pub fn cooldown_ms() -> u64 { timing::DEFAULT_COOLDOWN_MS }
}

impl Default for BufferSettings {
    fn default() -> Self {
        Self {
            capacity: defaults::buffer_capacity(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            eye: defaults::eye_threshold(),
            jaw: defaults::jaw_threshold(),
        }
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            analysis_interval_ms: defaults::analysis_interval_ms(),
            cooldown_ms: defaults::cooldown_ms(),
        }
    }
}

impl ThresholdConfig {
    /// Threshold for one channel group
    pub fn for_group(&self, group: ChannelGroup) -> f32 {
        match group {
            ChannelGroup::Eye => self.eye,
            ChannelGroup::Jaw => self.jaw,
        }
    }
}

impl TimingSettings {
    /// Classifier period
    pub fn analysis_interval(&self) -> Duration {
        Duration::from_millis(self.analysis_interval_ms)
    }

    /// Suppression window
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }
}

impl GestureConfig {
    /// Check every field; all problems are reported at once
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let capacity = self.buffer.capacity;
        if !(signal::MIN_BUFFER_CAPACITY..=signal::MAX_BUFFER_CAPACITY).contains(&capacity) {
            errors.push(ValidationError::new(
                "buffer.capacity",
                format!(
                    "{} is outside {}..={}",
                    capacity,
                    signal::MIN_BUFFER_CAPACITY,
                    signal::MAX_BUFFER_CAPACITY
                ),
            ));
        }

        for (field, value) in [("thresholds.eye", self.thresholds.eye), ("thresholds.jaw", self.thresholds.jaw)] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ValidationError::new(
                    field,
                    format!("{} must be a finite, non-negative amplitude", value),
                ));
            }
        }

        if self.timing.analysis_interval_ms < timing::MIN_ANALYSIS_INTERVAL_MS {
            errors.push(ValidationError::new(
                "timing.analysis_interval_ms",
                format!("must be at least {} ms", timing::MIN_ANALYSIS_INTERVAL_MS),
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Configuration summary for logging
    pub fn summary(&self) -> String {
        format!(
            "capacity={} eye>{} jaw>{} every {}ms, cooldown {}ms",
            self.buffer.capacity,
            self.thresholds.eye,
            self.thresholds.jaw,
            self.timing.analysis_interval_ms,
            self.timing.cooldown_ms
        )
    }
}
