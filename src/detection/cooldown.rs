// src/detection/cooldown.rs
//! Debounce gate armed after every fired gesture

use std::time::Duration;

use crate::utils::time::duration_to_nanos;

/// Gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    /// A trigger is permitted
    Idle,
    /// Triggers are dropped until the clock reaches `until_nanos`
    Suppressed {
        /// Clock reading at which the gate returns to idle
        until_nanos: u64,
    },
}

/// Two-state debounce gate
///
/// The gate never polls; callers pass the current clock reading and expiry is
/// resolved lazily on the next query.
#[derive(Debug, Clone)]
pub struct CooldownGate {
    state: CooldownState,
    duration_nanos: u64,
}

impl CooldownGate {
    /// Idle gate suppressing for `duration` after each arm
    pub fn new(duration: Duration) -> Self {
        Self {
            state: CooldownState::Idle,
            duration_nanos: duration_to_nanos(duration),
        }
    }

    /// Current state, after applying any expiry due at `now_nanos`
    pub fn state(&mut self, now_nanos: u64) -> CooldownState {
        if let CooldownState::Suppressed { until_nanos } = self.state {
            if now_nanos >= until_nanos {
                self.state = CooldownState::Idle;
            }
        }
        self.state
    }

    /// Whether a trigger at `now_nanos` would be dropped
    pub fn is_suppressed(&mut self, now_nanos: u64) -> bool {
        matches!(self.state(now_nanos), CooldownState::Suppressed { .. })
    }

    /// Enter `Suppressed` if the gate is idle. Returns `false` when the trigger is dropped.
    pub fn try_arm(&mut self, now_nanos: u64) -> bool {
        if self.is_suppressed(now_nanos) {
            return false;
        }
        self.state = CooldownState::Suppressed {
            until_nanos: now_nanos.saturating_add(self.duration_nanos),
        };
        true
    }
}
