// src/events/mod.rs
//! Gesture notifications and their fan-out

pub mod dispatcher;

pub use dispatcher::{EventDispatcher, GestureHandler, SubscriptionId};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two recognised gesture classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    /// Frontal peak crossed its threshold
    Blink,
    /// Temporal peak crossed its threshold
    JawClench,
}

impl GestureKind {
    /// Every kind
    pub const ALL: [GestureKind; 2] = [GestureKind::Blink, GestureKind::JawClench];

    /// Snake-case name, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureKind::Blink => "blink",
            GestureKind::JawClench => "jaw_clench",
        }
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fired gesture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GestureEvent {
    /// Which gesture fired
    pub kind: GestureKind,
    /// Reading of the service clock when the gesture fired
    pub fired_at_nanos: u64,
}
