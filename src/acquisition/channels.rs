// src/acquisition/channels.rs
//! Headset channel identifiers and their fixed grouping

use crate::error::GestureError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical signal source formed by a pair of electrodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelGroup {
    /// Frontal electrodes (AF7, AF8), dominated by ocular artifacts
    Eye,
    /// Temporal electrodes (TP9, TP10), dominated by masseter EMG
    Jaw,
}

impl ChannelGroup {
    /// Every group
    pub const ALL: [ChannelGroup; 2] = [ChannelGroup::Eye, ChannelGroup::Jaw];

    /// Lowercase name, as used in configuration and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelGroup::Eye => "eye",
            ChannelGroup::Jaw => "jaw",
        }
    }
}

impl fmt::Display for ChannelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// EEG channels streamed by the headset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorChannel {
    /// Left temporal
    Tp9,
    /// Left frontal
    Af7,
    /// Right frontal
    Af8,
    /// Right temporal
    Tp10,
    /// Auxiliary input; carries no gesture information
    Aux,
}

impl SensorChannel {
    /// Every channel, in headset order
    pub const ALL: [SensorChannel; 5] = [
        SensorChannel::Tp9,
        SensorChannel::Af7,
        SensorChannel::Af8,
        SensorChannel::Tp10,
        SensorChannel::Aux,
    ];

    /// Static channel-to-group table. `None` means the batch is not routed anywhere.
    pub const fn group(self) -> Option<ChannelGroup> {
        match self {
            SensorChannel::Af7 | SensorChannel::Af8 => Some(ChannelGroup::Eye),
            SensorChannel::Tp9 | SensorChannel::Tp10 => Some(ChannelGroup::Jaw),
            SensorChannel::Aux => None,
        }
    }

    /// Electrode label, e.g. `AF7`
    pub fn label(&self) -> &'static str {
        match self {
            SensorChannel::Tp9 => "TP9",
            SensorChannel::Af7 => "AF7",
            SensorChannel::Af8 => "AF8",
            SensorChannel::Tp10 => "TP10",
            SensorChannel::Aux => "AUX",
        }
    }
}

impl fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SensorChannel {
    type Err = GestureError;

    /// Accepts `AF7`, `af7` and the transport's `EEG_AF7` spelling
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();
        let name = upper.strip_prefix("EEG_").unwrap_or(&upper);

        SensorChannel::ALL
            .into_iter()
            .find(|channel| channel.label() == name)
            .ok_or_else(|| GestureError::UnknownChannel(trimmed.to_string()))
    }
}
