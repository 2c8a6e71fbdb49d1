//! Gesture-Core: blink and jaw-clench detection for four-electrode EEG headsets
//!
//! Sample batches arrive per channel from a headset transport. Each batch is
//! reduced to its peak magnitude and appended to a fixed-length window for its
//! channel group (frontal electrodes for the eyes, temporal for the jaw). A
//! scheduler thread inspects both windows periodically and fires at most one
//! gesture per tick, followed by a cooldown.
//!
//! - Per-group circular buffers behind explicit locks
//! - Winner-take-all threshold classifier with cooldown debounce
//! - Ordered, panic-isolated subscriber fan-out
//! - Layered TOML configuration with environment overrides
//! - Seeded headset simulator (feature `simulation`)
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gesture_core::{GestureConfig, GestureService, SensorChannel};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = GestureService::new(GestureConfig::default())?;
//!     service.on_blink(|event| println!("blink at {} ns", event.fired_at_nanos));
//!     service.on_jaw_clench(|_| println!("jaw clench"));
//!
//!     service.start()?;
//!     // Called by the transport for every notification
//!     service.ingest(SensorChannel::Af7, &[12.0, -340.0, 25.0]);
//!     service.stop();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod acquisition;
pub mod config;
pub mod detection;
pub mod error;
pub mod events;
pub mod hal;
pub mod session;
pub mod utils;

// Re-export commonly used types for convenience
pub use acquisition::{ChannelGroup, IngestOutcome, SensorChannel};
pub use config::{ConfigError, ConfigLoader, GestureConfig, ThresholdConfig, ValidationError};
pub use detection::TickOutcome;
pub use error::{GestureError, GestureResult};
pub use events::{GestureEvent, GestureKind, SubscriptionId};
pub use hal::SampleSink;
pub use session::{GestureService, SessionStats};
pub use utils::time::{MockTimeProvider, MonotonicTimeProvider, TimeProvider};

#[cfg(feature = "simulation")]
pub use hal::{SimulatedHeadset, SimulatorConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    let mut features = vec![
        "Per-group peak buffers".to_string(),
        "Threshold classifier with cooldown".to_string(),
        "Gesture event fan-out".to_string(),
        "Layered configuration".to_string(),
    ];
    if cfg!(feature = "simulation") {
        features.push("Simulated headset".to_string());
    }

    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Blink and jaw-clench detection for EEG headsets".to_string(),
        features,
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
