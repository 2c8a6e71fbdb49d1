// src/error.rs
//! Error types for the gesture core
//!
//! The classification path itself never fails: bad channels are ignored and
//! suppressed triggers are dropped. Errors only arise while building a
//! service from configuration or while spawning the scheduler thread.

use crate::config::loader::format_validation_errors;
use crate::config::{ConfigError, ValidationError};
use thiserror::Error;

/// Unified error type for the crate
#[derive(Debug, Error)]
pub enum GestureError {
    /// Loading configuration from disk or the environment failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A configuration built in code did not pass validation
    #[error("invalid configuration: {}", format_validation_errors(.0))]
    InvalidConfiguration(Vec<ValidationError>),

    /// The analysis thread could not be spawned
    #[error("failed to spawn scheduler thread: {0}")]
    SchedulerSpawn(#[source] std::io::Error),

    /// A channel label that names no headset channel
    #[error("unknown sensor channel: {0:?}")]
    UnknownChannel(String),
}

/// Result type alias for gesture core operations
pub type GestureResult<T> = Result<T, GestureError>;
