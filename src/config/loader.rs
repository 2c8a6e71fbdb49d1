// src/config/loader.rs
//! Layered configuration loader: defaults, TOML files, then environment overrides

use crate::config::{constants::paths, GestureConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Configuration loader
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    env_prefix: String,
}

/// A single rejected configuration field
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Dotted path, e.g. `timing.cooldown_ms`
    pub field: String,
    /// What is wrong with the value
    pub reason: String,
}

impl ValidationError {
    /// Create an error for `field`
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A search path does not exist
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML could not be read or written
    #[error("Configuration parse error: {0}")]
    ParseError(String),

    /// The merged configuration failed validation
    #[error("Configuration validation errors: {}", format_validation_errors(.0))]
    ValidationError(Vec<ValidationError>),

    /// Reading or writing a file failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub(crate) fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl ConfigLoader {
    /// Create a loader over the standard search paths
    pub fn new() -> Self {
        Self::with_paths(Self::discover_config_paths())
    }

    /// Create loader with custom paths, lowest precedence first
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            env_prefix: paths::ENV_PREFIX.to_string(),
        }
    }

    /// Override the environment variable prefix (default `GESTURE_`)
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Search paths, lowest precedence first
    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load, merge and validate the configuration
    pub fn load(&self) -> Result<GestureConfig, ConfigError> {
        let mut merged = toml::Value::try_from(GestureConfig::default())?;

        for config_path in &self.config_paths {
            match Self::load_config_file(config_path) {
                Ok(file_config) => {
                    debug!(path = %config_path.display(), "merging configuration file");
                    merge_toml_values(&mut merged, file_config);
                }
                Err(ConfigError::FileNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        self.apply_environment_overrides(&mut merged, self.environment());

        let config = merged.try_into::<GestureConfig>()?;
        config.validate().map_err(ConfigError::ValidationError)?;
        Ok(config)
    }

    /// Parse and validate a single file on top of the defaults
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<GestureConfig, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: GestureConfig = toml::from_str(&content)?;
        config.validate().map_err(ConfigError::ValidationError)?;
        Ok(config)
    }

    /// Write a configuration out as TOML
    pub fn export_config<P: AsRef<Path>>(config: &GestureConfig, path: P) -> Result<(), ConfigError> {
        let toml_content = toml::to_string_pretty(config)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_config_file(path: &Path) -> Result<toml::Value, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Process environment as UTF-8 pairs; entries that are not UTF-8 are skipped
    fn environment(&self) -> Vec<(String, String)> {
        std::env::vars_os()
            .filter_map(|(key, value)| {
                let key = match key.into_string() {
                    Ok(key) => key,
                    Err(raw) => {
                        let lossy = raw.to_string_lossy();
                        if lossy.starts_with(&self.env_prefix) {
                            warn!(key = %lossy, "ignoring environment variable with non-UTF-8 name");
                        }
                        return None;
                    }
                };
                match value.into_string() {
                    Ok(value) => Some((key, value)),
                    Err(_) => {
                        if key.starts_with(&self.env_prefix) {
                            warn!(%key, "ignoring environment override with non-UTF-8 value");
                        }
                        None
                    }
                }
            })
            .collect()
    }

    /// `GESTURE_TIMING_COOLDOWN_MS=1500` sets `timing.cooldown_ms`
    fn apply_environment_overrides<I>(&self, config: &mut toml::Value, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(&self.env_prefix) else {
                continue;
            };
            let stripped = stripped.to_lowercase();
            let Some((section, field)) = stripped.split_once('_') else {
                warn!(%key, "ignoring environment override without a section");
                continue;
            };

            let toml::Value::Table(root) = config else {
                continue;
            };
            match root.get_mut(section) {
                Some(toml::Value::Table(table)) => {
                    debug!(%key, "applying environment override");
                    table.insert(field.to_string(), parse_env_value(&value));
                }
                _ => warn!(%key, "ignoring environment override for unknown section"),
            }
        }
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(paths::SYSTEM_CONFIG_PATH)];

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(paths::USER_CONFIG_DIR).join("config.toml"));
        }

        paths.push(PathBuf::from(paths::DEFAULT_CONFIG_FILE));
        paths.push(PathBuf::from(paths::LOCAL_CONFIG_FILE));
        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn parse_env_value(value: &str) -> toml::Value {
    if let Ok(int_val) = value.parse::<i64>() {
        toml::Value::Integer(int_val)
    } else if let Ok(float_val) = value.parse::<f64>() {
        toml::Value::Float(float_val)
    } else if let Ok(bool_val) = value.parse::<bool>() {
        toml::Value::Boolean(bool_val)
    } else {
        toml::Value::String(value.to_string())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn home_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var_os("USERPROFILE").map(PathBuf::from)
        }
        #[cfg(not(target_os = "windows"))]
        {
            std::env::var_os("HOME").map(PathBuf::from)
        }
    }
}
