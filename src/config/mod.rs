//! Configuration APIs for stowage containers
//!
//! Containers work with built-in defaults; a [`ContainerConfig`] lets callers
//! choose the initial capacity, the geometric growth factor and the queue
//! overflow policy in one place, and load those choices from the environment
//! or a JSON file.
//!
//! # Builder Patterns
//!
//! ```rust
//! use stowage::config::ContainerConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ContainerConfig::builder()
//!     .initial_capacity(64)
//!     .growth_factor(1.5)
//!     .queue_auto_grow(false)
//!     .build()?;
//! assert_eq!(config.initial_capacity, 64);
//! # Ok(())
//! # }
//! ```
//!
//! # Preset Configurations
//!
//! ```rust
//! use stowage::config::{Config, ContainerConfig};
//!
//! // Large initial allocations, doubling growth
//! let config = ContainerConfig::performance_preset();
//!
//! // Small allocations, gentle growth
//! let config = ContainerConfig::memory_preset();
//!
//! // Preallocated, fixed-capacity queues
//! let config = ContainerConfig::realtime_preset();
//! ```
//!
//! # Environment Initialization
//!
//! ```rust
//! use stowage::config::{Config, ContainerConfig};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads STOWAGE_CONTAINER_* variables
//! let config = ContainerConfig::from_env()?;
//!
//! // Reads MYAPP_CONTAINER_* variables
//! let config = ContainerConfig::from_env_with_prefix("MYAPP_")?;
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use std::env;
use std::fmt;
use std::path::Path;

pub mod container;

#[cfg(test)]
mod tests;

pub use container::{ContainerConfig, ContainerConfigBuilder};

/// Default prefix for configuration environment variables
pub const ENV_PREFIX: &str = "STOWAGE_";

/// Common configuration trait providing validation, environment
/// initialization, presets and file persistence
pub trait Config: Clone + fmt::Debug {
    /// Validate the configuration for correctness and consistency
    fn validate(&self) -> Result<()>;

    /// Initialize from `STOWAGE_`-prefixed environment variables
    fn from_env() -> Result<Self>
    where
        Self: Default,
    {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Initialize from environment variables with a custom prefix
    ///
    /// Unset or unparsable variables keep their default value.
    fn from_env_with_prefix(prefix: &str) -> Result<Self>
    where
        Self: Default;

    /// Preset favoring throughput over memory
    fn performance_preset() -> Self;

    /// Preset favoring small footprint over throughput
    fn memory_preset() -> Self;

    /// Preset favoring predictable latency
    fn realtime_preset() -> Self;

    /// Balanced preset (the defaults)
    fn balanced_preset() -> Self
    where
        Self: Default,
    {
        Self::default()
    }

    /// Save the configuration as pretty-printed JSON
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Load and validate a configuration saved with [`Config::save_to_file`]
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self>;
}

/// Details of a single rejected configuration field
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// The invalid value
    pub value: String,
    /// Why the value is invalid
    pub reason: String,
    /// Suggested valid values or ranges
    pub suggestion: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(field: &str, value: &str, reason: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
            suggestion: None,
        }
    }

    /// Attach a suggestion for valid values
    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid configuration for field '{}': value '{}' is invalid ({})",
            self.field, self.value, self.reason
        )?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". Suggested values: {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Parse an environment variable, falling back to `default` when it is unset
/// or does not parse
pub fn parse_env_var<T>(var_name: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    env::var(var_name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Parse a boolean environment variable
///
/// "true", "1", "yes" and "on" (any case) are true; any other set value is
/// false; an unset variable yields `default`.
pub fn parse_env_bool(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .map(|s| {
            let s = s.trim().to_lowercase();
            matches!(s.as_str(), "true" | "1" | "yes" | "on")
        })
        .unwrap_or(default)
}
