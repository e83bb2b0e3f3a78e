//! Container sizing and growth configuration

use super::{parse_env_bool, parse_env_var, Config, ValidationError};
use crate::error::{Result, StowageError};
use crate::memory::DEFAULT_GROWTH_FACTOR;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sizing and growth policy shared by the array-backed containers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Slots allocated up front by `with_config` constructors
    pub initial_capacity: usize,
    /// Geometric growth factor, in (1.0, 4.0]
    pub growth_factor: f64,
    /// Whether queues grow when full instead of rejecting pushes
    pub queue_auto_grow: bool,
    /// Character units reserved up front by strings
    pub string_initial_capacity: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            growth_factor: DEFAULT_GROWTH_FACTOR,
            queue_auto_grow: true,
            string_initial_capacity: 32,
        }
    }
}

impl Config for ContainerConfig {
    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.initial_capacity == 0 {
            errors.push(
                ValidationError::new(
                    "initial_capacity",
                    &self.initial_capacity.to_string(),
                    "initial capacity must be at least 1",
                )
                .with_suggestion("typical values: 8-1024"),
            );
        }

        if !(self.growth_factor > 1.0 && self.growth_factor <= 4.0) {
            errors.push(
                ValidationError::new(
                    "growth_factor",
                    &self.growth_factor.to_string(),
                    "growth factor must be greater than 1.0 and at most 4.0",
                )
                .with_suggestion("typical values: 1.5-2.0"),
            );
        }

        if !errors.is_empty() {
            return Err(StowageError::configuration(format!(
                "Container configuration validation failed: {}",
                errors
                    .into_iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            )));
        }

        Ok(())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();

        config.initial_capacity = parse_env_var(
            &format!("{}CONTAINER_INITIAL_CAPACITY", prefix),
            config.initial_capacity,
        );
        config.growth_factor =
            parse_env_var(&format!("{}CONTAINER_GROWTH_FACTOR", prefix), config.growth_factor);
        config.queue_auto_grow =
            parse_env_bool(&format!("{}CONTAINER_QUEUE_AUTO_GROW", prefix), config.queue_auto_grow);
        config.string_initial_capacity = parse_env_var(
            &format!("{}CONTAINER_STRING_INITIAL_CAPACITY", prefix),
            config.string_initial_capacity,
        );

        config.validate()?;
        log::debug!("container configuration loaded from {}* environment", prefix);
        Ok(config)
    }

    fn performance_preset() -> Self {
        Self {
            initial_capacity: 1024,
            growth_factor: 2.0,
            queue_auto_grow: true,
            string_initial_capacity: 256,
        }
    }

    fn memory_preset() -> Self {
        Self {
            initial_capacity: 4,
            growth_factor: 1.5,
            queue_auto_grow: true,
            string_initial_capacity: 8,
        }
    }

    fn realtime_preset() -> Self {
        Self {
            initial_capacity: 4096,
            growth_factor: 2.0,
            queue_auto_grow: false,
            string_initial_capacity: 512,
        }
    }

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self).map_err(|e| {
            StowageError::configuration(format!("Failed to serialize container config: {}", e))
        })?;

        std::fs::write(path, serialized).map_err(|e| {
            StowageError::configuration(format!("Failed to write container config file: {}", e))
        })?;

        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StowageError::configuration(format!("Failed to read container config file: {}", e))
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            StowageError::configuration(format!("Failed to parse container config file: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }
}

impl ContainerConfig {
    /// Create a new builder starting from the defaults
    pub fn builder() -> ContainerConfigBuilder {
        ContainerConfigBuilder::new()
    }
}

/// Builder for [`ContainerConfig`]
#[derive(Debug, Clone)]
pub struct ContainerConfigBuilder {
    config: ContainerConfig,
}

impl ContainerConfigBuilder {
    /// Start from the defaults
    pub fn new() -> Self {
        Self {
            config: ContainerConfig::default(),
        }
    }

    /// Set the initial capacity
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Set the growth factor
    pub fn growth_factor(mut self, factor: f64) -> Self {
        self.config.growth_factor = factor;
        self
    }

    /// Set the queue overflow policy
    pub fn queue_auto_grow(mut self, enabled: bool) -> Self {
        self.config.queue_auto_grow = enabled;
        self
    }

    /// Set the string initial capacity
    pub fn string_initial_capacity(mut self, capacity: usize) -> Self {
        self.config.string_initial_capacity = capacity;
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<ContainerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ContainerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
