//! Core configuration structure and builder for rolling computations.

use crate::config_error;
use crate::core::constants::*;
use crate::core::error::{Result, RollingError};
use crate::core::types::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Settings for one rolling computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingConfig {
    /// Window width; must be at least 1
    pub window: usize,
    /// Label each result at the middle of its window
    pub center: bool,
    /// Exchange halos with neighboring ranks; `false` computes locally only
    pub parallel: bool,
    /// Aggregate applied to each window
    pub function: RollingFunction,
    /// How the array is split across ranks
    pub distribution: Distribution,
    /// Tag carried by halo messages
    pub comm_tag: Tag,
    /// Threads for column-parallel local rolling (0 = all cores)
    pub num_threads: usize,
}

impl Default for RollingConfig {
    fn default() -> Self {
        RollingConfig {
            window: DEFAULT_WINDOW,
            center: DEFAULT_CENTER,
            parallel: DEFAULT_PARALLEL,
            function: RollingFunction::default(),
            distribution: Distribution::default(),
            comm_tag: COMM_BORDER_TAG,
            num_threads: DEFAULT_NUM_THREADS,
        }
    }
}

impl RollingConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Window described by this configuration
    pub fn window_spec(&self) -> WindowSpec {
        WindowSpec::new(self.window, self.center)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.window_spec().validate()?;

        if self.comm_tag == COLLECTIVE_TAG {
            return Err(RollingError::invalid_parameter(
                "comm_tag",
                self.comm_tag.to_string(),
                "is reserved for collective operations",
            ));
        }

        if self.num_threads > num_cpus::get() * 2 {
            log::warn!(
                "num_threads ({}) is much larger than available cores ({})",
                self.num_threads,
                num_cpus::get()
            );
        }

        Ok(())
    }

    /// Number of threads actually used for column-parallel rolling
    pub fn effective_num_threads(&self) -> usize {
        if self.num_threads == 0 {
            num_cpus::get()
        } else {
            self.num_threads
        }
    }

    /// Load configuration from a `.toml` or `.json` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RollingError::config(format!("Failed to read config file: {}", e)))?;

        let config: RollingConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| RollingError::config(format!("Failed to parse JSON config: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| RollingError::config(format!("Failed to parse TOML config: {}", e)))?,
            _ => {
                return Err(RollingError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a `.toml` or `.json` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| RollingError::config(format!("Failed to serialize to TOML: {}", e)))?,
            _ => {
                return Err(RollingError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from `ROLLING_*` environment variables
    pub fn load_from_environment() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix(ENV_PREFIX)
                    .map(|name| (name.to_ascii_lowercase(), value))
            })
            .collect();
        Self::from_map(&vars)
    }

    /// Build a configuration from string key-value pairs.
    ///
    /// Unknown keys are logged and ignored.
    pub fn from_map(params: &HashMap<String, String>) -> Result<Self> {
        let mut config = RollingConfig::default();

        for (key, value) in params {
            match key.as_str() {
                "window" => {
                    config.window = value
                        .parse()
                        .map_err(|_| config_error!("Invalid window: {}", value))?;
                }
                "center" => config.center = parse_bool("center", value)?,
                "parallel" => config.parallel = parse_bool("parallel", value)?,
                "function" => config.function = value.parse()?,
                "distribution" => config.distribution = value.parse()?,
                "comm_tag" => {
                    config.comm_tag = value
                        .parse()
                        .map_err(|_| config_error!("Invalid comm_tag: {}", value))?;
                }
                "num_threads" => {
                    config.num_threads = value
                        .parse()
                        .map_err(|_| config_error!("Invalid num_threads: {}", value))?;
                }
                _ => {
                    log::warn!("Unknown configuration parameter: {}", key);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Convert configuration to key-value pairs
    pub fn as_parameter_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("window".to_string(), self.window.to_string());
        map.insert("center".to_string(), self.center.to_string());
        map.insert("parallel".to_string(), self.parallel.to_string());
        map.insert("function".to_string(), self.function.to_string());
        map.insert("distribution".to_string(), self.distribution.to_string());
        map.insert("comm_tag".to_string(), self.comm_tag.to_string());
        map.insert("num_threads".to_string(), self.num_threads.to_string());
        map
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(config_error!("Invalid {}: {}", name, value)),
    }
}

/// Builder for [`RollingConfig`].
#[derive(Debug)]
pub struct ConfigBuilder {
    config: RollingConfig,
    validation_errors: Vec<String>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        ConfigBuilder {
            config: RollingConfig::default(),
            validation_errors: Vec::new(),
        }
    }

    /// Set the window width
    pub fn window(mut self, window: usize) -> Self {
        if window < 1 {
            self.validation_errors
                .push("window must be at least 1".to_string());
        }
        self.config.window = window;
        self
    }

    /// Label results at the window center
    pub fn center(mut self, center: bool) -> Self {
        self.config.center = center;
        self
    }

    /// Enable or disable halo exchange
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Set the rolling function
    pub fn function(mut self, function: RollingFunction) -> Self {
        self.config.function = function;
        self
    }

    /// Set the data distribution
    pub fn distribution(mut self, distribution: Distribution) -> Self {
        self.config.distribution = distribution;
        self
    }

    /// Set the halo message tag
    pub fn comm_tag(mut self, tag: Tag) -> Self {
        self.config.comm_tag = tag;
        self
    }

    /// Set the number of threads for column-parallel rolling
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = threads;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<RollingConfig> {
        if !self.validation_errors.is_empty() {
            return Err(RollingError::config(format!(
                "Configuration validation failed: {}",
                self.validation_errors.join(", ")
            )));
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
