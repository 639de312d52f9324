//! Configuration management for rolling computations.
//!
//! A [`RollingConfig`] can be built programmatically with [`ConfigBuilder`],
//! loaded from `.toml`/`.json` files or `ROLLING_*` environment variables,
//! or derived from call-site arguments with [`RollingArgs`].

pub mod args;
pub mod core;

pub use args::{ArgValue, RollingArgs};
pub use self::core::{ConfigBuilder, RollingConfig};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "rolling.toml";
