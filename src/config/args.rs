//! Call-site argument parsing for `rolling(window, center=...)` style calls.
//!
//! The window may be passed positionally or as the `window` keyword; it is
//! the only required argument.

use crate::config::core::RollingConfig;
use crate::core::error::{Result, RollingError};
use crate::core::types::RollingFunction;
use std::collections::HashMap;

/// A literal argument value at the call site.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Integer literal
    Int(i64),
    /// Boolean literal
    Bool(bool),
    /// String literal
    Str(String),
}

/// Window arguments extracted from a rolling call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingArgs {
    /// Window width
    pub window: usize,
    /// Centered window flag
    pub center: bool,
}

impl RollingArgs {
    /// Extract the window and center arguments from a call
    pub fn from_call(positional: &[ArgValue], keywords: &HashMap<String, ArgValue>) -> Result<Self> {
        let window = positional
            .first()
            .or_else(|| keywords.get("window"))
            .ok_or_else(|| RollingError::missing_parameter("window"))?;

        let window = match window {
            ArgValue::Int(value) if *value >= 1 => *value as usize,
            other => {
                return Err(RollingError::invalid_parameter(
                    "window",
                    format!("{:?}", other),
                    "must be a positive integer",
                ))
            }
        };

        let center = match keywords.get("center") {
            None => false,
            Some(ArgValue::Bool(value)) => *value,
            Some(other) => {
                return Err(RollingError::invalid_parameter(
                    "center",
                    format!("{:?}", other),
                    "must be a boolean",
                ))
            }
        };

        Ok(RollingArgs { window, center })
    }

    /// Turn the call arguments into a validated configuration
    pub fn into_config(self, function: RollingFunction, parallel: bool) -> Result<RollingConfig> {
        let config = RollingConfig {
            window: self.window,
            center: self.center,
            parallel,
            function,
            ..RollingConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}
