//! Error handling and error types for halo-rolling.
//!
//! Every fallible operation in the crate returns [`Result`], and errors are
//! propagated with `?` up to the entry point. Transport failures are never
//! retried or translated into partial results: they surface unchanged as
//! [`RollingError::Communication`].

use std::io;
use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum RollingError {
    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// A required call argument was not supplied
    #[error("Missing required parameter: {parameter}")]
    MissingParameter { parameter: String },

    /// Point-to-point or collective transport failure
    #[error("Communication error: {message}")]
    Communication { message: String },

    /// Dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Internal library errors (should not occur in normal usage)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Type alias for Results using RollingError
pub type Result<T> = std::result::Result<T, RollingError>;

impl RollingError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        RollingError::Config {
            message: message.into(),
        }
    }

    /// Create a communication error
    pub fn communication<S: Into<String>>(message: S) -> Self {
        RollingError::Communication {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        RollingError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing parameter error
    pub fn missing_parameter<P: Into<String>>(parameter: P) -> Self {
        RollingError::MissingParameter {
            parameter: parameter.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        RollingError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        RollingError::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable.
    ///
    /// Nothing in a distributed rolling call is retried, so only errors raised
    /// before any communication started are safe to correct and resubmit.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RollingError::Config { .. } => true,
            RollingError::InvalidParameter { .. } => true,
            RollingError::MissingParameter { .. } => true,
            RollingError::Communication { .. } => false,
            RollingError::DimensionMismatch { .. } => false,
            RollingError::IO { .. } => true,
            RollingError::Json { .. } => true,
            RollingError::Internal { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            RollingError::Config { .. } => "config",
            RollingError::InvalidParameter { .. } => "invalid_parameter",
            RollingError::MissingParameter { .. } => "missing_parameter",
            RollingError::Communication { .. } => "communication",
            RollingError::DimensionMismatch { .. } => "dimension_mismatch",
            RollingError::IO { .. } => "io",
            RollingError::Json { .. } => "json",
            RollingError::Internal { .. } => "internal",
        }
    }
}

/// Convenience macros for error creation
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::RollingError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::RollingError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! comm_error {
    ($msg:expr) => {
        $crate::core::error::RollingError::communication($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::RollingError::communication(format!($fmt, $($arg)*))
    };
}
