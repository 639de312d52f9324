//! Core infrastructure: error types, fundamental types, constants and the
//! logging bootstrap.
//!
//! ```rust
//! use halo_rolling::core::{types::WindowSpec, constants::COMM_BORDER_TAG};
//!
//! let spec = WindowSpec::new(4, true);
//! assert_eq!(spec.halo_size(), 2);
//! assert_eq!(COMM_BORDER_TAG, 22);
//! ```

pub mod constants;
pub mod error;
pub mod types;

pub use constants::*;
pub use error::{Result, RollingError};
pub use types::*;

/// Initialize the `env_logger` backend for the `log` facade.
///
/// Safe to call more than once; later calls are no-ops. When `RUST_LOG` is
/// not set the level defaults to `info`.
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init()
        .is_ok()
    {
        log::debug!("Logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        log::info!("logging works after repeated init");
    }
}
