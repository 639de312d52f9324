//! # Halo Rolling
//!
//! Fixed-window rolling aggregation over a one-dimensional array that is
//! split into contiguous partitions, one per cooperating process.
//!
//! Each process rolls its own partition in a single pass, then repairs the
//! outputs near its partition edges with a few elements borrowed from its
//! neighbors (the *halo*). The concatenation of every rank's output is
//! exactly what a single pass over the whole array would produce.
//!
//! ## Features
//!
//! - **NaN-aware windows**: missing values are skipped, and a position only
//!   gets a value once `width` real observations are inside its window.
//! - **Trailing and centered windows**, including even widths.
//! - **Overlapped communication**: halo transfers are in flight while the
//!   local pass runs.
//! - **Small-partition fallback**: when any partition is too short to serve
//!   a halo, the array is rolled centrally and redistributed, with the same
//!   result.
//! - **Injected transport**: the kernels talk to a [`Communicator`], never to
//!   process-global state. [`LocalNetwork`] runs a whole process group as
//!   threads for tests and single-machine use.
//!
//! ## Quick Start
//!
//! ```rust
//! use halo_rolling::{roll_fixed_seq, Communicator, ConfigBuilder, LocalNetwork, RollingWindow};
//! use ndarray::array;
//!
//! # fn main() -> halo_rolling::Result<()> {
//! // Single process
//! let (sums, _) = roll_fixed_seq(array![1.0, 2.0, 3.0, 4.0, 5.0].view(), 3, true);
//! assert_eq!(sums[2], 9.0);
//!
//! // Two ranks, each holding half of the array
//! let window = RollingWindow::new(ConfigBuilder::new().window(3).build()?)?;
//! let parts = LocalNetwork::try_run(2, |comm| {
//!     let local = if comm.rank() == 0 { array![1.0, 2.0, 3.0] } else { array![4.0, 5.0, 6.0] };
//!     window.apply(&comm, local.view())
//! })?;
//! assert_eq!(parts[1].to_vec(), vec![9.0, 12.0, 15.0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: error type, fundamental types, constants and logging setup
//! - [`config`]: [`RollingConfig`], its builder, file and environment loading
//! - [`network`]: the [`Communicator`] capability, block partitioning and the
//!   thread-backed [`LocalCommunicator`]
//! - [`window`]: the sequential kernel, halo exchange, fallback and driver

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]

// Core infrastructure module - always available
pub mod core;

// Configuration management module
pub mod config;

// Communication capability and partitioning
pub mod network;

// Rolling window kernels and entry points
pub mod window;

// Re-export core functionality for convenience
pub use crate::core::{
    constants::*,
    error::{Result, RollingError},
    init_logging,
    types::*,
};

// Re-export configuration functionality
pub use crate::config::{ArgValue, ConfigBuilder, RollingArgs, RollingConfig};

// Re-export communication functionality
pub use crate::network::{
    get_end, get_start, partition_range, Communicator, Completion, LocalCommunicator,
    LocalNetwork, RequestHandle,
};

// Re-export window functionality
pub use crate::window::{
    roll_fixed_seq, roll_sum_fixed, Reducer, RollingWindow, SumReducer, WindowState,
};

// Version information
pub use crate::core::constants::HALO_ROLLING_VERSION as VERSION;
