//! # Rolling Window Module
//!
//! Fixed-window rolling aggregation over partitioned arrays.
//!
//! - [`accumulator`]: running window state and reducers
//! - [`sequential`]: the single-pass kernel over one contiguous array
//! - [`halo`]: neighbor exchange and boundary patches
//! - [`fallback`]: centralized path for partitions too short for a halo
//! - [`driver`]: entry points that choose between the three paths
//!
//! ```rust
//! use halo_rolling::network::{Communicator, LocalNetwork};
//! use halo_rolling::window::roll_sum_fixed;
//! use ndarray::ArrayView1;
//!
//! let global: Vec<f64> = (1..=8).map(f64::from).collect();
//! let parts = LocalNetwork::try_run(2, |comm| {
//!     let (start, end) = comm.partition_range(global.len());
//!     roll_sum_fixed(&comm, ArrayView1::from(&global[start..end]), 3, false, true)
//! })
//! .unwrap();
//! assert_eq!(parts[1].to_vec(), vec![12.0, 15.0, 18.0, 21.0]);
//! ```

pub mod accumulator;
pub mod driver;
pub mod fallback;
pub mod halo;
pub mod sequential;

pub use accumulator::{reducer_for, Reducer, SumReducer, WindowState};
pub use driver::{roll_sum_fixed, RollingWindow};
pub use fallback::{handle_small_data, is_small_for_parallel};
pub use halo::{patch_left, patch_right, HaloExchanger};
pub use sequential::{roll_fixed_seq, roll_fixed_seq_with};
