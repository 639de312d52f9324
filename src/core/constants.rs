//! Constants and default configuration values.

use crate::core::types::{Rank, Tag};

/// Tag carried by halo messages between adjacent ranks.
pub const COMM_BORDER_TAG: Tag = 22;

/// Tag reserved for the point-to-point traffic that implements collectives.
pub const COLLECTIVE_TAG: Tag = -1;

/// Rank that gathers, computes and broadcasts in the small-partition fallback.
pub const COORDINATOR_RANK: Rank = 0;

/// Default window width; zero means "not set" and fails validation.
pub const DEFAULT_WINDOW: usize = 0;

/// Default centering of the window label.
pub const DEFAULT_CENTER: bool = false;

/// Default for exchanging halos with neighboring ranks.
pub const DEFAULT_PARALLEL: bool = true;

/// Default number of threads for column-parallel rolling.
/// 0 means use all available cores.
pub const DEFAULT_NUM_THREADS: usize = 0;

/// Environment variable prefix read by `RollingConfig::load_from_environment`.
pub const ENV_PREFIX: &str = "ROLLING_";

/// Crate version string.
pub const HALO_ROLLING_VERSION: &str = env!("CARGO_PKG_VERSION");
