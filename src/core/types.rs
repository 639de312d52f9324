//! Core data types shared by the window kernels, the network layer and the
//! configuration system.

use crate::core::error::{Result, RollingError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Zero-based process identifier.
pub type Rank = usize;

/// Message tag used to match point-to-point sends and receives.
pub type Tag = i32;

/// Fixed-size window description.
///
/// `min_periods` is always equal to `width`: a position only gets a value
/// once `width` non-missing observations sit inside its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Number of consecutive elements aggregated per output position
    pub width: usize,
    /// Label the result at the middle of the window instead of its right edge
    pub center: bool,
}

impl WindowSpec {
    /// Create a window description
    pub fn new(width: usize, center: bool) -> Self {
        WindowSpec { width, center }
    }

    /// Minimum number of real observations for a defined result
    pub fn min_periods(&self) -> usize {
        self.width
    }

    /// Distance between the window's right edge and the labelled position
    pub fn offset(&self) -> usize {
        if self.center {
            self.width.saturating_sub(1) / 2
        } else {
            0
        }
    }

    /// Number of neighbor elements exchanged with each adjacent rank.
    ///
    /// A centered window borrows `width / 2` elements from each side (even
    /// widths need the extra element on the left); a trailing window borrows
    /// `width - 1` elements from the left only.
    pub fn halo_size(&self) -> usize {
        if self.center {
            self.width / 2
        } else {
            self.width.saturating_sub(1)
        }
    }

    /// Smallest local partition that can serve the halo boundary patches
    pub fn required_local_len(&self) -> usize {
        if self.center {
            self.width
        } else {
            self.halo_size()
        }
    }

    /// Check that the width is usable
    pub fn validate(&self) -> Result<()> {
        if self.width < 1 {
            return Err(RollingError::invalid_parameter(
                "window",
                self.width.to_string(),
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Collective reduction operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReduceOp {
    /// Sum of all contributions
    Sum,
    /// Smallest contribution
    Min,
    /// Largest contribution
    Max,
}

impl ReduceOp {
    /// Fold a set of per-rank values with this operator
    pub fn fold(&self, values: &[u64]) -> u64 {
        match self {
            ReduceOp::Sum => values.iter().sum(),
            ReduceOp::Min => values.iter().copied().min().unwrap_or(0),
            ReduceOp::Max => values.iter().copied().max().unwrap_or(0),
        }
    }
}

/// How the logical array is split across ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// Balanced contiguous blocks computed by the block partition function
    Block,
    /// Arbitrary contiguous partitions, any lengths
    Variable,
}

impl Default for Distribution {
    fn default() -> Self {
        Distribution::Block
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Block => write!(f, "block"),
            Distribution::Variable => write!(f, "variable"),
        }
    }
}

impl FromStr for Distribution {
    type Err = RollingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "block" | "1d_block" => Ok(Distribution::Block),
            "variable" | "1d_var" => Ok(Distribution::Variable),
            _ => Err(RollingError::config(format!("Invalid distribution: {}", s))),
        }
    }
}

/// Aggregate computed over each window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollingFunction {
    /// Sum of the non-missing values
    Sum,
}

impl Default for RollingFunction {
    fn default() -> Self {
        RollingFunction::Sum
    }
}

impl fmt::Display for RollingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollingFunction::Sum => write!(f, "sum"),
        }
    }
}

impl FromStr for RollingFunction {
    type Err = RollingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sum" => Ok(RollingFunction::Sum),
            _ => Err(RollingError::config(format!(
                "unsupported rolling function: {}",
                s
            ))),
        }
    }
}
