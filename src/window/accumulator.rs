//! Running window state and the reducers that finalize it.
//!
//! [`WindowState`] tracks how many real (non-NaN) observations are inside the
//! window and their sum. Adding and evicting values is the same for every
//! reducer; a [`Reducer`] only decides how a state becomes a result.

use crate::core::types::RollingFunction;
use std::fmt::Debug;

/// Running reduction over the values currently inside the window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowState {
    /// Number of non-missing values in the window
    pub observed: usize,
    /// Sum of the non-missing values in the window
    pub sum: f64,
}

impl WindowState {
    /// Incorporate one value; NaN is skipped
    #[inline]
    pub fn accumulate(self, value: f64) -> Self {
        if value.is_nan() {
            return self;
        }
        WindowState {
            observed: self.observed + 1,
            sum: self.sum + value,
        }
    }

    /// Evict one value previously passed to [`WindowState::accumulate`].
    ///
    /// Evicting a value that was never accumulated corrupts the state; this
    /// is not checked.
    #[inline]
    pub fn remove(self, value: f64) -> Self {
        if value.is_nan() {
            return self;
        }
        WindowState {
            observed: self.observed - 1,
            sum: self.sum - value,
        }
    }

    /// State after accumulating every value in order
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a f64>,
    {
        values
            .into_iter()
            .fold(WindowState::default(), |state, &value| state.accumulate(value))
    }
}

/// Turns a window state into the statistic reported for a position.
pub trait Reducer: Debug + Send + Sync {
    /// Statistic for `state`, or NaN when fewer than `min_periods`
    /// observations are available
    fn result(&self, state: &WindowState, min_periods: usize) -> f64;
}

/// Rolling sum.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumReducer;

impl Reducer for SumReducer {
    #[inline]
    fn result(&self, state: &WindowState, min_periods: usize) -> f64 {
        if state.observed >= min_periods {
            state.sum
        } else {
            f64::NAN
        }
    }
}

/// Reducer implementing a rolling function
pub fn reducer_for(function: RollingFunction) -> &'static dyn Reducer {
    match function {
        RollingFunction::Sum => &SumReducer,
    }
}
