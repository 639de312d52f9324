//! Single-pass fixed-window rolling over one contiguous array.
//!
//! No communication happens here. The pass is O(N) with O(1) state: each
//! step adds the entering value and evicts the one leaving the window.

use crate::core::types::WindowSpec;
use crate::window::accumulator::{Reducer, SumReducer, WindowState};
use ndarray::{Array1, ArrayView1};

/// Rolling sum over `input`.
///
/// Returns the output array and the window state after the last element,
/// which the centered halo patch continues from.
pub fn roll_fixed_seq(
    input: ArrayView1<'_, f64>,
    width: usize,
    center: bool,
) -> (Array1<f64>, WindowState) {
    roll_fixed_seq_with(input, WindowSpec::new(width, center), &SumReducer)
}

/// Rolling reduction over `input` with an arbitrary reducer.
///
/// Every output index is written exactly once, by the ramp, the main
/// phase or the centered tail.
pub fn roll_fixed_seq_with<R: Reducer + ?Sized>(
    input: ArrayView1<'_, f64>,
    spec: WindowSpec,
    reducer: &R,
) -> (Array1<f64>, WindowState) {
    let n = input.len();
    let width = spec.width;
    let min_periods = spec.min_periods();
    let offset = spec.offset();
    let mut output = Array1::<f64>::zeros(n);
    let mut state = WindowState::default();

    let range_endpoint = (min_periods.max(1) - 1).min(n);

    // Ramp: the window is never full yet.
    for i in 0..range_endpoint {
        state = state.accumulate(input[i]);
        if i >= offset {
            output[i - offset] = f64::NAN;
        }
    }

    for i in range_endpoint..n {
        state = state.accumulate(input[i]);
        if i >= width {
            state = state.remove(input[i - width]);
        }
        output[i - offset] = reducer.result(&state, min_periods);
    }

    // Centered tail: the window would reach past the local end.
    for j in n.saturating_sub(offset)..n {
        output[j] = f64::NAN;
    }

    (output, state)
}
