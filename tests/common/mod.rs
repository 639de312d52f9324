//! Common test utilities for halo-rolling integration tests.

#![allow(dead_code)]

use halo_rolling::*;
use ndarray::{Array1, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Single-process reference over the whole array
pub fn reference(global: &[f64], width: usize, center: bool) -> Vec<f64> {
    roll_fixed_seq(ArrayView1::from(global), width, center).0.to_vec()
}

/// Exact comparison where NaN equals NaN
pub fn same_values(actual: &[f64], expected: &[f64]) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(a, e)| (a.is_nan() && e.is_nan()) || a == e)
}

/// Panic with both sequences when they differ
pub fn assert_same_values(actual: &[f64], expected: &[f64]) {
    assert!(
        same_values(actual, expected),
        "values differ:\n  actual:   {:?}\n  expected: {:?}",
        actual,
        expected
    );
}

/// `[start, end)` per rank for the block distribution
pub fn block_bounds(len: usize, world: usize) -> Vec<(usize, usize)> {
    (0..world).map(|rank| partition_range(len, world, rank)).collect()
}

/// `[start, end)` per rank from explicit partition lengths
pub fn bounds_from_lengths(lengths: &[usize]) -> Vec<(usize, usize)> {
    let mut start = 0;
    lengths
        .iter()
        .map(|&len| {
            let bounds = (start, start + len);
            start += len;
            bounds
        })
        .collect()
}

/// Integer-valued data with roughly one NaN in `nan_every` positions
pub fn integer_data(len: usize, seed: u64, nan_every: u32) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len)
        .map(|_| {
            if nan_every > 0 && rng.gen_ratio(1, nan_every) {
                f64::NAN
            } else {
                f64::from(rng.gen_range(-50i32..50))
            }
        })
        .collect()
}

/// Uniform floating point data
pub fn float_data(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-100.0..100.0)).collect()
}

/// Roll `global` split at `bounds`, one thread per rank, and concatenate
/// the per-rank outputs in rank order
pub fn run_distributed(global: &[f64], bounds: &[(usize, usize)], config: &RollingConfig) -> Result<Vec<f64>> {
    let window = RollingWindow::new(config.clone())?;
    let parts: Vec<Array1<f64>> = LocalNetwork::try_run(bounds.len(), |comm| {
        let (start, end) = bounds[comm.rank()];
        window.apply(&comm, ArrayView1::from(&global[start..end]))
    })?;
    Ok(parts.into_iter().flat_map(|part| part.to_vec()).collect())
}

/// Configuration for a distributed rolling sum
pub fn sum_config(width: usize, center: bool, distribution: Distribution) -> RollingConfig {
    ConfigBuilder::new()
        .window(width)
        .center(center)
        .distribution(distribution)
        .build()
        .unwrap()
}
