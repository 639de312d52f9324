//! Centralized gather/compute/broadcast path for undersized partitions.
//!
//! When any partition is too short to serve the halo patches, the whole
//! array is gathered on the coordinator, rolled there in one pass, and the
//! result is broadcast back. Every rank then keeps its own slice. The
//! result is the same as the halo path; only the cost differs.

use crate::core::constants::COORDINATOR_RANK;
use crate::core::error::{Result, RollingError};
use crate::core::types::{Distribution, WindowSpec};
use crate::network::partition::variable_range;
use crate::network::Communicator;
use crate::window::accumulator::Reducer;
use crate::window::sequential::roll_fixed_seq_with;
use ndarray::{Array1, ArrayView1};

/// Whether any rank's partition is shorter than the window requires.
///
/// Collective: every rank must call this with its own local length, and
/// every rank gets the same answer.
pub fn is_small_for_parallel<C: Communicator + ?Sized>(
    comm: &C,
    local_len: usize,
    spec: WindowSpec,
) -> Result<bool> {
    let is_small = u64::from(local_len < spec.required_local_len());
    let num_small = comm.reduce_sum(is_small)?;
    Ok(num_small != 0)
}

/// Roll the full array on the coordinator and hand each rank its slice.
///
/// Collective. With [`Distribution::Block`] the slice comes from the block
/// partition function; with [`Distribution::Variable`] it comes from the
/// actual local lengths of all ranks.
pub fn handle_small_data<C, R>(
    comm: &C,
    local: ArrayView1<'_, f64>,
    spec: WindowSpec,
    distribution: Distribution,
    reducer: &R,
) -> Result<Array1<f64>>
where
    C: Communicator + ?Sized,
    R: Reducer + ?Sized,
{
    let rank = comm.rank();
    let local_len = local.len();

    let (all_n, (start, end)) = match distribution {
        Distribution::Block => {
            let all_n = comm.reduce_sum(local_len as u64)? as usize;
            (all_n, comm.partition_range(all_n))
        }
        Distribution::Variable => {
            let lengths = comm.global_array(local_len as u64)?;
            let all_n = lengths.iter().sum::<u64>() as usize;
            (all_n, variable_range(&lengths, rank))
        }
    };

    let local_values = local.to_vec();
    let mut all_out = match comm.gather(&local_values, COORDINATOR_RANK)? {
        Some(all_in) => {
            let (all_out, _) = roll_fixed_seq_with(ArrayView1::from(&all_in), spec, reducer);
            all_out.to_vec()
        }
        None => vec![0.0; all_n],
    };
    comm.broadcast(&mut all_out, COORDINATOR_RANK)?;

    if all_out.len() != all_n {
        return Err(RollingError::internal(format!(
            "broadcast result has {} elements, expected {}",
            all_out.len(),
            all_n
        )));
    }

    if end - start != local_len {
        log::warn!(
            "rank {} holds {} elements but the {} distribution assigns [{}, {})",
            rank,
            local_len,
            distribution,
            start,
            end
        );
        return Err(RollingError::dimension_mismatch(
            format!("{} local elements for [{}, {})", end - start, start, end),
            local_len.to_string(),
        ));
    }

    Ok(Array1::from(all_out[start..end].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{partition_range, LocalNetwork};
    use crate::window::accumulator::SumReducer;

    #[test]
    fn test_trigger_is_global() {
        let spec = WindowSpec::new(4, false);
        let results = LocalNetwork::try_run(3, |comm| {
            let local_len = if comm.rank() == 2 { 1 } else { 10 };
            is_small_for_parallel(&comm, local_len, spec)
        })
        .unwrap();
        assert_eq!(results, vec![true, true, true]);

        let results = LocalNetwork::try_run(3, |comm| is_small_for_parallel(&comm, 3, spec)).unwrap();
        assert_eq!(results, vec![false, false, false]);
    }

    #[test]
    fn test_centered_trigger_needs_full_width() {
        let spec = WindowSpec::new(4, true);
        let results = LocalNetwork::try_run(2, |comm| is_small_for_parallel(&comm, 3, spec)).unwrap();
        assert_eq!(results, vec![true, true]);
    }

    #[test]
    fn test_block_fallback_slices_by_partition() {
        let global: Vec<f64> = (1..=10).map(f64::from).collect();
        let spec = WindowSpec::new(6, false);
        let results = LocalNetwork::try_run(2, |comm| {
            let (start, end) = partition_range(global.len(), 2, comm.rank());
            let local = ArrayView1::from(&global[start..end]);
            handle_small_data(&comm, local, spec, Distribution::Block, &SumReducer)
        })
        .unwrap();

        let tail: Vec<f64> = results[1].to_vec();
        assert!(results[0].iter().all(|v| v.is_nan()));
        assert_eq!(tail, vec![21.0, 27.0, 33.0, 39.0, 45.0]);
    }

    #[test]
    fn test_variable_fallback_keeps_caller_partitioning() {
        let global: Vec<f64> = (1..=6).map(f64::from).collect();
        let bounds = [(0, 1), (1, 1), (1, 6)];
        let spec = WindowSpec::new(2, false);
        let results = LocalNetwork::try_run(3, |comm| {
            let (start, end) = bounds[comm.rank()];
            let local = ArrayView1::from(&global[start..end]);
            handle_small_data(&comm, local, spec, Distribution::Variable, &SumReducer)
        })
        .unwrap();

        assert_eq!(results[0].len(), 1);
        assert!(results[0][0].is_nan());
        assert!(results[1].is_empty());
        assert_eq!(results[2].to_vec(), vec![3.0, 5.0, 7.0, 9.0, 11.0]);
    }

    #[test]
    fn test_block_mismatch_is_reported_on_the_offending_ranks() {
        let spec = WindowSpec::new(2, false);
        let results = LocalNetwork::run(2, |comm| {
            let local = if comm.rank() == 0 { vec![1.0] } else { vec![2.0, 3.0, 4.0] };
            handle_small_data(&comm, ArrayView1::from(&local), spec, Distribution::Block, &SumReducer)
        })
        .unwrap();

        assert!(matches!(results[0], Err(RollingError::DimensionMismatch { .. })));
        assert!(matches!(results[1], Err(RollingError::DimensionMismatch { .. })));
    }
}
