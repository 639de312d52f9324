//! Entry points that pick between the local, halo and fallback paths.

use crate::config::RollingConfig;
use crate::core::error::{Result, RollingError};
use crate::core::types::WindowSpec;
use crate::network::Communicator;
use crate::window::accumulator::{reducer_for, Reducer};
use crate::window::fallback::{handle_small_data, is_small_for_parallel};
use crate::window::halo::{patch_left, patch_right, HaloExchanger};
use crate::window::sequential::roll_fixed_seq_with;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use num_traits::AsPrimitive;
use rayon::prelude::*;

/// A validated rolling computation, ready to apply to partitions.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    config: RollingConfig,
}

impl RollingWindow {
    /// Validate `config` and wrap it
    pub fn new(config: RollingConfig) -> Result<Self> {
        config.validate()?;
        Ok(RollingWindow { config })
    }

    /// Configuration this window was built from
    pub fn config(&self) -> &RollingConfig {
        &self.config
    }

    /// Window shape
    pub fn spec(&self) -> WindowSpec {
        self.config.window_spec()
    }

    fn reducer(&self) -> &'static dyn Reducer {
        reducer_for(self.config.function)
    }

    /// Roll this rank's partition and return its slice of the global result.
    ///
    /// With `parallel` disabled no communication takes place. Otherwise the
    /// call is collective: every rank of `comm` must make it with the same
    /// configuration.
    pub fn apply<C, T>(&self, comm: &C, local: ArrayView1<'_, T>) -> Result<Array1<f64>>
    where
        C: Communicator + ?Sized,
        T: AsPrimitive<f64>,
    {
        let values = local.mapv(|v| v.as_());
        self.roll(comm, values.view())
    }

    /// Roll a partition that is the whole array
    pub fn apply_local<T: AsPrimitive<f64>>(&self, input: ArrayView1<'_, T>) -> Array1<f64> {
        let values = input.mapv(|v| v.as_());
        roll_fixed_seq_with(values.view(), self.spec(), self.reducer()).0
    }

    /// Roll every column of a row-partitioned block independently.
    ///
    /// Local columns run on a rayon pool sized by `num_threads`. Distributed
    /// columns run one after another so every rank issues its collectives in
    /// the same order.
    pub fn apply_columns<C, T>(&self, comm: &C, local: ArrayView2<'_, T>) -> Result<Array2<f64>>
    where
        C: Communicator + ?Sized,
        T: AsPrimitive<f64>,
    {
        let values = local.mapv(|v| v.as_());
        let (rows, cols) = values.dim();

        let columns: Vec<Array1<f64>> = if self.config.parallel {
            (0..cols)
                .map(|j| self.roll(comm, values.column(j)))
                .collect::<Result<_>>()?
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.config.effective_num_threads())
                .build()
                .map_err(|e| RollingError::internal(format!("Failed to build thread pool: {}", e)))?;
            let spec = self.spec();
            let reducer = self.reducer();
            pool.install(|| {
                (0..cols)
                    .into_par_iter()
                    .map(|j| roll_fixed_seq_with(values.column(j), spec, reducer).0)
                    .collect()
            })
        };

        let mut output = Array2::<f64>::zeros((rows, cols));
        for (j, column) in columns.into_iter().enumerate() {
            output.column_mut(j).assign(&column);
        }
        Ok(output)
    }

    fn roll<C>(&self, comm: &C, local: ArrayView1<'_, f64>) -> Result<Array1<f64>>
    where
        C: Communicator + ?Sized,
    {
        let spec = self.spec();
        let reducer = self.reducer();
        let rank = comm.rank();

        if !self.config.parallel {
            log::debug!("rank {} rolling {} elements locally", rank, local.len());
            return Ok(roll_fixed_seq_with(local, spec, reducer).0);
        }

        if is_small_for_parallel(comm, local.len(), spec)? {
            log::info!(
                "rank {}: a partition is shorter than {} elements, centralizing rolling window",
                rank,
                spec.required_local_len()
            );
            return handle_small_data(comm, local, spec, self.config.distribution, reducer);
        }

        log::debug!(
            "rank {} rolling {} elements with halo exchange (halo_size={})",
            rank,
            local.len(),
            spec.halo_size()
        );

        let mut exchanger = HaloExchanger::launch(comm, local, spec, self.config.comm_tag)?;
        let (mut output, state) = roll_fixed_seq_with(local, spec, reducer);

        exchanger.wait_sends()?;
        if let Some(left) = exchanger.wait_left()? {
            patch_left(local, output.view_mut(), &left, spec, reducer);
        }
        if let Some(right) = exchanger.wait_right()? {
            patch_right(local, output.view_mut(), &right, state, spec, reducer);
        }

        Ok(output)
    }
}

/// Rolling sum over this rank's partition.
///
/// Collective when `parallel` is true. Fails before any communication when
/// `width` is zero.
pub fn roll_sum_fixed<C, T>(
    comm: &C,
    local: ArrayView1<'_, T>,
    width: usize,
    center: bool,
    parallel: bool,
) -> Result<Array1<f64>>
where
    C: Communicator + ?Sized,
    T: AsPrimitive<f64>,
{
    let config = RollingConfig {
        window: width,
        center,
        parallel,
        ..RollingConfig::default()
    };
    RollingWindow::new(config)?.apply(comm, local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::network::{partition_range, LocalNetwork};
    use ndarray::{array, Axis};

    fn same(actual: &[f64], expected: &[f64]) -> bool {
        actual.len() == expected.len()
            && actual
                .iter()
                .zip(expected)
                .all(|(a, e)| (a.is_nan() && e.is_nan()) || a == e)
    }

    fn distributed(global: &[f64], world: usize, width: usize, center: bool) -> Vec<f64> {
        LocalNetwork::try_run(world, |comm| {
            let (start, end) = partition_range(global.len(), world, comm.rank());
            roll_sum_fixed(&comm, ArrayView1::from(&global[start..end]), width, center, true)
        })
        .unwrap()
        .into_iter()
        .flat_map(|part| part.to_vec())
        .collect()
    }

    #[test]
    fn test_local_path_skips_communication() {
        let comms = LocalNetwork::new_group(1);
        let out = roll_sum_fixed(&comms[0], array![1.0, 2.0, 3.0, 4.0, 5.0].view(), 3, false, false)
            .unwrap();
        assert!(same(out.as_slice().unwrap(), &[f64::NAN, f64::NAN, 6.0, 9.0, 12.0]));
    }

    #[test]
    fn test_halo_path_matches_sequential() {
        let global: Vec<f64> = (1..=20).map(f64::from).collect();
        for &(width, center) in &[(3, false), (3, true), (4, true), (5, false)] {
            let (expected, _) = roll_fixed_seq_with(
                ArrayView1::from(&global),
                WindowSpec::new(width, center),
                reducer_for(Default::default()),
            );
            let actual = distributed(&global, 3, width, center);
            assert!(same(&actual, expected.as_slice().unwrap()), "width={} center={}", width, center);
        }
    }

    #[test]
    fn test_fallback_path_matches_sequential() {
        let global: Vec<f64> = (1..=10).map(f64::from).collect();
        let (expected, _) = roll_fixed_seq_with(
            ArrayView1::from(&global),
            WindowSpec::new(6, true),
            reducer_for(Default::default()),
        );
        let actual = distributed(&global, 2, 6, true);
        assert!(same(&actual, expected.as_slice().unwrap()));
    }

    #[test]
    fn test_integer_input_is_upcast() {
        let comms = LocalNetwork::new_group(1);
        let input = array![1_i32, 2, 3, 4];
        let out = roll_sum_fixed(&comms[0], input.view(), 2, false, true).unwrap();
        assert!(same(out.as_slice().unwrap(), &[f64::NAN, 3.0, 5.0, 7.0]));
    }

    #[test]
    fn test_zero_width_is_rejected() {
        let comms = LocalNetwork::new_group(1);
        let err = roll_sum_fixed(&comms[0], array![1.0, 2.0].view(), 0, false, true).unwrap_err();
        assert!(matches!(err, RollingError::InvalidParameter { .. }));
    }

    #[test]
    fn test_apply_columns_local() {
        let window = RollingWindow::new(
            ConfigBuilder::new().window(2).parallel(false).num_threads(2).build().unwrap(),
        )
        .unwrap();
        let comms = LocalNetwork::new_group(1);
        let input = array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]];
        let out = window.apply_columns(&comms[0], input.view()).unwrap();

        assert!(same(&out.column(0).to_vec(), &[f64::NAN, 3.0, 5.0]));
        assert!(same(&out.column(1).to_vec(), &[f64::NAN, 30.0, 50.0]));
    }

    #[test]
    fn test_apply_columns_distributed() {
        let global = array![[1.0, 1.0], [2.0, 0.0], [3.0, 1.0], [4.0, 0.0], [5.0, 1.0], [6.0, 0.0]];
        let window = RollingWindow::new(ConfigBuilder::new().window(3).center(true).build().unwrap())
            .unwrap();

        let parts = LocalNetwork::try_run(2, |comm| {
            let (start, end) = partition_range(global.nrows(), 2, comm.rank());
            window.apply_columns(&comm, global.slice(ndarray::s![start..end, ..]))
        })
        .unwrap();
        let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
        let out = ndarray::concatenate(Axis(0), &views).unwrap();

        let expected = window.apply_local(global.column(0));
        assert!(same(&out.column(0).to_vec(), &expected.to_vec()));
        assert!(same(&out.column(1).to_vec(), &[f64::NAN, 2.0, 1.0, 2.0, 1.0, f64::NAN]));
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let global: Vec<f64> = (0..30).map(|i| f64::from(i % 7)).collect();
        let first = distributed(&global, 4, 4, false);
        let second = distributed(&global, 4, 4, false);
        assert_eq!(
            first.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            second.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }
}
