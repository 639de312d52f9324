//! Halo exchange between rank-adjacent partitions.
//!
//! Each rank sends the edge of its partition to its neighbors and receives
//! theirs, so windows that straddle a partition boundary can be finished
//! locally. Trailing windows only need data from the left neighbor; centered
//! windows need both sides.
//!
//! Communication is launched before the local pass and awaited after it, so
//! the transfer overlaps with the local computation.

use crate::core::error::{Result, RollingError};
use crate::core::types::{Tag, WindowSpec};
use crate::network::{Communicator, RequestHandle};
use crate::window::accumulator::{Reducer, WindowState};
use ndarray::{s, ArrayView1, ArrayViewMut1};

/// In-flight halo traffic for one partition.
///
/// Every request is waited on at most once; the received buffers are only
/// handed out after their wait completes.
#[derive(Debug)]
pub struct HaloExchanger<'a, C: Communicator + ?Sized> {
    comm: &'a C,
    halo_size: usize,
    right_send: Option<RequestHandle>,
    left_send: Option<RequestHandle>,
    left_recv: Option<RequestHandle>,
    right_recv: Option<RequestHandle>,
}

impl<'a, C: Communicator + ?Sized> HaloExchanger<'a, C> {
    /// Issue all sends and receives this rank takes part in.
    ///
    /// Every rank but the last sends its trailing `halo_size` elements right
    /// and every rank but the first receives from the left. Centered windows
    /// add the mirror-image exchange.
    pub fn launch(comm: &'a C, local: ArrayView1<'_, f64>, spec: WindowSpec, tag: Tag) -> Result<Self> {
        let halo_size = spec.halo_size();
        let rank = comm.rank();
        let n = local.len();

        let mut exchanger = HaloExchanger {
            comm,
            halo_size,
            right_send: None,
            left_send: None,
            left_recv: None,
            right_recv: None,
        };

        if halo_size == 0 || comm.num_machines() <= 1 {
            return Ok(exchanger);
        }

        if n < halo_size {
            return Err(RollingError::dimension_mismatch(
                format!("at least {} local elements", halo_size),
                n.to_string(),
            ));
        }

        let is_first = rank == 0;
        let is_last = comm.is_last();

        if !is_last {
            let edge = local.slice(s![n - halo_size..]).to_vec();
            exchanger.right_send = Some(comm.isend(&edge, rank + 1, tag)?);
        }
        if !is_first {
            exchanger.left_recv = Some(comm.irecv(halo_size, rank - 1, tag)?);
        }
        if spec.center && !is_first {
            let edge = local.slice(s![..halo_size]).to_vec();
            exchanger.left_send = Some(comm.isend(&edge, rank - 1, tag)?);
        }
        if spec.center && !is_last {
            exchanger.right_recv = Some(comm.irecv(halo_size, rank + 1, tag)?);
        }

        log::debug!(
            "rank {} launched halo exchange: halo_size={}, center={}",
            rank,
            halo_size,
            spec.center
        );

        Ok(exchanger)
    }

    /// Elements exchanged with each neighbor
    pub fn halo_size(&self) -> usize {
        self.halo_size
    }

    /// Wait for both outgoing halos to leave this rank
    pub fn wait_sends(&mut self) -> Result<()> {
        if let Some(request) = self.right_send.take() {
            self.comm.wait(request)?;
        }
        if let Some(request) = self.left_send.take() {
            self.comm.wait(request)?;
        }
        Ok(())
    }

    /// Wait for the left neighbor's trailing edge, if this rank expects one
    pub fn wait_left(&mut self) -> Result<Option<Vec<f64>>> {
        let request = self.left_recv.take();
        self.wait_recv(request, "left")
    }

    /// Wait for the right neighbor's leading edge, if this rank expects one
    pub fn wait_right(&mut self) -> Result<Option<Vec<f64>>> {
        let request = self.right_recv.take();
        self.wait_recv(request, "right")
    }

    /// Whether every request has been waited on
    pub fn is_drained(&self) -> bool {
        self.right_send.is_none()
            && self.left_send.is_none()
            && self.left_recv.is_none()
            && self.right_recv.is_none()
    }

    fn wait_recv(&self, request: Option<RequestHandle>, side: &str) -> Result<Option<Vec<f64>>> {
        let Some(request) = request else {
            return Ok(None);
        };
        let buffer = self.comm.wait(request)?.into_received().ok_or_else(|| {
            RollingError::internal(format!("{} halo receive completed as a send", side))
        })?;
        Ok(Some(buffer))
    }
}

impl<C: Communicator + ?Sized> Drop for HaloExchanger<'_, C> {
    /// Cancel whatever was not waited on, e.g. after an early `?` return.
    fn drop(&mut self) {
        let leftover = [
            self.right_send.take(),
            self.left_send.take(),
            self.left_recv.take(),
            self.right_recv.take(),
        ];
        for request in leftover.into_iter().flatten() {
            if let Err(e) = self.comm.cancel(request) {
                log::debug!("rank {} could not cancel halo request: {}", self.comm.rank(), e);
            }
        }
    }
}

/// Recompute the outputs whose window reaches before local index 0.
///
/// The window is rebuilt from the left neighbor's halo and the first
/// `width - 1` local elements are replayed, evicting halo values instead of
/// local ones. Requires at least `width - 1` local elements.
pub fn patch_left<R: Reducer + ?Sized>(
    local: ArrayView1<'_, f64>,
    mut output: ArrayViewMut1<'_, f64>,
    left_recv: &[f64],
    spec: WindowSpec,
    reducer: &R,
) {
    let offset = spec.offset();
    let min_periods = spec.min_periods();
    debug_assert!(local.len() + 1 >= spec.width);

    let mut state = WindowState::from_values(left_recv);
    for i in 0..spec.width.saturating_sub(1) {
        state = state.accumulate(local[i]);
        if i > offset {
            state = state.remove(left_recv[i - offset - 1]);
        }
        if i >= offset {
            output[i - offset] = reducer.result(&state, min_periods);
        }
    }
}

/// Recompute the centered tail using the right neighbor's halo.
///
/// Continues from `state`, the window after the last local element. Only
/// indices inside the partition are written; for even widths the last halo
/// element is consumed without producing an output. Requires at least
/// `width` local elements.
pub fn patch_right<R: Reducer + ?Sized>(
    local: ArrayView1<'_, f64>,
    mut output: ArrayViewMut1<'_, f64>,
    right_recv: &[f64],
    mut state: WindowState,
    spec: WindowSpec,
    reducer: &R,
) {
    let n = local.len();
    let width = spec.width;
    let offset = spec.offset();
    let min_periods = spec.min_periods();
    debug_assert!(n >= width);

    for (i, &incoming) in right_recv.iter().enumerate() {
        state = state.accumulate(incoming);
        state = state.remove(local[n + i - width]);

        let target = n + i - offset;
        if target < n {
            output[target] = reducer.result(&state, min_periods);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::LocalNetwork;
    use crate::window::accumulator::SumReducer;
    use crate::window::sequential::roll_fixed_seq;
    use ndarray::{array, Array1};

    #[test]
    fn test_patch_left_trailing() {
        // global [1..=6] split as [1, 2, 3] | [4, 5, 6], width 3
        let local = array![4.0, 5.0, 6.0];
        let spec = WindowSpec::new(3, false);
        let (mut out, _) = roll_fixed_seq(local.view(), 3, false);
        patch_left(local.view(), out.view_mut(), &[2.0, 3.0], spec, &SumReducer);
        assert_eq!(out, array![9.0, 12.0, 15.0]);
    }

    #[test]
    fn test_patch_right_centered() {
        // global [1..=6] split as [1, 2, 3] | [4, 5, 6], width 3 centered
        let local = array![1.0, 2.0, 3.0];
        let spec = WindowSpec::new(3, true);
        let (mut out, state) = roll_fixed_seq(local.view(), 3, true);
        patch_right(local.view(), out.view_mut(), &[4.0], state, spec, &SumReducer);
        assert!(out[0].is_nan());
        assert_eq!(out[1], 6.0);
        assert_eq!(out[2], 9.0);
    }

    #[test]
    fn test_patch_right_even_width_stays_in_bounds() {
        // global [1..=8] split as [1..=4] | [5..=8], width 4 centered
        let local = array![1.0, 2.0, 3.0, 4.0];
        let spec = WindowSpec::new(4, true);
        let (mut out, state) = roll_fixed_seq(local.view(), 4, true);
        patch_right(local.view(), out.view_mut(), &[5.0, 6.0], state, spec, &SumReducer);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_eq!(out[2], 10.0);
        assert_eq!(out[3], 14.0);
    }

    #[test]
    fn test_launch_and_drain_centered() {
        let spec = WindowSpec::new(3, true);
        let results = LocalNetwork::try_run(3, |comm| {
            let base = comm.rank() as f64 * 10.0;
            let local: Array1<f64> = array![base, base + 1.0, base + 2.0];
            let mut exchanger = HaloExchanger::launch(&comm, local.view(), spec, 22)?;
            exchanger.wait_sends()?;
            let left = exchanger.wait_left()?;
            let right = exchanger.wait_right()?;
            assert!(exchanger.is_drained());
            Ok((left, right))
        })
        .unwrap();

        assert_eq!(results[0], (None, Some(vec![10.0])));
        assert_eq!(results[1], (Some(vec![2.0]), Some(vec![20.0])));
        assert_eq!(results[2], (Some(vec![12.0]), None));
    }

    #[test]
    fn test_dropped_exchanger_releases_its_requests() {
        let spec = WindowSpec::new(3, false);
        let results = LocalNetwork::try_run(2, |comm| {
            let stale = Array1::from(vec![-1.0; 4]);
            let exchanger = HaloExchanger::launch(&comm, stale.view(), spec, 22)?;
            drop(exchanger);
            assert_eq!(comm.outstanding_requests(), 0);

            let local = Array1::from(vec![comm.rank() as f64 + 1.0; 4]);
            let mut exchanger = HaloExchanger::launch(&comm, local.view(), spec, 22)?;
            exchanger.wait_sends()?;
            let left = exchanger.wait_left()?;
            drop(exchanger);
            assert_eq!(comm.outstanding_requests(), 0);
            Ok(left)
        })
        .unwrap();

        assert_eq!(results[0], None);
        assert_eq!(results[1], Some(vec![1.0, 1.0]));
    }

    #[test]
    fn test_launch_trailing_only_receives_from_left() {
        let spec = WindowSpec::new(3, false);
        let results = LocalNetwork::try_run(2, |comm| {
            let local = Array1::from(vec![comm.rank() as f64; 4]);
            let mut exchanger = HaloExchanger::launch(&comm, local.view(), spec, 22)?;
            assert_eq!(exchanger.halo_size(), 2);
            exchanger.wait_sends()?;
            Ok((exchanger.wait_left()?, exchanger.wait_right()?))
        })
        .unwrap();

        assert_eq!(results[0], (None, None));
        assert_eq!(results[1], (Some(vec![0.0, 0.0]), None));
    }
}
