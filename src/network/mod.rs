//! # Network Communication Module
//!
//! The communication capability the rolling kernels are written against.
//! A [`Communicator`] is injected into every distributed call; the kernels
//! never look up a global rank or world size.
//!
//! Point-to-point traffic is non-blocking: [`Communicator::isend`] and
//! [`Communicator::irecv`] return a [`RequestHandle`] that must be passed to
//! [`Communicator::wait`] or [`Communicator::cancel`] exactly once. Handles are neither `Clone` nor
//! `Copy`, so a second wait on the same request does not compile.
//!
//! Collectives (`global_array`, `allreduce`, `gather`, `broadcast`) must be
//! entered by every rank in the same order.

pub mod local;
pub mod partition;

pub use local::{LocalCommunicator, LocalNetwork};
pub use partition::{get_end, get_start, partition_range};

use crate::core::error::Result;
use crate::core::types::{Rank, ReduceOp, Tag};

/// Opaque token for an in-flight send or receive.
///
/// Issued by a [`Communicator`] and consumed by [`Communicator::wait`].
#[derive(Debug, PartialEq, Eq, Hash)]
#[must_use = "a request must be waited on before its buffers are used"]
pub struct RequestHandle(u64);

impl RequestHandle {
    /// Wrap a communicator-specific request id
    pub fn new(id: u64) -> Self {
        RequestHandle(id)
    }

    /// Communicator-specific request id
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Outcome of waiting on a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// A send finished; its source buffer may be reused
    Sent,
    /// A receive finished; the buffer now belongs to the caller
    Received(Vec<f64>),
}

impl Completion {
    /// Take the received buffer, if this was a receive
    pub fn into_received(self) -> Option<Vec<f64>> {
        match self {
            Completion::Received(buffer) => Some(buffer),
            Completion::Sent => None,
        }
    }
}

/// Process-group communication capability.
pub trait Communicator: Send {
    /// Rank of this process
    fn rank(&self) -> Rank;

    /// Total number of processes
    fn num_machines(&self) -> usize;

    /// Start sending a copy of `data` to `dest`
    fn isend(&self, data: &[f64], dest: Rank, tag: Tag) -> Result<RequestHandle>;

    /// Start receiving exactly `len` values from `src`
    fn irecv(&self, len: usize, src: Rank, tag: Tag) -> Result<RequestHandle>;

    /// Block until the request completes
    fn wait(&self, request: RequestHandle) -> Result<Completion>;

    /// Abandon a request without waiting on it.
    ///
    /// A cancelled receive still consumes its message when that message
    /// arrives, so later receives with the same source and tag are not
    /// matched against it.
    fn cancel(&self, request: RequestHandle) -> Result<()>;

    /// All-gather one count per rank, returned in rank order on every rank
    fn global_array(&self, local: u64) -> Result<Vec<u64>>;

    /// Gather variable-length arrays to `root` in rank order.
    ///
    /// Returns `Some` with the concatenation on `root` and `None` elsewhere.
    fn gather(&self, local: &[f64], root: Rank) -> Result<Option<Vec<f64>>>;

    /// Replicate `root`'s buffer into `data` on every rank
    fn broadcast(&self, data: &mut Vec<f64>, root: Rank) -> Result<()>;

    /// Reduce one count per rank; every rank receives the result
    fn allreduce(&self, local: u64, op: ReduceOp) -> Result<u64> {
        Ok(op.fold(&self.global_array(local)?))
    }

    /// Global sum of one count per rank
    fn reduce_sum(&self, local: u64) -> Result<u64> {
        self.allreduce(local, ReduceOp::Sum)
    }

    /// This rank's `[start, end)` slice of a block-distributed array
    fn partition_range(&self, global_len: usize) -> (usize, usize) {
        partition_range(global_len, self.num_machines(), self.rank())
    }

    /// Whether this rank is the last one
    fn is_last(&self) -> bool {
        self.rank() + 1 == self.num_machines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_into_received() {
        assert_eq!(Completion::Sent.into_received(), None);
        assert_eq!(
            Completion::Received(vec![1.0, 2.0]).into_received(),
            Some(vec![1.0, 2.0])
        );
    }

    #[test]
    fn test_default_collectives_single_rank() {
        let comms = LocalNetwork::new_group(1);
        let comm = &comms[0];
        assert_eq!(comm.reduce_sum(7).unwrap(), 7);
        assert_eq!(comm.allreduce(7, ReduceOp::Max).unwrap(), 7);
        assert_eq!(comm.partition_range(10), (0, 10));
        assert!(comm.is_last());
    }
}
