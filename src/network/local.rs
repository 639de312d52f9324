//! In-process communicator where every rank is a thread.
//!
//! Each ordered pair of ranks gets its own unbounded FIFO channel, so
//! messages between two ranks never overtake each other. Sends are buffered
//! and complete immediately; receives block inside [`Communicator::wait`].
//! A receive whose sender already exited fails with a communication error
//! instead of hanging.
//!
//! Collectives are built from point-to-point messages on
//! [`COLLECTIVE_TAG`], which callers must not use for their own traffic.

use crate::comm_error;
use crate::core::constants::COLLECTIVE_TAG;
use crate::core::error::{Result, RollingError};
use crate::core::types::{Rank, Tag};
use crate::network::{Communicator, Completion, RequestHandle};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
enum Payload {
    Values(Vec<f64>),
    Counts(Vec<u64>),
}

#[derive(Debug)]
struct Envelope {
    tag: Tag,
    payload: Payload,
}

#[derive(Debug)]
enum PendingOp {
    Send,
    Recv { src: Rank, tag: Tag, len: usize },
}

/// One rank's endpoint of a thread-backed process group.
#[derive(Debug)]
pub struct LocalCommunicator {
    rank: Rank,
    num_machines: usize,
    /// outboxes[dest] carries messages from this rank to `dest`
    outboxes: Vec<Sender<Envelope>>,
    /// inboxes[src] carries messages from `src` to this rank
    inboxes: Vec<Receiver<Envelope>>,
    /// Messages that arrived ahead of a receive with their tag
    stash: Mutex<HashMap<(Rank, Tag), VecDeque<Payload>>>,
    pending: Mutex<HashMap<u64, PendingOp>>,
    /// Messages owed to cancelled receives, dropped on arrival
    discards: Mutex<HashMap<(Rank, Tag), usize>>,
    next_request: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| RollingError::internal("communicator state lock poisoned"))
}

impl LocalCommunicator {
    fn check_peer(&self, peer: Rank) -> Result<()> {
        if peer >= self.num_machines {
            return Err(RollingError::invalid_parameter(
                "rank",
                peer.to_string(),
                format!("must be below the group size {}", self.num_machines),
            ));
        }
        Ok(())
    }

    fn register(&self, op: PendingOp) -> Result<RequestHandle> {
        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        lock(&self.pending)?.insert(id, op);
        Ok(RequestHandle::new(id))
    }

    fn post(&self, dest: Rank, tag: Tag, payload: Payload) -> Result<()> {
        self.check_peer(dest)?;
        self.outboxes[dest]
            .send(Envelope { tag, payload })
            .map_err(|_| {
                comm_error!(
                    "rank {} exited before rank {} could send to it (tag {})",
                    dest,
                    self.rank,
                    tag
                )
            })
    }

    fn recv_matching(&self, src: Rank, tag: Tag) -> Result<Payload> {
        loop {
            let payload = self.next_matching(src, tag)?;
            if !self.consume_discard(src, tag)? {
                return Ok(payload);
            }
        }
    }

    fn consume_discard(&self, src: Rank, tag: Tag) -> Result<bool> {
        let mut discards = lock(&self.discards)?;
        match discards.get_mut(&(src, tag)) {
            Some(count) if *count > 0 => {
                *count -= 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn next_matching(&self, src: Rank, tag: Tag) -> Result<Payload> {
        if let Some(payload) = lock(&self.stash)?
            .get_mut(&(src, tag))
            .and_then(VecDeque::pop_front)
        {
            return Ok(payload);
        }

        loop {
            let envelope = self.inboxes[src].recv().map_err(|_| {
                comm_error!(
                    "rank {} exited without sending to rank {} (tag {})",
                    src,
                    self.rank,
                    tag
                )
            })?;
            if envelope.tag == tag {
                return Ok(envelope.payload);
            }
            lock(&self.stash)?
                .entry((src, envelope.tag))
                .or_default()
                .push_back(envelope.payload);
        }
    }

    /// Requests issued but not yet waited on or cancelled
    pub fn outstanding_requests(&self) -> usize {
        lock(&self.pending).map(|pending| pending.len()).unwrap_or(0)
    }

    fn recv_values(&self, src: Rank, tag: Tag) -> Result<Vec<f64>> {
        match self.recv_matching(src, tag)? {
            Payload::Values(values) => Ok(values),
            Payload::Counts(_) => Err(comm_error!(
                "rank {} expected values from rank {} (tag {}), got counts",
                self.rank,
                src,
                tag
            )),
        }
    }

    fn recv_count(&self, src: Rank) -> Result<u64> {
        match self.recv_matching(src, COLLECTIVE_TAG)? {
            Payload::Counts(counts) if counts.len() == 1 => Ok(counts[0]),
            other => Err(comm_error!(
                "rank {} expected a single count from rank {}, got {:?}",
                self.rank,
                src,
                other
            )),
        }
    }
}

impl Communicator for LocalCommunicator {
    fn rank(&self) -> Rank {
        self.rank
    }

    fn num_machines(&self) -> usize {
        self.num_machines
    }

    fn isend(&self, data: &[f64], dest: Rank, tag: Tag) -> Result<RequestHandle> {
        self.post(dest, tag, Payload::Values(data.to_vec()))?;
        self.register(PendingOp::Send)
    }

    fn irecv(&self, len: usize, src: Rank, tag: Tag) -> Result<RequestHandle> {
        self.check_peer(src)?;
        self.register(PendingOp::Recv { src, tag, len })
    }

    fn wait(&self, request: RequestHandle) -> Result<Completion> {
        let op = lock(&self.pending)?.remove(&request.id()).ok_or_else(|| {
            RollingError::internal(format!("unknown request {}", request.id()))
        })?;

        match op {
            PendingOp::Send => Ok(Completion::Sent),
            PendingOp::Recv { src, tag, len } => {
                let values = self.recv_values(src, tag)?;
                if values.len() != len {
                    return Err(comm_error!(
                        "rank {} expected {} values from rank {} (tag {}), got {}",
                        self.rank,
                        len,
                        src,
                        tag,
                        values.len()
                    ));
                }
                Ok(Completion::Received(values))
            }
        }
    }

    fn cancel(&self, request: RequestHandle) -> Result<()> {
        let op = lock(&self.pending)?.remove(&request.id()).ok_or_else(|| {
            RollingError::internal(format!("unknown request {}", request.id()))
        })?;

        if let PendingOp::Recv { src, tag, .. } = op {
            *lock(&self.discards)?.entry((src, tag)).or_default() += 1;
        }
        Ok(())
    }

    fn global_array(&self, local: u64) -> Result<Vec<u64>> {
        for dest in (0..self.num_machines).filter(|&r| r != self.rank) {
            self.post(dest, COLLECTIVE_TAG, Payload::Counts(vec![local]))?;
        }

        (0..self.num_machines)
            .map(|src| {
                if src == self.rank {
                    Ok(local)
                } else {
                    self.recv_count(src)
                }
            })
            .collect()
    }

    fn gather(&self, local: &[f64], root: Rank) -> Result<Option<Vec<f64>>> {
        self.check_peer(root)?;
        if self.rank != root {
            self.post(root, COLLECTIVE_TAG, Payload::Values(local.to_vec()))?;
            return Ok(None);
        }

        let mut all = Vec::new();
        for src in 0..self.num_machines {
            if src == root {
                all.extend_from_slice(local);
            } else {
                all.extend(self.recv_values(src, COLLECTIVE_TAG)?);
            }
        }
        Ok(Some(all))
    }

    fn broadcast(&self, data: &mut Vec<f64>, root: Rank) -> Result<()> {
        self.check_peer(root)?;
        if self.rank == root {
            for dest in (0..self.num_machines).filter(|&r| r != root) {
                self.post(dest, COLLECTIVE_TAG, Payload::Values(data.clone()))?;
            }
        } else {
            *data = self.recv_values(root, COLLECTIVE_TAG)?;
        }
        Ok(())
    }
}

/// Factory and runner for thread-backed process groups.
#[derive(Debug)]
pub struct LocalNetwork;

impl LocalNetwork {
    /// Create the endpoints of a `num_machines`-rank group, in rank order
    pub fn new_group(num_machines: usize) -> Vec<LocalCommunicator> {
        let mut outboxes: Vec<Vec<Sender<Envelope>>> =
            (0..num_machines).map(|_| Vec::with_capacity(num_machines)).collect();
        let mut inboxes: Vec<Vec<Receiver<Envelope>>> =
            (0..num_machines).map(|_| Vec::with_capacity(num_machines)).collect();

        for dest in 0..num_machines {
            for src in 0..num_machines {
                let (tx, rx) = unbounded();
                outboxes[src].push(tx);
                inboxes[dest].push(rx);
            }
        }

        outboxes
            .into_iter()
            .zip(inboxes)
            .enumerate()
            .map(|(rank, (outboxes, inboxes))| LocalCommunicator {
                rank,
                num_machines,
                outboxes,
                inboxes,
                stash: Mutex::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
                discards: Mutex::new(HashMap::new()),
                next_request: AtomicU64::new(0),
            })
            .collect()
    }

    /// Run `f` once per rank, each on its own thread, and collect the
    /// results in rank order.
    ///
    /// A rank that panics is reported as a communication error; its peers
    /// see its channels close and fail instead of waiting forever.
    pub fn run<F, R>(num_machines: usize, f: F) -> Result<Vec<R>>
    where
        F: Fn(LocalCommunicator) -> R + Sync,
        R: Send,
    {
        let comms = Self::new_group(num_machines);
        let f = &f;

        std::thread::scope(|scope| -> Result<Vec<R>> {
            let mut handles = Vec::with_capacity(num_machines);
            for comm in comms {
                let rank = comm.rank();
                let handle = std::thread::Builder::new()
                    .name(format!("rank-{}", rank))
                    .spawn_scoped(scope, move || f(comm))?;
                handles.push((rank, handle));
            }

            // Join every rank before reporting so no panicked thread is left
            // for the scope to re-raise.
            let joined: Vec<_> = handles
                .into_iter()
                .map(|(rank, handle)| (rank, handle.join()))
                .collect();

            joined
                .into_iter()
                .map(|(rank, outcome)| outcome.map_err(|_| comm_error!("rank {} panicked", rank)))
                .collect()
        })
    }

    /// Like [`LocalNetwork::run`] for fallible per-rank work; the first
    /// failing rank's error is returned.
    pub fn try_run<F, T>(num_machines: usize, f: F) -> Result<Vec<T>>
    where
        F: Fn(LocalCommunicator) -> Result<T> + Sync,
        T: Send,
    {
        Self::run(num_machines, f)?.into_iter().collect()
    }
}

static_assertions::assert_impl_all!(LocalCommunicator: Send, Sync);
