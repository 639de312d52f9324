//! Block partitioning of a logical array across ranks.
//!
//! `total` elements are split into `num_machines` contiguous blocks whose
//! lengths differ by at most one; the first `total % num_machines` ranks get
//! the extra element.

use crate::core::types::Rank;

/// First global index owned by `rank`
pub fn get_start(total: usize, num_machines: usize, rank: Rank) -> usize {
    if num_machines == 0 {
        return 0;
    }
    let block = total / num_machines;
    let remainder = total % num_machines;
    rank * block + rank.min(remainder)
}

/// One past the last global index owned by `rank`
pub fn get_end(total: usize, num_machines: usize, rank: Rank) -> usize {
    get_start(total, num_machines, rank + 1).min(total)
}

/// `[start, end)` owned by `rank`
pub fn partition_range(total: usize, num_machines: usize, rank: Rank) -> (usize, usize) {
    (
        get_start(total, num_machines, rank),
        get_end(total, num_machines, rank),
    )
}

/// Exclusive prefix sum of per-rank lengths, i.e. the `[start, end)` of
/// `rank` when partitions have arbitrary lengths.
pub fn variable_range(lengths: &[u64], rank: Rank) -> (usize, usize) {
    let start: u64 = lengths[..rank].iter().sum();
    (start as usize, (start + lengths[rank]) as usize)
}
