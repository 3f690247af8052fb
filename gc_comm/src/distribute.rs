//! Block decomposition of distributed sequences.
//!
//! A sequence of global length `N` over `P` ranks is block-partitioned:
//! the first `N mod P` ranks hold `ceil(N / P)` elements, the rest hold
//! `floor(N / P)`. Every mutation of a distributed container's
//! cardinality is followed by a rebalance back to this canonical layout.

use crate::comm::Comm;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Canonical partitioning of `total` elements over `parts` ranks.
#[derive(Clone, Copy, Debug)]
pub struct BlockPartition {
    total: usize,
    parts: usize,
}

impl BlockPartition {
    pub fn new(total: usize, parts: usize) -> Self {
        assert!(parts > 0, "partition needs at least one part");
        BlockPartition { total, parts }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of elements held by `rank`.
    pub fn local_size(&self, rank: usize) -> usize {
        let base = self.total / self.parts;
        let extra = self.total % self.parts;
        base + usize::from(rank < extra)
    }

    /// Number of elements held by ranks before `rank`.
    pub fn prefix(&self, rank: usize) -> usize {
        let base = self.total / self.parts;
        let extra = self.total % self.parts;
        base * rank + rank.min(extra)
    }

    /// Rank owning the element with global index `index`.
    pub fn owner(&self, index: usize) -> usize {
        assert!(index < self.total, "global index {} out of {}", index, self.total);
        let base = self.total / self.parts;
        let extra = self.total % self.parts;
        let boundary = (base + 1) * extra;
        if index < boundary {
            index / (base + 1)
        } else {
            extra + (index - boundary) / base
        }
    }
}

/// Global element count of a distributed container.
pub fn global_size(local_len: usize, comm: &Comm) -> usize {
    comm.allreduce(&local_len, |a, b| a + b)
}

/// Restores the canonical block layout of a distributed vector, keeping
/// the global element order intact. A no-op when the sequence is empty.
pub fn distribute_inplace<T>(data: &mut Vec<T>, comm: &Comm)
where
    T: Serialize + DeserializeOwned + Clone,
{
    if comm.size() == 1 {
        return;
    }
    let total = global_size(data.len(), comm);
    if total == 0 {
        return;
    }
    let part = BlockPartition::new(total, comm.size());
    let offset = comm.exscan(&data.len(), |a, b| a + b).unwrap_or(0);

    let mut buckets: Vec<Vec<T>> = vec![Vec::new(); comm.size()];
    for (i, element) in data.drain(..).enumerate() {
        buckets[part.owner(offset + i)].push(element);
    }
    // Senders hold ascending global ranges and per-bucket order is
    // preserved, so concatenating by sender restores the global order.
    *data = comm.all_to_all_v(buckets).into_iter().flatten().collect();
    assert_eq!(data.len(), part.local_size(comm.rank()), "block rebalance invariant broken");
}

/// Rebalances only the active suffix `data[mid..]` across ranks, leaving
/// every rank's inactive prefix `data[..mid]` in place. Used to equalize
/// the working set once stable elements have been retired to the prefix.
pub fn block_decompose_partitions<T>(data: &mut Vec<T>, mid: usize, comm: &Comm)
where
    T: Serialize + DeserializeOwned + Clone,
{
    if comm.size() == 1 {
        return;
    }
    let active_total = global_size(data.len() - mid, comm);
    if active_total == 0 {
        return;
    }
    let part = BlockPartition::new(active_total, comm.size());
    let offset = comm.exscan(&(data.len() - mid), |a, b| a + b).unwrap_or(0);

    let mut buckets: Vec<Vec<T>> = vec![Vec::new(); comm.size()];
    for (i, element) in data.drain(mid..).enumerate() {
        buckets[part.owner(offset + i)].push(element);
    }
    data.extend(comm.all_to_all_v(buckets).into_iter().flatten());
    assert_eq!(
        data.len() - mid,
        part.local_size(comm.rank()),
        "active-suffix rebalance invariant broken"
    );
}
