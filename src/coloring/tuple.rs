//! The record manipulated by the coloring engine.
//!
//! Every tuple ties a node to the partition it currently believes it is
//! in (`pc`) and the candidate it may move to next (`pn`). The candidate
//! is a tagged variant rather than a sentinel id: its derived ordering
//! puts every concrete merge proposal below `TupleStable`, and
//! `TupleStable` below `PartitionStable`, which is exactly the order the
//! bucket minimum logic needs. Parent-request tuples used by pointer
//! doubling are distinguished by an explicit kind tag.

use serde_derive::{Deserialize, Serialize};
use std::cmp::Ordering;

pub type PartitionId = i64;
pub type NodeId = i64;

/// Next-partition candidate of a tuple.
///
/// The derived `Ord` is load-bearing: `Merge(a) < Merge(b)` iff `a < b`,
/// and any `Merge` sorts below the two stable states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Candidate {
    /// Propose moving the tuple's partition into the given one.
    Merge(PartitionId),
    /// This tuple saw a consistent neighbourhood this round.
    TupleStable,
    /// The whole partition is confirmed stable; the tuple can retire.
    PartitionStable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TupleKind {
    /// An ordinary member tuple created from an edge.
    Member,
    /// A transient tuple that fetches the current partition of a node
    /// during pointer doubling.
    ParentRequest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuple {
    /// Current partition. Mutated by merges.
    pub pc: PartitionId,
    /// Candidate next partition.
    pub pn: Candidate,
    /// The node this tuple belongs to; immutable after creation.
    pub nid: NodeId,
    pub kind: TupleKind,
}

impl Tuple {
    /// Member tuple for edge `(src, dst)`: the node `dst` starts out in
    /// partition `src`. The candidate is overwritten by the first
    /// neighbour poll before it is ever read.
    pub fn member(src: PartitionId, dst: NodeId) -> Self {
        Tuple { pc: src, pn: Candidate::PartitionStable, nid: dst, kind: TupleKind::Member }
    }

    /// Request tuple that will fetch the current partition of `target`.
    /// It polls as node `target` and, once flipped back, merges as a
    /// member of partition `target`.
    pub fn parent_request(target: PartitionId) -> Self {
        Tuple {
            pc: target,
            pn: Candidate::PartitionStable,
            nid: target,
            kind: TupleKind::ParentRequest,
        }
    }

    pub fn is_member(&self) -> bool {
        self.kind == TupleKind::Member
    }
}

/// Sort key of the neighbour-poll phase: group by node, members first.
pub fn by_node_then_partition(a: &Tuple, b: &Tuple) -> Ordering {
    (a.nid, a.kind, a.pc).cmp(&(b.nid, b.kind, b.pc))
}

/// Sort key of the merge phase: group by partition, best candidate first.
pub fn by_partition_then_candidate(a: &Tuple, b: &Tuple) -> Ordering {
    (a.pc, a.pn, a.kind, a.nid).cmp(&(b.pc, b.pn, b.kind, b.nid))
}

/// Final sort key for the component count.
pub fn by_partition(a: &Tuple, b: &Tuple) -> Ordering {
    a.pc.cmp(&b.pc)
}
