//! Undirected chain generator, mainly used by tests and scaling runs.

use crate::graph::Edge;
use gc_comm::distribute::BlockPartition;
use gc_comm::Comm;

/// Appends the edges of the chain `0 - 1 - ... - (chain_length - 1)` to
/// `edge_list`, split across ranks by block-decomposing the node range.
/// Each rank also emits the stitch edge to the next rank's first node.
pub fn populate_edge_list(edge_list: &mut Vec<Edge>, chain_length: usize, comm: &Comm) {
    let part = BlockPartition::new(chain_length, comm.size());
    let local_size = part.local_size(comm.rank());
    if local_size == 0 {
        return;
    }

    let begin_node = part.prefix(comm.rank()) as i64;
    let last_node = begin_node + local_size as i64 - 1;
    for node in begin_node..last_node {
        edge_list.push((node, node + 1));
        edge_list.push((node + 1, node));
    }

    // Stitch to the next rank unless this rank holds the chain's end.
    if (last_node as usize) + 1 < chain_length {
        edge_list.push((last_node, last_node + 1));
        edge_list.push((last_node + 1, last_node));
    }
}
