//! The distributed edge-list model shared by all engines.
//!
//! A graph is a block-distributed `Vec<Edge>` in which every undirected
//! edge appears twice, once per direction. The engines rely on that
//! bidirectionality invariant; `check_edge_bidirectionality` verifies it
//! at phase boundaries.

use gc_comm::distribute::global_size;
use gc_comm::sort::sort_by;
use gc_comm::Comm;
use log::info;

pub mod compact;
pub mod export;
pub mod permute;

/// Vertex ids are one concrete signed 64-bit type throughout.
pub type VertexId = i64;

/// One directed representative of an undirected edge.
pub type Edge = (VertexId, VertexId);

/// Number of undirected edges in the distributed list (each is stored in
/// both directions).
pub fn global_undirected_edge_count(edge_list: &[Edge], comm: &Comm) -> usize {
    global_size(edge_list.len(), comm) / 2
}

/// Confirms that every edge `(u, v)` has its mirror `(v, u)` somewhere in
/// the distributed list.
///
/// Sorts one copy by `(src, dst)` and another by `(dst, src)`; the i-th
/// elements must then be flips of each other on every rank. Verdict is
/// agreed by allreduce-min.
pub fn check_edge_bidirectionality(edge_list: &[Edge], comm: &Comm) -> bool {
    let mut by_src = edge_list.to_vec();
    let mut by_dst = edge_list.to_vec();
    sort_by(&mut by_src, comm, |a, b| a.cmp(b));
    sort_by(&mut by_dst, comm, |a, b| (a.1, a.0).cmp(&(b.1, b.0)));

    let local_check = by_src.len() == by_dst.len()
        && by_src.iter().zip(by_dst.iter()).all(|(a, b)| a.0 == b.1 && a.1 == b.0);
    comm.allreduce(&local_check, |a, b| *a && *b)
}

/// Logs the min, mean and max local edge count across ranks.
pub fn print_edge_list_distribution(local_len: usize, comm: &Comm) {
    let max_load = comm.allreduce(&local_len, |a, b| *a.max(b));
    let min_load = comm.allreduce(&local_len, |a, b| *a.min(b));
    let mean_load = global_size(local_len, comm) / comm.size();
    if comm.rank() == 0 {
        info!(
            "Distribution of edge list; min-mean-max : {},{},{}",
            min_load, mean_load, max_load
        );
    }
}

#[cfg(test)]
mod tests {
    use super::check_edge_bidirectionality;
    use gc_comm::execute;

    #[test]
    fn bidirectional_list_passes() {
        let results = execute(2, |comm| {
            // Chain 0-1-2 with mirrors split across ranks.
            let edges = if comm.rank() == 0 {
                vec![(0, 1), (2, 1)]
            } else {
                vec![(1, 0), (1, 2)]
            };
            check_edge_bidirectionality(&edges, comm)
        });
        assert_eq!(results, vec![true, true]);
    }

    #[test]
    fn missing_mirror_fails() {
        let results = execute(2, |comm| {
            let edges = if comm.rank() == 0 { vec![(0, 1), (1, 0)] } else { vec![(5, 6)] };
            check_edge_bidirectionality(&edges, comm)
        });
        assert_eq!(results, vec![false, false]);
    }
}
