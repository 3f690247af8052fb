//! Vertex id compaction.
//!
//! Relabels the vertex ids appearing in a distributed edge list onto the
//! dense range `0..|V|` without changing connectivity. Each endpoint gets
//! one pass: sort the edges by that endpoint, assign ascending dense ids
//! to the runs of equal values, stitch the run shared across a rank
//! boundary with a neighbour exchange, and shift every rank's ids by an
//! exclusive scan of the adjusted run counts.
//!
//! Both passes enumerate the identical vertex set because every edge is
//! present in both directions, so they produce the same bijection. The
//! edge list leaves the second pass globally sorted by `src`.

use crate::graph::Edge;
use gc_comm::sort::sort_by;
use gc_comm::Comm;
use log::info;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Src,
    Dst,
}

/// Compacts the ids of the distributed edge list in place and returns the
/// vertex count `|V|` (on every rank).
pub fn reduce_vertex_ids(edge_list: &mut Vec<Edge>, comm: &Comm) -> usize {
    let input_edges = gc_comm::distribute::global_size(edge_list.len(), comm);

    let vertices_by_dst = compact_endpoint(edge_list, comm, Endpoint::Dst);
    let vertices_by_src = compact_endpoint(edge_list, comm, Endpoint::Src);
    assert_eq!(
        vertices_by_dst, vertices_by_src,
        "compaction bijectivity violated: endpoint passes disagree on |V|"
    );

    let output_edges = gc_comm::distribute::global_size(edge_list.len(), comm);
    assert_eq!(input_edges, output_edges, "compaction bijectivity violated: edge count changed");

    if comm.rank() == 0 {
        info!("Vertex ids compacted, |V| = {}", vertices_by_src);
    }
    vertices_by_src
}

/// One endpoint pass. Returns the global count of distinct values seen at
/// this endpoint, which equals `|V|` under the bidirectionality invariant.
fn compact_endpoint(edge_list: &mut Vec<Edge>, comm: &Comm, endpoint: Endpoint) -> usize {
    let key = move |edge: &Edge| match endpoint {
        Endpoint::Src => (edge.0, edge.1),
        Endpoint::Dst => (edge.1, edge.0),
    };
    sort_by(edge_list, comm, move |a, b| key(a).cmp(&key(b)));

    let mut unique_total = 0;
    comm.with_subset(!edge_list.is_empty(), |sub| {
        // Dense run index per local edge, in sorted order.
        let mut run_of_edge = Vec::with_capacity(edge_list.len());
        let mut runs = 0_usize;
        let mut previous = None;
        for edge in edge_list.iter() {
            let value = key(edge).0;
            if previous != Some(value) {
                previous = Some(value);
                runs += 1;
            }
            run_of_edge.push(runs - 1);
        }

        // A run shared with the next rank is claimed by that rank.
        let first_value = key(&edge_list[0]).0;
        let last_value = key(&edge_list[edge_list.len() - 1]).0;
        let next_first = sub.left_shift(&first_value);
        let shared_with_next = next_first == Some(last_value);
        let claimed = runs - usize::from(shared_with_next);

        let offset = sub.exscan(&claimed, |a, b| a + b).unwrap_or(0);
        for (edge, run) in edge_list.iter_mut().zip(run_of_edge.into_iter()) {
            let dense = (offset + run) as i64;
            match endpoint {
                Endpoint::Src => edge.0 = dense,
                Endpoint::Dst => edge.1 = dense,
            }
        }

        unique_total = sub.allreduce(&claimed, |a, b| a + b);
    });
    // Ranks outside the subset learn the count here.
    comm.allreduce(&unique_total, |a, b| *a.max(b))
}
