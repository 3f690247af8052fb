//! Strategy selection from the degree distribution.
//!
//! Scale-free graphs carry a giant component that one BFS sweep clears
//! cheaply, so the driver peels it before coloring. The verdict comes
//! from fitting a discrete power law to the degree-frequency histogram
//! (with +1 smoothing, fed to the fit as the sample set) and thresholding
//! the Kolmogorov-Smirnov statistic at 0.05 on rank 0.

use crate::graph::Edge;
use gc_comm::distribute::distribute_inplace;
use gc_comm::sort::sort_by;
use gc_comm::Comm;
use hashbrown::HashMap;
use log::info;
use serde_derive::{Deserialize, Serialize};

pub mod powerlaw;

const KS_THRESHOLD: f64 = 0.05;

/// A rank's leading or trailing source bucket. These may straddle rank
/// boundaries, so they are merged on rank 0 instead of being counted
/// locally.
#[derive(Clone, Serialize, Deserialize)]
struct BoundaryBucket {
    src: i64,
    unique_dsts: usize,
    first_dst: i64,
    last_dst: i64,
}

/// Decides whether a BFS peel should run before coloring. Collective;
/// all ranks return the same verdict.
pub fn run_bfs_decision(edge_list: &mut Vec<Edge>, comm: &Comm) -> bool {
    distribute_inplace(edge_list, comm);
    sort_by(edge_list, comm, |a, b| a.cmp(b));

    let (histogram, boundaries) = local_degree_histogram(edge_list);

    let histogram_pairs: Vec<(usize, usize)> = histogram.into_iter().collect();
    let gathered_histograms = comm.gatherv(&histogram_pairs, 0);
    let gathered_boundaries = comm.gatherv(&boundaries, 0);

    let mut decision = 0_i32;
    if comm.rank() == 0 {
        let mut merged: HashMap<usize, usize> = HashMap::new();
        for (degree, count) in gathered_histograms.expect("rank 0 gathers histograms") {
            *merged.entry(degree).or_insert(0) += count;
        }
        for (_, degree) in
            merge_boundary_buckets(&gathered_boundaries.expect("rank 0 gathers boundaries"))
        {
            *merged.entry(degree).or_insert(0) += 1;
        }

        let max_degree = merged.keys().copied().max().unwrap_or(0);
        // Frequency of every degree in [1, max_degree], plus one per bin
        // for numerical stability.
        let degree_holder: Vec<f64> = (1..=max_degree)
            .map(|degree| merged.get(&degree).copied().unwrap_or(0) as f64 + 1.0)
            .collect();

        match powerlaw::fit_discrete_power_law(&degree_holder) {
            Some(fit) if fit.d < KS_THRESHOLD => {
                info!("Kolmogorov-Smirnov statistic {} (below {})", fit.d, KS_THRESHOLD);
                decision = 1;
            }
            Some(fit) => {
                info!("Kolmogorov-Smirnov statistic {} (above {})", fit.d, KS_THRESHOLD);
            }
            None => {
                info!("Degree distribution too degenerate for a power-law fit");
            }
        }
    }

    comm.allreduce(&decision, |a, b| *a.max(b)) == 1
}

/// Degrees of the interior source buckets, counted locally, plus the two
/// boundary buckets left for rank 0 to merge. The edge list must be
/// locally sorted by `(src, dst)`.
fn local_degree_histogram(
    edge_list: &[Edge],
) -> (HashMap<usize, usize>, Vec<BoundaryBucket>) {
    let mut histogram = HashMap::new();
    let mut boundaries = Vec::new();

    let mut begin = 0;
    while begin < edge_list.len() {
        let src = edge_list[begin].0;
        let mut end = begin;
        let mut unique_dsts = 0;
        let mut previous_dst = None;
        while end < edge_list.len() && edge_list[end].0 == src {
            // Duplicate destinations are counted once.
            if previous_dst != Some(edge_list[end].1) {
                unique_dsts += 1;
                previous_dst = Some(edge_list[end].1);
            }
            end += 1;
        }

        let is_boundary = begin == 0 || end == edge_list.len();
        if is_boundary {
            boundaries.push(BoundaryBucket {
                src,
                unique_dsts,
                first_dst: edge_list[begin].1,
                last_dst: edge_list[end - 1].1,
            });
        } else {
            *histogram.entry(unique_dsts).or_insert(0) += 1;
        }
        begin = end;
    }
    (histogram, boundaries)
}

/// Merges the per-rank boundary bucket fragments, in rank order, into one
/// degree per source vertex. Fragments of the same source on adjacent
/// ranks are joined, deduplicating a destination run split by the cut.
fn merge_boundary_buckets(fragments: &[BoundaryBucket]) -> Vec<(i64, usize)> {
    let mut merged: Vec<(i64, usize)> = Vec::new();
    let mut current: Option<BoundaryBucket> = None;

    for fragment in fragments {
        match current.take() {
            Some(mut bucket) if bucket.src == fragment.src => {
                bucket.unique_dsts += fragment.unique_dsts;
                if bucket.last_dst == fragment.first_dst {
                    bucket.unique_dsts -= 1;
                }
                bucket.last_dst = fragment.last_dst;
                current = Some(bucket);
            }
            Some(bucket) => {
                merged.push((bucket.src, bucket.unique_dsts));
                current = Some(fragment.clone());
            }
            None => {
                current = Some(fragment.clone());
            }
        }
    }
    if let Some(bucket) = current {
        merged.push((bucket.src, bucket.unique_dsts));
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::{local_degree_histogram, merge_boundary_buckets, run_bfs_decision};
    use crate::graph::Edge;
    use gc_comm::distribute::distribute_inplace;
    use gc_comm::execute;

    #[test]
    fn chain_degrees_count_boundary_buckets_once() {
        for &ranks in &[1, 4] {
            let results = execute(ranks, |comm| {
                let mut edges: Vec<Edge> = Vec::new();
                if comm.rank() == 0 {
                    for node in 0_i64..100 {
                        edges.push((node, node + 1));
                        edges.push((node + 1, node));
                    }
                }
                distribute_inplace(&mut edges, comm);
                gc_comm::sort::sort_by(&mut edges, comm, |a, b| a.cmp(b));

                let (histogram, boundaries) = local_degree_histogram(&edges);
                let pairs: Vec<(usize, usize)> = histogram.into_iter().collect();
                (comm.gatherv(&pairs, 0), comm.gatherv(&boundaries, 0))
            });

            let (histograms, boundaries) = results.into_iter().next().expect("rank 0 result");
            let mut merged = std::collections::HashMap::new();
            for (degree, count) in histograms.expect("rank 0") {
                *merged.entry(degree).or_insert(0) += count;
            }
            for (_, degree) in merge_boundary_buckets(&boundaries.expect("rank 0")) {
                *merged.entry(degree).or_insert(0) += 1;
            }
            // Chain of 101 nodes: two endpoints of degree 1, rest degree 2.
            assert_eq!(merged.get(&1), Some(&2), "ranks={}", ranks);
            assert_eq!(merged.get(&2), Some(&99), "ranks={}", ranks);
            assert_eq!(merged.len(), 2);
        }
    }

    #[test]
    fn duplicate_destinations_count_once() {
        let edges = vec![(5_i64, 1_i64), (5, 1), (5, 2), (7, 1), (9, 1)];
        let (histogram, boundaries) = local_degree_histogram(&edges);
        // Interior bucket: src 7 with one destination.
        assert_eq!(histogram.get(&1), Some(&1));
        assert_eq!(histogram.len(), 1);
        // Boundary buckets: src 5 (two unique dsts) and src 9.
        let merged = merge_boundary_buckets(&boundaries);
        assert_eq!(merged, vec![(5, 2), (9, 1)]);
    }

    #[test]
    fn straddling_bucket_fragments_are_joined() {
        let edges_by_rank: Vec<Vec<Edge>> =
            vec![vec![(3, 10), (3, 11)], vec![(3, 11), (3, 12)], vec![(3, 12), (4, 1)]];
        let mut fragments = Vec::new();
        for local in &edges_by_rank {
            let (histogram, boundaries) = local_degree_histogram(local);
            assert!(histogram.is_empty());
            fragments.extend(boundaries);
        }
        let merged = merge_boundary_buckets(&fragments);
        // src 3 reaches {10, 11, 12}; the split runs of 11 and 12 must
        // not be double counted.
        assert_eq!(merged, vec![(3, 3), (4, 1)]);
    }

    #[test]
    fn chain_never_selects_bfs() {
        let results = execute(4, |comm| {
            let mut edges: Vec<Edge> = Vec::new();
            if comm.rank() == 0 {
                for node in 0_i64..500 {
                    edges.push((node, node + 1));
                    edges.push((node + 1, node));
                }
            }
            run_bfs_decision(&mut edges, comm)
        });
        assert_eq!(results, vec![false, false, false, false]);
    }
}
