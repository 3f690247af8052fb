//! Connected component labeling by iterated label propagation.
//!
//! Every edge contributes one tuple; a bulk-synchronous round first polls
//! each node's neighbourhood for the smallest reachable partition (sort
//! by node, scan buckets), then merges every partition into its best
//! candidate (sort by partition, scan buckets). Buckets straddling rank
//! boundaries are resolved with one forward and one reverse exclusive
//! scan. Pointer doubling shortcuts parent chains by fetching, for every
//! merge target, that node's own current partition within the same round.
//! Stable partitions retire to an inactive prefix and the active suffix
//! is rebalanced across ranks.

use crate::graph::Edge;
use crate::util::timer::GcTimer;
use gc_comm::distribute::{block_decompose_partitions, distribute_inplace, global_size};
use gc_comm::sort::{is_sorted, sort_by, unique_count};
use gc_comm::Comm;
use log::{debug, info};

pub mod tuple;

use crate::coloring::tuple::{
    by_node_then_partition, by_partition, by_partition_then_candidate, Candidate, NodeId,
    PartitionId, Tuple,
};

/// Pointer doubling switch (runtime, not a type parameter).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Doubling {
    On,
    Off,
}

/// Optimization level of the round loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptLevel {
    /// Keep every tuple active until global convergence.
    Naive,
    /// Retire tuples of stable partitions to the inactive prefix.
    StableRemoved,
    /// Additionally rebalance the active suffix across ranks each round.
    LoadBalanced,
}

/// Which tuples a neighbour poll updates.
#[derive(Clone, Copy, PartialEq, Eq)]
enum PollTarget {
    /// Ordinary rounds: propose candidates for every member tuple.
    Members,
    /// Doubling: only fill in the parent-request tuples.
    Requests,
}

/// Which rule the merge phase applies.
#[derive(Clone, Copy, PartialEq, Eq)]
enum MergeMode {
    /// Ordinary rounds: merge or confirm partition stability.
    Normal,
    /// Doubling replay: rewrite merged partitions to the fetched parent,
    /// leave stable partitions alone.
    Replay,
}

pub struct ColoringEngine<'a, 'b> {
    comm: &'a Comm<'b>,
    tuples: Vec<Tuple>,
    doubling: Doubling,
    opt: OptLevel,
    /// Tuples before this offset belong to stable partitions and no
    /// longer participate in rounds.
    stable_prefix: usize,
}

impl<'a, 'b> ColoringEngine<'a, 'b> {
    /// Builds the tuple set from a distributed edge list in which every
    /// undirected edge is present in both directions. No self-loop tuples
    /// are added: the mirror edges already give every node a tuple.
    pub fn new(
        edge_list: &mut Vec<Edge>,
        comm: &'a Comm<'b>,
        doubling: Doubling,
        opt: OptLevel,
    ) -> Self {
        sort_by(edge_list, comm, |a, b| a.cmp(b));

        let mut tuples: Vec<Tuple> =
            edge_list.iter().map(|&(src, dst)| Tuple::member(src, dst)).collect();
        distribute_inplace(&mut tuples, comm);

        let total_tuples = global_size(tuples.len(), comm);
        if comm.rank() == 0 {
            info!("Total tuple count is {}", total_tuples);
        }
        ColoringEngine { comm, tuples, doubling, opt, stable_prefix: 0 }
    }

    /// Runs rounds until every partition is stable.
    pub fn compute(&mut self) {
        let timer = GcTimer::now();
        let mut converged = false;
        let mut iterations = 0;

        while !converged {
            iterations += 1;
            if self.comm.rank() == 0 {
                info!("Iteration #{}", iterations);
            }
            self.print_workload();

            let comm = self.comm;
            let doubling = self.doubling;
            let mid = self.stable_prefix;
            let tuples = &mut self.tuples;

            with_active(tuples, mid, comm, |active, sub| {
                poll_neighbourhoods(active, sub, PollTarget::Members);
            });

            let mut local_converged = true;
            let mut requests = Vec::new();
            with_active(tuples, mid, comm, |active, sub| {
                let (quiet, reqs) =
                    merge_partitions(active, sub, MergeMode::Normal, doubling == Doubling::On);
                local_converged = quiet;
                requests = reqs;
            });
            converged = comm.allreduce(&local_converged, |a, b| *a && *b);

            if self.doubling == Doubling::On {
                self.do_pointer_doubling(requests);
            }

            if !converged && self.opt != OptLevel::Naive {
                let split = itertools::partition(
                    &mut self.tuples[self.stable_prefix..],
                    |tuple| tuple.pn == Candidate::PartitionStable,
                );
                self.stable_prefix += split;
                if self.opt == OptLevel::LoadBalanced {
                    block_decompose_partitions(&mut self.tuples, self.stable_prefix, self.comm);
                }
            }
        }

        if self.comm.rank() == 0 {
            info!(
                "Algorithm took {} iterations in {}",
                iterations,
                timer.elapsed().to_seconds_string()
            );
        }
    }

    /// Counts distinct partitions over the final tuple set. Call after
    /// `compute`; equals the number of connected components.
    pub fn compute_component_count(&mut self) -> usize {
        let comm = self.comm;
        let tuples = &mut self.tuples;

        let mut component_count = 0;
        comm.with_subset(!tuples.is_empty(), |sub| {
            if !is_sorted(tuples, sub, by_partition) {
                sort_by(tuples, sub, by_partition);
            }
            component_count = unique_count(tuples, sub, |a, b| a.pc == b.pc);
        });
        comm.allreduce(&component_count, |a, b| *a.max(b))
    }

    /// Pointer doubling: append the parent requests, let them poll the
    /// merge targets' own partitions, replay the merge with the fetched
    /// parents folded in, then drop the requests and rebalance the active
    /// suffix.
    fn do_pointer_doubling(&mut self, requests: Vec<Tuple>) {
        let comm = self.comm;
        let mid = self.stable_prefix;
        let tuples = &mut self.tuples;

        tuples.extend(requests);
        comm.with_subset(mid < tuples.len(), |sub| {
            let mut active = tuples.split_off(mid);
            poll_neighbourhoods(&mut active, sub, PollTarget::Requests);
            let _ = merge_partitions(&mut active, sub, MergeMode::Replay, false);
            tuples.extend(active);
        });

        let mut active = tuples.split_off(mid);
        active.retain(Tuple::is_member);
        tuples.extend(active);

        block_decompose_partitions(tuples, mid, comm);
    }

    fn print_workload(&self) {
        let local = self.tuples.len() - self.stable_prefix;
        let max_load = self.comm.allreduce(&local, |a, b| *a.max(b));
        let min_load = self.comm.allreduce(&local, |a, b| *a.min(b));
        let mean_load = global_size(local, self.comm) / self.comm.size();
        if self.comm.rank() == 0 {
            debug!(
                "Load distribution of active tuples min-mean-max : {},{},{}",
                min_load, mean_load, max_load
            );
        }
    }
}

/// Runs `f` over the globally nonempty active suffixes, on the
/// sub-communicator of ranks that have any.
fn with_active<F>(tuples: &mut Vec<Tuple>, mid: usize, comm: &Comm, f: F)
where
    F: FnOnce(&mut Vec<Tuple>, &Comm),
{
    comm.with_subset(mid < tuples.len(), |sub| {
        let mut active = tuples.split_off(mid);
        f(&mut active, sub);
        tuples.extend(active);
    });
}

fn min_opt(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (value, None) | (None, value) => value,
    }
}

fn max_opt(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (value, None) | (None, value) => value,
    }
}

/// Neighbour poll: sort by `(nid, pc)` and, per node bucket, compare the
/// smallest reachable partition with the largest one. Buckets straddling
/// rank boundaries fold the previous ranks' minimum (for the first local
/// bucket) and the following ranks' maximum (for the last local bucket).
/// Request tuples never contribute their `pc` to the bucket extrema.
fn poll_neighbourhoods(active: &mut Vec<Tuple>, sub: &Comm, target: PollTarget) {
    sort_by(active, sub, by_node_then_partition);
    debug_assert!(!active.is_empty());

    // (node of the last local bucket, min member pc in it).
    let last_bucket = bucket_extremum(active.iter().rev(), |t| t.nid, min_opt);
    let previous_min = sub.exscan(&last_bucket, |a, b| match b.0.cmp(&a.0) {
        std::cmp::Ordering::Greater => *b,
        std::cmp::Ordering::Equal => (a.0, min_opt(a.1, b.1)),
        std::cmp::Ordering::Less => *a,
    });
    // (node of the first local bucket, max member pc in it).
    let first_bucket = bucket_extremum(active.iter(), |t| t.nid, max_opt);
    let next_max = sub.exscan_rev(&first_bucket, |a, b| match b.0.cmp(&a.0) {
        std::cmp::Ordering::Less => *b,
        std::cmp::Ordering::Equal => (a.0, max_opt(a.1, b.1)),
        std::cmp::Ordering::Greater => *a,
    });

    let mut begin = 0;
    while begin < active.len() {
        let nid = active[begin].nid;
        let mut end = begin;
        let mut local_min = None;
        let mut local_max = None;
        while end < active.len() && active[end].nid == nid {
            if active[end].is_member() {
                local_min = min_opt(local_min, Some(active[end].pc));
                local_max = max_opt(local_max, Some(active[end].pc));
            }
            end += 1;
        }

        let mut global_min = local_min;
        if begin == 0 {
            if let Some((previous_nid, previous_pc)) = previous_min {
                if previous_nid == nid {
                    global_min = min_opt(global_min, previous_pc);
                }
            }
        }
        let mut global_max = local_max;
        if end == active.len() {
            if let Some((next_nid, next_pc)) = next_max {
                if next_nid == nid {
                    global_max = max_opt(global_max, next_pc);
                }
            }
        }

        match target {
            PollTarget::Members => {
                // The node id itself is always a reachable partition.
                let min_value = global_min.map_or(nid, |pc| pc.min(nid));
                let max_value =
                    global_max.expect("neighbour poll: node bucket without member tuples");
                if min_value < max_value {
                    for tuple in &mut active[begin..end] {
                        tuple.pn = Candidate::Merge(min_value);
                    }
                } else {
                    for tuple in &mut active[begin..end] {
                        tuple.pn = Candidate::TupleStable;
                    }
                }
            }
            PollTarget::Requests => {
                if active[begin..end].iter().any(|tuple| !tuple.is_member()) {
                    let fetched =
                        global_min.expect("parent fetch: node bucket without member tuples");
                    for tuple in &mut active[begin..end] {
                        if !tuple.is_member() {
                            tuple.pn = Candidate::Merge(fetched);
                        }
                    }
                }
            }
        }
        begin = end;
    }
}

/// Merge phase: sort by `(pc, pn)` and take each partition bucket's best
/// candidate, folding the previous ranks' minimum into the first local
/// bucket. Returns whether this rank saw no merge, plus one parent
/// request per merged local bucket when requested.
fn merge_partitions(
    active: &mut Vec<Tuple>,
    sub: &Comm,
    mode: MergeMode,
    collect_requests: bool,
) -> (bool, Vec<Tuple>) {
    sort_by(active, sub, by_partition_then_candidate);
    debug_assert!(!active.is_empty());

    // (partition of the last local bucket, min candidate in it).
    let last = active.last().expect("active range is nonempty");
    let mut last_bucket = (last.pc, last.pn);
    for tuple in active.iter().rev() {
        if tuple.pc != last_bucket.0 {
            break;
        }
        last_bucket.1 = last_bucket.1.min(tuple.pn);
    }
    let previous_min = sub.exscan(&last_bucket, |a, b| match b.0.cmp(&a.0) {
        std::cmp::Ordering::Greater => *b,
        std::cmp::Ordering::Equal => (a.0, a.1.min(b.1)),
        std::cmp::Ordering::Less => *a,
    });

    let mut quiet = true;
    let mut requests = Vec::new();

    let mut begin = 0;
    while begin < active.len() {
        let pc = active[begin].pc;
        let mut end = begin;
        let mut min_candidate = Candidate::PartitionStable;
        while end < active.len() && active[end].pc == pc {
            min_candidate = min_candidate.min(active[end].pn);
            end += 1;
        }
        if begin == 0 {
            if let Some((previous_pc, previous_pn)) = previous_min {
                if previous_pc == pc {
                    min_candidate = min_candidate.min(previous_pn);
                }
            }
        }

        match mode {
            MergeMode::Normal => {
                if let Candidate::Merge(target) = min_candidate {
                    quiet = false;
                    for tuple in &mut active[begin..end] {
                        tuple.pc = target;
                    }
                    if collect_requests {
                        requests.push(Tuple::parent_request(target));
                    }
                } else {
                    for tuple in &mut active[begin..end] {
                        tuple.pn = Candidate::PartitionStable;
                    }
                }
            }
            MergeMode::Replay => {
                // Only rewrite partitions that actually merged this round;
                // a stable bucket's minimum is `PartitionStable` and a
                // `TupleStable` minimum must never reach `pc`.
                if let Candidate::Merge(target) = min_candidate {
                    for tuple in &mut active[begin..end] {
                        tuple.pc = target;
                    }
                }
            }
        }
        begin = end;
    }
    (quiet, requests)
}

/// Extremum of the member `pc` values over the run of equal keys at the
/// start of `iter`, together with that key.
fn bucket_extremum<'t, I, K, F>(iter: I, key: K, fold: F) -> (i64, Option<PartitionId>)
where
    I: Iterator<Item = &'t Tuple>,
    K: Fn(&Tuple) -> NodeId,
    F: Fn(Option<i64>, Option<i64>) -> Option<i64>,
{
    let mut bucket_key: Option<i64> = None;
    let mut extremum: Option<i64> = None;
    for tuple in iter {
        match bucket_key {
            None => {
                bucket_key = Some(key(tuple));
                if tuple.is_member() {
                    extremum = Some(tuple.pc);
                }
            }
            Some(current) => {
                if key(tuple) != current {
                    break;
                }
                if tuple.is_member() {
                    extremum = fold(extremum, Some(tuple.pc));
                }
            }
        }
    }
    (bucket_key.expect("bucket extremum of an empty range"), extremum)
}

#[cfg(test)]
mod tests {
    use super::{ColoringEngine, Doubling, OptLevel};
    use crate::graph::Edge;
    use gc_comm::distribute::distribute_inplace;
    use gc_comm::execute;

    fn clique(ids: &[i64], edges: &mut Vec<Edge>) {
        for &u in ids {
            for &v in ids {
                if u != v {
                    edges.push((u, v));
                }
            }
        }
    }

    fn chain(from: i64, to: i64, edges: &mut Vec<Edge>) {
        for node in from..to {
            edges.push((node, node + 1));
            edges.push((node + 1, node));
        }
    }

    fn count_components(
        all_edges: &[Edge],
        ranks: usize,
        doubling: Doubling,
        opt: OptLevel,
    ) -> usize {
        let results = execute(ranks, |comm| {
            let mut edges: Vec<Edge> = if comm.rank() == 0 { all_edges.to_vec() } else { Vec::new() };
            distribute_inplace(&mut edges, comm);
            let mut engine = ColoringEngine::new(&mut edges, comm, doubling, opt);
            engine.compute();
            engine.compute_component_count()
        });
        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
        results[0]
    }

    #[test]
    fn two_disjoint_cliques() {
        let mut edges = Vec::new();
        clique(&[0, 1, 2, 3], &mut edges);
        clique(&[4, 5, 6, 7], &mut edges);
        for &ranks in &[1, 4] {
            for &doubling in &[Doubling::On, Doubling::Off] {
                assert_eq!(
                    count_components(&edges, ranks, doubling, OptLevel::LoadBalanced),
                    2,
                    "ranks={} doubling={:?}",
                    ranks,
                    doubling
                );
            }
        }
    }

    #[test]
    fn optimization_levels_agree() {
        let mut edges = Vec::new();
        clique(&[2, 3, 4, 11], &mut edges);
        clique(&[5, 6, 8, 10], &mut edges);
        chain(50, 100, &mut edges);
        for &opt in &[OptLevel::Naive, OptLevel::StableRemoved, OptLevel::LoadBalanced] {
            assert_eq!(count_components(&edges, 4, Doubling::On, opt), 3, "opt={:?}", opt);
        }
    }

    #[test]
    fn long_chain_is_one_component() {
        let mut edges = Vec::new();
        chain(0, 1200, &mut edges);
        assert_eq!(count_components(&edges, 4, Doubling::On, OptLevel::LoadBalanced), 1);
    }

    #[test]
    fn short_chain_without_doubling() {
        let mut edges = Vec::new();
        chain(0, 16, &mut edges);
        assert_eq!(count_components(&edges, 2, Doubling::Off, OptLevel::StableRemoved), 1);
    }

    #[test]
    fn singleton_edge_lists_on_some_ranks() {
        // Fewer edges than ranks: some ranks stay empty throughout.
        let edges = vec![(0, 1), (1, 0)];
        assert_eq!(count_components(&edges, 4, Doubling::On, OptLevel::LoadBalanced), 1);
    }

    #[test]
    fn labels_shrink_monotonically() {
        // The multiset of pc values may only decrease; spot-check the sum
        // by re-running compute with manual rounds is intrusive, so check
        // the final labels are canonical minima instead.
        let mut edges = Vec::new();
        clique(&[7, 9, 30], &mut edges);
        chain(100, 103, &mut edges);
        let results = execute(2, |comm| {
            let mut local: Vec<_> = if comm.rank() == 0 { edges.clone() } else { Vec::new() };
            distribute_inplace(&mut local, comm);
            let mut engine = ColoringEngine::new(
                &mut local,
                comm,
                Doubling::On,
                OptLevel::LoadBalanced,
            );
            engine.compute();
            let mut labels: Vec<i64> = engine.tuples.iter().map(|t| t.pc).collect();
            labels.sort();
            labels.dedup();
            labels
        });
        let mut labels: Vec<i64> = results.into_iter().flatten().collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels, vec![7, 100]);
    }
}
