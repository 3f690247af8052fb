//! Connected components by repeated top-down BFS.
//!
//! The engine owns a boolean adjacency matrix in a 2-D block layout and a
//! 1-D block-partitioned vertex space holding the parents vector, the
//! sparse frontier and the per-rank set of unvisited local indices. One
//! BFS step is a sparse matrix-vector multiply with a min-parent
//! semiring: frontier entries are broadcast down their grid columns,
//! blocks emit `(row, parent)` candidates, candidates are routed to the
//! row's vertex owner and reduced by minimum, and already-visited rows
//! are dropped. After the runs, `filter_edge_list` peels every visited
//! component out of the edge list.

use crate::graph::{Edge, VertexId};
use crate::util::timer::GcTimer;
use gc_comm::bucket;
use gc_comm::distribute::{distribute_inplace, global_size, BlockPartition};
use gc_comm::sort::{is_sorted, sort_by};
use gc_comm::Comm;
use hashbrown::HashMap;
use log::info;
use std::collections::BTreeSet;

pub mod matrix;

use crate::bfs::matrix::{MatrixBlock, ProcessGrid};

pub struct BfsEngine<'a, 'b> {
    comm: &'a Comm<'b>,
    grid: ProcessGrid,
    matrix: MatrixBlock,
    /// 1-D partition of the vertex space, shared by parents, frontier,
    /// degrees and the unvisited set.
    vertex_part: BlockPartition,
    /// Undirected degree of each locally owned vertex.
    degrees: Vec<i64>,
    /// Local indices of vertices no BFS run has touched yet. Ordered so
    /// source selection is deterministic.
    unvisited: BTreeSet<usize>,
    /// Traversal throughput of each run, in millions of edges per second.
    mteps: Vec<f64>,
}

impl<'a, 'b> BfsEngine<'a, 'b> {
    /// Builds the adjacency matrix and degree vector from a compacted
    /// edge list with vertex ids in `[0, vertex_count)`. Collective.
    pub fn new(edge_list: &[Edge], vertex_count: usize, comm: &'a Comm<'b>) -> Self {
        assert!(vertex_count > 0, "BFS needs a nonempty vertex space");
        let grid = ProcessGrid::new(vertex_count, comm);
        let matrix = MatrixBlock::build(edge_list, &grid, comm);
        let vertex_part = BlockPartition::new(vertex_count, comm.size());

        // Row degrees, reduced onto the 1-D vertex owners. Every
        // undirected edge appears in both directions, so counting local
        // sources gives the full degree.
        let mut partial: HashMap<VertexId, i64> = HashMap::new();
        for &(src, _) in edge_list {
            *partial.entry(src).or_insert(0) += 1;
        }
        let mut buckets: Vec<Vec<(VertexId, i64)>> = vec![Vec::new(); comm.size()];
        for (vertex, count) in partial {
            buckets[vertex_part.owner(vertex as usize)].push((vertex, count));
        }
        let local_offset = vertex_part.prefix(comm.rank());
        let mut degrees = vec![0_i64; vertex_part.local_size(comm.rank())];
        for (vertex, count) in comm.all_to_all_v(buckets).into_iter().flatten() {
            degrees[vertex as usize - local_offset] += count;
        }

        let unvisited = (0..vertex_part.local_size(comm.rank())).collect();
        BfsEngine { comm, grid, matrix, vertex_part, degrees, unvisited, mteps: Vec::new() }
    }

    /// Runs up to `max_iterations` BFS traversals, each from the lowest
    /// unvisited vertex, appending the size of every discovered component
    /// to `component_sizes`. Returns the number of runs executed; stops
    /// early once every vertex is visited.
    pub fn run_bfs_iterations(
        &mut self,
        max_iterations: usize,
        component_sizes: &mut Vec<usize>,
    ) -> usize {
        for iteration in 0..max_iterations {
            let source = match self.next_source() {
                Some(source) => source,
                None => {
                    if self.comm.rank() == 0 {
                        info!("All vertices already covered, no more BFS iterations required");
                    }
                    return iteration;
                }
            };

            let timer = GcTimer::now();
            let local_offset = self.vertex_part.prefix(self.comm.rank());
            let local_size = self.vertex_part.local_size(self.comm.rank());
            let mut parents: Vec<Option<VertexId>> = vec![None; local_size];

            let mut fringe: Vec<(VertexId, VertexId)> = Vec::new();
            if self.vertex_part.owner(source as usize) == self.comm.rank() {
                parents[source as usize - local_offset] = Some(source);
                self.unvisited.remove(&(source as usize - local_offset));
                fringe.push((source, source));
            }
            let mut visited_count = 1_usize;

            loop {
                // Top-down: each frontier vertex offers itself as parent.
                for entry in &mut fringe {
                    entry.1 = entry.0;
                }
                let candidates = self.spmv_min_parent(&fringe);

                // Keep only still-unvisited rows, then commit parents.
                fringe = candidates
                    .into_iter()
                    .filter(|&(vertex, _)| parents[vertex as usize - local_offset].is_none())
                    .collect();
                for &(vertex, parent) in &fringe {
                    parents[vertex as usize - local_offset] = Some(parent);
                    self.unvisited.remove(&(vertex as usize - local_offset));
                }

                let frontier_total = global_size(fringe.len(), self.comm);
                if frontier_total == 0 {
                    break;
                }
                visited_count += frontier_total;
            }

            component_sizes.push(visited_count);

            // Throughput from the row degrees of the visited vertices,
            // on a nanosecond clock.
            let traversed_local: i64 = parents
                .iter()
                .zip(self.degrees.iter())
                .filter(|(parent, _)| parent.is_some())
                .map(|(_, degree)| degree)
                .sum();
            let traversed = self.comm.allreduce(&traversed_local, |a, b| a + b);
            let seconds = timer.elapsed().as_seconds_f64();
            let score = traversed as f64 / seconds / 1_000_000.0;
            let score = self.comm.allreduce(&score, |a, b| a.min(*b));
            self.mteps.push(score);
            if self.comm.rank() == 0 {
                info!(
                    "BFS run visited {} vertices, traversed {} edges, {:.3} MTEPS",
                    visited_count, traversed, score
                );
            }
        }
        max_iterations
    }

    pub fn mteps(&self) -> &[f64] {
        &self.mteps
    }

    /// Removes from the edge list every edge touched by a BFS run. The
    /// unvisited vertex ids are routed to the ranks owning their `src`
    /// range and each rank keeps exactly the buckets of its unvisited
    /// vertices. Both endpoints of a surviving edge are unvisited, since
    /// BFS visits whole components.
    pub fn filter_edge_list(&self, edge_list: &mut Vec<Edge>) {
        let comm = self.comm;
        let local_offset = self.vertex_part.prefix(comm.rank());
        let unvisited_global: Vec<VertexId> =
            self.unvisited.iter().map(|&index| (index + local_offset) as VertexId).collect();

        // Should be quick, the list was last sorted by src during id
        // compaction.
        if !is_sorted(edge_list, comm, |a, b| a.0.cmp(&b.0)) {
            sort_by(edge_list, comm, |a, b| a.cmp(b));
        }

        // Splitters from each nonempty rank's first src; empty ranks own
        // no src range.
        let firsts = comm.allgather(&edge_list.first().map(|edge| edge.0));
        let owners: Vec<(VertexId, usize)> = firsts
            .iter()
            .enumerate()
            .filter_map(|(rank, first)| first.map(|src| (src, rank)))
            .collect();
        assert!(!owners.is_empty(), "edge filter called with a globally empty edge list");

        let mut routed = bucket::route(unvisited_global, comm, |&vertex| {
            // Last listed range containing the key; ties go to the
            // higher rank, keys below every range to the first.
            let mut owner = owners[0].1;
            for &(first_src, rank) in &owners {
                if first_src <= vertex {
                    owner = rank;
                } else {
                    break;
                }
            }
            owner
        });
        routed.sort();

        let mut kept: Vec<Edge> = Vec::new();
        comm.with_subset(!routed.is_empty(), |sub| {
            // The bucket at the rank boundary may begin in this rank's
            // tail; the next rank's first unvisited vertex decides it.
            let next_first = sub.left_shift(&routed[0]);
            if let Some(next_first) = next_first {
                routed.push(next_first);
            }

            let mut position = 0;
            for &vertex in &routed {
                while position < edge_list.len() && edge_list[position].0 < vertex {
                    position += 1;
                }
                while position < edge_list.len() && edge_list[position].0 == vertex {
                    kept.push(edge_list[position]);
                    position += 1;
                }
            }
        });

        *edge_list = kept;
        comm.with_subset(!edge_list.is_empty(), |sub| {
            distribute_inplace(edge_list, sub);
        });
    }

    /// Lowest-indexed unvisited vertex across all ranks, or `None` when
    /// every vertex has been visited.
    fn next_source(&self) -> Option<VertexId> {
        let local_offset = self.vertex_part.prefix(self.comm.rank());
        let candidate = self
            .unvisited
            .iter()
            .next()
            .map_or(VertexId::max_value(), |&index| (index + local_offset) as VertexId);
        let source = self.comm.allreduce(&candidate, |a, b| *a.min(b));
        if source == VertexId::max_value() {
            None
        } else {
            Some(source)
        }
    }

    /// One SpMV step: broadcast the frontier down its grid columns, emit
    /// `(row, parent)` products per block, reduce by minimum parent on
    /// the row's vertex owner.
    fn spmv_min_parent(
        &self,
        fringe: &[(VertexId, VertexId)],
    ) -> Vec<(VertexId, VertexId)> {
        let comm = self.comm;

        let mut buckets: Vec<Vec<(VertexId, VertexId)>> = vec![Vec::new(); comm.size()];
        for &(vertex, value) in fringe {
            for rank in self.grid.column_ranks(vertex) {
                buckets[rank].push((vertex, value));
            }
        }
        let incoming = comm.all_to_all_v(buckets);

        let mut products: HashMap<VertexId, VertexId> = HashMap::new();
        for (vertex, value) in incoming.into_iter().flatten() {
            for row in self.matrix.column(vertex) {
                let entry = products.entry(row).or_insert(value);
                if value < *entry {
                    *entry = value;
                }
            }
        }

        let mut buckets: Vec<Vec<(VertexId, VertexId)>> = vec![Vec::new(); comm.size()];
        for (row, parent) in products {
            buckets[self.vertex_part.owner(row as usize)].push((row, parent));
        }
        let mut reduced: HashMap<VertexId, VertexId> = HashMap::new();
        for (row, parent) in comm.all_to_all_v(buckets).into_iter().flatten() {
            let entry = reduced.entry(row).or_insert(parent);
            if parent < *entry {
                *entry = parent;
            }
        }
        reduced.into_iter().collect()
    }
}
