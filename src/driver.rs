//! The benchmark driver: ingest, permute, select a strategy, optionally
//! peel the giant component with BFS, color the residual, report.
//!
//! All phases are collective with barriers between them; any rank failing
//! aborts the whole job. The returned component count is identical on
//! every rank.

use crate::bfs::BfsEngine;
use crate::coloring::{ColoringEngine, Doubling, OptLevel};
use crate::error::GcError;
use crate::graph::compact::reduce_vertex_ids;
use crate::graph::export::{write_edge_list_binary_format, write_edge_list_dot_format};
use crate::graph::permute::permute_vertex_ids;
use crate::graph::{
    check_edge_bidirectionality, global_undirected_edge_count, print_edge_list_distribution, Edge,
};
use crate::graphgen;
use crate::selector::run_bfs_decision;
use crate::util::memory_usage::print_memory_usage;
use crate::util::timer::GcTimer;
use gc_comm::Comm;
use log::info;

#[derive(Clone, Debug)]
pub enum GraphInput {
    /// Kronecker generator: `2^scale` vertices, `16 * 2^scale` edges.
    Kronecker { scale: u8 },
    /// de Bruijn graph over a FASTQ sequence file.
    DeBruijn { file: String },
    /// Plain text edge list.
    Generic { file: String, add_reverse: bool },
    /// Undirected chain of the given node count.
    Chain { length: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Let the degree distribution decide (the default).
    Auto,
    ColoringOnly,
    BfsThenColoring,
    /// Single-rank Rem's algorithm baseline.
    Sequential,
}

#[derive(Clone, Debug)]
pub struct DriverConfig {
    pub input: GraphInput,
    pub strategy: Strategy,
    pub doubling: Doubling,
    pub max_bfs_iterations: usize,
    pub export_dot: Option<String>,
    pub export_binary: Option<String>,
}

impl DriverConfig {
    pub fn new(input: GraphInput) -> Self {
        DriverConfig {
            input,
            strategy: Strategy::Auto,
            doubling: Doubling::On,
            max_bfs_iterations: 1,
            export_dot: None,
            export_binary: None,
        }
    }
}

/// Runs the full connectivity pipeline and returns the number of weakly
/// connected components.
pub fn run_connectivity(config: &DriverConfig, comm: &Comm) -> Result<usize, GcError> {
    let mut edge_list = generate_edges(config, comm)?;
    print_edge_list_distribution(edge_list.len(), comm);

    if let Some(directory) = &config.export_dot {
        write_edge_list_dot_format(&mut edge_list, directory, comm)?;
    }
    if let Some(directory) = &config.export_binary {
        write_edge_list_binary_format(&mut edge_list, directory, comm)?;
    }

    assert!(
        check_edge_bidirectionality(&edge_list, comm),
        "bidirectionality violated: some edge is missing its mirror"
    );

    comm.barrier();
    let timer = GcTimer::now();
    if comm.rank() == 0 {
        info!("Beginning computation, benchmark timer started");
        print_memory_usage("graph load");
    }

    permute_vertex_ids(&mut edge_list);
    if comm.rank() == 0 {
        info!("Vertex ids permuted");
    }

    if config.strategy == Strategy::Sequential {
        assert_eq!(comm.size(), 1, "run the sequential baseline using a single rank only");
        let vertex_count = reduce_vertex_ids(&mut edge_list, comm);
        let component_count = crate::sequential::rem_component_count(&edge_list, vertex_count);
        info!("Count of components -> {}", component_count);
        info!("Time (ms) -> {}", timer.elapsed().to_millis_string());
        return Ok(component_count);
    }

    let want_bfs = match config.strategy {
        Strategy::Auto => run_bfs_decision(&mut edge_list, comm),
        Strategy::ColoringOnly | Strategy::Sequential => false,
        Strategy::BfsThenColoring => true,
    };

    let mut bfs_runs_done = 0;
    // An empty residual graph has nothing to traverse.
    let vertex_count = if want_bfs { reduce_vertex_ids(&mut edge_list, comm) } else { 0 };
    if want_bfs && vertex_count > 0 {
        let undirected_edges = global_undirected_edge_count(&edge_list, comm);
        if comm.rank() == 0 {
            info!("Graph size : vertices -> {}, edges -> {}", vertex_count, undirected_edges);
        }

        let mut component_sizes = Vec::new();
        let mut bfs = BfsEngine::new(&edge_list, vertex_count, comm);
        bfs_runs_done = bfs.run_bfs_iterations(config.max_bfs_iterations, &mut component_sizes);
        if comm.rank() == 0 {
            info!(
                "{} BFS iterations executed, component sizes {:?}",
                bfs_runs_done, component_sizes
            );
        }
        bfs.filter_edge_list(&mut edge_list);
        if comm.rank() == 0 {
            print_memory_usage("BFS residual filter");
        }
    } else {
        let undirected_edges = global_undirected_edge_count(&edge_list, comm);
        if comm.rank() == 0 {
            info!("Graph size : edges -> {}", undirected_edges);
        }
    }

    let mut coloring_count = 0;
    comm.with_subset(!edge_list.is_empty(), |sub| {
        let mut engine =
            ColoringEngine::new(&mut edge_list, sub, config.doubling, OptLevel::LoadBalanced);
        engine.compute();
        coloring_count = engine.compute_component_count();
    });
    let coloring_count = comm.allreduce(&coloring_count, |a, b| *a.max(b));
    let component_count = bfs_runs_done + coloring_count;

    comm.barrier();
    if comm.rank() == 0 {
        info!("Count of components -> {}", component_count);
        info!("Time (ms) -> {}", timer.elapsed().to_millis_string());
    }
    Ok(component_count)
}

fn generate_edges(config: &DriverConfig, comm: &Comm) -> Result<Vec<Edge>, GcError> {
    if comm.rank() == 0 {
        info!("Generating graph");
    }
    let mut edge_list = Vec::new();
    match &config.input {
        GraphInput::Kronecker { scale } => {
            graphgen::kronecker::populate_edge_list(
                &mut edge_list,
                *scale,
                graphgen::kronecker::DEFAULT_EDGE_FACTOR,
                comm,
            );
        }
        GraphInput::DeBruijn { file } => {
            graphgen::debruijn::populate_edge_list(&mut edge_list, file, comm)?;
        }
        GraphInput::Generic { file, add_reverse } => {
            graphgen::file_input::populate_edge_list(&mut edge_list, file, *add_reverse, comm)?;
        }
        GraphInput::Chain { length } => {
            graphgen::chain::populate_edge_list(&mut edge_list, *length, comm);
        }
    }
    Ok(edge_list)
}

#[cfg(test)]
mod tests {
    use super::{run_connectivity, DriverConfig, GraphInput, Strategy};
    use crate::bfs::BfsEngine;
    use crate::coloring::{ColoringEngine, Doubling, OptLevel};
    use crate::graph::compact::reduce_vertex_ids;
    use crate::graph::permute::permute_vertex_ids;
    use crate::graph::Edge;
    use crate::graphgen;
    use gc_comm::execute;
    use gc_comm::Comm;
    use hashbrown::HashMap;
    use std::io::Write;

    /// Sequential oracle: union-find by rank with path compression.
    #[derive(Default)]
    struct UnionFind {
        parents: HashMap<i64, i64>,
        ranks: HashMap<i64, usize>,
    }

    impl UnionFind {
        fn get(&mut self, value: i64) -> i64 {
            if let Some(parent) = self.parents.get(&value) {
                let mut root = *parent;

                // Find path of objects leading to the root.
                let mut path = vec![value];
                while root != path[path.len() - 1] {
                    path.push(root);
                    root = self.parents[&root];
                }

                // Compress the path and return.
                for ancestor in path {
                    if let Some(v) = self.parents.get_mut(&ancestor) {
                        *v = root;
                    }
                }
                root
            } else {
                self.parents.insert(value, value);
                self.ranks.insert(value, 1);
                value
            }
        }

        fn union(&mut self, u: i64, v: i64) {
            let roots = vec![self.get(u), self.get(v)];
            let heaviest = roots
                .iter()
                .map(|r| (self.ranks[r], *r))
                .max_by_key(|k| k.0)
                .map(|(_, r)| r)
                .expect("Should be present");
            for r in &roots {
                if *r != heaviest {
                    let val = self.ranks[r];
                    if let Some(v) = self.ranks.get_mut(&heaviest) {
                        *v += val;
                    }
                    if let Some(v) = self.parents.get_mut(r) {
                        *v = heaviest;
                    }
                }
            }
        }
    }

    /// Component count of the gathered edge list, over vertices that
    /// appear in it.
    fn oracle_component_count(edges: &[Edge]) -> usize {
        let mut forest = UnionFind::default();
        for &(u, v) in edges {
            forest.union(u, v);
        }
        let ids: Vec<i64> = forest.parents.keys().copied().collect();
        let mut roots: Vec<i64> = ids.into_iter().map(|id| forest.get(id)).collect();
        roots.sort();
        roots.dedup();
        roots.len()
    }

    fn write_edge_file(name: &str, edges: &[Edge]) -> String {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).expect("temp file");
        for (u, v) in edges {
            writeln!(file, "{} {}", u, v).expect("write edge");
        }
        path.to_str().expect("utf8 path").to_string()
    }

    fn clique(ids: &[i64], edges: &mut Vec<Edge>) {
        for &u in ids {
            for &v in ids {
                if u < v {
                    edges.push((u, v));
                }
            }
        }
    }

    fn run_driver(config: DriverConfig, ranks: usize) -> usize {
        let counts = execute(ranks, |comm| {
            run_connectivity(&config, comm).expect("pipeline failed")
        });
        assert!(counts.windows(2).all(|pair| pair[0] == pair[1]));
        counts[0]
    }

    #[test]
    fn two_disjoint_cliques_from_file() {
        let mut edges = Vec::new();
        clique(&[0, 1, 2, 3], &mut edges);
        clique(&[4, 5, 6, 7], &mut edges);
        let path = write_edge_file("gc_driver_cliques.txt", &edges);
        for &ranks in &[1, 4] {
            let config = DriverConfig::new(GraphInput::Generic {
                file: path.clone(),
                add_reverse: true,
            });
            assert_eq!(run_driver(config, ranks), 2);
        }
        // Forcing the BFS peel first must not change the answer: one run
        // clears a clique, coloring counts the other.
        let mut config =
            DriverConfig::new(GraphInput::Generic { file: path, add_reverse: true });
        config.strategy = Strategy::BfsThenColoring;
        assert_eq!(run_driver(config, 2), 2);
    }

    #[test]
    fn chain_of_1201_nodes() {
        let edges: Vec<Edge> = (0..1200_i64).map(|node| (node, node + 1)).collect();
        let path = write_edge_file("gc_driver_chain.txt", &edges);
        let config =
            DriverConfig::new(GraphInput::Generic { file: path, add_reverse: true });
        assert_eq!(run_driver(config, 4), 1);
    }

    #[test]
    fn two_cliques_and_a_chain() {
        let mut edges = Vec::new();
        clique(&[2, 3, 4, 11], &mut edges);
        clique(&[5, 6, 8, 10], &mut edges);
        for node in 50..100_i64 {
            edges.push((node, node + 1));
        }
        let path = write_edge_file("gc_driver_three.txt", &edges);
        for strategy in &[Strategy::Auto, Strategy::ColoringOnly] {
            let mut config = DriverConfig::new(GraphInput::Generic {
                file: path.clone(),
                add_reverse: true,
            });
            config.strategy = *strategy;
            assert_eq!(run_driver(config, 4), 3, "strategy {:?}", strategy);
        }
    }

    #[test]
    fn pointer_doubling_toggle_agrees() {
        let mut edges = Vec::new();
        clique(&[0, 1, 2, 3], &mut edges);
        for node in 20..60_i64 {
            edges.push((node, node + 1));
        }
        let path = write_edge_file("gc_driver_toggle.txt", &edges);
        for &doubling in &[Doubling::On, Doubling::Off] {
            let mut config = DriverConfig::new(GraphInput::Generic {
                file: path.clone(),
                add_reverse: true,
            });
            config.doubling = doubling;
            assert_eq!(run_driver(config, 2), 2, "doubling {:?}", doubling);
        }
    }

    /// Kronecker scale 11: the three algorithms must agree, and the
    /// compacted ids must be dense.
    #[test]
    fn kronecker_algorithms_agree() {
        let ranks = 4;
        let results = execute(ranks, |comm| {
            let mut edges = Vec::new();
            graphgen::kronecker::populate_edge_list(&mut edges, 11, 16, comm);

            let oracle = oracle_count_of(&edges, comm);
            let coloring = coloring_only_count(edges.clone(), comm);
            let hybrid = bfs_then_coloring_count(edges, comm);
            (oracle, coloring, hybrid)
        });
        for (oracle, coloring, hybrid) in results {
            assert_eq!(coloring, oracle);
            assert_eq!(hybrid, oracle);
        }
    }

    fn oracle_count_of(edges: &[Edge], comm: &Comm) -> usize {
        let gathered = comm.gatherv(edges, 0);
        let count = gathered.map_or(0, |all| oracle_component_count(&all));
        comm.allreduce(&count, |a, b| *a.max(b))
    }

    fn coloring_only_count(mut edges: Vec<Edge>, comm: &Comm) -> usize {
        permute_vertex_ids(&mut edges);
        let mut count = 0;
        comm.with_subset(!edges.is_empty(), |sub| {
            let mut engine =
                ColoringEngine::new(&mut edges, sub, Doubling::On, OptLevel::LoadBalanced);
            engine.compute();
            count = engine.compute_component_count();
        });
        comm.allreduce(&count, |a, b| *a.max(b))
    }

    fn bfs_then_coloring_count(mut edges: Vec<Edge>, comm: &Comm) -> usize {
        permute_vertex_ids(&mut edges);
        let vertex_count = reduce_vertex_ids(&mut edges, comm);

        // Compaction bijectivity: ids are exactly 0..vertex_count.
        let local_max = edges.iter().map(|e| e.0.max(e.1)).max().unwrap_or(-1);
        let global_max = comm.allreduce(&local_max, |a, b| *a.max(b));
        assert_eq!(global_max, vertex_count as i64 - 1);

        let mut sizes = Vec::new();
        let mut bfs = BfsEngine::new(&edges, vertex_count, comm);
        let runs = bfs.run_bfs_iterations(1, &mut sizes);
        bfs.filter_edge_list(&mut edges);

        let mut count = 0;
        comm.with_subset(!edges.is_empty(), |sub| {
            let mut engine =
                ColoringEngine::new(&mut edges, sub, Doubling::On, OptLevel::LoadBalanced);
            engine.compute();
            count = engine.compute_component_count();
        });
        runs + comm.allreduce(&count, |a, b| *a.max(b))
    }

    /// The sequential baseline and the distributed pipeline must agree.
    #[test]
    fn sequential_strategy_matches_coloring() {
        let mut edges = Vec::new();
        clique(&[0, 1, 2, 3], &mut edges);
        for node in 30..80_i64 {
            edges.push((node, node + 1));
        }
        clique(&[200, 201, 202], &mut edges);
        let path = write_edge_file("gc_driver_sequential.txt", &edges);

        let mut sequential = DriverConfig::new(GraphInput::Generic {
            file: path.clone(),
            add_reverse: true,
        });
        sequential.strategy = Strategy::Sequential;
        let baseline = run_driver(sequential, 1);
        assert_eq!(baseline, 3);

        let distributed = DriverConfig::new(GraphInput::Generic { file: path, add_reverse: true });
        assert_eq!(run_driver(distributed, 4), baseline);
    }

    #[test]
    fn chain_input_kind_runs_end_to_end() {
        let mut config = DriverConfig::new(GraphInput::Chain { length: 120 });
        config.strategy = Strategy::ColoringOnly;
        assert_eq!(run_driver(config, 3), 1);
    }

    /// Solving on hash-permuted ids must give the same count as solving
    /// on the original ids.
    #[test]
    fn permutation_round_trip_preserves_count() {
        let results = execute(2, |comm| {
            let mut edges = Vec::new();
            graphgen::chain::populate_edge_list(&mut edges, 64, comm);
            clique_on_rank_zero(&mut edges, comm);

            let plain = {
                let mut copy = edges.clone();
                let mut count = 0;
                comm.with_subset(!copy.is_empty(), |sub| {
                    let mut engine = ColoringEngine::new(
                        &mut copy,
                        sub,
                        Doubling::On,
                        OptLevel::LoadBalanced,
                    );
                    engine.compute();
                    count = engine.compute_component_count();
                });
                comm.allreduce(&count, |a, b| *a.max(b))
            };
            let permuted = coloring_only_count(edges, comm);
            (plain, permuted)
        });
        for (plain, permuted) in results {
            assert_eq!(plain, 2);
            assert_eq!(permuted, 2);
        }
    }

    fn clique_on_rank_zero(edges: &mut Vec<Edge>, comm: &Comm) {
        if comm.rank() == 0 {
            for &u in &[1000_i64, 1001, 1002] {
                for &v in &[1000_i64, 1001, 1002] {
                    if u != v {
                        edges.push((u, v));
                    }
                }
            }
        }
    }
}
