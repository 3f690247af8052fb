//! Kronecker (R-MAT) graph generator.
//!
//! Produces the scale-free benchmark graphs: `2^scale` vertices and
//! `edgefactor * 2^scale` undirected edges sampled from the recursive
//! 2x2 initiator matrix. Edge generation is split evenly across ranks
//! and is deterministic for a given `(scale, edgefactor, rank)`.

use crate::graph::Edge;
use gc_comm::distribute::BlockPartition;
use gc_comm::Comm;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Initiator probabilities (a, b, c, d) of the 2x2 matrix.
const INITIATOR: [f64; 4] = [0.57, 0.19, 0.19, 0.05];

/// Fixed seeds, matching the benchmark convention.
const SEEDS: (u64, u64) = (1, 2);

pub const DEFAULT_EDGE_FACTOR: usize = 16;

/// Appends this rank's share of the generated edges, each one emitted in
/// both directions.
pub fn populate_edge_list(
    edge_list: &mut Vec<Edge>,
    scale: u8,
    edge_factor: usize,
    comm: &Comm,
) {
    let desired_edges = edge_factor << scale;
    let part = BlockPartition::new(desired_edges, comm.size());
    let local_edges = part.local_size(comm.rank());

    let mut rng = StdRng::seed_from_u64(
        SEEDS.0 ^ SEEDS.1.wrapping_shl(32) ^ (comm.rank() as u64).wrapping_mul(0x9e37_79b9),
    );

    edge_list.reserve(2 * local_edges);
    for _ in 0..local_edges {
        let (src, dst) = sample_edge(scale, &INITIATOR, &mut rng);
        edge_list.push((src, dst));
        edge_list.push((dst, src));
    }

    if comm.rank() == 0 {
        info!(
            "Kronecker graph generated: scale = {}, edgefactor = {}, edges = {}",
            scale, edge_factor, desired_edges
        );
    }
}

/// One R-MAT sample: descend `scale` levels of the recursive matrix,
/// picking a quadrant per level according to the initiator.
fn sample_edge(scale: u8, initiator: &[f64; 4], rng: &mut StdRng) -> Edge {
    let mut src: i64 = 0;
    let mut dst: i64 = 0;
    for _ in 0..scale {
        src <<= 1;
        dst <<= 1;
        let draw: f64 = rng.gen();
        if draw < initiator[0] {
            // Quadrant a: both high.
        } else if draw < initiator[0] + initiator[1] {
            dst |= 1;
        } else if draw < initiator[0] + initiator[1] + initiator[2] {
            src |= 1;
        } else {
            src |= 1;
            dst |= 1;
        }
    }
    (src, dst)
}
