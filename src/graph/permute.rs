//! Bijective permutation of vertex ids.
//!
//! Thomas Wang's 64-bit integer hash and its inverse. Applying the hash
//! independently to both endpoints of every edge permutes the vertex ids
//! uniformly without changing connectivity, which breaks adversarial id
//! layouts before coloring. The inverse recovers original ids.

use crate::graph::Edge;

pub fn hash64(key: u64) -> u64 {
    let mut key = (!key).wrapping_add(key << 21); // key = (key << 21) - key - 1
    key ^= key >> 24;
    key = key.wrapping_add(key << 3).wrapping_add(key << 8); // key * 265
    key ^= key >> 14;
    key = key.wrapping_add(key << 2).wrapping_add(key << 4); // key * 21
    key ^= key >> 28;
    key.wrapping_add(key << 31)
}

pub fn hash64i(key: u64) -> u64 {
    // Invert key = key + (key << 31)
    let mut tmp = key.wrapping_sub(key << 31);
    let mut key = key.wrapping_sub(tmp << 31);

    // Invert key = key ^ (key >> 28)
    tmp = key ^ key >> 28;
    key ^= tmp >> 28;

    // Invert key *= 21
    key = key.wrapping_mul(14_933_078_535_860_113_213);

    // Invert key = key ^ (key >> 14)
    tmp = key ^ key >> 14;
    tmp = key ^ tmp >> 14;
    tmp = key ^ tmp >> 14;
    key ^= tmp >> 14;

    // Invert key *= 265
    key = key.wrapping_mul(15_244_667_743_933_553_977);

    // Invert key = key ^ (key >> 24)
    tmp = key ^ key >> 24;
    key ^= tmp >> 24;

    // Invert key = (~key) + (key << 21)
    tmp = !key;
    tmp = !(key.wrapping_sub(tmp << 21));
    tmp = !(key.wrapping_sub(tmp << 21));
    !(key.wrapping_sub(tmp << 21))
}

/// Relabels both endpoints of every local edge with the hash.
pub fn permute_vertex_ids(edge_list: &mut [Edge]) {
    for edge in edge_list.iter_mut() {
        edge.0 = hash64(edge.0 as u64) as i64;
        edge.1 = hash64(edge.1 as u64) as i64;
    }
}
