//! Single-rank connectivity baseline using Rem's algorithm.
//!
//! Union-find with splicing over a compacted edge list. Serves as the
//! reference answer the distributed engines are benchmarked against; it
//! expects vertex ids already compacted to `0..vertex_count`.

use crate::graph::Edge;

pub fn rem_component_count(edge_list: &[Edge], vertex_count: usize) -> usize {
    let mut parent: Vec<i64> = (0..vertex_count as i64).collect();
    let mut components = vertex_count;

    for &(u, v) in edge_list {
        let mut rx = u as usize;
        let mut ry = v as usize;

        // Walk both chains upward until they meet, splicing each step.
        while parent[rx] != parent[ry] {
            if parent[rx] < parent[ry] {
                if rx as i64 == parent[rx] {
                    // rx is a root, link it.
                    parent[rx] = parent[ry];
                    components -= 1;
                    break;
                }
                let next = parent[rx] as usize;
                parent[rx] = parent[ry];
                rx = next;
            } else {
                if ry as i64 == parent[ry] {
                    parent[ry] = parent[rx];
                    components -= 1;
                    break;
                }
                let next = parent[ry] as usize;
                parent[ry] = parent[rx];
                ry = next;
            }
        }
    }
    components
}

#[cfg(test)]
mod tests {
    use super::rem_component_count;
    use crate::graph::Edge;

    #[test]
    fn counts_components_of_mixed_graph() {
        let mut edges: Vec<Edge> = Vec::new();
        // Clique {0..3}, chain 4-5-6, isolated vertices 7 and 8.
        for u in 0_i64..4 {
            for v in 0_i64..4 {
                if u != v {
                    edges.push((u, v));
                }
            }
        }
        for node in 4_i64..6 {
            edges.push((node, node + 1));
            edges.push((node + 1, node));
        }
        assert_eq!(rem_component_count(&edges, 9), 4);
    }

    #[test]
    fn empty_edge_list_leaves_singletons() {
        assert_eq!(rem_component_count(&[], 5), 5);
    }

    #[test]
    fn duplicate_and_self_edges_are_harmless() {
        let edges = vec![(0_i64, 1_i64), (1, 0), (0, 1), (2, 2)];
        assert_eq!(rem_component_count(&edges, 3), 2);
    }
}
