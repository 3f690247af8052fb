//! Distributed boolean adjacency matrix in a 2-D block layout.
//!
//! The `P` ranks form a `rows x cols` process grid (the factorization of
//! `P` nearest to square). Vertex rows are block-partitioned over the
//! grid rows and vertex columns over the grid columns; the rank at grid
//! position `(i, j)` stores the edges whose source falls in row block `i`
//! and whose destination falls in column block `j`, ordered by column for
//! frontier lookups.

use crate::graph::{Edge, VertexId};
use gc_comm::distribute::BlockPartition;
use gc_comm::Comm;

#[derive(Clone, Copy, Debug)]
pub struct ProcessGrid {
    pub rows: usize,
    pub cols: usize,
    pub my_row: usize,
    pub my_col: usize,
    pub row_part: BlockPartition,
    pub col_part: BlockPartition,
}

impl ProcessGrid {
    pub fn new(vertex_count: usize, comm: &Comm) -> Self {
        let ranks = comm.size();
        let mut rows = (ranks as f64).sqrt() as usize;
        while ranks % rows != 0 {
            rows -= 1;
        }
        let cols = ranks / rows;
        ProcessGrid {
            rows,
            cols,
            my_row: comm.rank() / cols,
            my_col: comm.rank() % cols,
            row_part: BlockPartition::new(vertex_count, rows),
            col_part: BlockPartition::new(vertex_count, cols),
        }
    }

    /// Rank owning the matrix block that holds edge `(src, dst)`.
    pub fn block_owner(&self, src: VertexId, dst: VertexId) -> usize {
        self.row_part.owner(src as usize) * self.cols + self.col_part.owner(dst as usize)
    }

    /// Ranks of the grid column holding vertex `v`'s matrix column: one
    /// rank per grid row.
    pub fn column_ranks(&self, v: VertexId) -> impl Iterator<Item = usize> {
        let cols = self.cols;
        let grid_col = self.col_part.owner(v as usize);
        (0..self.rows).map(move |grid_row| grid_row * cols + grid_col)
    }
}

/// This rank's matrix block.
pub struct MatrixBlock {
    /// Edges of the block, sorted by `(dst, src)`.
    entries: Vec<Edge>,
}

impl MatrixBlock {
    /// Routes every edge of the distributed list to its block owner and
    /// column-sorts the received entries. Collective.
    pub fn build(edge_list: &[Edge], grid: &ProcessGrid, comm: &Comm) -> Self {
        let mut buckets: Vec<Vec<Edge>> = vec![Vec::new(); comm.size()];
        for &(src, dst) in edge_list {
            buckets[grid.block_owner(src, dst)].push((src, dst));
        }
        let mut entries: Vec<Edge> =
            comm.all_to_all_v(buckets).into_iter().flatten().collect();
        entries.sort_by_key(|&(src, dst)| (dst, src));
        MatrixBlock { entries }
    }

    /// The sources adjacent to column `v` within this block.
    pub fn column(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        let (begin, end) = self.column_range(v);
        self.entries[begin..end].iter().map(|&(src, _)| src)
    }

    fn column_range(&self, v: VertexId) -> (usize, usize) {
        let mut low = 0;
        let mut high = self.entries.len();
        while low < high {
            let middle = (low + high) / 2;
            if self.entries[middle].1 < v {
                low = middle + 1;
            } else {
                high = middle;
            }
        }
        let begin = low;
        let mut high = self.entries.len();
        while low < high {
            let middle = (low + high) / 2;
            if self.entries[middle].1 <= v {
                low = middle + 1;
            } else {
                high = middle;
            }
        }
        (begin, low)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
