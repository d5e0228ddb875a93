//! Element adjacency graphs in CSR (compressed-sparse-row) form.
//
// Each element is a vertex; an undirected edge joins every pair of
// elements sharing a side. Rows are ParMETIS-shaped:
//
// * `xadj[i] .. xadj[i+1]` = neighbor range of local row *i*
// * `adjncy`               = concatenated neighbor IDs
// * `vwgt[i]`              = vertex weight (node count of the element kind)
//
// The graph is symmetric and self-free by construction: face neighbors on
// a structured grid are mutual.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::partitioning::linear::LinearPartition;
use crate::structured::{ElemId, ElementTopology};

/// Rows of the global element graph owned by one rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributedGraph {
    /// Row ranges of every rank; rank `r` owns global rows `vtxdist[r]..vtxdist[r+1]`.
    pub vtxdist: Vec<u64>,
    pub xadj: Vec<usize>,
    /// Global element IDs.
    pub adjncy: Vec<u64>,
    pub vwgt: Vec<i32>,
}

impl DistributedGraph {
    /// Number of local rows.
    pub fn n_local(&self) -> usize {
        self.xadj.len().saturating_sub(1)
    }

    /// Global ID of local row 0.
    pub fn first_row(&self, rank: usize) -> u64 {
        self.vtxdist.get(rank).copied().unwrap_or(0)
    }

    pub fn row(&self, i: usize) -> &[u64] {
        &self.adjncy[self.xadj[i]..self.xadj[i + 1]]
    }
}

/// Build the rows of `rank`'s initial linear chunk.
///
/// Boundary faces are omitted; the rows need no communication.
pub fn build_local_graph(
    topology: &dyn ElementTopology,
    partition: &LinearPartition,
    rank: usize,
) -> DistributedGraph {
    let range = partition.range(rank);
    let weight = topology.elem_type().n_nodes() as i32;
    let row_of = |id: ElemId| -> Vec<u64> {
        topology
            .neighbors(topology.indices(id), false)
            .into_iter()
            .flatten()
            .collect()
    };

    #[cfg(feature = "rayon")]
    let rows: Vec<Vec<u64>> = range.clone().into_par_iter().map(row_of).collect();
    #[cfg(not(feature = "rayon"))]
    let rows: Vec<Vec<u64>> = range.clone().map(row_of).collect();

    let mut xadj = Vec::with_capacity(rows.len() + 1);
    xadj.push(0);
    let mut adjncy = Vec::with_capacity(rows.iter().map(Vec::len).sum());
    for row in &rows {
        adjncy.extend_from_slice(row);
        xadj.push(adjncy.len());
    }

    DistributedGraph {
        vtxdist: partition.vtxdist(),
        xadj,
        adjncy,
        vwgt: vec![weight; rows.len()],
    }
}

/// Serial CSR graph with dense `usize` vertices, as handed to partitioners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsrGraph {
    pub xadj: Vec<usize>,
    pub adjncy: Vec<usize>,
    pub vwgt: Vec<i32>,
}

impl CsrGraph {
    pub fn n_vertices(&self) -> usize {
        self.xadj.len().saturating_sub(1)
    }

    pub fn neighbors(&self, v: usize) -> &[usize] {
        &self.adjncy[self.xadj[v]..self.xadj[v + 1]]
    }

    pub fn weight(&self, v: usize) -> i64 {
        i64::from(self.vwgt.get(v).copied().unwrap_or(1))
    }

    /// Undirected edges `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.n_vertices()).flat_map(move |u| {
            self.neighbors(u)
                .iter()
                .copied()
                .filter(move |&v| u < v)
                .map(move |v| (u, v))
        })
    }
}
