//! Recursive coordinate bisection of the implicit grid.
//!
//! Every cut is a plane across the longest active axis of the current
//! box, placed so that both sides get cells in proportion to their part
//! counts. The part of a cell is found by descending the cuts from its
//! `(i, j, k)` alone, so each rank labels its own rows without any
//! communication and all ranks agree on every label.

use std::cmp::Reverse;

use crate::algs::dual_graph::DistributedGraph;
use crate::mesh_error::MeshGenError;
use crate::partitioning::{PartitionId, RowPartitioner};
use crate::structured::{Dims, ElementTopology, Ijk};

/// Half-open box of cells `lo[a] .. hi[a]` per axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellBox {
    pub lo: Ijk,
    pub hi: Ijk,
}

impl CellBox {
    /// The whole grid.
    pub fn grid(dims: Dims) -> Self {
        Self {
            lo: [0; 3],
            hi: [dims.nx, dims.ny, dims.nz],
        }
    }

    pub fn extent(&self, axis: usize) -> u64 {
        self.hi[axis].saturating_sub(self.lo[axis])
    }

    pub fn n_cells(&self) -> u64 {
        (0..3).map(|a| self.extent(a)).product()
    }

    pub fn contains(&self, ijk: Ijk) -> bool {
        (0..3).all(|a| self.lo[a] <= ijk[a] && ijk[a] < self.hi[a])
    }
}

/// Part in `0..n_parts` of the cell at `ijk` when `cells` is bisected
/// recursively over its first `dim` axes, along with the box of that part.
pub fn locate(cells: CellBox, dim: usize, n_parts: usize, ijk: Ijk) -> (PartitionId, CellBox) {
    let mut cells = cells;
    let mut first = 0;
    let mut n = n_parts.max(1);
    while n > 1 {
        let left = n / 2;
        // longest axis; ties go to the lowest
        let axis = (0..dim.clamp(1, 3))
            .max_by_key(|&a| (cells.extent(a), Reverse(a)))
            .unwrap_or(0);
        let extent = cells.extent(axis);
        let cut = cells.lo[axis] + (extent * left as u64 + n as u64 / 2) / n as u64;
        if ijk[axis] < cut {
            cells.hi[axis] = cut;
            n = left;
        } else {
            cells.lo[axis] = cut;
            first += left;
            n -= left;
        }
    }
    (first, cells)
}

fn local_ids(graph: &DistributedGraph, rank: usize) -> impl Iterator<Item = u64> {
    let first = graph.first_row(rank);
    first..first + graph.n_local() as u64
}

/// Recursive coordinate bisection into `P` parts.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoordinateBisection;

impl RowPartitioner for CoordinateBisection {
    fn name(&self) -> &str {
        "native"
    }

    fn partition_rows(
        &self,
        graph: &DistributedGraph,
        topology: &dyn ElementTopology,
        rank: usize,
        n_parts: usize,
    ) -> Result<Vec<PartitionId>, MeshGenError> {
        let grid = CellBox::grid(topology.dims());
        Ok(local_ids(graph, rank)
            .map(|id| locate(grid, topology.dim(), n_parts, topology.indices(id)).0)
            .collect())
    }
}

/// Bisect across compute nodes first, then within each node.
///
/// With `P` ranks and `k` ranks per node the grid is cut into `P / k`
/// node boxes; each node box is then cut into `k`.
#[derive(Clone, Copy, Debug)]
pub struct HierarchicalBisection {
    pub parts_per_node: usize,
}

impl RowPartitioner for HierarchicalBisection {
    fn name(&self) -> &str {
        "hierarch"
    }

    fn partition_rows(
        &self,
        graph: &DistributedGraph,
        topology: &dyn ElementTopology,
        rank: usize,
        n_parts: usize,
    ) -> Result<Vec<PartitionId>, MeshGenError> {
        let k = self.parts_per_node;
        if k == 0 || n_parts % k != 0 {
            return Err(MeshGenError::invalid_parameter(
                "num_parts_per_compute_node",
                k,
                format!("must divide the number of processes ({n_parts})"),
            ));
        }
        let n_nodes = n_parts / k;
        let grid = CellBox::grid(topology.dims());
        let dim = topology.dim();
        Ok(local_ids(graph, rank)
            .map(|id| {
                let ijk = topology.indices(id);
                let (node, node_box) = locate(grid, dim, n_nodes, ijk);
                let (fine, _) = locate(node_box, dim, k, ijk);
                node * k + fine
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::dual_graph::build_local_graph;
    use crate::partitioning::linear::LinearPartition;
    use crate::partitioning::metrics::part_sizes;
    use crate::structured::{Edge2, Hex8, Quad4};

    fn all_parts(topology: &dyn ElementTopology, p: &dyn RowPartitioner, n_parts: usize) -> Vec<usize> {
        // label on one rank per part, as the generator would
        let linear = LinearPartition::new(topology.n_elems(), n_parts);
        (0..n_parts)
            .flat_map(|rank| {
                let g = build_local_graph(topology, &linear, rank);
                p.partition_rows(&g, topology, rank, n_parts).unwrap()
            })
            .collect()
    }

    #[test]
    fn line_splits_into_contiguous_chunks() {
        let parts = all_parts(&Edge2::new(9), &CoordinateBisection, 3);
        assert_eq!(parts, vec![0, 0, 0, 1, 1, 1, 2, 2, 2]);
    }

    #[test]
    fn square_grid_splits_into_quadrants() {
        let topo = Quad4::new(4, 4);
        let parts = all_parts(&topo, &CoordinateBisection, 4);
        assert_eq!(part_sizes(&parts, 4), vec![4; 4]);
        // cells (0,0) and (1,1) share a quadrant, (2,2) does not
        assert_eq!(parts[0], parts[5]);
        assert_ne!(parts[0], parts[10]);
    }

    #[test]
    fn labels_do_not_depend_on_the_number_of_ranks_asking() {
        let topo = Hex8::new(3, 4, 5);
        let serial = all_parts(&topo, &CoordinateBisection, 1);
        assert!(serial.iter().all(|&p| p == 0));
        let linear = LinearPartition::new(topo.n_elems(), 7);
        let mut from_chunks = Vec::new();
        for rank in 0..7 {
            let g = build_local_graph(&topo, &linear, rank);
            from_chunks.extend(CoordinateBisection.partition_rows(&g, &topo, rank, 6).unwrap());
        }
        let whole: Vec<usize> = (0..topo.n_elems())
            .map(|id| locate(CellBox::grid(topo.dims()), 3, 6, topo.indices(id)).0)
            .collect();
        assert_eq!(from_chunks, whole);
        assert_eq!(part_sizes(&whole, 6).iter().sum::<usize>(), 60);
        assert!(whole.iter().all(|&p| p < 6));
    }

    #[test]
    fn more_parts_than_cells_leaves_parts_empty() {
        let parts = all_parts(&Edge2::new(2), &CoordinateBisection, 3);
        assert_eq!(parts, vec![0, 1]);
    }

    #[test]
    fn part_boxes_hold_their_cells() {
        let grid = CellBox::grid(Dims::new(5, 3, 1));
        for j in 0..3 {
            for i in 0..5 {
                let (_, b) = locate(grid, 2, 4, [i, j, 0]);
                assert!(b.contains([i, j, 0]));
                assert!(b.n_cells() >= 1);
            }
        }
    }

    #[test]
    fn hierarchical_requires_a_divisor() {
        let topo = Edge2::new(8);
        let linear = LinearPartition::new(8, 4);
        let g = build_local_graph(&topo, &linear, 0);
        let h = HierarchicalBisection { parts_per_node: 3 };
        assert!(h.partition_rows(&g, &topo, 0, 4).unwrap_err().is_configuration_error());

        let h = HierarchicalBisection { parts_per_node: 2 };
        let parts = all_parts(&topo, &h, 4);
        assert_eq!(parts, vec![0, 0, 1, 1, 2, 2, 3, 3]);
    }
}
