//! One-dimensional line elements.

use super::{Dims, ElemId, ElemType, ElementTopology, Ijk, NodeId};

const EDGE_BOUNDARY_NAMES: &[&str] = &["left", "right"];

fn edge_neighbors(nx: u64, i: u64) -> Vec<Option<ElemId>> {
    vec![
        // left
        (i > 0).then(|| i - 1),
        // right
        (i + 1 < nx).then(|| i + 1),
    ]
}

/// Two-node line element.
#[derive(Clone, Copy, Debug)]
pub struct Edge2 {
    nx: u64,
}

impl Edge2 {
    pub fn new(nx: u64) -> Self {
        Self { nx }
    }
}

impl ElementTopology for Edge2 {
    fn elem_type(&self) -> ElemType {
        ElemType::Edge2
    }

    fn dims(&self) -> Dims {
        Dims::new(self.nx, 1, 1)
    }

    fn elem_id(&self, ijk: Ijk) -> ElemId {
        ijk[0]
    }

    fn indices(&self, id: ElemId) -> Ijk {
        [id, 0, 0]
    }

    // In 1D the corner neighborhood is the face neighborhood.
    fn neighbors(&self, ijk: Ijk, _corner: bool) -> Vec<Option<ElemId>> {
        edge_neighbors(self.nx, ijk[0])
    }

    fn node_id(&self, node_ijk: Ijk) -> NodeId {
        node_ijk[0]
    }

    fn element_nodes(&self, ijk: Ijk) -> Vec<(NodeId, [f64; 3])> {
        let nx = self.nx as f64;
        let i = ijk[0];
        vec![
            (self.node_id([i, 0, 0]), [i as f64 / nx, 0.0, 0.0]),
            (self.node_id([i + 1, 0, 0]), [(i + 1) as f64 / nx, 0.0, 0.0]),
        ]
    }

    fn boundary_names(&self) -> &'static [&'static str] {
        EDGE_BOUNDARY_NAMES
    }
}

/// Three-node (quadratic) line element: two vertices, then the midpoint.
///
/// Nodes live on the doubled lattice `0..=2nx`.
#[derive(Clone, Copy, Debug)]
pub struct Edge3 {
    nx: u64,
}

impl Edge3 {
    pub fn new(nx: u64) -> Self {
        Self { nx }
    }
}

impl ElementTopology for Edge3 {
    fn elem_type(&self) -> ElemType {
        ElemType::Edge3
    }

    fn dims(&self) -> Dims {
        Dims::new(self.nx, 1, 1)
    }

    fn elem_id(&self, ijk: Ijk) -> ElemId {
        ijk[0]
    }

    fn indices(&self, id: ElemId) -> Ijk {
        [id, 0, 0]
    }

    fn neighbors(&self, ijk: Ijk, _corner: bool) -> Vec<Option<ElemId>> {
        edge_neighbors(self.nx, ijk[0])
    }

    fn node_id(&self, node_ijk: Ijk) -> NodeId {
        node_ijk[0]
    }

    fn element_nodes(&self, ijk: Ijk) -> Vec<(NodeId, [f64; 3])> {
        let n = (2 * self.nx) as f64;
        let a = 2 * ijk[0];
        [a, a + 2, a + 1]
            .into_iter()
            .map(|h| (self.node_id([h, 0, 0]), [h as f64 / n, 0.0, 0.0]))
            .collect()
    }

    fn boundary_names(&self) -> &'static [&'static str] {
        EDGE_BOUNDARY_NAMES
    }
}
