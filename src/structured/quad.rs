//! Quadrilateral elements on an `nx × ny` grid.

use super::{Dims, ElemId, ElemType, ElementTopology, Ijk, NodeId, corner_neighborhood};

const QUAD_BOUNDARY_NAMES: &[&str] = &["bottom", "right", "top", "left"];

fn quad_neighbors(nx: u64, ny: u64, i: u64, j: u64) -> Vec<Option<ElemId>> {
    let id = |i: u64, j: u64| i + nx * j;
    vec![
        // bottom
        (j > 0).then(|| id(i, j - 1)),
        // right
        (i + 1 < nx).then(|| id(i + 1, j)),
        // top
        (j + 1 < ny).then(|| id(i, j + 1)),
        // left
        (i > 0).then(|| id(i - 1, j)),
    ]
}

/// Four-node bilinear quadrilateral, nodes counter-clockwise from the
/// lower-left corner.
#[derive(Clone, Copy, Debug)]
pub struct Quad4 {
    nx: u64,
    ny: u64,
}

impl Quad4 {
    pub fn new(nx: u64, ny: u64) -> Self {
        Self { nx, ny }
    }
}

impl ElementTopology for Quad4 {
    fn elem_type(&self) -> ElemType {
        ElemType::Quad4
    }

    fn dims(&self) -> Dims {
        Dims::new(self.nx, self.ny, 1)
    }

    fn elem_id(&self, ijk: Ijk) -> ElemId {
        ijk[0] + self.nx * ijk[1]
    }

    fn indices(&self, id: ElemId) -> Ijk {
        let i = id % self.nx;
        [i, (id - i) / self.nx, 0]
    }

    fn neighbors(&self, ijk: Ijk, corner: bool) -> Vec<Option<ElemId>> {
        if corner {
            corner_neighborhood(self.dims(), 2, ijk)
        } else {
            quad_neighbors(self.nx, self.ny, ijk[0], ijk[1])
        }
    }

    fn node_id(&self, node_ijk: Ijk) -> NodeId {
        node_ijk[0] + (self.nx + 1) * node_ijk[1]
    }

    fn element_nodes(&self, ijk: Ijk) -> Vec<(NodeId, [f64; 3])> {
        let [i, j, _] = ijk;
        let (nx, ny) = (self.nx as f64, self.ny as f64);
        [(i, j), (i + 1, j), (i + 1, j + 1), (i, j + 1)]
            .into_iter()
            .map(|(a, b)| {
                (
                    self.node_id([a, b, 0]),
                    [a as f64 / nx, b as f64 / ny, 0.0],
                )
            })
            .collect()
    }

    fn boundary_names(&self) -> &'static [&'static str] {
        QUAD_BOUNDARY_NAMES
    }
}

/// Nine-node biquadratic quadrilateral: four corners, four midsides
/// (bottom, right, top, left), then the center.
///
/// Nodes live on the doubled lattice `(2nx+1) × (2ny+1)`.
#[derive(Clone, Copy, Debug)]
pub struct Quad9 {
    nx: u64,
    ny: u64,
}

impl Quad9 {
    pub fn new(nx: u64, ny: u64) -> Self {
        Self { nx, ny }
    }
}

impl ElementTopology for Quad9 {
    fn elem_type(&self) -> ElemType {
        ElemType::Quad9
    }

    fn dims(&self) -> Dims {
        Dims::new(self.nx, self.ny, 1)
    }

    fn elem_id(&self, ijk: Ijk) -> ElemId {
        ijk[0] + self.nx * ijk[1]
    }

    fn indices(&self, id: ElemId) -> Ijk {
        let i = id % self.nx;
        [i, (id - i) / self.nx, 0]
    }

    fn neighbors(&self, ijk: Ijk, corner: bool) -> Vec<Option<ElemId>> {
        if corner {
            corner_neighborhood(self.dims(), 2, ijk)
        } else {
            quad_neighbors(self.nx, self.ny, ijk[0], ijk[1])
        }
    }

    fn node_id(&self, node_ijk: Ijk) -> NodeId {
        node_ijk[0] + (2 * self.nx + 1) * node_ijk[1]
    }

    fn element_nodes(&self, ijk: Ijk) -> Vec<(NodeId, [f64; 3])> {
        let (a, b) = (2 * ijk[0], 2 * ijk[1]);
        let (nx, ny) = ((2 * self.nx) as f64, (2 * self.ny) as f64);
        [
            (a, b),
            (a + 2, b),
            (a + 2, b + 2),
            (a, b + 2),
            (a + 1, b),
            (a + 2, b + 1),
            (a + 1, b + 2),
            (a, b + 1),
            (a + 1, b + 1),
        ]
        .into_iter()
        .map(|(p, q)| {
            (
                self.node_id([p, q, 0]),
                [p as f64 / nx, q as f64 / ny, 0.0],
            )
        })
        .collect()
    }

    fn boundary_names(&self) -> &'static [&'static str] {
        QUAD_BOUNDARY_NAMES
    }
}
