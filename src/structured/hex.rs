//! Hexahedral elements on an `nx × ny × nz` grid.

use super::{Dims, ElemId, ElemType, ElementTopology, Ijk, NodeId, corner_neighborhood};

const HEX_BOUNDARY_NAMES: &[&str] = &["back", "bottom", "right", "top", "left", "front"];

/// Eight-node trilinear hexahedron.
///
/// Nodes 0-3 run counter-clockwise around the `k` face, 4-7 repeat the
/// pattern on the `k + 1` face.
#[derive(Clone, Copy, Debug)]
pub struct Hex8 {
    nx: u64,
    ny: u64,
    nz: u64,
}

impl Hex8 {
    pub fn new(nx: u64, ny: u64, nz: u64) -> Self {
        Self { nx, ny, nz }
    }
}

impl ElementTopology for Hex8 {
    fn elem_type(&self) -> ElemType {
        ElemType::Hex8
    }

    fn dims(&self) -> Dims {
        Dims::new(self.nx, self.ny, self.nz)
    }

    fn elem_id(&self, ijk: Ijk) -> ElemId {
        ijk[0] + ijk[1] * self.nx + ijk[2] * self.nx * self.ny
    }

    fn indices(&self, id: ElemId) -> Ijk {
        let i = id % self.nx;
        let j = ((id - i) / self.nx) % self.ny;
        let k = (id - i - j * self.nx) / (self.nx * self.ny);
        [i, j, k]
    }

    fn neighbors(&self, ijk: Ijk, corner: bool) -> Vec<Option<ElemId>> {
        if corner {
            return corner_neighborhood(self.dims(), 3, ijk);
        }
        let [i, j, k] = ijk;
        let id = |i, j, k| self.elem_id([i, j, k]);
        vec![
            // back
            (k > 0).then(|| id(i, j, k - 1)),
            // bottom
            (j > 0).then(|| id(i, j - 1, k)),
            // right
            (i + 1 < self.nx).then(|| id(i + 1, j, k)),
            // top
            (j + 1 < self.ny).then(|| id(i, j + 1, k)),
            // left
            (i > 0).then(|| id(i - 1, j, k)),
            // front
            (k + 1 < self.nz).then(|| id(i, j, k + 1)),
        ]
    }

    fn node_id(&self, node_ijk: Ijk) -> NodeId {
        node_ijk[0] + (self.nx + 1) * (node_ijk[1] + node_ijk[2] * (self.ny + 1))
    }

    fn element_nodes(&self, ijk: Ijk) -> Vec<(NodeId, [f64; 3])> {
        let [i, j, k] = ijk;
        let (nx, ny, nz) = (self.nx as f64, self.ny as f64, self.nz as f64);
        [
            [i, j, k],
            [i + 1, j, k],
            [i + 1, j + 1, k],
            [i, j + 1, k],
            [i, j, k + 1],
            [i + 1, j, k + 1],
            [i + 1, j + 1, k + 1],
            [i, j + 1, k + 1],
        ]
        .into_iter()
        .map(|n| {
            (
                self.node_id(n),
                [n[0] as f64 / nx, n[1] as f64 / ny, n[2] as f64 / nz],
            )
        })
        .collect()
    }

    fn boundary_names(&self) -> &'static [&'static str] {
        HEX_BOUNDARY_NAMES
    }
}
