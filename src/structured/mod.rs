//! Structured index space for rectilinear meshes.
//!
//! Elements of an `nx × ny × nz` grid are never stored globally; their
//! identity is a pure function of the logical coordinate `(i, j, k)`:
//!
//! * element IDs: `i + nx*j + nx*ny*k` (the trailing terms vanish in 1D/2D),
//! * node IDs: the same linearization over the shared node lattice,
//!   `(nx+1) × (ny+1) × (nz+1)` for linear elements and the doubled
//!   lattice `(2nx+1) × (2ny+1)` for quadratic ones.
//!
//! Each supported element kind implements [`ElementTopology`]; the
//! generator picks one with [`topology_for`] and stays element-agnostic
//! afterwards.
//!
//! Side numbering is shared by neighbor lists and boundary IDs:
//!
//! | kind | sides |
//! |------|-------|
//! | edge | 0 `left`, 1 `right` |
//! | quad | 0 `bottom`, 1 `right`, 2 `top`, 3 `left` |
//! | hex  | 0 `back`, 1 `bottom`, 2 `right`, 3 `top`, 4 `left`, 5 `front` |

pub mod edge;
pub mod hex;
pub mod quad;

pub use edge::{Edge2, Edge3};
pub use hex::Hex8;
pub use quad::{Quad4, Quad9};

use crate::mesh::{BoundaryId, DistributedMesh, Elem};
use crate::mesh_error::MeshGenError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dense element identifier.
pub type ElemId = u64;
/// Dense node identifier, shared by every process touching the node.
pub type NodeId = u64;
/// Logical grid coordinate `(i, j, k)`.
pub type Ijk = [u64; 3];

/// Number of elements along each axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dims {
    pub nx: u64,
    pub ny: u64,
    pub nz: u64,
}

impl Dims {
    pub const fn new(nx: u64, ny: u64, nz: u64) -> Self {
        Self { nx, ny, nz }
    }

    /// Total number of elements.
    pub const fn n_elems(&self) -> u64 {
        self.nx * self.ny * self.nz
    }

    /// Element count along `axis` (0, 1 or 2).
    pub fn along(&self, axis: usize) -> u64 {
        [self.nx, self.ny, self.nz][axis]
    }

    /// Row-major linearization `i + nx*(j + ny*k)`.
    #[inline]
    pub const fn linear_id(&self, ijk: Ijk) -> u64 {
        ijk[0] + self.nx * (ijk[1] + self.ny * ijk[2])
    }

    /// Inverse of [`Dims::linear_id`].
    #[inline]
    pub const fn linear_indices(&self, id: u64) -> Ijk {
        let i = id % self.nx;
        let j = (id / self.nx) % self.ny;
        let k = id / (self.nx * self.ny);
        [i, j, k]
    }

    /// Whether `ijk` addresses an element of the grid.
    pub fn contains(&self, ijk: Ijk) -> bool {
        ijk[0] < self.nx && ijk[1] < self.ny && ijk[2] < self.nz
    }
}

/// Physical bounding box of the generated mesh.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Extents {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Extents {
    pub fn width(&self, axis: usize) -> f64 {
        self.max[axis] - self.min[axis]
    }
}

impl Default for Extents {
    fn default() -> Self {
        Self {
            min: [0.0; 3],
            max: [1.0; 3],
        }
    }
}

/// Element families known to the configuration layer.
///
/// Only the kinds accepted by [`topology_for`] can be generated; the
/// others parse so that an unsupported request fails with an
/// [`MeshGenError::Unimplemented`] naming the kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElemType {
    #[serde(alias = "EDGE")]
    Edge2,
    Edge3,
    Edge4,
    #[serde(alias = "QUAD")]
    Quad4,
    Quad8,
    Quad9,
    Tri3,
    Tri6,
    #[serde(alias = "HEX")]
    Hex8,
    Hex20,
    Hex27,
    Tet4,
    Tet10,
    Prism6,
    Prism15,
    Prism18,
    Pyramid5,
    Pyramid13,
    Pyramid14,
}

const ALL_ELEM_TYPES: [(ElemType, &str); 19] = [
    (ElemType::Edge2, "EDGE2"),
    (ElemType::Edge3, "EDGE3"),
    (ElemType::Edge4, "EDGE4"),
    (ElemType::Quad4, "QUAD4"),
    (ElemType::Quad8, "QUAD8"),
    (ElemType::Quad9, "QUAD9"),
    (ElemType::Tri3, "TRI3"),
    (ElemType::Tri6, "TRI6"),
    (ElemType::Hex8, "HEX8"),
    (ElemType::Hex20, "HEX20"),
    (ElemType::Hex27, "HEX27"),
    (ElemType::Tet4, "TET4"),
    (ElemType::Tet10, "TET10"),
    (ElemType::Prism6, "PRISM6"),
    (ElemType::Prism15, "PRISM15"),
    (ElemType::Prism18, "PRISM18"),
    (ElemType::Pyramid5, "PYRAMID5"),
    (ElemType::Pyramid13, "PYRAMID13"),
    (ElemType::Pyramid14, "PYRAMID14"),
];

const EDGE_SIDES: [&[usize]; 2] = [&[0], &[1]];
const QUAD_SIDES: [&[usize]; 4] = [&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
const HEX_SIDES: [&[usize]; 6] = [
    &[0, 3, 2, 1],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
    &[4, 5, 6, 7],
];

impl ElemType {
    /// Topological dimension of the element.
    pub fn dim(self) -> usize {
        use ElemType::*;
        match self {
            Edge2 | Edge3 | Edge4 => 1,
            Quad4 | Quad8 | Quad9 | Tri3 | Tri6 => 2,
            _ => 3,
        }
    }

    /// The linear element used when no `elem_type` is configured.
    pub fn default_for_dim(dim: usize) -> Option<Self> {
        match dim {
            1 => Some(ElemType::Edge2),
            2 => Some(ElemType::Quad4),
            3 => Some(ElemType::Hex8),
            _ => None,
        }
    }

    /// Number of nodes of one element.
    pub fn n_nodes(self) -> usize {
        use ElemType::*;
        match self {
            Edge2 => 2,
            Edge3 | Tri3 => 3,
            Edge4 | Quad4 | Tet4 => 4,
            Pyramid5 => 5,
            Tri6 | Prism6 => 6,
            Quad8 | Hex8 => 8,
            Quad9 => 9,
            Tet10 => 10,
            Pyramid13 => 13,
            Pyramid14 => 14,
            Prism15 => 15,
            Prism18 => 18,
            Hex20 => 20,
            Hex27 => 27,
        }
    }

    /// Number of sides (faces of codimension one).
    pub fn n_sides(self) -> usize {
        use ElemType::*;
        match self {
            Edge2 | Edge3 | Edge4 => 2,
            Tri3 | Tri6 => 3,
            Quad4 | Quad8 | Quad9 | Tet4 | Tet10 => 4,
            Prism6 | Prism15 | Prism18 | Pyramid5 | Pyramid13 | Pyramid14 => 5,
            Hex8 | Hex20 | Hex27 => 6,
        }
    }

    /// Local indices of the vertex nodes on `side`.
    ///
    /// Two elements are face neighbors exactly when they share the vertex
    /// set of a side. Empty for kinds without a structured layout.
    pub fn side_vertices(self, side: usize) -> &'static [usize] {
        use ElemType::*;
        let table: &[&'static [usize]] = match self {
            Edge2 | Edge3 | Edge4 => &EDGE_SIDES,
            Quad4 | Quad8 | Quad9 => &QUAD_SIDES,
            Hex8 | Hex20 | Hex27 => &HEX_SIDES,
            _ => &[],
        };
        table.get(side).copied().unwrap_or(&[])
    }

    /// Name used in configuration files, e.g. `QUAD4`.
    pub fn name(self) -> &'static str {
        ALL_ELEM_TYPES
            .iter()
            .find(|(t, _)| *t == self)
            .map(|(_, n)| *n)
            .unwrap_or("UNKNOWN")
    }
}

impl fmt::Display for ElemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElemType {
    type Err = MeshGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "EDGE" => return Ok(ElemType::Edge2),
            "QUAD" => return Ok(ElemType::Quad4),
            "HEX" => return Ok(ElemType::Hex8),
            _ => {}
        }
        ALL_ELEM_TYPES
            .iter()
            .find(|(_, n)| *n == upper)
            .map(|(t, _)| *t)
            .ok_or_else(|| MeshGenError::invalid_parameter("elem_type", s, "unknown element type"))
    }
}

/// Index-space strategy for one element kind.
///
/// Implementations are pure: every method is a function of the grid
/// dimensions and its arguments, so any process can evaluate it for any
/// element without communication.
pub trait ElementTopology: fmt::Debug + Send + Sync {
    /// The element kind produced by [`ElementTopology::add_element`].
    fn elem_type(&self) -> ElemType;

    /// Grid dimensions (unused axes are 1).
    fn dims(&self) -> Dims;

    /// Topological dimension.
    fn dim(&self) -> usize {
        self.elem_type().dim()
    }

    /// Total element count.
    fn n_elems(&self) -> u64 {
        self.dims().n_elems()
    }

    /// Element ID of the cell at `ijk`.
    fn elem_id(&self, ijk: Ijk) -> ElemId;

    /// Logical coordinate of element `id`.
    fn indices(&self, id: ElemId) -> Ijk;

    /// Number of existing face neighbors of the cell at `ijk`.
    fn num_neighbors(&self, ijk: Ijk) -> usize {
        self.neighbors(ijk, false).iter().flatten().count()
    }

    /// Neighbors of the cell at `ijk`.
    ///
    /// Face mode returns one entry per side, in side order, `None` on the
    /// grid boundary. Corner mode returns the full `3^d - 1` neighborhood
    /// (diagonals included), `None` outside the grid.
    fn neighbors(&self, ijk: Ijk, corner: bool) -> Vec<Option<ElemId>>;

    /// ID of the node at lattice position `node_ijk`.
    fn node_id(&self, node_ijk: Ijk) -> NodeId;

    /// Nodes of the cell at `ijk` in local node order, with unit-cube coordinates.
    fn element_nodes(&self, ijk: Ijk) -> Vec<(NodeId, [f64; 3])>;

    /// Side-set names indexed by boundary ID.
    fn boundary_names(&self) -> &'static [&'static str];

    /// Sides of the cell at `ijk` that lie on the grid boundary.
    ///
    /// Boundary IDs equal side indices.
    fn boundary_sides(&self, ijk: Ijk) -> Vec<(usize, BoundaryId)> {
        self.neighbors(ijk, false)
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_none())
            .map(|(side, _)| (side, side as BoundaryId))
            .collect()
    }

    /// Materialize the cell at `ijk` in `mesh`.
    ///
    /// Nodes are added by ID, so nodes shared with elements added earlier
    /// coalesce. Returns `Ok(false)` without touching the mesh if the
    /// element is already present.
    fn add_element(
        &self,
        mesh: &mut DistributedMesh,
        ijk: Ijk,
        elem_id: ElemId,
        owner: usize,
    ) -> Result<bool, MeshGenError> {
        debug_assert_eq!(self.elem_id(ijk), elem_id);
        if mesh.contains_elem(elem_id) {
            return Ok(false);
        }

        let mut nodes = Vec::with_capacity(self.elem_type().n_nodes());
        for (id, unit) in self.element_nodes(ijk) {
            mesh.add_point(id, unit);
            nodes.push(id);
        }

        mesh.add_elem(Elem::new(elem_id, self.elem_type(), nodes, owner))?;

        let boundary = mesh.boundary_info_mut();
        for (side, bid) in self.boundary_sides(ijk) {
            boundary.add_side(elem_id, side, bid);
        }
        Ok(true)
    }

    /// Map unit-cube coordinates onto `extents` along the active axes.
    fn scale_nodes(&self, mesh: &mut DistributedMesh, extents: &Extents) {
        let dim = self.dim();
        for node in mesh.nodes_mut() {
            for axis in 0..dim {
                node.coords[axis] = node.coords[axis] * extents.width(axis) + extents.min[axis];
            }
        }
    }
}

/// Select the topology implementation for `elem_type` on a grid of `dims`.
pub fn topology_for(
    elem_type: ElemType,
    dims: Dims,
) -> Result<Box<dyn ElementTopology>, MeshGenError> {
    let topology: Box<dyn ElementTopology> = match elem_type {
        ElemType::Edge2 => Box::new(Edge2::new(dims.nx)),
        ElemType::Edge3 => Box::new(Edge3::new(dims.nx)),
        ElemType::Quad4 => Box::new(Quad4::new(dims.nx, dims.ny)),
        ElemType::Quad9 => Box::new(Quad9::new(dims.nx, dims.ny)),
        ElemType::Hex8 => Box::new(Hex8::new(dims.nx, dims.ny, dims.nz)),
        other => {
            return Err(MeshGenError::Unimplemented {
                operation: "element topology",
                elem_type: other,
            });
        }
    };
    Ok(topology)
}

/// Full `3^dim - 1` neighborhood of `ijk`, ordered k-slowest.
pub(crate) fn corner_neighborhood(dims: Dims, dim: usize, ijk: Ijk) -> Vec<Option<ElemId>> {
    let n = [dims.nx, dims.ny, dims.nz];
    let offsets = |axis: usize| if axis < dim { -1i64..=1 } else { 0i64..=0 };
    let mut out = Vec::with_capacity(3usize.pow(dim as u32) - 1);
    for dk in offsets(2) {
        for dj in offsets(1) {
            for di in offsets(0) {
                if di == 0 && dj == 0 && dk == 0 {
                    continue;
                }
                let cand = [
                    ijk[0] as i64 + di,
                    ijk[1] as i64 + dj,
                    ijk[2] as i64 + dk,
                ];
                let inside = (0..3).all(|a| cand[a] >= 0 && (cand[a] as u64) < n[a]);
                out.push(inside.then(|| {
                    dims.linear_id([cand[0] as u64, cand[1] as u64, cand[2] as u64])
                }));
            }
        }
    }
    out
}
