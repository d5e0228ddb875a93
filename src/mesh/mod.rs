//! Per-process unstructured view of the generated mesh.
//!
//! A [`DistributedMesh`] holds the elements this rank owns plus its ghost
//! layer, each with explicit node lists, neighbor links and boundary tags.
//! Node and element IDs are global, so meshes built independently on
//! different ranks agree on every shared entity.

pub mod boundary;
pub mod ownership;

pub use boundary::{BoundaryId, BoundaryInfo};
pub use ownership::{ElemOwnership, OwnershipEntry};

use std::collections::BTreeMap;

use hashbrown::HashMap;

use crate::mesh_error::MeshGenError;
use crate::structured::{ElemId, ElemType, NodeId};

/// A mesh vertex (or higher-order node).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub coords: [f64; 3],
    /// Set by [`DistributedMesh::prepare_for_use`].
    pub processor_id: Option<usize>,
}

/// Neighbor across one side of an element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Neighbor {
    /// The neighbor is present in this mesh.
    Local(ElemId),
    /// The neighbor exists but lives only on another rank.
    Remote,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Elem {
    pub id: ElemId,
    pub elem_type: ElemType,
    pub nodes: Vec<NodeId>,
    pub processor_id: usize,
    neighbors: Vec<Option<Neighbor>>,
}

impl Elem {
    pub fn new(id: ElemId, elem_type: ElemType, nodes: Vec<NodeId>, processor_id: usize) -> Self {
        Self {
            id,
            elem_type,
            nodes,
            processor_id,
            neighbors: vec![None; elem_type.n_sides()],
        }
    }

    pub fn n_sides(&self) -> usize {
        self.neighbors.len()
    }

    pub fn neighbor(&self, side: usize) -> Option<Neighbor> {
        self.neighbors.get(side).copied().flatten()
    }

    /// Global IDs of the vertices of `side`, in element-local order.
    pub fn side_vertex_ids(&self, side: usize) -> Vec<NodeId> {
        self.elem_type
            .side_vertices(side)
            .iter()
            .filter_map(|&local| self.nodes.get(local).copied())
            .collect()
    }

    /// Global IDs of every node on `side`, midside nodes included.
    pub fn side_node_ids(&self, side: usize) -> Vec<NodeId> {
        let mut ids = self.side_vertex_ids(side);
        if matches!(self.elem_type, ElemType::Quad8 | ElemType::Quad9) {
            if let Some(&mid) = self.nodes.get(4 + side) {
                ids.push(mid);
            }
        }
        ids
    }

    // Sorted vertex IDs identify a side independently of which element sees it.
    fn side_key(&self, side: usize) -> Vec<NodeId> {
        let mut key = self.side_vertex_ids(side);
        key.sort_unstable();
        key
    }
}

/// Classification of one element side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SideState {
    Linked(ElemId),
    Boundary,
    Remote,
    /// Neither linked, tagged nor marked remote.
    Dangling,
    /// Linked or remote and also boundary-tagged.
    Conflicting,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DistributedMesh {
    rank: usize,
    n_procs: usize,
    dim: usize,
    nodes: BTreeMap<NodeId, Node>,
    elems: BTreeMap<ElemId, Elem>,
    boundary: BoundaryInfo,
    ownership: ElemOwnership,
    prepared: bool,
}

impl DistributedMesh {
    pub fn new(rank: usize, n_procs: usize, dim: usize) -> Self {
        Self {
            rank,
            n_procs,
            dim,
            nodes: BTreeMap::new(),
            elems: BTreeMap::new(),
            boundary: BoundaryInfo::new(),
            ownership: ElemOwnership::new(),
            prepared: false,
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn n_procs(&self) -> usize {
        self.n_procs
    }

    pub fn mesh_dimension(&self) -> usize {
        self.dim
    }

    pub fn n_elem(&self) -> usize {
        self.elems.len()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Add a node unless one with `id` exists. Returns whether it was added.
    pub fn add_point(&mut self, id: NodeId, coords: [f64; 3]) -> bool {
        if self.nodes.contains_key(&id) {
            return false;
        }
        self.nodes.insert(
            id,
            Node {
                id,
                coords,
                processor_id: None,
            },
        );
        self.prepared = false;
        true
    }

    /// Add `elem` unless its ID is taken. Returns whether it was added.
    ///
    /// Every referenced node must already be present.
    pub fn add_elem(&mut self, elem: Elem) -> Result<bool, MeshGenError> {
        if self.elems.contains_key(&elem.id) {
            return Ok(false);
        }
        if let Some(&missing) = elem.nodes.iter().find(|n| !self.nodes.contains_key(n)) {
            return Err(MeshGenError::MissingNode(missing));
        }
        self.elems.insert(elem.id, elem);
        self.prepared = false;
        Ok(true)
    }

    pub fn contains_elem(&self, id: ElemId) -> bool {
        self.elems.contains_key(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn elem(&self, id: ElemId) -> Option<&Elem> {
        self.elems.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Elements in ascending ID order.
    pub fn elems(&self) -> impl Iterator<Item = &Elem> + '_ {
        self.elems.values()
    }

    /// Nodes in ascending ID order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> + '_ {
        self.nodes.values_mut()
    }

    /// Elements whose processor ID is this rank.
    pub fn local_elements(&self) -> impl Iterator<Item = &Elem> + '_ {
        let rank = self.rank;
        self.elems.values().filter(move |e| e.processor_id == rank)
    }

    /// Elements present here but owned elsewhere.
    pub fn ghost_elements(&self) -> impl Iterator<Item = &Elem> + '_ {
        let rank = self.rank;
        self.elems.values().filter(move |e| e.processor_id != rank)
    }

    pub fn boundary_info(&self) -> &BoundaryInfo {
        &self.boundary
    }

    pub fn boundary_info_mut(&mut self) -> &mut BoundaryInfo {
        &mut self.boundary
    }

    /// Ownership table built by [`DistributedMesh::prepare_for_use`].
    pub fn ownership(&self) -> &ElemOwnership {
        &self.ownership
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn neighbor(&self, elem: ElemId, side: usize) -> Result<Option<Neighbor>, MeshGenError> {
        let e = self.elems.get(&elem).ok_or(MeshGenError::MissingElement(elem))?;
        Ok(e.neighbor(side))
    }

    pub fn set_neighbor(
        &mut self,
        elem: ElemId,
        side: usize,
        neighbor: Option<Neighbor>,
    ) -> Result<(), MeshGenError> {
        let e = self
            .elems
            .get_mut(&elem)
            .ok_or(MeshGenError::MissingElement(elem))?;
        let slot = e.neighbors.get_mut(side).ok_or_else(|| {
            MeshGenError::invalid_parameter("side", side, format!("element {elem} has fewer sides"))
        })?;
        *slot = neighbor;
        Ok(())
    }

    /// Link every pair of present elements that share a side.
    ///
    /// Existing local links are recomputed. [`Neighbor::Remote`] markers
    /// survive unless `reset_remote` is set or a local match replaces them.
    pub fn find_neighbors(&mut self, reset_remote: bool) {
        let mut open: HashMap<Vec<NodeId>, (ElemId, usize)> = HashMap::new();
        let mut links = Vec::new();
        for elem in self.elems.values() {
            for side in 0..elem.n_sides() {
                let key = elem.side_key(side);
                if key.is_empty() {
                    continue;
                }
                match open.remove(&key) {
                    Some(other) => links.push(((elem.id, side), other)),
                    None => {
                        open.insert(key, (elem.id, side));
                    }
                }
            }
        }

        for elem in self.elems.values_mut() {
            for slot in &mut elem.neighbors {
                match slot {
                    Some(Neighbor::Local(_)) => *slot = None,
                    Some(Neighbor::Remote) if reset_remote => *slot = None,
                    _ => {}
                }
            }
        }

        for ((a, sa), (b, sb)) in links {
            if let Some(e) = self.elems.get_mut(&a) {
                e.neighbors[sa] = Some(Neighbor::Local(b));
            }
            if let Some(e) = self.elems.get_mut(&b) {
                e.neighbors[sb] = Some(Neighbor::Local(a));
            }
        }
        log::trace!(
            "rank {}: find_neighbors left {} unmatched sides",
            self.rank,
            open.len()
        );
    }

    pub fn side_state(&self, elem: ElemId, side: usize) -> Result<SideState, MeshGenError> {
        let neighbor = self.neighbor(elem, side)?;
        let tagged = self.boundary.is_tagged(elem, side);
        Ok(match (neighbor, tagged) {
            (Some(_), true) => SideState::Conflicting,
            (Some(Neighbor::Local(n)), false) => SideState::Linked(n),
            (Some(Neighbor::Remote), false) => SideState::Remote,
            (None, true) => SideState::Boundary,
            (None, false) => SideState::Dangling,
        })
    }

    /// Check that every side has exactly one of: neighbor, tag, remote marker.
    pub fn validate_sides(&self) -> Result<(), MeshGenError> {
        for elem in self.elems.values() {
            for side in 0..elem.n_sides() {
                let state = match self.side_state(elem.id, side)? {
                    SideState::Dangling => "dangling",
                    SideState::Conflicting => "both linked and boundary-tagged",
                    _ => continue,
                };
                return Err(MeshGenError::DanglingSide {
                    elem: elem.id,
                    side,
                    state,
                });
            }
        }
        Ok(())
    }

    /// Overwrite the processor ID of node `id`, e.g. with an owner agreed
    /// across ranks.
    pub fn set_node_processor_id(&mut self, id: NodeId, pid: usize) -> Result<(), MeshGenError> {
        let node = self.nodes.get_mut(&id).ok_or(MeshGenError::MissingNode(id))?;
        node.processor_id = Some(pid);
        Ok(())
    }

    /// Finalize the mesh for consumers.
    ///
    /// Nodes take the smallest processor ID among the *present* elements
    /// touching them (see [`DistributedMesh::set_node_processor_id`] for
    /// the global rule), node boundary tags are derived from the side tags and the
    /// ownership table is rebuilt.
    pub fn prepare_for_use(&mut self, skip_find_neighbors: bool) -> Result<(), MeshGenError> {
        if !skip_find_neighbors {
            self.find_neighbors(false);
        }

        for node in self.nodes.values_mut() {
            node.processor_id = None;
        }
        for elem in self.elems.values() {
            for id in &elem.nodes {
                let node = self.nodes.get_mut(id).ok_or(MeshGenError::MissingNode(*id))?;
                node.processor_id = Some(
                    node.processor_id
                        .map_or(elem.processor_id, |p| p.min(elem.processor_id)),
                );
            }
        }

        self.boundary.build_node_list_from_side_list(&self.elems);

        self.ownership = ElemOwnership::new();
        for elem in self.elems.values() {
            self.ownership
                .set_from_owner(elem.id, elem.processor_id, self.rank);
        }

        self.prepared = true;
        Ok(())
    }
}
