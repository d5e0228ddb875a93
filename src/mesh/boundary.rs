//! Boundary tags on element sides and nodes.
//!
//! [`BoundaryInfo`] maps `(element, side)` pairs to sets of integer
//! boundary IDs, optionally named (`left`, `top`, ...). Node tags are
//! derived from the side tags by
//! [`BoundaryInfo::build_node_list_from_side_list`].

use std::collections::{BTreeMap, BTreeSet};

use crate::mesh::Elem;
use crate::structured::{ElemId, NodeId};

/// Integer boundary identifier. Structured grids use the side index.
pub type BoundaryId = i32;

/// Side and node boundary tags of one process's mesh.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct BoundaryInfo {
    sides: BTreeMap<(ElemId, usize), BTreeSet<BoundaryId>>,
    nodes: BTreeMap<NodeId, BTreeSet<BoundaryId>>,
    sideset_names: BTreeMap<BoundaryId, String>,
}

impl BoundaryInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag `side` of `elem` with `id`. Returns false if the tag was already there.
    pub fn add_side(&mut self, elem: ElemId, side: usize, id: BoundaryId) -> bool {
        self.sides.entry((elem, side)).or_default().insert(id)
    }

    /// Whether `side` of `elem` carries `id`.
    pub fn has_boundary_id(&self, elem: ElemId, side: usize, id: BoundaryId) -> bool {
        self.sides
            .get(&(elem, side))
            .is_some_and(|ids| ids.contains(&id))
    }

    /// Whether `side` of `elem` carries any tag at all.
    pub fn is_tagged(&self, elem: ElemId, side: usize) -> bool {
        self.sides.get(&(elem, side)).is_some_and(|ids| !ids.is_empty())
    }

    /// Tags on `side` of `elem`, ascending.
    pub fn side_boundary_ids(&self, elem: ElemId, side: usize) -> Vec<BoundaryId> {
        self.sides
            .get(&(elem, side))
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Drop every side tag of `elem`.
    pub fn remove_elem(&mut self, elem: ElemId) {
        self.sides.retain(|(e, _), _| *e != elem);
    }

    /// Every distinct boundary ID used on sides or nodes.
    pub fn boundary_ids(&self) -> BTreeSet<BoundaryId> {
        self.sides
            .values()
            .chain(self.nodes.values())
            .flat_map(|ids| ids.iter().copied())
            .collect()
    }

    pub fn n_boundary_ids(&self) -> usize {
        self.boundary_ids().len()
    }

    /// Number of sides tagged with `id`.
    pub fn side_count(&self, id: BoundaryId) -> usize {
        self.sides.values().filter(|ids| ids.contains(&id)).count()
    }

    /// `(elem, side, id)` triples in deterministic order.
    pub fn side_list(&self) -> Vec<(ElemId, usize, BoundaryId)> {
        self.sides
            .iter()
            .flat_map(|(&(e, s), ids)| ids.iter().map(move |&id| (e, s, id)))
            .collect()
    }

    pub fn set_sideset_name(&mut self, id: BoundaryId, name: impl Into<String>) {
        self.sideset_names.insert(id, name.into());
    }

    pub fn sideset_name(&self, id: BoundaryId) -> Option<&str> {
        self.sideset_names.get(&id).map(String::as_str)
    }

    /// Reverse lookup of [`BoundaryInfo::sideset_name`].
    pub fn boundary_id_by_name(&self, name: &str) -> Option<BoundaryId> {
        self.sideset_names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(&id, _)| id)
    }

    pub fn add_node(&mut self, node: NodeId, id: BoundaryId) -> bool {
        self.nodes.entry(node).or_default().insert(id)
    }

    pub fn node_boundary_ids(&self, node: NodeId) -> Vec<BoundaryId> {
        self.nodes
            .get(&node)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Nodes tagged with `id`, ascending.
    pub fn nodes_with_boundary(&self, id: BoundaryId) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, ids)| ids.contains(&id))
            .map(|(&n, _)| n)
            .collect()
    }

    /// Rebuild node tags: every node on a tagged side inherits the side's IDs.
    ///
    /// Sides of elements missing from `elems` are skipped.
    pub fn build_node_list_from_side_list(&mut self, elems: &BTreeMap<ElemId, Elem>) {
        self.nodes.clear();
        for (&(elem, side), ids) in &self.sides {
            let Some(e) = elems.get(&elem) else {
                continue;
            };
            for node in e.side_node_ids(side) {
                self.nodes.entry(node).or_default().extend(ids.iter().copied());
            }
        }
    }
}
