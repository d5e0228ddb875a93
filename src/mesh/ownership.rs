//! Ownership metadata for mesh elements.
//!
//! [`ElemOwnership`] records the owning rank of every element present on
//! this rank and whether it is a ghost here.

use std::collections::BTreeMap;

use crate::mesh_error::MeshGenError;
use crate::structured::ElemId;

#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OwnershipEntry {
    pub owner: usize,
    pub is_ghost: bool,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ElemOwnership {
    entries: BTreeMap<ElemId, OwnershipEntry>,
}

impl ElemOwnership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked elements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or update the entry for `elem`.
    pub fn set(&mut self, elem: ElemId, owner: usize, is_ghost: bool) {
        self.entries.insert(elem, OwnershipEntry { owner, is_ghost });
    }

    /// Insert or update, deriving ghostness from `my_rank`.
    pub fn set_from_owner(&mut self, elem: ElemId, owner: usize, my_rank: usize) {
        self.set(elem, owner, owner != my_rank);
    }

    pub fn entry(&self, elem: ElemId) -> Option<OwnershipEntry> {
        self.entries.get(&elem).copied()
    }

    pub fn owner(&self, elem: ElemId) -> Option<usize> {
        self.entry(elem).map(|e| e.owner)
    }

    /// Owning rank, or [`MeshGenError::MissingElement`] if untracked.
    pub fn owner_or_err(&self, elem: ElemId) -> Result<usize, MeshGenError> {
        self.owner(elem).ok_or(MeshGenError::MissingElement(elem))
    }

    pub fn is_ghost(&self, elem: ElemId) -> Option<bool> {
        self.entry(elem).map(|e| e.is_ghost)
    }

    pub fn is_owned_by(&self, elem: ElemId, rank: usize) -> bool {
        self.owner(elem).is_some_and(|owner| owner == rank)
    }

    /// Owned (non-ghost) elements, ascending.
    pub fn owned_elems(&self) -> impl Iterator<Item = ElemId> + '_ {
        self.entries
            .iter()
            .filter(|(_, e)| !e.is_ghost)
            .map(|(&id, _)| id)
    }

    /// Ghost elements, ascending.
    pub fn ghost_elems(&self) -> impl Iterator<Item = ElemId> + '_ {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_ghost)
            .map(|(&id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElemId, OwnershipEntry)> + '_ {
        self.entries.iter().map(|(&id, &e)| (id, e))
    }
}
