//! Ghost layer discovery, owner resolution and neighbor sealing.
//!
//! Each layer runs the same four stages on every rank:
//!
//! 1. link the elements already present,
//! 2. collect the absent neighbors across untagged, unlinked sides,
//! 3. ask each absent element's *initial linear* owner where it went,
//! 4. materialize the ghosts with their true owners.
//!
//! The initial linear owner can always answer: migration is a single hop,
//! so it holds the destination of every element it started with. After the
//! last layer, [`seal`] relinks everything and marks the sides that still
//! face an absent element as remote.

use std::collections::BTreeSet;

use itertools::Itertools;

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::exchange::{Exchanger, INVALID_ID, KeyedIds};
use crate::generator::config::RectilinearMeshConfig;
use crate::mesh::{DistributedMesh, Neighbor};
use crate::mesh_error::MeshGenError;
use crate::partitioning::PartitionId;
use crate::partitioning::linear::LinearPartition;
use crate::structured::{ElemId, ElementTopology};

/// What a rank knows about the initial partition.
pub struct OwnerTable<'a> {
    pub linear: &'a LinearPartition,
    /// Post-partition owner of each element of this rank's linear chunk.
    pub parts: &'a [PartitionId],
}

impl OwnerTable<'_> {
    /// Answer an owner query for `id` on `rank`.
    pub fn answer(&self, rank: usize, id: ElemId) -> Result<u64, MeshGenError> {
        let range = self.linear.range(rank);
        if !range.contains(&id) {
            return Err(MeshGenError::UnresolvedGhostOwner { elem: id, rank });
        }
        self.parts
            .get((id - range.start) as usize)
            .map(|&p| p as u64)
            .ok_or(MeshGenError::UnresolvedGhostOwner { elem: id, rank })
    }
}

/// IDs of absent elements across the unlinked, untagged sides of every
/// present element, plus (with `corners`) the absent point neighbors of
/// locally owned elements.
pub fn collect_ghosts(
    mesh: &DistributedMesh,
    topology: &dyn ElementTopology,
    corners: bool,
) -> BTreeSet<ElemId> {
    let mut wanted = BTreeSet::new();
    for elem in mesh.elems() {
        let ijk = topology.indices(elem.id);
        let face = topology.neighbors(ijk, false);
        for side in 0..elem.n_sides() {
            if elem.neighbor(side).is_some() || mesh.boundary_info().is_tagged(elem.id, side) {
                continue;
            }
            if let Some(Some(n)) = face.get(side) {
                wanted.insert(*n);
            }
        }
        if corners && elem.processor_id == mesh.rank() {
            wanted.extend(topology.neighbors(ijk, true).into_iter().flatten());
        }
    }
    wanted.retain(|id| !mesh.contains_elem(*id));
    wanted
}

/// Resolve the owners of `ghosts` (collective). Returns `(id, owner)` pairs.
pub fn query_owners<C: Communicator>(
    ex: &Exchanger<'_, C>,
    ghosts: &BTreeSet<ElemId>,
    table: &OwnerTable<'_>,
    tag: CommTag,
) -> Result<Vec<(ElemId, usize)>, MeshGenError> {
    let me = ex.rank();
    let mut requests = KeyedIds::new();
    for &id in ghosts {
        requests.entry(table.linear.owner(id)).or_default().push(id);
    }

    let answers = ex.pull(&requests, tag, |_, id| table.answer(me, id))?;

    let mut resolved = Vec::with_capacity(ghosts.len());
    for (peer, ids) in &requests {
        let owners = answers.get(peer).map(Vec::as_slice).unwrap_or(&[]);
        for (&id, &owner) in ids.iter().zip(owners) {
            if owner == INVALID_ID || owner as usize >= ex.size() {
                return Err(MeshGenError::UnresolvedGhostOwner { elem: id, rank: me });
            }
            resolved.push((id, owner as usize));
        }
    }
    Ok(resolved)
}

/// Grow `mesh` by `cfg.num_side_layers` ghost rings. Collective; every
/// rank runs the same number of rounds.
pub fn add_ghost_layers<C: Communicator>(
    ex: &Exchanger<'_, C>,
    mesh: &mut DistributedMesh,
    topology: &dyn ElementTopology,
    table: &OwnerTable<'_>,
    cfg: &RectilinearMeshConfig,
    tag: CommTag,
) -> Result<(), MeshGenError> {
    for layer in 0..cfg.num_side_layers {
        mesh.find_neighbors(false);
        let ghosts = collect_ghosts(mesh, topology, cfg.ghost_point_neighbors && layer == 0);
        if cfg.verbose {
            log::info!(
                "rank {} layer {layer}: ghosts {}",
                ex.rank(),
                ghosts.iter().join(" ")
            );
        }

        let resolved = query_owners(ex, &ghosts, table, tag)?;
        for (id, owner) in resolved {
            topology.add_element(mesh, topology.indices(id), id, owner)?;
        }
        log::debug!(
            "rank {} layer {layer}: added {} ghosts",
            ex.rank(),
            ghosts.len()
        );
    }
    Ok(())
}

/// Relink from scratch, mark every side still facing an absent element as
/// [`Neighbor::Remote`] and check that no side is left dangling.
pub fn seal(mesh: &mut DistributedMesh) -> Result<(), MeshGenError> {
    mesh.find_neighbors(true);
    let mut open = Vec::new();
    for elem in mesh.elems() {
        for side in 0..elem.n_sides() {
            if elem.neighbor(side).is_none() && !mesh.boundary_info().is_tagged(elem.id, side) {
                open.push((elem.id, side));
            }
        }
    }
    for (id, side) in open {
        mesh.set_neighbor(id, side, Some(Neighbor::Remote))?;
    }
    mesh.validate_sides()
}
