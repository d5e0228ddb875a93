//! Globally consistent node ownership.
//!
//! A node belongs to the smallest processor ID among *all* elements of the
//! grid touching it, not only those present on this rank. Every touching
//! element lies in the corner neighborhood of a present element that holds
//! the node, so the candidates are known locally; the owners of the absent
//! ones are pulled from their initial linear owners without materializing
//! them.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::{HashMap, HashSet};

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::exchange::Exchanger;
use crate::generator::ghosts::{OwnerTable, query_owners};
use crate::mesh::DistributedMesh;
use crate::mesh_error::MeshGenError;
use crate::structured::{ElemId, ElementTopology, NodeId};

/// Every element of the grid touching each node of `mesh`.
pub fn touching_elements(
    mesh: &DistributedMesh,
    topology: &dyn ElementTopology,
) -> BTreeMap<NodeId, BTreeSet<ElemId>> {
    let mut touching: BTreeMap<NodeId, BTreeSet<ElemId>> = BTreeMap::new();
    for elem in mesh.elems() {
        let mine: HashSet<NodeId> = elem.nodes.iter().copied().collect();
        let candidates = std::iter::once(elem.id).chain(
            topology
                .neighbors(topology.indices(elem.id), true)
                .into_iter()
                .flatten(),
        );
        for c in candidates {
            for (node, _) in topology.element_nodes(topology.indices(c)) {
                if mine.contains(&node) {
                    touching.entry(node).or_default().insert(c);
                }
            }
        }
    }
    touching
}

/// Give every node of `mesh` the smallest owner among all elements
/// touching it. Collective; ranks holding a copy of a node agree on it.
pub fn assign_node_owners<C: Communicator>(
    ex: &Exchanger<'_, C>,
    mesh: &mut DistributedMesh,
    topology: &dyn ElementTopology,
    table: &OwnerTable<'_>,
    tag: CommTag,
) -> Result<(), MeshGenError> {
    let touching = touching_elements(mesh, topology);

    let absent: BTreeSet<ElemId> = touching
        .values()
        .flatten()
        .copied()
        .filter(|id| !mesh.contains_elem(*id))
        .collect();
    let mut owner: HashMap<ElemId, usize> = query_owners(ex, &absent, table, tag)?
        .into_iter()
        .collect();
    owner.extend(mesh.elems().map(|e| (e.id, e.processor_id)));
    log::debug!(
        "rank {}: node owners from {} absent elements",
        ex.rank(),
        absent.len()
    );

    for (node, elems) in touching {
        let pid = elems
            .iter()
            .map(|id| {
                owner
                    .get(id)
                    .copied()
                    .ok_or(MeshGenError::UnresolvedGhostOwner {
                        elem: *id,
                        rank: ex.rank(),
                    })
            })
            .try_fold(usize::MAX, |lo, p| p.map(|p| lo.min(p)))?;
        mesh.set_node_processor_id(node, pid)?;
    }
    Ok(())
}
