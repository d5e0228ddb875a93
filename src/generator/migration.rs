//! Hand each element of the initial linear chunk to its assigned rank.

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::exchange::{Exchanger, KeyedIds};
use crate::mesh_error::MeshGenError;
use crate::partitioning::PartitionId;
use crate::structured::ElemId;

/// Push `first_row + i` to `parts[i]` for every local row; return the IDs
/// this rank now owns, ascending.
///
/// Collective: every rank takes part even with nothing to send.
pub fn migrate<C: Communicator>(
    ex: &Exchanger<'_, C>,
    first_row: ElemId,
    parts: &[PartitionId],
    tag: CommTag,
) -> Result<Vec<ElemId>, MeshGenError> {
    let mut outgoing = KeyedIds::new();
    for (i, &dest) in parts.iter().enumerate() {
        outgoing.entry(dest).or_default().push(first_row + i as u64);
    }
    log::debug!(
        "rank {}: sending {} elements to {} ranks",
        ex.rank(),
        parts.len(),
        outgoing.keys().filter(|&&r| r != ex.rank()).count()
    );

    let incoming = ex.push(&outgoing, tag)?;
    let mut owned: Vec<ElemId> = incoming.into_values().flatten().collect();
    owned.sort_unstable();
    Ok(owned)
}
