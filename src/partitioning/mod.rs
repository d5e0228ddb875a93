//! Assignment of elements to processes.
//!
//! Three methods are available (see [`PartitionMethod`]):
//!
//! * `linear`: keep the initial contiguous chunks,
//! * `square`: block decomposition of the grid ([`block`]),
//! * `graph`: a named [`Partitioner`]. The `native` and `hierarch`
//!   packages label each rank's rows where they live ([`coordinate`]);
//!   the opt-in `gathered` and `metis` packages collect the element graph
//!   on rank 0 and cut it there.
//!
//! Whatever the method, every local row ends up with exactly one
//! destination in `0..P`.

pub mod bisection;
pub mod block;
pub mod coordinate;
pub mod linear;
#[cfg(feature = "metis-support")]
pub mod metis;
pub mod metrics;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::dual_graph::{CsrGraph, DistributedGraph};
use crate::algs::exchange::{Exchanger, ROOT};
use crate::mesh_error::MeshGenError;
use crate::partitioning::block::BlockPartition;
use crate::structured::ElementTopology;

pub type PartitionId = usize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionMethod {
    Linear,
    #[default]
    Graph,
    Square,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartitionOptions {
    pub method: PartitionMethod,
    /// Graph partitioner package, used by [`PartitionMethod::Graph`].
    pub part_package: String,
    /// Ranks per compute node, used by the `hierarch` package.
    pub num_parts_per_compute_node: usize,
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            method: PartitionMethod::Graph,
            part_package: "native".to_string(),
            num_parts_per_compute_node: 1,
        }
    }
}

/// A partitioner that sees only the rows of the calling rank.
pub trait RowPartitioner: fmt::Debug + Send + Sync {
    /// Package name as given in the configuration.
    fn name(&self) -> &str;

    /// One part in `0..n_parts` per local row of `graph` on `rank`.
    fn partition_rows(
        &self,
        graph: &DistributedGraph,
        topology: &dyn ElementTopology,
        rank: usize,
        n_parts: usize,
    ) -> Result<Vec<PartitionId>, MeshGenError>;
}

/// A serial partitioner of a whole graph.
pub trait GraphPartitioner: fmt::Debug + Send + Sync {
    /// Package name as given in the configuration.
    fn name(&self) -> &str;

    /// One part in `0..n_parts` per vertex of `graph`.
    fn partition(&self, graph: &CsrGraph, n_parts: usize) -> Result<Vec<PartitionId>, MeshGenError>;
}

/// How [`PartitionMethod::Graph`] reaches its partitioner.
#[derive(Debug)]
pub enum Partitioner {
    /// Every rank labels its own rows; no rank ever holds the whole graph.
    Distributed(Box<dyn RowPartitioner>),
    /// Rank 0 gathers the whole element graph and cuts it serially.
    Gathered(Box<dyn GraphPartitioner>),
}

impl Partitioner {
    pub fn name(&self) -> &str {
        match self {
            Partitioner::Distributed(p) => p.name(),
            Partitioner::Gathered(p) => p.name(),
        }
    }

    pub fn is_distributed(&self) -> bool {
        matches!(self, Partitioner::Distributed(_))
    }
}

/// Look up a partitioner package by name.
///
/// Packages that are unknown or not compiled into this build are a
/// configuration error; there is no fallback.
pub fn resolve_partitioner(
    package: &str,
    parts_per_node: usize,
) -> Result<Partitioner, MeshGenError> {
    match package {
        "native" => Ok(Partitioner::Distributed(Box::new(
            coordinate::CoordinateBisection,
        ))),
        "hierarch" => Ok(Partitioner::Distributed(Box::new(
            coordinate::HierarchicalBisection { parts_per_node },
        ))),
        "gathered" => Ok(Partitioner::Gathered(Box::new(
            bisection::RecursiveBisection,
        ))),
        #[cfg(feature = "metis-support")]
        "metis" => Ok(Partitioner::Gathered(Box::new(metis::MetisKway))),
        other => Err(MeshGenError::PartitionerUnavailable(other.to_string())),
    }
}

/// Check a partitioner's output for rows starting at global ID `first_id`.
pub fn validate_assignment(
    parts: &[PartitionId],
    first_id: u64,
    expected: usize,
    n_parts: usize,
) -> Result<(), MeshGenError> {
    if parts.len() != expected {
        return Err(MeshGenError::PartitionSizeMismatch {
            expected,
            got: parts.len(),
        });
    }
    if let Some((i, &part)) = parts.iter().enumerate().find(|(_, p)| **p >= n_parts) {
        return Err(MeshGenError::PartitionOutOfRange {
            elem: first_id + i as u64,
            part,
            n_parts,
        });
    }
    Ok(())
}

const STATUS_OK: u64 = 0;
const STATUS_FAILED: u64 = 1;

/// Label the local rows in place.
///
/// The only communication is a one-word status round (gathered on rank 0,
/// verdict scattered back), so that a partitioner failing on one rank
/// fails the call on every rank. Uses tags `tag .. tag + 4`.
pub fn partition_local_rows<C: Communicator>(
    graph: &DistributedGraph,
    topology: &dyn ElementTopology,
    partitioner: &dyn RowPartitioner,
    ex: &Exchanger<'_, C>,
    tag: CommTag,
) -> Result<Vec<PartitionId>, MeshGenError> {
    let rank = ex.rank();
    let result = partitioner
        .partition_rows(graph, topology, rank, ex.size())
        .and_then(|p| {
            validate_assignment(&p, graph.first_row(rank), graph.n_local(), ex.size()).map(|_| p)
        });
    if let Err(e) = &result {
        log::warn!("rank {rank}: {} partitioner failed: {e}", partitioner.name());
    }

    let status = if result.is_ok() { STATUS_OK } else { STATUS_FAILED };
    let verdict = ex.gather_to_root(&[status], tag)?.map(|all| {
        let worst = all.iter().flatten().copied().max().unwrap_or(STATUS_OK);
        vec![vec![worst]; ex.size()]
    });
    let agreed = ex.scatter_from_root(verdict, tag.offset(2))?;

    match (result, agreed.first()) {
        (Err(e), _) => Err(e),
        (Ok(parts), Some(&STATUS_OK)) => {
            log::debug!(
                "rank {rank}: {} labeled {} rows",
                partitioner.name(),
                parts.len()
            );
            Ok(parts)
        }
        (Ok(_), _) => Err(MeshGenError::PartitionerFailed {
            package: partitioner.name().to_string(),
            reason: "failed on another rank".to_string(),
        }),
    }
}

/// Partition on rank 0.
///
/// Collective. Rank 0 gathers every rank's rows into one graph, runs
/// `partitioner`, validates and scatters. A failure on rank 0 is broadcast
/// through a status word so that every rank returns an error. Only the
/// opt-in gathered packages take this path. Uses tags `tag .. tag + 8`.
pub fn partition_on_root<C: Communicator>(
    graph: &DistributedGraph,
    partitioner: &dyn GraphPartitioner,
    ex: &Exchanger<'_, C>,
    tag: CommTag,
) -> Result<Vec<PartitionId>, MeshGenError> {
    let n_local = graph.n_local();
    let degrees: Vec<u64> = graph.xadj.windows(2).map(|w| (w[1] - w[0]) as u64).collect();
    let weights: Vec<u64> = graph.vwgt.iter().map(|&w| w as u64).collect();

    let all_degrees = ex.gather_to_root(&degrees, tag)?;
    let all_adjncy = ex.gather_to_root(&graph.adjncy, tag.offset(2))?;
    let all_weights = ex.gather_to_root(&weights, tag.offset(4))?;

    let mut root_err = None;
    let outgoing = match (all_degrees, all_adjncy, all_weights) {
        (Some(d), Some(a), Some(w)) => {
            let counts: Vec<usize> = d.iter().map(Vec::len).collect();
            let global = CsrGraph {
                xadj: std::iter::once(0)
                    .chain(d.iter().flatten().scan(0usize, |acc, &k| {
                        *acc += k as usize;
                        Some(*acc)
                    }))
                    .collect(),
                adjncy: a.into_iter().flatten().map(|v| v as usize).collect(),
                vwgt: w.into_iter().flatten().map(|v| v as i32).collect(),
            };
            let n_parts = ex.size();
            let result = partitioner
                .partition(&global, n_parts)
                .and_then(|p| validate_assignment(&p, 0, global.n_vertices(), n_parts).map(|_| p));
            match result {
                Ok(parts) => {
                    log::debug!(
                        "{} partition: edge cut {}, imbalance {:.3}",
                        partitioner.name(),
                        metrics::edge_cut(&global, &parts),
                        metrics::imbalance(&parts, n_parts)
                    );
                    let mut rest = parts.as_slice();
                    let mut per_rank = Vec::with_capacity(counts.len());
                    for n in counts {
                        let (mine, tail) = rest.split_at(n);
                        rest = tail;
                        per_rank.push(
                            std::iter::once(STATUS_OK)
                                .chain(mine.iter().map(|&p| p as u64))
                                .collect(),
                        );
                    }
                    Some(per_rank)
                }
                Err(e) => {
                    log::warn!("{} partitioner failed: {e}", partitioner.name());
                    root_err = Some(e);
                    Some(vec![vec![STATUS_FAILED]; ex.size()])
                }
            }
        }
        _ => None,
    };

    let received = ex.scatter_from_root(outgoing, tag.offset(6))?;
    if let Some(e) = root_err {
        return Err(e);
    }
    match received.split_first() {
        Some((&STATUS_OK, parts)) => {
            let parts: Vec<PartitionId> = parts.iter().map(|&p| p as usize).collect();
            validate_assignment(&parts, graph.first_row(ex.rank()), n_local, ex.size())?;
            Ok(parts)
        }
        _ => Err(MeshGenError::PartitionerFailed {
            package: partitioner.name().to_string(),
            reason: format!("no valid assignment received from rank {ROOT}"),
        }),
    }
}

/// Destination rank of each row of `graph`, by the configured method.
///
/// Collective for [`PartitionMethod::Graph`] on more than one rank; local
/// otherwise.
pub fn assign_local_rows<C: Communicator>(
    method: PartitionMethod,
    topology: &dyn ElementTopology,
    graph: &DistributedGraph,
    partitioner: &Partitioner,
    ex: &Exchanger<'_, C>,
    tag: CommTag,
) -> Result<Vec<PartitionId>, MeshGenError> {
    let n_local = graph.n_local();
    if ex.size() == 1 {
        return Ok(vec![0; n_local]);
    }
    match method {
        PartitionMethod::Linear => Ok(vec![ex.rank(); n_local]),
        PartitionMethod::Square => {
            let blocks = BlockPartition::new(topology.dims(), topology.dim(), ex.size());
            let first = graph.first_row(ex.rank());
            log::debug!("square partition with blocks {:?}", blocks.blocks());
            Ok((first..first + n_local as u64)
                .map(|id| blocks.owner(topology.indices(id)))
                .collect())
        }
        PartitionMethod::Graph => match partitioner {
            Partitioner::Distributed(p) => {
                partition_local_rows(graph, topology, p.as_ref(), ex, tag)
            }
            Partitioner::Gathered(p) => {
                log::debug!("gathering the element graph on rank {ROOT} for {}", p.name());
                partition_on_root(graph, p.as_ref(), ex, tag)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_packages_are_configuration_errors() {
        for name in ["parmetis", "ptscotch", "chaco", "party", "bogus"] {
            let err = resolve_partitioner(name, 1).unwrap_err();
            assert_eq!(err, MeshGenError::PartitionerUnavailable(name.to_string()));
            assert!(err.is_configuration_error());
        }
        let native = resolve_partitioner("native", 1).unwrap();
        assert_eq!(native.name(), "native");
        assert!(native.is_distributed());
        assert!(resolve_partitioner("hierarch", 2).unwrap().is_distributed());
        let gathered = resolve_partitioner("gathered", 1).unwrap();
        assert_eq!(gathered.name(), "gathered");
        assert!(!gathered.is_distributed());
    }

    #[test]
    fn assignment_checks() {
        validate_assignment(&[0, 1, 1], 4, 3, 2).unwrap();
        assert_eq!(
            validate_assignment(&[0, 1], 4, 3, 2),
            Err(MeshGenError::PartitionSizeMismatch { expected: 3, got: 2 })
        );
        assert_eq!(
            validate_assignment(&[0, 2, 1], 4, 3, 2),
            Err(MeshGenError::PartitionOutOfRange {
                elem: 5,
                part: 2,
                n_parts: 2
            })
        );
    }

    #[test]
    fn options_default_to_native_graph() {
        let opts: PartitionOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, PartitionOptions::default());
        let opts: PartitionOptions =
            serde_json::from_str(r#"{"method": "square"}"#).unwrap();
        assert_eq!(opts.method, PartitionMethod::Square);
        assert!(serde_json::from_str::<PartitionOptions>(r#"{"nparts": 2}"#).is_err());
    }
}
