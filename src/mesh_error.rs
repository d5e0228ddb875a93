//! MeshGenError: unified error type for mesh generation.
//!
//! Every variant is fatal for the `generate()` call that produced it: a
//! partially built distributed mesh cannot be repaired, so there is no
//! retry or degraded path. Variants fall into four groups:
//! configuration, algorithmic invariant violations, unimplemented
//! element specializations, and communication failures.

use crate::structured::ElemType;
use thiserror::Error;

/// Unified error type for mesh generation operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshGenError {
    // --- configuration -----------------------------------------------------
    /// A configuration parameter is out of range or inconsistent.
    #[error("invalid parameter `{name}` = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },
    /// The requested element type does not match the mesh dimension.
    #[error("element type {elem_type} is not valid for a {dim}D mesh")]
    UnsupportedElementType { elem_type: ElemType, dim: usize },
    /// The named partitioner package is unknown or not compiled in.
    #[error("partitioner package `{0}` is not available in this build")]
    PartitionerUnavailable(String),

    // --- algorithmic invariants ----------------------------------------------
    /// The partitioner itself reported a failure.
    #[error("partitioner `{package}` failed: {reason}")]
    PartitionerFailed { package: String, reason: String },
    /// The partitioner returned the wrong number of assignments.
    #[error("partition output has {got} entries for {expected} local elements")]
    PartitionSizeMismatch { expected: usize, got: usize },
    /// The partitioner assigned an element to a non-existent process.
    #[error("element {elem} was assigned to process {part}, but only {n_parts} processes exist")]
    PartitionOutOfRange { elem: u64, part: usize, n_parts: usize },
    /// No process could tell the post-partition owner of a ghost element.
    #[error("rank {rank} cannot resolve the owner of ghost element {elem}")]
    UnresolvedGhostOwner { elem: u64, rank: usize },
    /// A node sits neither on a vertex nor on a midside position of the grid.
    #[error("unable to bias node {node}: coordinate {coord} along axis {axis} is not a vertex or midside position")]
    UnsupportedBiasPosition { node: u64, axis: usize, coord: f64 },
    /// A side has no neighbor, boundary tag or remote marker (or more than one).
    #[error("element {elem} side {side} is {state}")]
    DanglingSide {
        elem: u64,
        side: usize,
        state: &'static str,
    },
    /// An element ID was referenced but is not present in the mesh.
    #[error("element {0} is not present in the mesh")]
    MissingElement(u64),
    /// A node ID was referenced but is not present in the mesh.
    #[error("node {0} is not present in the mesh")]
    MissingNode(u64),

    // --- unimplemented specializations ---------------------------------------
    /// The element type has no implementation of the requested operation.
    #[error("`{operation}` is not implemented for element type {elem_type}")]
    Unimplemented {
        operation: &'static str,
        elem_type: ElemType,
    },

    // --- communication ---------------------------------------------------------
    /// A message to or from `neighbor` was lost, truncated or malformed.
    #[error("communication with rank {neighbor} failed: {reason}")]
    CommError { neighbor: usize, reason: String },
}

impl MeshGenError {
    /// Shorthand for [`MeshGenError::InvalidParameter`].
    pub fn invalid_parameter(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        MeshGenError::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`MeshGenError::CommError`].
    pub fn comm(neighbor: usize, reason: impl Into<String>) -> Self {
        MeshGenError::CommError {
            neighbor,
            reason: reason.into(),
        }
    }

    /// True for errors caused by the user's configuration rather than a bug.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            MeshGenError::InvalidParameter { .. }
                | MeshGenError::UnsupportedElementType { .. }
                | MeshGenError::PartitionerUnavailable(_)
        )
    }
}
